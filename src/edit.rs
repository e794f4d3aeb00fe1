use std::io::Write;
use std::path::Path;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The fundamental edit primitive: byte-span replacement with verification.
///
/// Every structural change (function bodies, doc comments, declarative block
/// bodies) compiles down to one or more of these. Intelligence lives in span
/// acquisition, not application.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until applied"]
pub struct Edit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text to insert at [byte_start, byte_end)
    pub new_text: String,
    /// Verification of what we expect to find before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("before-text verification failed at byte {byte_start}")]
    BeforeTextMismatch {
        byte_start: usize,
        byte_end: usize,
        found: String,
    },

    #[error("invalid byte range: [{byte_start}, {byte_end}) in buffer of length {len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        len: usize,
    },

    #[error("overlapping edits at byte {byte_start}")]
    Overlap { byte_start: usize },

    #[error("edit boundary at byte {0} is not a UTF-8 character boundary")]
    CharBoundary(usize),
}

impl Edit {
    /// Create a replacement edit that expects `expected_before` at the span.
    pub fn new(
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: &str,
    ) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(expected_before),
        }
    }

    /// Create a pure insertion at `at`.
    pub fn insert(at: usize, new_text: impl Into<String>) -> Self {
        Self::new(at, at, new_text, "")
    }

    /// Create a deletion of the span, verified against the current text.
    pub fn delete(byte_start: usize, byte_end: usize, current: &str) -> Self {
        Self::new(byte_start, byte_end, String::new(), current)
    }

    /// Validate the edit against `content`, returning the current span text.
    fn validate<'a>(&self, content: &'a str) -> Result<&'a str, EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                len: content.len(),
            });
        }
        for offset in [self.byte_start, self.byte_end] {
            if !content.is_char_boundary(offset) {
                return Err(EditError::CharBoundary(offset));
            }
        }

        let current = &content[self.byte_start..self.byte_end];
        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }
        Ok(current)
    }
}

/// Apply a set of edits computed against the same `content`.
///
/// Edits are sorted by byte_start descending and spliced bottom-to-top so
/// earlier offsets stay valid. Overlapping spans are rejected. An insertion
/// may share its offset with the start of a replaced span.
pub fn apply_edits(content: &str, mut edits: Vec<Edit>) -> Result<String, EditError> {
    if edits.is_empty() {
        return Ok(content.to_string());
    }

    for edit in &edits {
        edit.validate(content)?;
    }

    // Reverse first so the stable sort splices same-offset insertions in
    // reverse, which leaves them in caller order in the output.
    edits.reverse();
    edits.sort_by(|a, b| {
        b.byte_start
            .cmp(&a.byte_start)
            .then(b.byte_end.cmp(&a.byte_end))
    });

    for window in edits.windows(2) {
        let (later, earlier) = (&window[0], &window[1]);
        if earlier.byte_end > later.byte_start {
            return Err(EditError::Overlap {
                byte_start: later.byte_start,
            });
        }
    }

    let mut updated = content.to_string();
    for edit in &edits {
        updated.replace_range(edit.byte_start..edit.byte_end, &edit.new_text);
    }
    Ok(updated)
}

/// Atomic file write: tempfile + fsync + rename.
///
/// The whole content lands in one rename, so readers see either the old or
/// the new file.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

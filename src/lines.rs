//! Line-number patching for files no structural parser handles.

use crate::plan::Change;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum LinePatchError {
    #[error("line {line_num} out of range: file has {line_count} line(s)")]
    OutOfRange { line_num: usize, line_count: usize },

    #[error("file is not valid UTF-8 (first invalid byte at offset {0})")]
    NotUtf8(usize),
}

/// Apply line changes in order, each against the progressively edited lines.
///
/// A trailing newline on `original` is restored on output. Empty input is
/// treated as a new file, which gets a trailing newline once it has lines.
pub fn apply_lines(original: &[u8], changes: &[&Change]) -> Result<Vec<u8>, LinePatchError> {
    let text =
        std::str::from_utf8(original).map_err(|err| LinePatchError::NotUtf8(err.valid_up_to()))?;

    let (body, trailing_newline) = match text.strip_suffix('\n') {
        Some(body) => (body, true),
        None => (text, text.is_empty()),
    };
    let mut lines: Vec<String> = if text.is_empty() {
        Vec::new()
    } else {
        body.split('\n').map(str::to_string).collect()
    };

    for change in changes {
        let index = match change.line_num {
            0 => {
                lines.push(change.add.clone());
                lines.len() - 1
            }
            line_num if line_num <= lines.len() => {
                let line = &mut lines[line_num - 1];
                if !change.delete.is_empty() {
                    match line.find(&change.delete) {
                        Some(at) => line.replace_range(at..at + change.delete.len(), ""),
                        None => warn!(
                            path = %change.path.display(),
                            line_num,
                            delete = %change.delete,
                            "text to delete not found on line"
                        ),
                    }
                }
                line.push_str(&change.add);
                line_num - 1
            }
            line_num => {
                return Err(LinePatchError::OutOfRange {
                    line_num,
                    line_count: lines.len(),
                })
            }
        };

        if lines[index].contains('\n') {
            let split: Vec<String> = lines[index].split('\n').map(str::to_string).collect();
            lines.splice(index..=index, split);
        }
    }

    let mut out = lines.join("\n");
    if trailing_newline && !lines.is_empty() {
        out.push('\n');
    }
    Ok(out.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn change(line_num: usize, add: &str, delete: &str) -> Change {
        Change {
            path: PathBuf::from("notes.txt"),
            line_num,
            add: add.to_string(),
            delete: delete.to_string(),
        }
    }

    fn apply(original: &str, changes: &[Change]) -> Result<String, LinePatchError> {
        let refs: Vec<&Change> = changes.iter().collect();
        apply_lines(original.as_bytes(), &refs).map(|out| String::from_utf8(out).unwrap())
    }

    #[test]
    fn append_adds_last_line() {
        let out = apply("one\ntwo\n", &[change(0, "X", "")]).unwrap();
        assert_eq!(out, "one\ntwo\nX\n");
    }

    #[test]
    fn delete_then_append_on_line() {
        let out = apply("abc\n", &[change(1, "b", "a")]).unwrap();
        assert_eq!(out, "bcb\n");
    }

    #[test]
    fn only_first_occurrence_is_deleted() {
        let out = apply("a-a-a", &[change(1, "", "a")]).unwrap();
        assert_eq!(out, "-a-a");
    }

    #[test]
    fn missing_delete_still_appends() {
        let out = apply("abc", &[change(1, "!", "zzz")]).unwrap();
        assert_eq!(out, "abc!");
    }

    #[test]
    fn missing_file_is_empty() {
        let out = apply("", &[change(0, "first", ""), change(0, "second", "")]).unwrap();
        assert_eq!(out, "first\nsecond\n");
    }

    #[test]
    fn out_of_range_is_an_error() {
        let err = apply("one\n", &[change(2, "x", "")]).unwrap_err();
        assert!(matches!(
            err,
            LinePatchError::OutOfRange {
                line_num: 2,
                line_count: 1
            }
        ));
    }

    #[test]
    fn added_newlines_shift_later_changes() {
        let out = apply(
            "head\ntail\n",
            &[change(1, "\ninserted", ""), change(3, "!", "")],
        )
        .unwrap();
        assert_eq!(out, "head\ninserted\ntail!\n");
    }

    #[test]
    fn no_trailing_newline_is_preserved() {
        let out = apply("a\nb", &[change(2, "c", "")]).unwrap();
        assert_eq!(out, "a\nbc");
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let refs: Vec<&Change> = Vec::new();
        assert!(matches!(
            apply_lines(&[0x61, 0xff], &refs),
            Err(LinePatchError::NotUtf8(1))
        ));
    }
}

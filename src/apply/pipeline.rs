use crate::apply::{ApplyError, FileOutcome};
use crate::diff::render_diff;
use crate::edit::atomic_write;
use crate::hcl::{HclEditor, HclError};
use crate::kind::{KindRegistry, SourceKind};
use crate::lines::apply_lines;
use crate::plan::{BlockChange, Change};
use crate::ts::{replace_function, ProceduralLang};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub(crate) const FUNCTION_TARGET: &str = "function";

pub(crate) enum FileWork<'a> {
    Blocks(Vec<&'a BlockChange>),
    Lines(Vec<&'a Change>),
}

/// Every change for one file, in plan order.
pub(crate) struct FileJob<'a> {
    /// Plan path of the first change, used in reports and errors
    pub path: &'a Path,
    /// Resolved location read and written on disk
    pub target: PathBuf,
    pub work: FileWork<'a>,
}

pub(crate) struct JobContext<'a> {
    pub dry_run: bool,
    pub color: bool,
    pub registry: &'a KindRegistry,
}

pub(crate) fn run_job(job: &FileJob<'_>, ctx: &JobContext<'_>) -> Result<FileOutcome, ApplyError> {
    let path = job.path;
    let resolved = job.target.as_path();

    let (original, modified) = match &job.work {
        FileWork::Blocks(changes) => {
            let kind = ctx.registry.detect(path);
            if kind == SourceKind::Unsupported {
                return Err(ApplyError::UnsupportedFileType {
                    path: path.to_path_buf(),
                });
            }
            let original = fs::read_to_string(resolved).map_err(|source| ApplyError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let mut content = original.clone();
            for change in changes {
                content = apply_block_change(kind, path, &content, change)?;
            }
            (original.into_bytes(), content.into_bytes())
        }
        FileWork::Lines(changes) => {
            let original = match fs::read(resolved) {
                Ok(bytes) => bytes,
                Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
                Err(source) => {
                    return Err(ApplyError::Read {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            };
            let modified = apply_lines(&original, changes).map_err(|source| ApplyError::Lines {
                path: path.to_path_buf(),
                source,
            })?;
            (original, modified)
        }
    };

    let changed = original != modified;
    let mut outcome = FileOutcome {
        path: path.to_path_buf(),
        diff: String::new(),
        changed,
        written: false,
    };

    if ctx.dry_run {
        outcome.diff = render_diff(
            &String::from_utf8_lossy(&original),
            &String::from_utf8_lossy(&modified),
            path,
            ctx.color,
        );
        return Ok(outcome);
    }

    if changed {
        write_file(resolved, &modified).map_err(|source| ApplyError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "wrote file");
        outcome.written = true;
    }

    Ok(outcome)
}

fn apply_block_change(
    kind: SourceKind,
    path: &Path,
    content: &str,
    change: &BlockChange,
) -> Result<String, ApplyError> {
    let block = &change.block;
    debug!(
        path = %path.display(),
        target_type = %block.target_type,
        target_name = %block.target_name,
        "applying block change"
    );

    match kind {
        SourceKind::Procedural(lang) => apply_procedural(lang, path, content, change),
        SourceKind::Declarative => {
            apply_declarative(content, change).map_err(|source| ApplyError::Declarative {
                path: path.to_path_buf(),
                source,
            })
        }
        SourceKind::Unsupported => Err(ApplyError::UnsupportedFileType {
            path: path.to_path_buf(),
        }),
    }
}

fn apply_procedural(
    lang: ProceduralLang,
    path: &Path,
    content: &str,
    change: &BlockChange,
) -> Result<String, ApplyError> {
    let block = &change.block;
    if block.target_type != FUNCTION_TARGET {
        return Err(ApplyError::UnsupportedTarget {
            path: path.to_path_buf(),
            target_type: block.target_type.clone(),
        });
    }

    replace_function(
        lang,
        content,
        &block.target_name,
        &change.new_content,
        &change.new_comment,
    )
    .map_err(|source| ApplyError::Function {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_declarative(content: &str, change: &BlockChange) -> Result<String, HclError> {
    let block = &change.block;
    if !change.new_comment.trim().is_empty() {
        warn!(
            path = %block.path.display(),
            target_type = %block.target_type,
            target_name = %block.target_name,
            "comments are not supported for declarative blocks; skipping comment"
        );
    }

    let editor = HclEditor::parse(content)?;
    if change.new_content.trim().is_empty() {
        editor.require_block(&block.target_type, &block.target_name)?;
        return Ok(content.to_string());
    }
    editor.replace_block(&block.target_type, &block.target_name, &change.new_content)
}

fn write_file(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    atomic_write(path, content)
}

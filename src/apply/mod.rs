//! Batch apply: one task per file on a bounded worker pool.
//!
//! Workers send their outcome over a channel and a single aggregator builds
//! the report after the pool scope joins. The first error received is the one
//! returned; every other file still runs to completion.

mod pipeline;

use crate::hcl::HclError;
use crate::kind::KindRegistry;
use crate::lines::LinePatchError;
use crate::plan::{ChangePlan, PlanChanges};
use crate::safety::{SafetyError, WorkspaceGuard};
use crate::ts::FunctionError;
use pipeline::{run_job, FileJob, FileWork, JobContext};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Directory change paths are resolved against and confined to.
    /// `None` resolves relative paths against the current directory.
    pub root: Option<PathBuf>,
    /// Render diffs instead of writing files
    pub dry_run: bool,
    /// Worker threads; 0 picks the default for this machine
    pub workers: usize,
    /// Colorize rendered diffs
    pub color: bool,
    pub registry: KindRegistry,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// Path as given in the plan
    pub path: PathBuf,
    /// Unified diff; only rendered in dry-run mode
    pub diff: String,
    pub changed: bool,
    pub written: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub dry_run: bool,
    /// Outcomes in completion order
    pub files: Vec<FileOutcome>,
}

impl ApplyReport {
    /// Every rendered diff, concatenated.
    pub fn render(&self) -> String {
        self.files.iter().map(|file| file.diff.as_str()).collect()
    }

    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .filter(|file| file.written)
            .map(|file| file.path.as_path())
    }

    pub fn changed_count(&self) -> usize {
        self.files.iter().filter(|file| file.changed).count()
    }
}

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("unsupported file type: {}", .path.display())]
    UnsupportedFileType { path: PathBuf },

    #[error("unsupported target type '{target_type}' in {}", .path.display())]
    UnsupportedTarget { path: PathBuf, target_type: String },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Function {
        path: PathBuf,
        #[source]
        source: FunctionError,
    },

    #[error("{}: {source}", .path.display())]
    Declarative {
        path: PathBuf,
        #[source]
        source: HclError,
    },

    #[error("{}: {source}", .path.display())]
    Lines {
        path: PathBuf,
        #[source]
        source: LinePatchError,
    },

    #[error("{}: {source}", .path.display())]
    Unsafe {
        path: PathBuf,
        #[source]
        source: SafetyError,
    },

    #[error("invalid root: {0}")]
    Root(#[source] SafetyError),

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl ApplyError {
    /// The plan path of the file that failed, when the error concerns one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ApplyError::UnsupportedFileType { path }
            | ApplyError::UnsupportedTarget { path, .. }
            | ApplyError::Read { path, .. }
            | ApplyError::Write { path, .. }
            | ApplyError::Function { path, .. }
            | ApplyError::Declarative { path, .. }
            | ApplyError::Lines { path, .. }
            | ApplyError::Unsafe { path, .. } => Some(path),
            ApplyError::Root(_) | ApplyError::Pool(_) => None,
        }
    }
}

/// Apply every change in `plan`, one task per distinct file.
///
/// Paths are resolved before fan-out, so two spellings of one file share a
/// task. A path that fails to resolve fails on its own; other files still run.
pub fn apply(plan: &ChangePlan, options: &ApplyOptions) -> Result<ApplyReport, ApplyError> {
    let guard = options
        .root
        .as_ref()
        .map(WorkspaceGuard::new)
        .transpose()
        .map_err(ApplyError::Root)?;

    let Grouped { jobs, rejected } = group_jobs(&plan.changes, guard.as_ref());
    debug!(
        files = jobs.len(),
        rejected = rejected.len(),
        changes = plan.len(),
        dry_run = options.dry_run,
        "applying plan"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .thread_name(|index| format!("blockpatch-{index}"))
        .build()?;

    let context = JobContext {
        dry_run: options.dry_run,
        color: options.color,
        registry: &options.registry,
    };
    let context = &context;

    let (tx, rx) = crossbeam::channel::unbounded();
    for err in rejected {
        let _ = tx.send(Err(err));
    }
    pool.scope(|scope| {
        for job in &jobs {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let _ = tx.send(run_job(job, context));
            });
        }
    });
    drop(tx);

    let mut report = ApplyReport {
        dry_run: options.dry_run,
        files: Vec::with_capacity(jobs.len()),
    };
    let mut first_error = None;
    for outcome in rx {
        match outcome {
            Ok(file) => report.files.push(file),
            Err(err) => {
                warn!(error = %err, "file failed");
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(report),
    }
}

struct Grouped<'a> {
    jobs: Vec<FileJob<'a>>,
    /// Paths the guard refused, one error per distinct plan path
    rejected: Vec<ApplyError>,
}

/// Group changes by resolved file in first-appearance order, keeping
/// per-file order.
fn group_jobs<'a>(changes: &'a PlanChanges, guard: Option<&WorkspaceGuard>) -> Grouped<'a> {
    match changes {
        PlanChanges::Blocks(changes) => {
            let (groups, rejected) = group_by(changes, |c| &c.block.path, guard);
            let jobs = groups
                .into_iter()
                .map(|group| FileJob {
                    path: group.path,
                    target: group.target,
                    work: FileWork::Blocks(group.items),
                })
                .collect();
            Grouped { jobs, rejected }
        }
        PlanChanges::Lines(changes) => {
            let (groups, rejected) = group_by(changes, |c| &c.path, guard);
            let jobs = groups
                .into_iter()
                .map(|group| FileJob {
                    path: group.path,
                    target: group.target,
                    work: FileWork::Lines(group.items),
                })
                .collect();
            Grouped { jobs, rejected }
        }
    }
}

struct Group<'a, T> {
    /// Plan path of the first change for this file
    path: &'a Path,
    target: PathBuf,
    items: Vec<&'a T>,
}

fn group_by<'a, T>(
    items: &'a [T],
    key: impl Fn(&'a T) -> &'a PathBuf,
    guard: Option<&WorkspaceGuard>,
) -> (Vec<Group<'a, T>>, Vec<ApplyError>) {
    let mut groups: Vec<Group<'a, T>> = Vec::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();
    let mut rejected: HashMap<&'a Path, ApplyError> = HashMap::new();
    let mut rejected_order = Vec::new();

    for item in items {
        let path = key(item).as_path();
        if rejected.contains_key(path) {
            continue;
        }
        let (target, identity) = match guard {
            Some(guard) => match guard.validate_path(path) {
                Ok(resolved) => (resolved.clone(), resolved),
                Err(source) => {
                    rejected_order.push(path);
                    rejected.insert(
                        path,
                        ApplyError::Unsafe {
                            path: path.to_path_buf(),
                            source,
                        },
                    );
                    continue;
                }
            },
            None => (path.to_path_buf(), file_identity(path)),
        };

        match index.get(&identity) {
            Some(&slot) => groups[slot].items.push(item),
            None => {
                index.insert(identity, groups.len());
                groups.push(Group {
                    path,
                    target,
                    items: vec![item],
                });
            }
        }
    }

    let rejected = rejected_order
        .into_iter()
        .filter_map(|path| rejected.remove(path))
        .collect();
    (groups, rejected)
}

/// Identity of a file when no root is configured: the canonical path when the
/// file exists, else the path made absolute and normalized lexically.
fn file_identity(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let absolute = match std::env::current_dir() {
        Ok(cwd) if path.is_relative() => cwd.join(path),
        _ => path.to_path_buf(),
    };
    normalize_lexically(&absolute)
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

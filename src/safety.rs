use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Keeps edits inside a root directory.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    /// Canonical path to the root
    workspace_root: PathBuf,
    /// Canonical paths that may never be edited
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("path is outside workspace: {path} (workspace: {workspace})")]
    OutsideWorkspace { path: PathBuf, workspace: PathBuf },

    #[error("path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("failed to canonicalize {path}: {source}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn canonicalize(path: &Path) -> Result<PathBuf, SafetyError> {
    path.canonicalize().map_err(|source| SafetyError::Canonicalize {
        path: path.to_path_buf(),
        source,
    })
}

impl WorkspaceGuard {
    /// Create a guard rooted at `workspace_root`, forbidding its `.git`.
    pub fn new(workspace_root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let workspace_root = canonicalize(workspace_root.as_ref())?;
        let forbidden_paths = vec![workspace_root.join(".git")];

        Ok(Self {
            workspace_root,
            forbidden_paths,
        })
    }

    /// Resolve `path` against the root and check it stays inside.
    ///
    /// The file itself may not exist yet; its nearest existing ancestor is
    /// canonicalized instead, so symlinked directories are still followed.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        };

        let resolved = self.resolve(&absolute)?;
        self.check_canonical(&resolved)?;
        Ok(resolved)
    }

    fn resolve(&self, absolute: &Path) -> Result<PathBuf, SafetyError> {
        // `..` through a missing directory cannot be resolved against the disk
        if !absolute.exists()
            && absolute
                .components()
                .any(|component| component == Component::ParentDir)
        {
            return Err(SafetyError::OutsideWorkspace {
                path: absolute.to_path_buf(),
                workspace: self.workspace_root.clone(),
            });
        }

        let mut existing = absolute;
        let mut missing = Vec::new();
        while !existing.exists() {
            match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    existing = parent;
                }
                _ => break,
            }
        }

        let mut resolved = canonicalize(existing)?;
        for name in missing.iter().rev() {
            resolved.push(name);
        }

        Ok(resolved)
    }

    fn check_canonical(&self, canonical: &Path) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.workspace_root) {
            return Err(SafetyError::OutsideWorkspace {
                path: canonical.to_path_buf(),
                workspace: self.workspace_root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if canonical.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: canonical.to_path_buf(),
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(())
    }

    /// Get the workspace root.
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }
}

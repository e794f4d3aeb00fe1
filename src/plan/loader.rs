use crate::plan::schema::{ChangePlan, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Serialization format of a plan file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat {
    Json,
    Toml,
}

impl PlanFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(PlanFormat::Json),
            "toml" => Some(PlanFormat::Toml),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum PlanError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    UnknownFormat {
        path: PathBuf,
    },
    Json {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl PlanError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            PlanError::Json { path: None, source } => PlanError::Json {
                path: Some(path),
                source,
            },
            PlanError::Toml { path: None, source } => PlanError::Toml {
                path: Some(path),
                source,
            },
            PlanError::Validation { path: None, source } => PlanError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::Io { path, source } => {
                write!(f, "failed to read plan from {}: {}", path.display(), source)
            }
            PlanError::Walk { path, source } => {
                write!(f, "failed to list plans in {}: {}", path.display(), source)
            }
            PlanError::UnknownFormat { path } => write!(
                f,
                "unrecognized plan format for {} (expected .json or .toml)",
                path.display()
            ),
            PlanError::Json { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse plan JSON ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse plan JSON: {}", source),
            },
            PlanError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse plan TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse plan TOML: {}", source),
            },
            PlanError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid plan ({}): {}", path.display(), source),
                None => write!(f, "invalid plan: {}", source),
            },
        }
    }
}

impl std::error::Error for PlanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlanError::Io { source, .. } => Some(source),
            PlanError::Walk { source, .. } => Some(source),
            PlanError::UnknownFormat { .. } => None,
            PlanError::Json { source, .. } => Some(source),
            PlanError::Toml { source, .. } => Some(source),
            PlanError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str, format: PlanFormat) -> Result<ChangePlan, PlanError> {
    let plan: ChangePlan = match format {
        PlanFormat::Json => serde_json::from_str(input)
            .map_err(|source| PlanError::Json { path: None, source })?,
        PlanFormat::Toml => toml_edit::de::from_str(input)
            .map_err(|source| PlanError::Toml { path: None, source })?,
    };
    plan.validate()
        .map_err(|source| PlanError::Validation { path: None, source })?;
    Ok(plan)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<ChangePlan, PlanError> {
    let path = path.as_ref();
    let format = PlanFormat::from_path(path).ok_or_else(|| PlanError::UnknownFormat {
        path: path.to_path_buf(),
    })?;
    let contents = fs::read_to_string(path).map_err(|source| PlanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents, format).map_err(|error| error.with_path(path))
}

/// Plan files directly inside `dir`, sorted by file name.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, PlanError> {
    let mut plans = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| PlanError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && PlanFormat::from_path(entry.path()).is_some() {
            plans.push(entry.into_path());
        }
    }
    Ok(plans)
}

/// Load one plan file, or every plan file in a directory.
pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<(PathBuf, ChangePlan)>, PlanError> {
    let path = path.as_ref();
    let files = if path.is_dir() {
        discover(path)?
    } else {
        vec![path.to_path_buf()]
    };

    files
        .into_iter()
        .map(|file| load_from_path(&file).map(|plan| (file, plan)))
        .collect()
}

//! Engine settings loaded from `blockpatch.toml`.
//!
//! ```toml
//! [apply]
//! workers = 4
//! color = "never"
//! root = "."
//!
//! [kinds]
//! nomad = "hcl"
//! ```

use crate::kind::{KindRegistry, SourceKind};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "blockpatch.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub apply: ApplySettings,
    /// Extra extension mappings, e.g. `nomad = "hcl"`
    #[serde(default)]
    pub kinds: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ApplySettings {
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub color: Option<ColorChoice>,
    /// Root directory, relative to the settings file
    #[serde(default)]
    pub root: Option<PathBuf>,
}

#[derive(Debug)]
pub enum SettingsError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    UnknownKind {
        extension: String,
        message: String,
    },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io { path, source } => {
                write!(f, "failed to read settings from {}: {}", path.display(), source)
            }
            SettingsError::Toml { path, source } => match path {
                Some(path) => write!(f, "failed to parse settings ({}): {}", path.display(), source),
                None => write!(f, "failed to parse settings: {}", source),
            },
            SettingsError::UnknownKind { extension, message } => {
                write!(f, "invalid kind for extension '{extension}': {message}")
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io { source, .. } => Some(source),
            SettingsError::Toml { source, .. } => Some(source),
            SettingsError::UnknownKind { .. } => None,
        }
    }
}

impl Settings {
    pub fn parse(input: &str) -> Result<Self, SettingsError> {
        toml_edit::de::from_str(input).map_err(|source| SettingsError::Toml { path: None, source })
    }

    /// Load settings from `path`. A relative `root` is resolved against the
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings: Settings =
            toml_edit::de::from_str(&contents).map_err(|source| SettingsError::Toml {
                path: Some(path.to_path_buf()),
                source,
            })?;

        if let (Some(root), Some(dir)) = (settings.apply.root.as_mut(), path.parent()) {
            if root.is_relative() {
                *root = dir.join(&*root);
            }
        }
        Ok(settings)
    }

    /// Load `blockpatch.toml` from `dir` if present, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self, SettingsError> {
        let candidate = dir.join(SETTINGS_FILE);
        if candidate.is_file() {
            Self::load(candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Built-in extension mappings extended with `[kinds]`.
    pub fn registry(&self) -> Result<KindRegistry, SettingsError> {
        let mut registry = KindRegistry::default();
        for (extension, kind) in &self.kinds {
            let kind: SourceKind = kind.parse().map_err(|message| SettingsError::UnknownKind {
                extension: extension.clone(),
                message,
            })?;
            registry.register(extension, kind);
        }
        Ok(registry)
    }
}

//! Source-kind detection by file extension.

use crate::ts::ProceduralLang;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// How a file's blocks are located and replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Brace-scoped source whose named units are functions
    Procedural(ProceduralLang),
    /// HCL-style configuration with typed, labeled blocks
    Declarative,
    Unsupported,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rust" => Ok(SourceKind::Procedural(ProceduralLang::Rust)),
            "go" => Ok(SourceKind::Procedural(ProceduralLang::Go)),
            "hcl" => Ok(SourceKind::Declarative),
            other => Err(format!(
                "unknown source kind '{other}' (expected rust, go or hcl)"
            )),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Procedural(lang) => write!(f, "{lang}"),
            SourceKind::Declarative => write!(f, "hcl"),
            SourceKind::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Maps file extensions to source kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindRegistry {
    by_extension: BTreeMap<String, SourceKind>,
}

impl Default for KindRegistry {
    fn default() -> Self {
        let mut registry = Self {
            by_extension: BTreeMap::new(),
        };
        registry.register("rs", SourceKind::Procedural(ProceduralLang::Rust));
        registry.register("go", SourceKind::Procedural(ProceduralLang::Go));
        for ext in ["tf", "hcl", "tfvars"] {
            registry.register(ext, SourceKind::Declarative);
        }
        registry
    }
}

impl KindRegistry {
    /// Map `extension` (without the dot, case-insensitive) to `kind`.
    pub fn register(&mut self, extension: &str, kind: SourceKind) {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self.by_extension.insert(extension, kind);
    }

    pub fn detect(&self, path: &Path) -> SourceKind {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.by_extension.get(&ext.to_ascii_lowercase()))
            .copied()
            .unwrap_or(SourceKind::Unsupported)
    }
}

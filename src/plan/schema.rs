use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A line-oriented edit.
///
/// `line_num == 0` appends `add` as a new last line. Otherwise the 1-based
/// line loses the first occurrence of `delete` and gains `add` as a suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub path: PathBuf,
    pub line_num: usize,
    #[serde(default)]
    pub add: String,
    #[serde(default)]
    pub delete: String,
}

/// Identifies one named block in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub path: PathBuf,
    /// `function` for procedural sources, the block keyword for declarative ones
    pub target_type: String,
    /// Function name, or declarative labels joined with `,`
    pub target_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockChange {
    #[serde(flatten)]
    pub block: Block,
    #[serde(default)]
    pub new_content: String,
    #[serde(default)]
    pub new_comment: String,
}

/// Either every change is a block change or every change is a line change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanChanges {
    Blocks(Vec<BlockChange>),
    Lines(Vec<Change>),
}

impl Default for PlanChanges {
    fn default() -> Self {
        PlanChanges::Blocks(Vec::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePlan {
    /// The request that produced this plan; informational only
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub changes: PlanChanges,
}

impl ChangePlan {
    pub fn blocks(query: impl Into<String>, changes: Vec<BlockChange>) -> Self {
        Self {
            query: query.into(),
            changes: PlanChanges::Blocks(changes),
        }
    }

    pub fn lines(query: impl Into<String>, changes: Vec<Change>) -> Self {
        Self {
            query: query.into(),
            changes: PlanChanges::Lines(changes),
        }
    }

    pub fn len(&self) -> usize {
        match &self.changes {
            PlanChanges::Blocks(changes) => changes.len(),
            PlanChanges::Lines(changes) => changes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        match &self.changes {
            PlanChanges::Blocks(changes) => {
                for (index, change) in changes.iter().enumerate() {
                    let block = &change.block;
                    if block.path.as_os_str().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            index,
                            field: "path",
                        });
                    }
                    if block.target_type.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            index,
                            field: "target_type",
                        });
                    }
                    if block.target_type == "function" && block.target_name.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            index,
                            field: "target_name",
                        });
                    }
                }
            }
            PlanChanges::Lines(changes) => {
                for (index, change) in changes.iter().enumerate() {
                    if change.path.as_os_str().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            index,
                            field: "path",
                        });
                    }
                    if change.line_num == 0 && !change.delete.is_empty() {
                        issues.push(ValidationIssue::InvalidCombo {
                            index,
                            message: "append (line_num 0) cannot delete text".to_string(),
                        });
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    MissingField { index: usize, field: &'static str },
    InvalidCombo { index: usize, message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { index, field } => {
                write!(f, "change #{index} missing required field '{field}'")
            }
            ValidationIssue::InvalidCombo { index, message } => {
                write!(f, "change #{index} is invalid: {message}")
            }
        }
    }
}

//! Blockpatch: block-level source patching.
//!
//! A change names a block by `(file, kind, name)`. The block is located in the
//! file's syntax tree, its content is replaced, and every other byte of the
//! file is kept as it was.
//!
//! Two source families are supported:
//!
//! - Procedural sources (Rust, Go) whose named units are functions, parsed
//!   with tree-sitter.
//! - Declarative HCL sources whose named units are typed, labeled blocks.
//!
//! Files no structural parser handles can be patched by line number.
//!
//! # Architecture
//!
//! All structural changes compile down to [`Edit`], a byte-span replacement
//! that verifies the text it expects to replace. Batch application fans out
//! one task per file and writes each file atomically.
//!
//! # Example
//!
//! ```no_run
//! use blockpatch::{apply, ApplyOptions, Block, BlockChange, ChangePlan};
//! use std::path::PathBuf;
//!
//! let plan = ChangePlan::blocks(
//!     "make run return early",
//!     vec![BlockChange {
//!         block: Block {
//!             path: PathBuf::from("src/main.rs"),
//!             target_type: "function".to_string(),
//!             target_name: "run".to_string(),
//!         },
//!         new_content: "return;".to_string(),
//!         new_comment: "Does nothing.".to_string(),
//!     }],
//! );
//!
//! let options = ApplyOptions {
//!     dry_run: true,
//!     ..ApplyOptions::default()
//! };
//! match apply(&plan, &options) {
//!     Ok(report) => print!("{}", report.render()),
//!     Err(e) => eprintln!("apply failed: {e}"),
//! }
//! ```

pub mod apply;
pub mod diff;
pub mod edit;
pub mod hcl;
pub mod kind;
pub mod lines;
pub mod plan;
pub mod pool;
pub mod safety;
pub mod settings;
pub mod suggest;
pub mod ts;

// Re-exports
pub use apply::{apply, ApplyError, ApplyOptions, ApplyReport, FileOutcome};
pub use diff::render_diff;
pub use edit::{apply_edits, atomic_write, Edit, EditError, EditVerification};
pub use hcl::{HclEditor, HclError};
pub use kind::{KindRegistry, SourceKind};
pub use lines::{apply_lines, LinePatchError};
pub use plan::{
    load_all, load_from_path, load_from_str, Block, BlockChange, Change, ChangePlan, PlanChanges,
    PlanError, PlanFormat,
};
pub use safety::{SafetyError, WorkspaceGuard};
pub use settings::{ColorChoice, Settings, SettingsError};
pub use ts::{replace_function, FunctionError, FunctionSpan, ProceduralLang, TreeSitterError};

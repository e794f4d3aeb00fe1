//! Declarative (label-scoped) sources: HCL blocks located by type and labels.

pub mod editor;
pub mod errors;
pub mod lexer;
pub mod parser;

pub use editor::HclEditor;
pub use errors::HclError;

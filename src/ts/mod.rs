//! Tree-sitter integration for procedural (brace-scoped) sources.
//!
//! Functions are located by name in the concrete syntax tree, so comments and
//! formatting outside the replaced spans survive untouched.

pub mod comment;
pub mod errors;
pub mod layout;
pub mod locator;
pub mod parser;
pub mod replacer;
pub mod validator;

pub use errors::{FunctionError, TreeSitterError};
pub use locator::{locate, FunctionSpan};
pub use parser::{ParsedSource, ProceduralLang, SourceParser};
pub use replacer::replace_function;

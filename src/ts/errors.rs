use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeSitterError {
    #[error("failed to set language for parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,
}

/// Errors raised while locating or rewriting a function.
#[derive(Error, Debug)]
pub enum FunctionError {
    #[error(transparent)]
    TreeSitter(#[from] TreeSitterError),

    #[error("source does not parse: {count} syntax error(s), first at line {line}")]
    SourceSyntax { count: usize, line: usize },

    #[error("replacement body for '{function}' does not parse: {message}")]
    InvalidBody { function: String, message: String },

    #[error("function not found: {name}{}", crate::suggest::suffix(.suggestion))]
    NotFound {
        name: String,
        suggestion: Option<String>,
    },

    #[error("function '{name}' has no body to replace")]
    MissingBody { name: String },

    #[error("rewriting '{function}' introduced {count} syntax error(s)")]
    IntroducedSyntax { function: String, count: usize },

    #[error("edit error: {0}")]
    Edit(#[from] crate::edit::EditError),
}

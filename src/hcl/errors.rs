use thiserror::Error;

#[derive(Error, Debug)]
pub enum HclError {
    #[error("unterminated string starting at line {line}")]
    UnterminatedString { line: usize },

    #[error("unterminated heredoc '{marker}' starting at line {line}")]
    UnterminatedHeredoc { marker: String, line: usize },

    #[error("unterminated block comment starting at line {line}")]
    UnterminatedComment { line: usize },

    #[error("unexpected '{found}' at line {line}")]
    UnexpectedToken { found: String, line: usize },

    #[error("unclosed '{open}' opened at line {line}")]
    UnclosedDelimiter { open: String, line: usize },

    #[error("mismatched '{found}' at line {line}")]
    MismatchedDelimiter { found: String, line: usize },

    #[error("attribute '{name}' has no value at line {line}")]
    MissingValue { name: String, line: usize },

    #[error("replacement body does not parse: {0}")]
    InvalidFragment(#[source] Box<HclError>),

    #[error("rewritten document does not parse: {0}")]
    InvalidResult(#[source] Box<HclError>),

    #[error(
        "block not found: {block_type} with labels \"{label_key}\"{}",
        crate::suggest::suffix(.suggestion)
    )]
    BlockNotFound {
        block_type: String,
        label_key: String,
        suggestion: Option<String>,
    },

    #[error("edit error: {0}")]
    Edit(#[from] crate::edit::EditError),
}

use crate::ts::errors::FunctionError;
use crate::ts::parser::{ParsedSource, ProceduralLang, SourceParser};
use tree_sitter::Tree;

/// Reject a source file that already contains syntax errors.
pub fn validate_source(parsed: &ParsedSource<'_>) -> Result<(), FunctionError> {
    let errors = parsed.error_nodes();
    match errors.first() {
        None => Ok(()),
        Some(first) => Err(FunctionError::SourceSyntax {
            count: errors.len(),
            line: first.start_point.row + 1,
        }),
    }
}

/// A replacement body that parsed cleanly inside its wrapper function.
pub struct CheckedBody {
    /// Parse tree of the wrapper unit
    pub tree: Tree,
    /// Number of wrapper lines above the first body line
    pub prefix_rows: usize,
}

/// Parse a replacement body as a standalone function body.
///
/// Nothing is mutated; a failure here leaves the target file untouched.
pub fn validate_body(
    parser: &mut SourceParser,
    function: &str,
    body: &str,
) -> Result<CheckedBody, FunctionError> {
    let lang = parser.lang();
    let (wrapped, offset) = lang.wrap_body(body);
    let prefix_rows = wrapped[..offset].matches('\n').count();
    let parsed = parser.parse_with_source(&wrapped)?;

    if let Some(first) = parsed.error_nodes().first() {
        let line = first.start_point.row.saturating_sub(prefix_rows) + 1;
        return Err(FunctionError::InvalidBody {
            function: function.to_string(),
            message: format!("syntax error at body line {line}"),
        });
    }

    if lang == ProceduralLang::Rust {
        syn::parse_str::<syn::Block>(&format!("{{\n{body}\n}}")).map_err(|e| {
            FunctionError::InvalidBody {
                function: function.to_string(),
                message: e.to_string(),
            }
        })?;
    }

    Ok(CheckedBody {
        prefix_rows,
        tree: parsed.tree,
    })
}

/// Reject a rewritten file that no longer parses.
pub fn validate_result(
    parser: &mut SourceParser,
    function: &str,
    updated: &str,
) -> Result<(), FunctionError> {
    let parsed = parser.parse_with_source(updated)?;
    let count = parsed.error_nodes().len();
    if count > 0 {
        return Err(FunctionError::IntroducedSyntax {
            function: function.to_string(),
            count,
        });
    }
    Ok(())
}

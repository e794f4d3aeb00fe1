use crate::edit::{apply_edits, Edit};
use crate::pool::with_parser;
use crate::suggest::closest;
use crate::ts::comment::comment_edits;
use crate::ts::errors::FunctionError;
use crate::ts::layout::layout_body;
use crate::ts::locator::{function_names, locate_function};
use crate::ts::parser::{ProceduralLang, SourceParser};
use crate::ts::validator::{validate_body, validate_result, validate_source};
use tracing::debug;

/// Replace the body and/or doc comment of the first function named `name`.
///
/// An empty `new_body` leaves the body untouched; an empty `new_comment`
/// leaves the documentation untouched. When both are empty the function must
/// still exist and the source is returned unchanged.
pub fn replace_function(
    lang: ProceduralLang,
    source: &str,
    name: &str,
    new_body: &str,
    new_comment: &str,
) -> Result<String, FunctionError> {
    with_parser(lang, |parser| {
        replace_with(parser, source, name, new_body, new_comment)
    })?
}

fn replace_with(
    parser: &mut SourceParser,
    source: &str,
    name: &str,
    new_body: &str,
    new_comment: &str,
) -> Result<String, FunctionError> {
    let lang = parser.lang();
    let parsed = parser.parse_with_source(source)?;
    validate_source(&parsed)?;

    let span = locate_function(&parsed, name).ok_or_else(|| FunctionError::NotFound {
        name: name.to_string(),
        suggestion: closest(name, function_names(&parsed)),
    })?;
    debug!(function = name, line = span.start_line, %lang, "located function");

    let mut edits = Vec::new();
    if !new_body.trim().is_empty() {
        let body = span.body.clone().ok_or_else(|| FunctionError::MissingBody {
            name: name.to_string(),
        })?;
        let checked = validate_body(parser, name, new_body)?;
        let laid_out = layout_body(lang, new_body, &checked, &span.indent);
        edits.push(Edit::new(body.start, body.end, laid_out, &source[body]));
    }
    if !new_comment.trim().is_empty() {
        edits.extend(comment_edits(lang, source, &span, new_comment));
    }

    if edits.is_empty() {
        return Ok(source.to_string());
    }

    let updated = apply_edits(source, edits)?;
    validate_result(parser, name, &updated)?;
    Ok(updated)
}

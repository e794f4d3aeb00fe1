//! Doc-comment rewriting for located functions.

use crate::edit::Edit;
use crate::ts::locator::FunctionSpan;
use crate::ts::parser::ProceduralLang;

/// Render `text` as one single-line doc comment, or `None` if it is blank.
///
/// Multi-line text is joined with spaces. A comment marker already present on
/// a line is dropped so it is not doubled.
pub fn render_doc_comment(lang: ProceduralLang, text: &str, indent: &str) -> Option<String> {
    let marker = lang.doc_marker();
    let words: Vec<&str> = text
        .lines()
        .map(str::trim)
        .map(|line| {
            line.strip_prefix(marker)
                .or_else(|| line.strip_prefix("//"))
                .unwrap_or(line)
                .trim()
        })
        .filter(|line| !line.is_empty())
        .collect();

    if words.is_empty() {
        return None;
    }
    Some(format!("{indent}{marker} {}\n", words.join(" ")))
}

/// Edits that replace the function's leading documentation with `text`.
///
/// Every existing doc-comment line is deleted and the new comment is inserted
/// above any attributes.
pub fn comment_edits(
    lang: ProceduralLang,
    source: &str,
    span: &FunctionSpan,
    text: &str,
) -> Vec<Edit> {
    let Some(rendered) = render_doc_comment(lang, text, &span.indent) else {
        return Vec::new();
    };

    let mut edits = vec![Edit::insert(span.comment_insert_at, rendered)];
    edits.extend(
        span.doc_comments
            .iter()
            .map(|range| Edit::delete(range.start, range.end, &source[range.clone()])),
    );
    edits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_multiline_text() {
        let rendered =
            render_doc_comment(ProceduralLang::Rust, "Parses input.\n  Returns tokens.", "");
        assert_eq!(rendered.as_deref(), Some("/// Parses input. Returns tokens.\n"));
    }

    #[test]
    fn does_not_double_marker() {
        let rendered =
            render_doc_comment(ProceduralLang::Go, "// Run starts the loop.", "");
        assert_eq!(rendered.as_deref(), Some("// Run starts the loop.\n"));

        let rendered = render_doc_comment(ProceduralLang::Rust, "/// Already marked", "");
        assert_eq!(rendered.as_deref(), Some("/// Already marked\n"));
    }

    #[test]
    fn blank_text_renders_nothing() {
        assert!(render_doc_comment(ProceduralLang::Rust, "  \n ", "").is_none());
    }
}

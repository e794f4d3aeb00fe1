use crate::ts::errors::{FunctionError, TreeSitterError};
use crate::ts::parser::{ParsedSource, ProceduralLang};
use std::ops::Range;
use tree_sitter::Node;

/// Byte spans of a located function and its attached documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpan {
    pub name: String,
    /// Byte range of the whole declaration, signature through closing brace
    pub byte_start: usize,
    pub byte_end: usize,
    /// Byte range of the body block, braces included
    pub body: Option<Range<usize>>,
    /// Full-line byte ranges of each leading doc comment, top to bottom
    pub doc_comments: Vec<Range<usize>>,
    /// Start of the first line above the function that belongs to it
    /// (doc comments or attributes); the function's own line otherwise
    pub comment_insert_at: usize,
    /// Leading whitespace of the function's line
    pub indent: String,
    /// 1-based line numbers
    pub start_line: usize,
    pub end_line: usize,
}

impl FunctionSpan {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.byte_start..self.byte_end]
    }
}

/// Find the first top-level function named `name`, in document order.
pub fn locate_function(parsed: &ParsedSource<'_>, name: &str) -> Option<FunctionSpan> {
    let root = parsed.root_node();
    let mut cursor = root.walk();
    let found = root
        .named_children(&mut cursor)
        .filter(|node| parsed.lang.is_function(*node))
        .find(|node| function_name(parsed, *node) == Some(name));

    found.map(|node| span_of(parsed, node, name))
}

/// Names of every top-level function, in document order.
pub fn function_names<'a>(parsed: &ParsedSource<'a>) -> Vec<&'a str> {
    let root = parsed.root_node();
    let mut cursor = root.walk();
    root.named_children(&mut cursor)
        .filter(|node| parsed.lang.is_function(*node))
        .filter_map(|node| function_name(parsed, node))
        .collect()
}

/// Parse `source` with the pooled parser and locate `name`.
pub fn locate(
    lang: ProceduralLang,
    source: &str,
    name: &str,
) -> Result<Option<FunctionSpan>, FunctionError> {
    let located = crate::pool::with_parser(lang, |parser| {
        let parsed = parser.parse_with_source(source)?;
        Ok::<_, TreeSitterError>(locate_function(&parsed, name))
    })??;
    Ok(located)
}

fn function_name<'a>(parsed: &ParsedSource<'a>, node: Node<'_>) -> Option<&'a str> {
    node.child_by_field_name("name")
        .map(|name_node| parsed.node_text(name_node))
}

fn span_of(parsed: &ParsedSource<'_>, node: Node<'_>, name: &str) -> FunctionSpan {
    let source = parsed.source;
    let line_start = line_start(source, node.start_byte());

    let mut doc_comments = Vec::new();
    let mut top = node;
    let mut prev = node.prev_sibling();
    while let Some(sibling) = prev {
        if last_row(sibling) + 1 != top.start_position().row {
            break;
        }
        if parsed.lang.is_item_prefix(sibling) {
            top = sibling;
        } else if parsed.lang.is_doc_comment(sibling, parsed.node_text(sibling))
            && starts_line(source, sibling.start_byte())
        {
            doc_comments.push(line_span(source, sibling));
            top = sibling;
        } else {
            break;
        }
        prev = sibling.prev_sibling();
    }
    doc_comments.reverse();

    FunctionSpan {
        name: name.to_string(),
        byte_start: node.start_byte(),
        byte_end: node.end_byte(),
        body: node.child_by_field_name("body").map(|body| body.byte_range()),
        doc_comments,
        comment_insert_at: line_start_of(source, top),
        indent: source[line_start..node.start_byte()].to_string(),
        start_line: node.start_position().row + 1,
        end_line: last_row(node) + 1,
    }
}

/// Last row a node occupies. A node ending at column 0 ends on the row before.
pub(crate) fn last_row(node: Node<'_>) -> usize {
    let end = node.end_position();
    if end.column == 0 && end.row > node.start_position().row {
        end.row - 1
    } else {
        end.row
    }
}

fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |idx| idx + 1)
}

fn line_start_of(source: &str, node: Node<'_>) -> usize {
    line_start(source, node.start_byte())
}

fn starts_line(source: &str, offset: usize) -> bool {
    source[line_start(source, offset)..offset]
        .chars()
        .all(|c| c == ' ' || c == '\t')
}

/// Byte range from the start of the node's first line through its final newline.
fn line_span(source: &str, node: Node<'_>) -> Range<usize> {
    let start = line_start(source, node.start_byte());
    let end = node.end_byte();
    if source[..end].ends_with('\n') {
        return start..end;
    }
    let end = source[end..]
        .find('\n')
        .map_or(source.len(), |idx| end + idx + 1);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::parser::SourceParser;

    fn locate_in(lang: ProceduralLang, source: &str, name: &str) -> Option<FunctionSpan> {
        let mut parser = SourceParser::new(lang).unwrap();
        let parsed = parser.parse_with_source(source).unwrap();
        locate_function(&parsed, name)
    }

    #[test]
    fn locate_rust_function() {
        let source = "fn helper() -> i32 {\n    42\n}\n\nfn main() {\n    let x = helper();\n}\n";
        let span = locate_in(ProceduralLang::Rust, source, "main").unwrap();

        assert!(span.text(source).starts_with("fn main()"));
        let body = span.body.clone().unwrap();
        assert_eq!(&source[body], "{\n    let x = helper();\n}");
        assert_eq!(span.start_line, 5);
        assert_eq!(span.end_line, 7);
    }

    #[test]
    fn byte_span_accuracy() {
        let source = "fn foo() {}\nfn bar() {}";
        let span = locate_in(ProceduralLang::Rust, source, "bar").unwrap();
        assert_eq!(span.text(source), "fn bar() {}");
    }

    #[test]
    fn first_match_wins() {
        let source = "package main\n\nfunc dup() int {\n\treturn 1\n}\n\nfunc dup() int {\n\treturn 2\n}\n";
        let span = locate_in(ProceduralLang::Go, source, "dup").unwrap();
        assert!(span.text(source).contains("return 1"));
    }

    #[test]
    fn name_match_is_case_sensitive() {
        let source = "fn Main() {}\n";
        assert!(locate_in(ProceduralLang::Rust, source, "main").is_none());
    }

    #[test]
    fn rust_doc_comments_above_attributes() {
        let source = "/// First line.\n/// Second line.\n#[inline]\nfn tagged() {}\n";
        let span = locate_in(ProceduralLang::Rust, source, "tagged").unwrap();

        assert_eq!(span.doc_comments.len(), 2);
        assert_eq!(&source[span.doc_comments[0].clone()], "/// First line.\n");
        assert_eq!(&source[span.doc_comments[1].clone()], "/// Second line.\n");
        assert_eq!(span.comment_insert_at, 0);
    }

    #[test]
    fn rust_plain_comment_is_not_documentation() {
        let source = "// just a note\nfn plain() {}\n";
        let span = locate_in(ProceduralLang::Rust, source, "plain").unwrap();

        assert!(span.doc_comments.is_empty());
        assert_eq!(span.comment_insert_at, source.find("fn plain").unwrap());
    }

    #[test]
    fn go_doc_comment_must_be_adjacent() {
        let source = "package main\n\n// Detached.\n\n// Run does work.\nfunc Run() {\n}\n";
        let span = locate_in(ProceduralLang::Go, source, "Run").unwrap();

        assert_eq!(span.doc_comments.len(), 1);
        assert_eq!(&source[span.doc_comments[0].clone()], "// Run does work.\n");
    }

    #[test]
    fn go_function_names_in_order() {
        let source = "package main\n\nfunc a() {}\n\nfunc b() {}\n";
        let mut parser = SourceParser::new(ProceduralLang::Go).unwrap();
        let parsed = parser.parse_with_source(source).unwrap();
        assert_eq!(function_names(&parsed), vec!["a", "b"]);
    }

    #[test]
    fn go_method_is_located() {
        let source = "package main\n\ntype S struct{}\n\n// Run runs.\nfunc (s *S) Run() int {\n\treturn 1\n}\n";
        let span = locate_in(ProceduralLang::Go, source, "Run").unwrap();

        assert!(span.text(source).starts_with("func (s *S) Run() int {"));
        assert_eq!(&source[span.body.clone().unwrap()], "{\n\treturn 1\n}");
        assert_eq!(&source[span.doc_comments[0].clone()], "// Run runs.\n");
    }

    #[test]
    fn go_methods_and_functions_share_document_order() {
        let source = "package main\n\ntype S struct{}\n\nfunc (s S) Name() string {\n\treturn \"m\"\n}\n\nfunc Name() string {\n\treturn \"f\"\n}\n";
        let span = locate_in(ProceduralLang::Go, source, "Name").unwrap();
        assert!(span.text(source).contains("return \"m\""));

        let mut parser = SourceParser::new(ProceduralLang::Go).unwrap();
        let parsed = parser.parse_with_source(source).unwrap();
        assert_eq!(function_names(&parsed), vec!["Name", "Name"]);
    }
}

//! Canonical layout for replacement function bodies.
//!
//! Only the new body is laid out. The surrounding file keeps its bytes.

use crate::ts::locator::last_row;
use crate::ts::parser::ProceduralLang;
use crate::ts::validator::CheckedBody;
use std::collections::BTreeSet;
use tree_sitter::Node;

/// Body rows that belong to a multi-line string literal or comment.
#[derive(Debug, Default)]
struct OpaqueRows {
    /// Rows that begin inside a string or comment; emitted verbatim
    verbatim: BTreeSet<usize>,
    /// Rows whose line break is inside a string; trailing whitespace kept
    open_ended: BTreeSet<usize>,
}

/// Nodes laid out as a single token: their text is never reindented.
fn is_opaque(lang: ProceduralLang, kind: &str) -> bool {
    match lang {
        ProceduralLang::Rust => matches!(
            kind,
            "string_literal" | "raw_string_literal" | "char_literal" | "block_comment" | "line_comment"
        ),
        ProceduralLang::Go => matches!(
            kind,
            "raw_string_literal" | "interpreted_string_literal" | "rune_literal" | "comment"
        ),
    }
}

/// Case labels sit at the level of their `switch` in gofmt output.
fn is_case_label(lang: ProceduralLang, kind: &str, parent: Option<&str>) -> bool {
    lang == ProceduralLang::Go
        && matches!(kind, "case" | "default")
        && matches!(
            parent,
            Some("expression_case" | "type_case" | "default_case" | "communication_case")
        )
}

/// One leaf of the wrapper tree, positioned in body rows.
#[derive(Debug, Clone, Copy)]
struct Token {
    row: usize,
    delta: Delta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delta {
    Open,
    Close,
    CaseLabel,
    Other,
}

/// Walk the wrapper tree in document order, collecting leaf tokens and the
/// rows covered by multi-line opaque nodes.
fn collect(
    lang: ProceduralLang,
    node: Node<'_>,
    prefix_rows: usize,
    tokens: &mut Vec<Token>,
    rows: &mut OpaqueRows,
) {
    let start = node.start_position().row;
    let opaque = is_opaque(lang, node.kind());
    if opaque || node.child_count() == 0 {
        if opaque {
            let end = last_row(node);
            for row in start..end {
                if row >= prefix_rows {
                    rows.open_ended.insert(row - prefix_rows);
                }
                if row + 1 >= prefix_rows {
                    rows.verbatim.insert(row + 1 - prefix_rows);
                }
            }
        }
        if start < prefix_rows {
            return;
        }
        let parent = node.parent().map(|p| p.kind());
        let delta = match node.kind() {
            _ if opaque => Delta::Other,
            "{" | "(" | "[" => Delta::Open,
            "}" | ")" | "]" => Delta::Close,
            kind if is_case_label(lang, kind, parent) => Delta::CaseLabel,
            _ => Delta::Other,
        };
        tokens.push(Token {
            row: start - prefix_rows,
            delta,
        });
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect(lang, child, prefix_rows, tokens, rows);
    }
}

/// Nesting depth of each body row.
///
/// Depth counts the distinct rows that opened a still-unclosed bracket, so
/// brackets opened together on one row add a single level. A row starting
/// with closing brackets sits at the depth they return to.
fn row_depths(tokens: &[Token], row_count: usize) -> Vec<usize> {
    let mut depths = vec![0; row_count];
    let mut open_rows: Vec<usize> = Vec::new();
    let mut current = None;
    let mut leading = false;

    for token in tokens.iter().filter(|t| t.row < row_count) {
        if current != Some(token.row) {
            current = Some(token.row);
            leading = true;
            depths[token.row] = distinct(&open_rows);
        }
        match token.delta {
            Delta::Open => {
                leading = false;
                open_rows.push(token.row);
            }
            Delta::Close => {
                open_rows.pop();
                if leading {
                    depths[token.row] = distinct(&open_rows);
                }
            }
            Delta::CaseLabel => {
                if leading {
                    depths[token.row] = depths[token.row].saturating_sub(1);
                }
                leading = false;
            }
            Delta::Other => leading = false,
        }
    }
    depths
}

fn distinct(open_rows: &[usize]) -> usize {
    let mut rows = open_rows.to_vec();
    rows.dedup();
    rows.len()
}

/// Lay out `body` as a block indented one level below `indent`.
///
/// Each row is indented by its bracket depth in the parsed body, so the
/// result does not depend on how the body was indented. Returns the full
/// replacement for the body span, braces included.
pub fn layout_body(
    lang: ProceduralLang,
    body: &str,
    checked: &CheckedBody,
    indent: &str,
) -> String {
    let lines: Vec<&str> = body.split('\n').collect();

    let mut tokens = Vec::new();
    let mut rows = OpaqueRows::default();
    collect(
        lang,
        checked.tree.root_node(),
        checked.prefix_rows,
        &mut tokens,
        &mut rows,
    );
    let depths = row_depths(&tokens, lines.len());

    let unit = lang.indent_unit();
    let inner_indent = format!("{indent}{unit}");
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for (row, line) in lines.iter().enumerate() {
        if rows.verbatim.contains(&row) {
            out.push((*line).to_string());
            continue;
        }
        let line = if rows.open_ended.contains(&row) {
            *line
        } else {
            line.trim_end()
        };
        if line.trim().is_empty() {
            // collapse runs of blank lines
            if out.last().is_some_and(|prev| prev.is_empty()) {
                continue;
            }
            out.push(String::new());
            continue;
        }
        out.push(format!(
            "{inner_indent}{}{}",
            unit.repeat(depths[row]),
            line.trim_start_matches([' ', '\t'])
        ));
    }

    while out.first().is_some_and(|line| line.is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|line| line.is_empty()) {
        out.pop();
    }

    format!("{{\n{}\n{indent}}}", out.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::parser::SourceParser;
    use crate::ts::validator::validate_body;

    fn lay_out(lang: ProceduralLang, body: &str, indent: &str) -> String {
        let mut parser = SourceParser::new(lang).unwrap();
        let checked = validate_body(&mut parser, "f", body).unwrap();
        layout_body(lang, body, &checked, indent)
    }

    #[test]
    fn strips_common_indent_and_reindents() {
        let body = "\n\n        let x = 1;   \n        if x > 0 {\n            println!(\"{x}\");\n        }\n\n";
        assert_eq!(
            lay_out(ProceduralLang::Rust, body, ""),
            "{\n    let x = 1;\n    if x > 0 {\n        println!(\"{x}\");\n    }\n}"
        );
    }

    #[test]
    fn collapses_blank_runs() {
        let body = "let a = 1;\n\n\n\nlet b = 2;";
        assert_eq!(
            lay_out(ProceduralLang::Rust, body, ""),
            "{\n    let a = 1;\n\n    let b = 2;\n}"
        );
    }

    #[test]
    fn go_uses_tabs() {
        let body = "    x := 1\n    return x";
        assert_eq!(
            lay_out(ProceduralLang::Go, body, ""),
            "{\n\tx := 1\n\treturn x\n}"
        );
    }

    #[test]
    fn multiline_string_content_is_verbatim() {
        let body = "    let s = \"first\n  second   \nthird\";\n    s.len()";
        assert_eq!(
            lay_out(ProceduralLang::Rust, body, ""),
            "{\n    let s = \"first\n  second   \nthird\";\n    s.len()\n}"
        );
    }

    #[test]
    fn go_raw_string_is_verbatim() {
        let body = "q := `\n  SELECT 1\n`\n_ = q";
        assert_eq!(
            lay_out(ProceduralLang::Go, body, ""),
            "{\n\tq := `\n  SELECT 1\n`\n\t_ = q\n}"
        );
    }

    #[test]
    fn indentation_ignores_input_formatting() {
        let flat = "if x {\nreturn 0\n}\nreturn 1";
        let tabbed = "if x {\n\treturn 0\n}\nreturn 1";
        let mixed = "  if x {\n\t    return 0\n    }\n return 1";
        let expected = "{\n\tif x {\n\t\treturn 0\n\t}\n\treturn 1\n}";

        for body in [flat, tabbed, mixed] {
            assert_eq!(lay_out(ProceduralLang::Go, body, ""), expected);
        }
    }

    #[test]
    fn rust_nesting_sets_depth() {
        let body = "match x {\nSome(v) => {\nv\n}\nNone => 0,\n}";
        assert_eq!(
            lay_out(ProceduralLang::Rust, body, ""),
            "{\n    match x {\n        Some(v) => {\n            v\n        }\n        None => 0,\n    }\n}"
        );
    }

    #[test]
    fn closing_brackets_lead_their_row() {
        let body = "do(func() {\nwork()\n})";
        assert_eq!(
            lay_out(ProceduralLang::Go, body, ""),
            "{\n\tdo(func() {\n\t\twork()\n\t})\n}"
        );
    }

    #[test]
    fn brackets_opened_together_add_one_level() {
        let body = "items.iter().fold(0, |acc, x| {\n                acc + x\n})";
        assert_eq!(
            lay_out(ProceduralLang::Rust, body, ""),
            "{\n    items.iter().fold(0, |acc, x| {\n        acc + x\n    })\n}"
        );
    }

    #[test]
    fn go_case_labels_align_with_switch() {
        let body = "switch x {\n    case 1:\n        a()\n    default:\n        b()\n}";
        assert_eq!(
            lay_out(ProceduralLang::Go, body, ""),
            "{\n\tswitch x {\n\tcase 1:\n\t\ta()\n\tdefault:\n\t\tb()\n\t}\n}"
        );
    }

    #[test]
    fn nested_indent_is_preserved() {
        let body = "1";
        assert_eq!(lay_out(ProceduralLang::Rust, body, "    "), "{\n        1\n    }");
    }
}

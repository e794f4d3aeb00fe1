use crate::ts::errors::TreeSitterError;
use ast_grep_language::{LanguageExt, SupportLang};
use std::fmt;
use tree_sitter::{Node, Parser, Tree};

/// Brace-scoped languages whose named units are function declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProceduralLang {
    Rust,
    Go,
}

impl ProceduralLang {
    pub const ALL: [ProceduralLang; 2] = [ProceduralLang::Rust, ProceduralLang::Go];

    fn support_lang(self) -> SupportLang {
        match self {
            ProceduralLang::Rust => SupportLang::Rust,
            ProceduralLang::Go => SupportLang::Go,
        }
    }

    /// Node kinds of top-level function declarations. Go methods count.
    pub fn function_kinds(self) -> &'static [&'static str] {
        match self {
            ProceduralLang::Rust => &["function_item"],
            ProceduralLang::Go => &["function_declaration", "method_declaration"],
        }
    }

    pub fn is_function(self, node: Node<'_>) -> bool {
        self.function_kinds().contains(&node.kind())
    }

    /// One level of body indentation, as the language's formatter writes it.
    pub fn indent_unit(self) -> &'static str {
        match self {
            ProceduralLang::Rust => "    ",
            ProceduralLang::Go => "\t",
        }
    }

    /// Marker written in front of a single-line doc comment.
    pub fn doc_marker(self) -> &'static str {
        match self {
            ProceduralLang::Rust => "///",
            ProceduralLang::Go => "//",
        }
    }

    /// Whether a comment node is documentation that attaches to the next item.
    pub fn is_doc_comment(self, node: Node<'_>, text: &str) -> bool {
        match self {
            ProceduralLang::Rust => match node.kind() {
                "line_comment" => text.starts_with("///") && !text.starts_with("////"),
                "block_comment" => {
                    text.starts_with("/**") && !text.starts_with("/***") && text != "/**/"
                }
                _ => false,
            },
            ProceduralLang::Go => node.kind() == "comment",
        }
    }

    /// Whether a node may sit between a doc comment and its function.
    pub fn is_item_prefix(self, node: Node<'_>) -> bool {
        matches!(self, ProceduralLang::Rust) && node.kind() == "attribute_item"
    }

    /// Wrap a body fragment in a minimal compilable unit.
    ///
    /// Returns the wrapper source and the byte offset where the fragment starts.
    pub fn wrap_body(self, body: &str) -> (String, usize) {
        let prefix = match self {
            ProceduralLang::Rust => "fn __blockpatch_body__() {\n",
            ProceduralLang::Go => "package blockpatch\n\nfunc __blockpatch_body__() {\n",
        };
        (format!("{prefix}{body}\n}}\n"), prefix.len())
    }
}

impl fmt::Display for ProceduralLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProceduralLang::Rust => write!(f, "rust"),
            ProceduralLang::Go => write!(f, "go"),
        }
    }
}

/// Tree-sitter parser bound to one procedural language.
pub struct SourceParser {
    parser: Parser,
    lang: ProceduralLang,
}

impl SourceParser {
    pub fn new(lang: ProceduralLang) -> Result<Self, TreeSitterError> {
        let mut parser = Parser::new();
        let ts_lang = lang.support_lang().get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| TreeSitterError::LanguageSet)?;

        Ok(Self { parser, lang })
    }

    pub fn lang(&self) -> ProceduralLang {
        self.lang
    }

    /// Parse source code into a tree-sitter Tree.
    pub fn parse(&mut self, source: &str) -> Result<Tree, TreeSitterError> {
        self.parser
            .parse(source, None)
            .ok_or(TreeSitterError::ParseFailed)
    }

    /// Parse source code and return the tree along with the source.
    pub fn parse_with_source<'a>(
        &mut self,
        source: &'a str,
    ) -> Result<ParsedSource<'a>, TreeSitterError> {
        let tree = self.parse(source)?;
        Ok(ParsedSource {
            source,
            tree,
            lang: self.lang,
        })
    }
}

/// A parsed source file with its tree-sitter tree.
pub struct ParsedSource<'a> {
    pub source: &'a str,
    pub tree: Tree,
    pub lang: ProceduralLang,
}

impl<'a> ParsedSource<'a> {
    /// Get the root node of the tree.
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Check if the tree contains any ERROR or MISSING nodes.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Get all ERROR and MISSING nodes in the tree.
    pub fn error_nodes(&self) -> Vec<ErrorNode> {
        let mut errors = Vec::new();
        collect_error_nodes(self.tree.root_node(), &mut errors);
        errors
    }

    /// Extract text for a node's byte range.
    pub fn node_text(&self, node: Node<'_>) -> &'a str {
        &self.source[node.byte_range()]
    }
}

/// Information about an ERROR node in the parse tree.
#[derive(Debug, Clone)]
pub struct ErrorNode {
    pub byte_start: usize,
    pub byte_end: usize,
    pub start_point: tree_sitter::Point,
}

fn collect_error_nodes(node: Node<'_>, errors: &mut Vec<ErrorNode>) {
    if node.is_error() || node.is_missing() {
        errors.push(ErrorNode {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            start_point: node.start_position(),
        });
        return;
    }

    if !node.has_error() {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, errors);
    }
}

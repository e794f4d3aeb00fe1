//! Thread-local parser pooling.
//!
//! Each worker thread keeps one parser per procedural language. A parser is
//! created on first use and reused for every later file on that thread.

use crate::ts::{ProceduralLang, SourceParser, TreeSitterError};
use std::cell::RefCell;

thread_local! {
    static RUST_PARSER: RefCell<Option<SourceParser>> = const { RefCell::new(None) };
    static GO_PARSER: RefCell<Option<SourceParser>> = const { RefCell::new(None) };
}

/// Execute function with the pooled parser for `lang`.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use blockpatch::pool::with_parser;
/// use blockpatch::ts::ProceduralLang;
///
/// let has_errors = with_parser(ProceduralLang::Go, |parser| {
///     parser.parse("package main\n").map(|tree| tree.root_node().has_error())
/// })??;
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(lang: ProceduralLang, f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut SourceParser) -> R,
{
    let slot = match lang {
        ProceduralLang::Rust => &RUST_PARSER,
        ProceduralLang::Go => &GO_PARSER,
    };

    slot.with(|cell| {
        let mut opt = cell.borrow_mut();
        let parser = match opt.as_mut() {
            Some(parser) => parser,
            None => opt.insert(SourceParser::new(lang)?),
        };
        Ok(f(parser))
    })
}

//! Tokenizer for HCL source.
//!
//! Tokens carry byte spans into the original text. Strings, templates and
//! heredocs are single tokens so their content is never split or re-indented.

use crate::hcl::errors::HclError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    /// Quoted string, template interpolations included
    String,
    /// `<<EOF` or `<<-EOF` through the closing marker
    Heredoc,
    Comment,
    Newline,
    Equals,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    /// Any other operator or separator
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// 1-based line number of a byte offset.
pub fn line_of(source: &str, offset: usize) -> usize {
    source.as_bytes()[..offset]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}

const TWO_CHAR_OPERATORS: [&str; 7] = ["==", "!=", "<=", ">=", "=>", "&&", "||"];

pub fn tokenize(source: &str) -> Result<Vec<Token>, HclError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while pos < bytes.len() {
        let start = pos;
        let rest = &source[pos..];
        let (kind, end) = match bytes[pos] {
            b' ' | b'\t' | b'\r' => {
                pos += 1;
                continue;
            }
            b'\n' => (TokenKind::Newline, pos + 1),
            b'#' => (TokenKind::Comment, line_end(bytes, pos)),
            b'/' if rest.starts_with("//") => (TokenKind::Comment, line_end(bytes, pos)),
            b'/' if rest.starts_with("/*") => {
                let close = rest[2..]
                    .find("*/")
                    .ok_or_else(|| HclError::UnterminatedComment {
                        line: line_of(source, pos),
                    })?;
                (TokenKind::Comment, pos + 2 + close + 2)
            }
            b'"' => (TokenKind::String, scan_string(source, pos)?),
            b'<' if rest.starts_with("<<") => match scan_heredoc(source, pos)? {
                Some(end) => (TokenKind::Heredoc, end),
                None => (TokenKind::Punct, pos + 1),
            },
            b'{' => (TokenKind::LBrace, pos + 1),
            b'}' => (TokenKind::RBrace, pos + 1),
            b'[' => (TokenKind::LBracket, pos + 1),
            b']' => (TokenKind::RBracket, pos + 1),
            b'(' => (TokenKind::LParen, pos + 1),
            b')' => (TokenKind::RParen, pos + 1),
            b'0'..=b'9' => (TokenKind::Number, scan_number(bytes, pos)),
            _ if TWO_CHAR_OPERATORS.iter().any(|op| rest.starts_with(op)) => {
                (TokenKind::Punct, pos + 2)
            }
            b'=' => (TokenKind::Equals, pos + 1),
            _ => {
                let ident_len: usize = rest
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
                    .map(char::len_utf8)
                    .sum();
                let first = rest.chars().next().unwrap_or(' ');
                if ident_len > 0 && (first.is_alphabetic() || first == '_') {
                    (TokenKind::Ident, pos + ident_len)
                } else if rest.starts_with("...") {
                    (TokenKind::Punct, pos + 3)
                } else {
                    (TokenKind::Punct, pos + first.len_utf8())
                }
            }
        };

        tokens.push(Token { kind, start, end });
        pos = end;
    }

    Ok(tokens)
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|b| *b == b'\n')
        .map_or(bytes.len(), |idx| from + idx)
}

fn scan_number(bytes: &[u8], from: usize) -> usize {
    let mut pos = from;
    while pos < bytes.len() {
        match bytes[pos] {
            b'0'..=b'9' | b'.' => pos += 1,
            b'e' | b'E' => {
                pos += 1;
                if matches!(bytes.get(pos), Some(b'+') | Some(b'-')) {
                    pos += 1;
                }
            }
            _ => break,
        }
    }
    pos
}

/// Scan a quoted string starting at the opening quote; returns the end offset.
fn scan_string(source: &str, open: usize) -> Result<usize, HclError> {
    let bytes = source.as_bytes();
    let unterminated = || HclError::UnterminatedString {
        line: line_of(source, open),
    };
    let mut pos = open + 1;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'"' => return Ok(pos + 1),
            b'\n' => return Err(unterminated()),
            b'$' | b'%' if bytes.get(pos + 1) == Some(&bytes[pos]) => pos += 2,
            b'$' | b'%' if bytes.get(pos + 1) == Some(&b'{') => {
                pos = scan_template(source, pos + 2).ok_or_else(unterminated)??;
            }
            _ => pos += 1,
        }
    }

    Err(unterminated())
}

/// Scan a `${ ... }` or `%{ ... }` sequence body; returns the offset after `}`.
///
/// Returns `None` at end of input.
fn scan_template(source: &str, from: usize) -> Option<Result<usize, HclError>> {
    let bytes = source.as_bytes();
    let mut depth = 1usize;
    let mut pos = from;

    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(Ok(pos + 1));
                }
            }
            b'"' => match scan_string(source, pos) {
                Ok(end) => {
                    pos = end;
                    continue;
                }
                Err(err) => return Some(Err(err)),
            },
            _ => {}
        }
        pos += 1;
    }

    None
}

/// Scan a heredoc starting at `<<`. Returns `None` if no heredoc header follows.
fn scan_heredoc(source: &str, open: usize) -> Result<Option<usize>, HclError> {
    let header_end = line_end(source.as_bytes(), open);
    let header = source[open + 2..header_end].trim_end_matches('\r');
    let marker = header.strip_prefix('-').unwrap_or(header);

    let is_marker = marker
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && marker.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !is_marker || header_end == source.len() {
        return Ok(None);
    }

    let mut line_start = header_end + 1;
    while line_start < source.len() {
        let end = line_end(source.as_bytes(), line_start);
        let line = source[line_start..end].trim_end_matches('\r');
        if line.trim() == marker {
            return Ok(Some(line_start + line.len()));
        }
        line_start = end + 1;
    }

    Err(HclError::UnterminatedHeredoc {
        marker: marker.to_string(),
        line: line_of(source, open),
    })
}

/// Unescape the contents of a quoted string token.
pub fn unquote(text: &str) -> String {
    let inner = text
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(text);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

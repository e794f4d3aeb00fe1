//! Block-tree parser over the token stream.
//!
//! Expressions are not interpreted. An attribute value runs until the end of
//! its line at bracket depth zero, which is all block lookup needs.

use crate::hcl::errors::HclError;
use crate::hcl::lexer::{line_of, tokenize, unquote, Token, TokenKind};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub attributes: Vec<Attribute>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Name through the end of the value expression
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub block_type: String,
    pub labels: Vec<String>,
    /// Type keyword through the closing brace
    pub span: Range<usize>,
    /// Offset just after the opening brace
    pub body_start: usize,
    /// Offset of the closing brace
    pub body_end: usize,
    pub body: Body,
}

impl Block {
    /// Labels joined with `,` in source order.
    pub fn label_key(&self) -> String {
        self.labels.join(",")
    }

    /// Pre-order walk over this block and every nested block.
    pub fn walk(&self) -> Box<dyn Iterator<Item = &Block> + '_> {
        Box::new(std::iter::once(self).chain(self.body.blocks.iter().flat_map(Block::walk)))
    }
}

impl Body {
    /// Every block in document order, parents before children.
    pub fn all_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().flat_map(Block::walk)
    }
}

/// Parse a complete HCL document or body fragment.
pub fn parse(source: &str) -> Result<Body, HclError> {
    let tokens: Vec<Token> = tokenize(source)?
        .into_iter()
        .filter(|t| t.kind != TokenKind::Comment)
        .collect();

    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let body = parser.parse_body(None)?;
    Ok(body)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn skip_newlines(&mut self) {
        while self.peek().is_some_and(|t| t.kind == TokenKind::Newline) {
            self.pos += 1;
        }
    }

    fn unexpected(&self, token: Token) -> HclError {
        HclError::UnexpectedToken {
            found: token.text(self.source).escape_debug().to_string(),
            line: line_of(self.source, token.start),
        }
    }

    /// Parse body items until EOF (top level) or the closing brace of `open`.
    fn parse_body(&mut self, open: Option<Token>) -> Result<Body, HclError> {
        let mut body = Body {
            attributes: Vec::new(),
            blocks: Vec::new(),
        };

        loop {
            self.skip_newlines();
            let Some(token) = self.peek() else {
                return match open {
                    Some(open) => Err(HclError::UnclosedDelimiter {
                        open: "{".to_string(),
                        line: line_of(self.source, open.start),
                    }),
                    None => Ok(body),
                };
            };

            match token.kind {
                TokenKind::RBrace if open.is_some() => return Ok(body),
                TokenKind::Ident => {
                    self.pos += 1;
                    match self.peek().map(|t| t.kind) {
                        Some(TokenKind::Equals) => {
                            self.pos += 1;
                            body.attributes.push(self.parse_attribute(token)?);
                        }
                        Some(TokenKind::Ident | TokenKind::String | TokenKind::LBrace) => {
                            body.blocks.push(self.parse_block(token)?);
                        }
                        Some(_) => {
                            let next = self.tokens[self.pos];
                            return Err(self.unexpected(next));
                        }
                        None => return Err(self.unexpected(token)),
                    }
                }
                _ => return Err(self.unexpected(token)),
            }
        }
    }

    fn parse_attribute(&mut self, name: Token) -> Result<Attribute, HclError> {
        let mut stack: Vec<Token> = Vec::new();
        let mut end = None;

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Newline | TokenKind::RBrace if stack.is_empty() => break,
                TokenKind::LBrace | TokenKind::LBracket | TokenKind::LParen => {
                    stack.push(token);
                }
                TokenKind::RBrace | TokenKind::RBracket | TokenKind::RParen => {
                    let open = stack.pop().ok_or_else(|| self.unexpected(token))?;
                    if !closes(open.kind, token.kind) {
                        return Err(HclError::MismatchedDelimiter {
                            found: token.text(self.source).to_string(),
                            line: line_of(self.source, token.start),
                        });
                    }
                }
                _ => {}
            }
            end = Some(token.end);
            self.pos += 1;
        }

        if let Some(open) = stack.pop() {
            return Err(HclError::UnclosedDelimiter {
                open: open.text(self.source).to_string(),
                line: line_of(self.source, open.start),
            });
        }

        let end = end.ok_or_else(|| HclError::MissingValue {
            name: name.text(self.source).to_string(),
            line: line_of(self.source, name.start),
        })?;

        Ok(Attribute {
            name: name.text(self.source).to_string(),
            span: name.start..end,
        })
    }

    fn parse_block(&mut self, keyword: Token) -> Result<Block, HclError> {
        let mut labels = Vec::new();
        let open = loop {
            let Some(token) = self.bump() else {
                return Err(self.unexpected(keyword));
            };
            match token.kind {
                TokenKind::Ident => labels.push(token.text(self.source).to_string()),
                TokenKind::String => labels.push(unquote(token.text(self.source))),
                TokenKind::LBrace => break token,
                _ => return Err(self.unexpected(token)),
            }
        };

        let body = self.parse_body(Some(open))?;
        let close = self.bump().ok_or_else(|| HclError::UnclosedDelimiter {
            open: "{".to_string(),
            line: line_of(self.source, open.start),
        })?;

        Ok(Block {
            block_type: keyword.text(self.source).to_string(),
            labels,
            span: keyword.start..close.end,
            body_start: open.end,
            body_end: close.start,
            body,
        })
    }
}

fn closes(open: TokenKind, close: TokenKind) -> bool {
    matches!(
        (open, close),
        (TokenKind::LBrace, TokenKind::RBrace)
            | (TokenKind::LBracket, TokenKind::RBracket)
            | (TokenKind::LParen, TokenKind::RParen)
    )
}

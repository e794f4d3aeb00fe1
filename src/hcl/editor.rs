use crate::edit::{apply_edits, Edit};
use crate::hcl::errors::HclError;
use crate::hcl::lexer::{tokenize, TokenKind};
use crate::hcl::parser::{parse, Block, Body};
use crate::suggest::closest;
use std::collections::BTreeSet;

const INDENT_UNIT: &str = "  ";

/// A parsed HCL document that can have block bodies replaced.
pub struct HclEditor {
    content: String,
    body: Body,
}

impl HclEditor {
    pub fn parse(content: &str) -> Result<Self, HclError> {
        let body = parse(content)?;
        Ok(Self {
            content: content.to_string(),
            body,
        })
    }

    /// First block in document order with this type and label key.
    pub fn find_block(&self, block_type: &str, label_key: &str) -> Option<&Block> {
        self.body
            .all_blocks()
            .find(|block| block.block_type == block_type && block.label_key() == label_key)
    }

    /// Like [`find_block`](Self::find_block), but a miss is an error naming
    /// the closest label key of the same type.
    pub fn require_block(&self, block_type: &str, label_key: &str) -> Result<&Block, HclError> {
        self.find_block(block_type, label_key)
            .ok_or_else(|| self.not_found(block_type, label_key))
    }

    /// Replace the inner body of the first matching block with `new_body`.
    ///
    /// The header and the closing brace are untouched; the fragment is
    /// re-indented to the block's inner indentation.
    pub fn replace_block(
        &self,
        block_type: &str,
        label_key: &str,
        new_body: &str,
    ) -> Result<String, HclError> {
        let block = self.require_block(block_type, label_key)?;

        parse(new_body).map_err(|err| HclError::InvalidFragment(Box::new(err)))?;

        let indent = line_indent(&self.content, block.span.start);
        let inner_indent = format!("{indent}{INDENT_UNIT}");
        let lines = reindent_fragment(new_body, &inner_indent)?;
        let replacement = if lines.is_empty() {
            "\n".to_string()
        } else {
            format!("\n{}\n", lines.join("\n"))
        };

        let edit = Edit::new(
            block.body_start,
            block.body_end,
            format!("{replacement}{indent}"),
            &self.content[block.body_start..block.body_end],
        );
        let updated = apply_edits(&self.content, vec![edit])?;
        parse(&updated).map_err(|err| HclError::InvalidResult(Box::new(err)))?;

        Ok(updated)
    }

    fn not_found(&self, block_type: &str, label_key: &str) -> HclError {
        let keys: Vec<String> = self
            .body
            .all_blocks()
            .filter(|block| block.block_type == block_type)
            .map(Block::label_key)
            .collect();

        HclError::BlockNotFound {
            block_type: block_type.to_string(),
            label_key: label_key.to_string(),
            suggestion: closest(label_key, keys.iter().map(String::as_str)),
        }
    }
}

fn line_indent(content: &str, offset: usize) -> &str {
    let line_start = content[..offset].rfind('\n').map_or(0, |idx| idx + 1);
    let line = &content[line_start..offset];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// Rows of `fragment` that begin inside a heredoc or multi-line string.
fn verbatim_rows(fragment: &str) -> Result<BTreeSet<usize>, HclError> {
    let mut rows = BTreeSet::new();
    for token in tokenize(fragment)? {
        if !matches!(token.kind, TokenKind::String | TokenKind::Heredoc) {
            continue;
        }
        let first = fragment[..token.start].matches('\n').count();
        let newlines = token.text(fragment).matches('\n').count();
        rows.extend(first + 1..=first + newlines);
    }
    Ok(rows)
}

fn reindent_fragment(fragment: &str, indent: &str) -> Result<Vec<String>, HclError> {
    let verbatim = verbatim_rows(fragment)?;
    let lines: Vec<&str> = fragment.split('\n').collect();

    let common = lines
        .iter()
        .enumerate()
        .filter(|(row, line)| !verbatim.contains(row) && !line.trim().is_empty())
        .map(|(_, line)| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let mut out: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(row, line)| {
            if verbatim.contains(&row) {
                (*line).to_string()
            } else if line.trim().is_empty() {
                String::new()
            } else {
                format!("{indent}{}", line[common..].trim_end())
            }
        })
        .collect();

    while out.first().is_some_and(|line| line.is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|line| line.is_empty()) {
        out.pop();
    }
    Ok(out)
}

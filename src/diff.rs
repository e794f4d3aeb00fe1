//! Unified diff rendering for dry runs.

use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fmt::Write;
use std::path::Path;

const CONTEXT_LINES: usize = 3;

/// Render a git-style unified diff of `original` against `modified`.
///
/// Inserted, deleted and unchanged lines are prefixed `+`, `-` and two
/// spaces. Identical inputs render to an empty string. With `color`, inserted
/// lines are green, deleted lines red, and the changed tokens inside a line
/// are emphasized.
pub fn render_diff(original: &str, modified: &str, path: &Path, color: bool) -> String {
    if original == modified {
        return String::new();
    }

    let display = path.display();
    let mut out = String::new();
    let _ = writeln!(out, "diff --git a/{display} b/{display}");
    let _ = writeln!(out, "--- a/{display}");
    let _ = writeln!(out, "+++ b/{display}");

    let diff = TextDiff::from_lines(original, modified);
    for hunk in diff.unified_diff().context_radius(CONTEXT_LINES).iter_hunks() {
        let header = hunk.header().to_string();
        if color {
            let _ = writeln!(out, "{}", header.cyan());
        } else {
            let _ = writeln!(out, "{header}");
        }

        for op in hunk.ops() {
            for change in diff.iter_inline_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => "  ",
                };

                let mut line = String::new();
                for (emphasized, value) in change.iter_strings_lossy() {
                    let value = value.trim_end_matches('\n');
                    line.push_str(&paint(change.tag(), emphasized, value, color));
                }
                let sign = paint(change.tag(), false, sign, color);
                let _ = writeln!(out, "{sign}{line}");

                if change.missing_newline() {
                    let _ = writeln!(out, "\\ No newline at end of file");
                }
            }
        }
    }

    out
}

fn paint(tag: ChangeTag, emphasized: bool, text: &str, color: bool) -> String {
    if !color || text.is_empty() {
        return text.to_string();
    }
    match (tag, emphasized) {
        (ChangeTag::Delete, true) => text.red().bold().underline().to_string(),
        (ChangeTag::Delete, false) => text.red().to_string(),
        (ChangeTag::Insert, true) => text.green().bold().underline().to_string(),
        (ChangeTag::Insert, false) => text.green().to_string(),
        (ChangeTag::Equal, _) => text.dimmed().to_string(),
    }
}

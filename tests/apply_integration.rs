//! End-to-end tests for batch apply across procedural, declarative and
//! line-oriented files.

use blockpatch::{
    apply, ApplyError, ApplyOptions, Block, BlockChange, Change, ChangePlan, FunctionError,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const RUST_SOURCE: &str = r#"use std::collections::HashMap;

/// Counts words.
/// Splits on whitespace.
pub fn count_words(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for word in text.split_whitespace() {
        *counts.entry(word.to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn unchanged() -> u32 {
    7
}
"#;

const GO_SOURCE: &str = "package util\n\n// Add adds.\nfunc Add(a, b int) int {\n\treturn a + b\n}\n\nfunc Sub(a, b int) int {\n\treturn a - b\n}\n";

const HCL_SOURCE: &str = r#"provider "gcp" {
  project = "demo"
}

resource "bucket" "x" {
  name = "old"
}

resource "bucket" "y" {
  name = "keep"
}
"#;

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::create_dir_all(dir.path().join("util")).unwrap();
    fs::create_dir_all(dir.path().join("infra")).unwrap();
    fs::write(dir.path().join("src/words.rs"), RUST_SOURCE).unwrap();
    fs::write(dir.path().join("util/math.go"), GO_SOURCE).unwrap();
    fs::write(dir.path().join("infra/main.tf"), HCL_SOURCE).unwrap();
    fs::write(dir.path().join("notes.md"), "# Notes\n").unwrap();
    dir
}

fn block_change(
    path: &str,
    target_type: &str,
    name: &str,
    content: &str,
    comment: &str,
) -> BlockChange {
    BlockChange {
        block: Block {
            path: PathBuf::from(path),
            target_type: target_type.to_string(),
            target_name: name.to_string(),
        },
        new_content: content.to_string(),
        new_comment: comment.to_string(),
    }
}

fn options(root: &Path, dry_run: bool) -> ApplyOptions {
    ApplyOptions {
        root: Some(root.to_path_buf()),
        dry_run,
        workers: 2,
        ..ApplyOptions::default()
    }
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

#[test]
fn applies_changes_across_file_kinds() {
    let dir = workspace();
    let plan = ChangePlan::blocks(
        "refresh utilities",
        vec![
            block_change(
                "src/words.rs",
                "function",
                "count_words",
                "text.split_whitespace().fold(HashMap::new(), |mut counts, word| {\n    *counts.entry(word.to_string()).or_insert(0) += 1;\n    counts\n})",
                "Counts each whitespace-separated word.",
            ),
            block_change("util/math.go", "function", "Sub", "return b - a", ""),
            block_change(
                "infra/main.tf",
                "resource",
                "bucket,x",
                "name = \"new\"\nlocation = \"EU\"\n",
                "",
            ),
        ],
    );

    let report = apply(&plan, &options(dir.path(), false)).unwrap();
    assert_eq!(report.files.len(), 3);
    assert_eq!(report.written().count(), 3);

    let rust = read(dir.path(), "src/words.rs");
    assert!(rust.starts_with(
        "use std::collections::HashMap;\n\n/// Counts each whitespace-separated word.\npub fn count_words"
    ));
    assert!(rust.contains(
        "{\n    text.split_whitespace().fold(HashMap::new(), |mut counts, word| {\n        *counts.entry(word.to_string()).or_insert(0) += 1;\n        counts\n    })\n}\n"
    ));
    assert!(rust.ends_with("pub fn unchanged() -> u32 {\n    7\n}\n"));
    assert_eq!(rust.matches("fn count_words").count(), 1);

    let go = read(dir.path(), "util/math.go");
    assert!(go.contains("func Sub(a, b int) int {\n\treturn b - a\n}\n"));
    assert!(go.contains("// Add adds.\nfunc Add(a, b int) int {\n\treturn a + b\n}\n"));

    let hcl = read(dir.path(), "infra/main.tf");
    assert!(hcl.contains("resource \"bucket\" \"x\" {\n  name = \"new\"\n  location = \"EU\"\n}\n"));
    assert!(hcl.starts_with("provider \"gcp\" {\n  project = \"demo\"\n}\n"));
    assert!(hcl.ends_with("resource \"bucket\" \"y\" {\n  name = \"keep\"\n}\n"));
}

#[test]
fn multiple_changes_to_one_file_apply_in_order() {
    let dir = workspace();
    let plan = ChangePlan::blocks(
        "two edits",
        vec![
            block_change("src/words.rs", "function", "unchanged", "8", ""),
            block_change("src/words.rs", "function", "unchanged", "", "Returns eight."),
        ],
    );

    apply(&plan, &options(dir.path(), false)).unwrap();
    let rust = read(dir.path(), "src/words.rs");
    assert!(rust.ends_with("/// Returns eight.\npub fn unchanged() -> u32 {\n    8\n}\n"));
}

#[test]
fn aliased_paths_are_one_file() {
    let dir = workspace();
    let absolute = dir.path().join("util/math.go").display().to_string();
    let plan = ChangePlan::blocks(
        "aliases",
        vec![
            block_change("util/math.go", "function", "Add", "return 11", ""),
            block_change("./util/math.go", "function", "Sub", "return 22", ""),
            block_change(&absolute, "function", "Add", "", "Add returns eleven."),
        ],
    );

    let report = apply(&plan, &options(dir.path(), false)).unwrap();
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.written().collect::<Vec<_>>(), vec![Path::new("util/math.go")]);

    let go = read(dir.path(), "util/math.go");
    assert_eq!(
        go,
        "package util\n\n// Add returns eleven.\nfunc Add(a, b int) int {\n\treturn 11\n}\n\nfunc Sub(a, b int) int {\n\treturn 22\n}\n"
    );
}

#[test]
fn go_method_is_a_function_target() {
    let dir = workspace();
    fs::write(
        dir.path().join("util/counter.go"),
        "package util\n\ntype Counter struct{ n int }\n\nfunc (c *Counter) Inc() {\n\tc.n++\n}\n",
    )
    .unwrap();
    let plan = ChangePlan::blocks(
        "method",
        vec![block_change(
            "util/counter.go",
            "function",
            "Inc",
            "if c.n < 10 {\n        c.n++\n}",
            "Inc increments up to ten.",
        )],
    );

    apply(&plan, &options(dir.path(), false)).unwrap();
    assert_eq!(
        read(dir.path(), "util/counter.go"),
        "package util\n\ntype Counter struct{ n int }\n\n// Inc increments up to ten.\nfunc (c *Counter) Inc() {\n\tif c.n < 10 {\n\t\tc.n++\n\t}\n}\n"
    );
}

#[test]
fn empty_block_change_is_byte_identical() {
    let dir = workspace();
    let plan = ChangePlan::blocks(
        "noop",
        vec![
            block_change("src/words.rs", "function", "unchanged", "", ""),
            block_change("infra/main.tf", "resource", "bucket,y", "", ""),
        ],
    );

    let report = apply(&plan, &options(dir.path(), false)).unwrap();
    assert_eq!(report.written().count(), 0);
    assert_eq!(read(dir.path(), "src/words.rs"), RUST_SOURCE);
    assert_eq!(read(dir.path(), "infra/main.tf"), HCL_SOURCE);
}

#[test]
fn dry_run_renders_diff_without_writing() {
    let dir = workspace();
    let plan = ChangePlan::blocks(
        "dry",
        vec![block_change("util/math.go", "function", "Add", "return a + b + 0", "")],
    );

    let report = apply(&plan, &options(dir.path(), true)).unwrap();
    let rendered = report.render();

    assert!(rendered.starts_with("diff --git a/util/math.go b/util/math.go\n--- a/util/math.go\n+++ b/util/math.go\n@@ "));
    assert!(rendered.contains("-\treturn a + b\n+\treturn a + b + 0\n"));
    assert_eq!(report.written().count(), 0);
    assert_eq!(read(dir.path(), "util/math.go"), GO_SOURCE);
}

#[test]
fn dry_run_failure_leaves_valid_file_untouched() {
    let dir = workspace();
    let plan = ChangePlan::blocks(
        "one bad",
        vec![
            block_change("util/math.go", "function", "Add", "return 0", ""),
            block_change("src/words.rs", "function", "missing_fn", "1", ""),
        ],
    );

    let err = apply(&plan, &options(dir.path(), true)).unwrap_err();
    match err {
        ApplyError::Function {
            path,
            source: FunctionError::NotFound { name, .. },
        } => {
            assert_eq!(path, PathBuf::from("src/words.rs"));
            assert_eq!(name, "missing_fn");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(read(dir.path(), "util/math.go"), GO_SOURCE);
    assert_eq!(read(dir.path(), "src/words.rs"), RUST_SOURCE);
}

#[test]
fn unsupported_file_type_names_path() {
    let dir = workspace();
    let plan = ChangePlan::blocks(
        "markdown",
        vec![block_change("notes.md", "section", "Notes", "text", "")],
    );

    let err = apply(&plan, &options(dir.path(), false)).unwrap_err();
    assert_eq!(err.to_string(), "unsupported file type: notes.md");
    assert_eq!(read(dir.path(), "notes.md"), "# Notes\n");
}

#[test]
fn procedural_target_must_be_function() {
    let dir = workspace();
    let plan = ChangePlan::blocks(
        "struct",
        vec![block_change("src/words.rs", "struct", "Counter", "x: u32", "")],
    );

    let err = apply(&plan, &options(dir.path(), false)).unwrap_err();
    assert!(matches!(err, ApplyError::UnsupportedTarget { .. }));
}

#[test]
fn missing_declarative_block_is_reported() {
    let dir = workspace();
    let plan = ChangePlan::blocks(
        "missing",
        vec![block_change("infra/main.tf", "resource", "bucket,z", "name = \"z\"", "")],
    );

    let err = apply(&plan, &options(dir.path(), false)).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("block not found: resource with labels \"bucket,z\""));
}

#[test]
fn declarative_comment_is_skipped() {
    let dir = workspace();
    let plan = ChangePlan::blocks(
        "comment",
        vec![block_change("infra/main.tf", "provider", "gcp", "project = \"prod\"", "Production.")],
    );

    apply(&plan, &options(dir.path(), false)).unwrap();
    let hcl = read(dir.path(), "infra/main.tf");
    assert!(hcl.starts_with("provider \"gcp\" {\n  project = \"prod\"\n}\n"));
    assert!(!hcl.contains("Production"));
}

#[test]
fn line_plan_creates_and_edits_files() {
    let dir = workspace();
    let plan = ChangePlan::lines(
        "lines",
        vec![
            Change {
                path: PathBuf::from("notes.md"),
                line_num: 1,
                add: " (draft)".to_string(),
                delete: String::new(),
            },
            Change {
                path: PathBuf::from("docs/new.txt"),
                line_num: 0,
                add: "created".to_string(),
                delete: String::new(),
            },
        ],
    );

    let report = apply(&plan, &options(dir.path(), false)).unwrap();
    assert_eq!(report.written().count(), 2);
    assert_eq!(read(dir.path(), "notes.md"), "# Notes (draft)\n");
    assert_eq!(read(dir.path(), "docs/new.txt"), "created\n");
}

#[test]
fn line_out_of_range_fails() {
    let dir = workspace();
    let plan = ChangePlan::lines(
        "range",
        vec![Change {
            path: PathBuf::from("notes.md"),
            line_num: 5,
            add: "x".to_string(),
            delete: String::new(),
        }],
    );

    let err = apply(&plan, &options(dir.path(), false)).unwrap_err();
    assert!(matches!(err, ApplyError::Lines { .. }));
}

#[test]
fn paths_outside_root_are_rejected() {
    let dir = workspace();
    let root = dir.path().join("src");
    let plan = ChangePlan::blocks(
        "escape",
        vec![block_change("../util/math.go", "function", "Add", "return 0", "")],
    );

    let err = apply(&plan, &options(&root, false)).unwrap_err();
    assert!(matches!(err, ApplyError::Unsafe { .. }));
    assert_eq!(read(dir.path(), "util/math.go"), GO_SOURCE);
}

#[test]
fn invalid_body_is_rejected_before_writing() {
    let dir = workspace();
    let plan = ChangePlan::blocks(
        "bad body",
        vec![block_change("src/words.rs", "function", "unchanged", "let = ;", "")],
    );

    let err = apply(&plan, &options(dir.path(), false)).unwrap_err();
    assert!(matches!(
        err,
        ApplyError::Function {
            source: FunctionError::InvalidBody { .. },
            ..
        }
    ));
    assert_eq!(read(dir.path(), "src/words.rs"), RUST_SOURCE);
}

use blockpatch::{HclEditor, HclError};
use std::fs;

fn load_fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|err| panic!("failed to load fixture {name}: {err}"))
}

#[test]
fn replace_resource_body_fixture() {
    let input = load_fixture("main.tf.input");
    let expected = load_fixture("main.tf.expected");

    let editor = HclEditor::parse(&input).expect("editor");
    let output = editor
        .replace_block(
            "resource",
            "google_storage_bucket,artifacts",
            "name     = \"artifacts-new\"\nlocation = \"EU\"\n\nversioning {\n  enabled = true\n}\n",
        )
        .expect("replace");

    assert_eq!(output, expected);
}

#[test]
fn heredoc_fragment_fixture() {
    let input = load_fixture("policy.tf.input");
    let expected = load_fixture("policy.tf.expected");

    // Heredoc lines keep their own indentation.
    let fragment = "    name   = \"reader\"\n    policy = <<-EOT\n    {\n      \"Version\": \"2012-10-17\",\n      \"Statement\": []\n    }\n  EOT\n";
    let output = HclEditor::parse(&input)
        .expect("editor")
        .replace_block("resource", "aws_iam_policy,reader", fragment)
        .expect("replace");

    assert_eq!(output, expected);
}

#[test]
fn replacing_twice_is_stable() {
    let input = load_fixture("main.tf.input");
    let body = "name = \"logs-v2\"";

    let once = HclEditor::parse(&input)
        .unwrap()
        .replace_block("resource", "google_storage_bucket,logs", body)
        .unwrap();
    let twice = HclEditor::parse(&once)
        .unwrap()
        .replace_block("resource", "google_storage_bucket,logs", body)
        .unwrap();

    assert_eq!(once, twice);
    assert!(once.contains("resource \"google_storage_bucket\" \"logs\" {\n  name = \"logs-v2\"\n}\n"));
}

#[test]
fn nested_block_is_found_by_type() {
    let input = load_fixture("main.tf.input");

    let output = HclEditor::parse(&input)
        .unwrap()
        .replace_block("action", "", "type = \"SetStorageClass\"")
        .unwrap();

    assert!(output.contains("    action {\n      type = \"SetStorageClass\"\n    }\n"));
    assert!(output.contains("    condition {\n      age = 30\n    }\n"));
}

#[test]
fn broken_document_is_rejected() {
    let input = load_fixture("main.tf.input").replace("module \"network\" {", "module \"network\"");
    assert!(HclEditor::parse(&input).is_err());
}

#[test]
fn missing_label_suggests_sibling() {
    let input = load_fixture("main.tf.input");
    let err = HclEditor::parse(&input)
        .unwrap()
        .replace_block("resource", "google_storage_bucket,log", "name = \"x\"")
        .unwrap_err();

    match err {
        HclError::BlockNotFound { suggestion, .. } => {
            assert_eq!(suggestion.as_deref(), Some("google_storage_bucket,logs"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

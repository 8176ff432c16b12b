use std::fs;
use std::io::Write;
use tunnel_patcher::compose::{ComposeEditor, ComposeFile, ImageTagUpdate};
use tunnel_patcher::text::{TextEditor, TextOperation};
use tunnel_patcher::{Plan, RewriteResult};

fn load_fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|err| panic!("failed to load fixture {name}: {err}"))
}

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut temp = tempfile::NamedTempFile::new().expect("tempfile");
    temp.write_all(contents.as_bytes()).expect("write temp");
    temp.flush().expect("flush temp");
    temp
}

/// Apply `operations` in order to a temp copy of `input`, then check that a
/// second pass plans nothing.
fn run_golden(input: &str, operations: &[TextOperation]) -> String {
    let temp = write_temp(input);

    for operation in operations {
        let editor = TextEditor::from_path(temp.path()).expect("editor");
        match editor.plan(operation).expect("plan") {
            Plan::Rewrite(rewrite) => {
                let result = rewrite.apply().expect("apply rewrite");
                assert!(matches!(result, RewriteResult::Applied { .. }));
            }
            other => panic!("unexpected plan for {operation}: {other:?}"),
        }
    }

    let output = fs::read_to_string(temp.path()).expect("read output");

    for operation in operations {
        let editor = TextEditor::new(temp.path(), output.clone());
        match editor.plan(operation).expect("plan") {
            Plan::Rewrite(_) => panic!("expected no-op on second application of {operation}"),
            Plan::Unchanged(_) => {}
            Plan::Unmatched(reason) => {
                // A substituted placeholder is gone for good; anything else must still match.
                assert!(
                    matches!(operation, TextOperation::ReplaceAll { .. }),
                    "{operation} stopped matching: {reason}"
                );
            }
        }
    }

    output
}

#[test]
fn hostname_in_env_file_fixture() {
    let output = run_golden(
        &load_fixture("docker_env.input"),
        &[TextOperation::ReplaceValue {
            marker: "MAGENTO_URL".to_string(),
            separator: "=".to_string(),
            value: "4f2a9c.ngrok.io".to_string(),
        }],
    );
    assert_eq!(output, load_fixture("docker_env.expected"));
}

#[test]
fn dockerfile_php_and_sample_data_fixture() {
    let output = run_golden(
        &load_fixture("Dockerfile.input"),
        &[
            TextOperation::ReplaceTag {
                marker: "alexcheng/apache2-php5".to_string(),
                delimiter: ":".to_string(),
                value: "5.6.30".to_string(),
            },
            TextOperation::RemoveLine {
                line: "RUN chmod +x /usr/local/bin/install-sampledata".to_string(),
            },
        ],
    );
    assert_eq!(output, load_fixture("Dockerfile.expected"));
}

#[test]
fn placeholder_fixture() {
    let output = run_golden(
        &load_fixture("local.xml.input"),
        &[TextOperation::ReplaceAll {
            placeholder: "{{TUNNEL_HOST}}".to_string(),
            value: "4f2a9c.ngrok.io".to_string(),
        }],
    );
    assert_eq!(output, load_fixture("local.xml.expected"));
}

#[test]
fn compose_image_tag_fixture() {
    let input = load_fixture("docker-compose.yml.input");
    let temp = write_temp(&input);
    let update = ImageTagUpdate::new("web", "1.9.3.8");

    let editor = ComposeEditor::from_path(temp.path()).expect("editor");
    match editor.plan(&update).expect("plan") {
        Plan::Rewrite(rewrite) => {
            let _ = rewrite.apply().expect("apply rewrite");
        }
        other => panic!("unexpected plan: {other:?}"),
    }

    let output = fs::read_to_string(temp.path()).expect("read output");
    let before: ComposeFile = serde_yaml::from_str(&input).expect("parse input");
    let after: ComposeFile = serde_yaml::from_str(&output).expect("parse output");

    assert_eq!(
        after.services["web"].image.as_deref(),
        Some("alexcheng/magento:1.9.3.8")
    );
    assert_eq!(after.services["db"], before.services["db"]);
    assert_eq!(after.services["web"].extra, before.services["web"].extra);
    assert_eq!(after.extra, before.extra);

    let editor = ComposeEditor::from_path(temp.path()).expect("editor");
    assert!(matches!(
        editor.plan(&update).expect("plan"),
        Plan::Unchanged(_)
    ));
}

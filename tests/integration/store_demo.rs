//! Runs every built-in preset against a mock copy of the store demo.
//!
//! Layout mirrors the demo repository: `docker_env` and
//! `docker-compose.yml` at the root, the store image under `docker-magento/`.

use std::fs;
use tempfile::TempDir;
use tunnel_patcher::config::{apply_patches, presets, ApplyOptions, PatchConfig, PatchResult};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|err| panic!("failed to load fixture {name}: {err}"))
}

fn setup_mock_store_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();

    fs::create_dir_all(dir.path().join("docker-magento")).unwrap();
    fs::write(
        dir.path().join(presets::DOCKER_ENV),
        fixture("docker_env.input"),
    )
    .unwrap();
    fs::write(
        dir.path().join(presets::DOCKERFILE),
        fixture("Dockerfile.input"),
    )
    .unwrap();
    fs::write(
        dir.path().join(presets::COMPOSE_FILE),
        fixture("docker-compose.yml.input"),
    )
    .unwrap();

    dir
}

fn workflow() -> Vec<(PatchConfig, &'static str)> {
    vec![
        (presets::set_hostname(presets::DOCKER_ENV), "4f2a9c.ngrok.io"),
        (presets::remove_sample_data(presets::DOCKERFILE), ""),
        (presets::set_php(presets::DOCKERFILE), "5.6.30"),
        (
            presets::set_magento_version(presets::COMPOSE_FILE, presets::STORE_SERVICE),
            "1.9.3.8",
        ),
    ]
}

fn run_workflow(workspace: &TempDir) -> Vec<(String, PatchResult)> {
    let mut results = Vec::new();
    for (config, argument) in workflow() {
        let options = ApplyOptions {
            argument: (!argument.is_empty()).then(|| argument.to_string()),
            strict: true,
        };
        let report = apply_patches(&config, workspace.path(), &options);
        for (id, result) in report.results {
            let result = result.unwrap_or_else(|err| panic!("{id} failed: {err}"));
            results.push((id, result));
        }
    }
    results
}

#[test]
fn test_full_store_workflow() {
    let workspace = setup_mock_store_workspace();

    let results = run_workflow(&workspace);
    for (id, result) in &results {
        assert!(
            matches!(result, PatchResult::Applied { .. }),
            "{id} should apply: {result:?}"
        );
    }

    assert_eq!(
        fs::read_to_string(workspace.path().join(presets::DOCKER_ENV)).unwrap(),
        fixture("docker_env.expected")
    );
    assert_eq!(
        fs::read_to_string(workspace.path().join(presets::DOCKERFILE)).unwrap(),
        fixture("Dockerfile.expected")
    );

    let compose = fs::read_to_string(workspace.path().join(presets::COMPOSE_FILE)).unwrap();
    assert!(compose.contains("image: alexcheng/magento:1.9.3.8"));
    assert!(compose.contains("image: mysql:5.6.23"));
    assert!(compose.contains("docker_env"));
}

#[test]
fn test_full_store_workflow_idempotent() {
    let workspace = setup_mock_store_workspace();
    run_workflow(&workspace);

    let snapshot: Vec<String> = [presets::DOCKER_ENV, presets::DOCKERFILE, presets::COMPOSE_FILE]
        .iter()
        .map(|file| fs::read_to_string(workspace.path().join(file)).unwrap())
        .collect();

    let results = run_workflow(&workspace);
    for (id, result) in &results {
        assert!(
            matches!(result, PatchResult::AlreadyApplied { .. }),
            "{id} should be a no-op: {result:?}"
        );
    }

    let after: Vec<String> = [presets::DOCKER_ENV, presets::DOCKERFILE, presets::COMPOSE_FILE]
        .iter()
        .map(|file| fs::read_to_string(workspace.path().join(file)).unwrap())
        .collect();
    assert_eq!(after, snapshot);
}

#[test]
fn test_crlf_env_file_keeps_line_endings() {
    let workspace = setup_mock_store_workspace();
    let crlf = fixture("docker_env.input").replace('\n', "\r\n");
    fs::write(workspace.path().join(presets::DOCKER_ENV), &crlf).unwrap();

    let options = ApplyOptions {
        argument: Some("4f2a9c.ngrok.io".to_string()),
        strict: true,
    };
    let report = apply_patches(
        &presets::set_hostname(presets::DOCKER_ENV),
        workspace.path(),
        &options,
    );
    assert_eq!(report.failed(), 0);

    let output = fs::read_to_string(workspace.path().join(presets::DOCKER_ENV)).unwrap();
    assert_eq!(output, fixture("docker_env.expected").replace('\n', "\r\n"));
}

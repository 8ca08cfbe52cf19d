//! End-to-end tests for the `resolve` command.

#[allow(dead_code)]
mod common;
use common::prelude::*;

#[test]
fn test_resolve_summary() {
    let fixture = TestFixture::new().with_workspace("Blueprint", &fixtures::parameter_all());

    fixture
        .command()
        .args(["resolve", "--env", "dev"])
        .arg(fixture.root())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[OK] Blueprint: 1 substitution(s) in 1 file(s), 0 unmapped",
        ));
}

#[test]
fn test_resolve_writes_output_tree() {
    let fixture = TestFixture::new().with_workspace("Blueprint", &fixtures::parameter_all());
    let output = fixture.path().join("resolved");

    fixture
        .command()
        .args(["resolve", "--env", "prod", "--output"])
        .arg(&output)
        .arg(fixture.root())
        .assert()
        .success();

    let content =
        std::fs::read_to_string(output.join("Blueprint").join(fixtures::NOTEBOOK_PATH)).unwrap();
    assert_eq!(
        content,
        format!("# Fabric notebook source\nlakehouse_id = \"{}\"\n", fixtures::PROD_ID)
    );
}

#[test]
fn test_resolve_reports_unmapped_without_failing() {
    let fixture = TestFixture::new().with_workspace("Blueprint", &fixtures::parameter_dev_test());

    fixture
        .command()
        .args(["resolve", "--env", "prod"])
        .arg(fixture.root())
        .assert()
        .success()
        .stdout(predicate::str::contains("[WARN] Blueprint: 0 substitution(s)"))
        .stdout(predicate::str::contains("1 unmapped"))
        .stdout(predicate::str::contains("has no prod value (rule #1)"));
}

#[test]
fn test_resolve_selected_workspace() {
    let fixture = TestFixture::new()
        .with_workspace("Alpha", &fixtures::parameter_all())
        .with_workspace("Beta", &fixtures::parameter_all());

    fixture
        .command()
        .args(["resolve", "--env", "test", "--workspace", "Beta"])
        .arg(fixture.root())
        .assert()
        .success()
        .stdout(predicate::str::contains("Beta:"))
        .stdout(predicate::str::contains("Alpha:").not());

    fixture
        .command()
        .args(["resolve", "--env", "test", "--workspace", "Gamma"])
        .arg(fixture.root())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Workspace 'Gamma' not found"));
}

#[test]
fn test_resolve_json_lists_substitutions() {
    let fixture = TestFixture::new().with_workspace("Blueprint", &fixtures::parameter_all());

    let output = fixture
        .command()
        .args(["resolve", "--env", "test", "--format", "json"])
        .arg(fixture.root())
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let event = &json[0]["substitutions"][0];
    assert_eq!(event["original"], fixtures::SOURCE_ID);
    assert_eq!(event["replacement"], fixtures::TEST_ID);
    assert_eq!(event["rule"], 0);
}

#[test]
fn test_resolve_rejects_unknown_environment() {
    let fixture = TestFixture::new().with_workspace("Blueprint", &fixtures::parameter_all());

    fixture
        .command()
        .args(["resolve", "--env", "staging"])
        .arg(fixture.root())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown environment 'staging'"));
}

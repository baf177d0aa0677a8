//! Prepare and preserve-fields integration tests

mod common;

use common::TestContent;
use predicates::prelude::*;

const INTEGRATION: &str = "Packs/HelloWorld/Integrations/HelloWorld/HelloWorld.yml";

fn yaml(text: &str) -> serde_yaml::Value {
    serde_yaml::from_str(text).unwrap()
}

#[test]
fn test_prepare_unifies_integration() {
    let content = TestContent::new();
    content.create_hello_world();

    content
        .cmd()
        .args(["prepare", INTEGRATION, "-o", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("integration-HelloWorld.yml"));

    let unified = yaml(&content.read_file("out/integration-HelloWorld.yml"));
    let code = unified["script"]["script"].as_str().unwrap();
    assert!(code.starts_with("register_module_line('HelloWorld', 'start', __line__())\n"));
    assert!(code.contains("### pack version: 1.2.0\n"));
    assert!(code.contains("def main():\n    return 'hello'\nmain()\n"));
    assert!(code.trim_end().ends_with("register_module_line('HelloWorld', 'end', __line__())"));
    assert!(
        unified["image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );
    assert_eq!(unified["detaileddescription"].as_str(), Some("Use an API key.\n"));
}

#[test]
fn test_prepare_writes_beside_item_by_default() {
    let content = TestContent::new();
    content.create_hello_world();

    content
        .cmd()
        .args(["prepare", "Packs/HelloWorld/Scripts/SayHello/SayHello.yml"])
        .assert()
        .success();
    assert!(content.file_exists("Packs/HelloWorld/Scripts/SayHello/script-SayHello.yml"));
}

#[test]
fn test_prepare_custom_label() {
    let content = TestContent::new();
    content.create_hello_world();

    content
        .cmd()
        .args(["prepare", INTEGRATION, "-o", "out", "--custom", "Beta"])
        .assert()
        .success();

    let unified = yaml(&content.read_file("out/integration-HelloWorld.yml"));
    assert_eq!(unified["name"].as_str(), Some("HelloWorld - Beta"));
    assert_eq!(unified["display"].as_str(), Some("Hello World - Beta"));
    assert_eq!(unified["commonfields"]["id"].as_str(), Some("HelloWorld - Beta"));
}

#[test]
fn test_prepare_suffix_override() {
    let content = TestContent::new();
    content.create_hello_world();
    content.write_file(
        "Packs/HelloWorld/Playbooks/playbook-Suffixed.yml",
        "id: A\nid:marketplacev2: B\nid:xsoar: C\nname: Suffixed\ntasks: {}\n",
    );

    content
        .cmd()
        .args([
            "prepare",
            "Packs/HelloWorld/Playbooks/playbook-Suffixed.yml",
            "-o",
            "v2",
            "-m",
            "marketplacev2",
        ])
        .assert()
        .success();
    let v2 = yaml(&content.read_file("v2/Suffixed.yml"));
    assert_eq!(v2["id"].as_str(), Some("B"));
    assert!(v2.get("id:marketplacev2").is_none());
    assert!(v2.get("id:xsoar").is_none());

    content
        .cmd()
        .args([
            "prepare",
            "Packs/HelloWorld/Playbooks/playbook-Suffixed.yml",
            "-o",
            "saas",
            "-m",
            "xsoar_saas",
        ])
        .assert()
        .success();
    let saas = yaml(&content.read_file("saas/Suffixed.yml"));
    assert_eq!(saas["id"].as_str(), Some("C"));
}

#[test]
fn test_prepare_missing_item() {
    let content = TestContent::new();
    content
        .cmd()
        .args(["prepare", "Packs/HelloWorld/Scripts/Nope/Nope.yml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_prepare_missing_sidecar_fails() {
    let content = TestContent::new();
    content.create_hello_world();
    std::fs::remove_file(
        content
            .path
            .join("Packs/HelloWorld/Integrations/HelloWorld/HelloWorld.py"),
    )
    .unwrap();

    content
        .cmd()
        .args(["prepare", INTEGRATION, "-o", "out"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing"));
}

#[test]
fn test_preserve_fields() {
    let content = TestContent::new();
    content.write_file(
        "local.yml",
        "commonfields:\n  id: X\nname: X\nfromversion: 6.5.0\nscript:\n  dockerimage45: demisto/python:2.7\n",
    );
    content.write_file("downloaded.yml", "commonfields:\n  id: X\nname: X\nscript: {}\n");

    content
        .cmd()
        .args(["preserve-fields", "local.yml", "downloaded.yml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fromversion"))
        .stdout(predicate::str::contains("script.dockerimage45"));

    let merged = yaml(&content.read_file("downloaded.yml"));
    assert_eq!(merged["fromversion"].as_str(), Some("6.5.0"));
    assert_eq!(merged["script"]["dockerimage45"].as_str(), Some("demisto/python:2.7"));
}

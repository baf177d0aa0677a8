//! Zip-packs integration tests using the real packsmith binary

mod common;

use common::{TIMESTAMP, TestContent, zip_entries, zip_entry, zip_entry_text};
use predicates::prelude::*;

fn zip_packs(content: &TestContent, packs: &[&str], extra: &[&str]) -> assert_cmd::assert::Assert {
    content
        .cmd()
        .arg("zip-packs")
        .args(packs)
        .args(["-o", "out", "--timestamp", TIMESTAMP])
        .args(extra)
        .assert()
}

fn yaml(text: &str) -> serde_yaml::Value {
    serde_yaml::from_str(text).unwrap()
}

#[test]
fn test_single_pack_zip_layout_in_dependency_order() {
    let content = TestContent::new();
    content.create_hello_world();

    zip_packs(&content, &["HelloWorld"], &[])
        .success()
        .stdout(predicate::str::contains("HelloWorld.zip"));

    let bytes = content.read_bytes("out/HelloWorld.zip");
    assert_eq!(
        zip_entries(&bytes),
        vec![
            "metadata.json",
            "Integrations/integration-HelloWorld.yml",
            "Scripts/script-SayHello.yml",
            "Playbooks/Triage.yml",
            "README.md",
        ]
    );
    assert!(!content.file_exists("out/uploadable_packs.zip"));
}

#[test]
fn test_unified_integration_in_zip() {
    let content = TestContent::new();
    content.create_hello_world();
    zip_packs(&content, &["HelloWorld"], &[]).success();

    let bytes = content.read_bytes("out/HelloWorld.zip");
    let integration = yaml(&zip_entry_text(&bytes, "Integrations/integration-HelloWorld.yml"));
    let code = integration["script"]["script"].as_str().unwrap();
    assert!(code.starts_with("register_module_line('HelloWorld', 'start', __line__())\n"));
    assert!(code.contains("return 'hello'"));
    assert!(code.trim_end().ends_with("register_module_line('HelloWorld', 'end', __line__())"));
    assert!(
        integration["image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );
    assert_eq!(integration["detaileddescription"].as_str(), Some("Use an API key.\n"));
    // xsoar has no event collection
    assert_eq!(integration["script"]["isfetchevents"], serde_yaml::Value::Bool(false));
}

#[test]
fn test_marketplacev2_specialization() {
    let content = TestContent::new();
    content.create_hello_world();
    zip_packs(&content, &["HelloWorld"], &["-m", "marketplacev2"]).success();

    let bytes = content.read_bytes("out/HelloWorld.zip");
    let integration = yaml(&zip_entry_text(&bytes, "Integrations/integration-HelloWorld.yml"));
    assert_eq!(integration["script"]["isfetchevents"], serde_yaml::Value::Bool(true));
    assert_eq!(
        integration["description"].as_str(),
        Some("Creates an alert for each event.")
    );

    let playbook = yaml(&zip_entry_text(&bytes, "Playbooks/Triage.yml"));
    assert_eq!(
        playbook["tasks"]["0"]["task"]["description"].as_str(),
        Some("Create an alert for each alert")
    );
    assert_eq!(
        playbook["tasks"]["1"]["task"]["description"].as_str(),
        Some("Create an incident for each alert")
    );

    let readme = zip_entry_text(&bytes, "README.md");
    assert!(readme.contains("![x](api/marketplace/file?name=content/packs/HelloWorld/doc_files/foo.png)"));

    let metadata: serde_json::Value =
        serde_json::from_slice(&zip_entry(&bytes, "metadata.json")).unwrap();
    assert_eq!(metadata["author"], "Cortex XSIAM");
    assert_eq!(metadata["description"], "Creates an alert for each event");
    assert!(
        metadata["tags"]
            .as_array()
            .unwrap()
            .iter()
            .any(|t| t == "Collection")
    );
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    let content = TestContent::new();
    content.create_hello_world();
    content.create_script_pack("Alpha");

    zip_packs(&content, &["HelloWorld", "Alpha"], &[]).success();
    let first = content.read_bytes("out/uploadable_packs.zip");
    std::fs::remove_dir_all(content.path.join("out")).unwrap();

    zip_packs(&content, &["Alpha", "HelloWorld"], &["-j", "1"]).success();
    let second = content.read_bytes("out/uploadable_packs.zip");
    assert_eq!(first, second);
}

#[test]
fn test_uploadable_packs_with_manifest() {
    let content = TestContent::new();
    content.create_script_pack("Zeta");
    content.create_script_pack("Alpha");

    zip_packs(&content, &["Zeta", "Alpha"], &[])
        .success()
        .stdout(predicate::str::contains("uploadable_packs.zip"));

    let outer = content.read_bytes("out/uploadable_packs.zip");
    assert_eq!(
        zip_entries(&outer),
        vec!["Alpha.zip", "Zeta.zip", "packs_manifest.json"]
    );

    let manifest: serde_json::Value =
        serde_json::from_slice(&zip_entry(&outer, "packs_manifest.json")).unwrap();
    assert_eq!(manifest["marketplace"], "xsoar");
    assert_eq!(manifest["timestamp"], TIMESTAMP);
    assert_eq!(manifest["packs"][0]["id"], "Alpha");
    assert_eq!(manifest["packs"][0]["version"], "1.2.0");
    assert_eq!(manifest["packs"][1]["id"], "Zeta");

    let alpha = zip_entry(&outer, "Alpha.zip");
    let digest = format!("blake3:{}", blake3::hash(&alpha).to_hex());
    assert_eq!(manifest["packs"][0]["digest"], digest.as_str());
    assert!(zip_entries(&alpha).contains(&"Scripts/script-AlphaScript.yml".to_string()));
}

#[test]
fn test_failing_pack_is_isolated() {
    let content = TestContent::new();
    content.create_script_pack("Alpha");
    content.create_script_pack("Broken");
    std::fs::remove_file(content.path.join("Packs/Broken/pack_metadata.json")).unwrap();

    zip_packs(&content, &["Alpha"], &["--zip-all"]).success();
    let solo = zip_entry(&content.read_bytes("out/uploadable_packs.zip"), "Alpha.zip");
    std::fs::remove_dir_all(content.path.join("out")).unwrap();

    zip_packs(&content, &["Alpha", "Broken"], &[])
        .code(1)
        .stderr(predicate::str::contains("Broken"))
        .stderr(predicate::str::contains("packsmith::metadata::not_found"));

    let outer = content.read_bytes("out/uploadable_packs.zip");
    assert_eq!(zip_entries(&outer), vec!["Alpha.zip", "packs_manifest.json"]);
    assert_eq!(zip_entry(&outer, "Alpha.zip"), solo);
}

#[test]
fn test_broken_item_fails_run_but_pack_is_zipped() {
    let content = TestContent::new();
    content.create_script_pack("Alpha");
    content.write_file("Packs/Alpha/Scripts/Bad/Bad.yml", "commonfields: [unclosed\n");

    zip_packs(&content, &["Alpha"], &[])
        .code(1)
        .stderr(predicate::str::contains("packsmith::load::failed"));

    let bytes = content.read_bytes("out/Alpha.zip");
    assert!(zip_entries(&bytes).contains(&"Scripts/script-AlphaScript.yml".to_string()));
}

#[test]
fn test_warnings_fail_only_in_strict_mode() {
    let content = TestContent::new();
    content.create_script_pack("Alpha");
    content.write_file(
        "Packs/Alpha/Scripts/Other/Other.yml",
        "commonfields:\n  id: Other\n  version: -1\nname: Other\nscript: ''\ntype: python\n\
         subtype: python3\nmarketplaces:\n- xsoar\n- nowhere\n",
    );
    content.write_file("Packs/Alpha/Scripts/Other/Other.py", "print('other')\n");

    zip_packs(&content, &["Alpha"], &[])
        .success()
        .stderr(predicate::str::contains("nowhere"));
    zip_packs(&content, &["Alpha"], &["--strict"]).code(1);
}

#[test]
fn test_pack_ignore_downgrades_warning() {
    let content = TestContent::new();
    content.create_script_pack("Alpha");
    content.write_file(
        "Packs/Alpha/Scripts/Other/Other.yml",
        "commonfields:\n  id: Other\n  version: -1\nname: Other\nscript: ''\ntype: python\n\
         subtype: python3\nmarketplaces:\n- xsoar\n- nowhere\n",
    );
    content.write_file("Packs/Alpha/Scripts/Other/Other.py", "print('other')\n");
    content.write_file(
        "Packs/Alpha/.pack-ignore",
        "[file:Other.yml]\nignore=packsmith::specialize::unknown_marketplace\n",
    );

    zip_packs(&content, &["Alpha"], &["--strict"])
        .success()
        .stderr(predicate::str::contains("info"));
}

#[test]
fn test_config_file_ignored_packs_and_marketplace() {
    let content = TestContent::new();
    content.create_script_pack("Alpha");
    content.create_script_pack("Beta");
    content.write_file(
        "packsmith.yaml",
        "marketplace: xsoar_saas\nignored_packs:\n- Alpha\n",
    );

    zip_packs(&content, &["Alpha", "Beta"], &["--zip-all"]).success();
    let outer = content.read_bytes("out/uploadable_packs.zip");
    assert_eq!(zip_entries(&outer), vec!["Beta.zip", "packs_manifest.json"]);
    let manifest: serde_json::Value =
        serde_json::from_slice(&zip_entry(&outer, "packs_manifest.json")).unwrap();
    assert_eq!(manifest["marketplace"], "xsoar_saas");
}

#[test]
fn test_api_modules_pack_is_never_zipped() {
    let content = TestContent::new();
    content.create_script_pack("ApiModules");
    content.create_script_pack("Alpha");

    zip_packs(&content, &["ApiModules", "Alpha"], &[]).success();
    assert!(content.file_exists("out/Alpha.zip"));
    assert!(!content.file_exists("out/ApiModules.zip"));
}

#[test]
fn test_unknown_marketplace_is_invocation_error() {
    let content = TestContent::new();
    content.create_script_pack("Alpha");
    zip_packs(&content, &["Alpha"], &["-m", "nowhere"])
        .code(2)
        .stderr(predicate::str::contains("Unknown marketplace"));
}

#[test]
fn test_missing_pack_is_invocation_error() {
    let content = TestContent::new();
    zip_packs(&content, &["Missing"], &[])
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_invalid_config_is_invocation_error() {
    let content = TestContent::new();
    content.create_script_pack("Alpha");
    content.write_file("packsmith.yaml", "workerz: 3\n");
    zip_packs(&content, &["Alpha"], &[]).code(2);
}

#[test]
fn test_marketplace_from_environment() {
    let content = TestContent::new();
    content.create_hello_world();
    content
        .cmd()
        .env("PACKSMITH_MARKETPLACE", "marketplacev2")
        .args(["zip-packs", "HelloWorld", "-o", "out", "--timestamp", TIMESTAMP])
        .assert()
        .success();

    let bytes = content.read_bytes("out/HelloWorld.zip");
    let integration = yaml(&zip_entry_text(&bytes, "Integrations/integration-HelloWorld.yml"));
    assert_eq!(integration["script"]["isfetchevents"], serde_yaml::Value::Bool(true));
}

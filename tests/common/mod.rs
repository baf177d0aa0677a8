//! Common test utilities for Packsmith integration tests

#![allow(dead_code)]

use std::io::{Cursor, Read};
use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

pub const XSOAR_METADATA: &str = r#"{
    "name": "Hello World",
    "description": "Creates an incident for each event",
    "support": "xsoar",
    "currentVersion": "1.2.0",
    "author": "Cortex XSOAR",
    "url": "https://www.paloaltonetworks.com/cortex",
    "email": "",
    "categories": ["Utilities"],
    "tags": [],
    "useCases": [],
    "keywords": ["incident"],
    "created": "2020-01-01T00:00:00Z",
    "updated": "2024-01-01T00:00:00Z",
    "dependencies": {}
}"#;

/// Fixed manifest timestamp for reproducible runs
pub const TIMESTAMP: &str = "2024-02-01T00:00:00Z";

/// A throw-away content repository
pub struct TestContent {
    pub temp: TempDir,
    pub path: PathBuf,
}

impl TestContent {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a file relative to the content root
    pub fn write_file(&self, path: &str, content: impl AsRef<[u8]>) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    pub fn read_bytes(&self, path: &str) -> Vec<u8> {
        std::fs::read(self.path.join(path)).expect("Failed to read file")
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Create `Packs/<name>/pack_metadata.json`
    pub fn create_pack(&self, name: &str, metadata: &str) {
        self.write_file(&format!("Packs/{name}/pack_metadata.json"), metadata);
    }

    /// Pack with an integration, a script, a playbook and a README image
    pub fn create_hello_world(&self) {
        let pack = "Packs/HelloWorld";
        self.create_pack("HelloWorld", XSOAR_METADATA);
        self.write_file(
            &format!("{pack}/Integrations/HelloWorld/HelloWorld.yml"),
            "commonfields:\n  id: HelloWorld\n  version: -1\nname: HelloWorld\ndisplay: Hello World\n\
             category: Utilities\ndescription: Creates an incident for each event.\nconfiguration: []\n\
             script:\n  script: ''\n  type: python\n  subtype: python3\n  isfetchevents: true\n\
             fromversion: 6.0.0\n",
        );
        self.write_file(
            &format!("{pack}/Integrations/HelloWorld/HelloWorld.py"),
            "def main():\n    return 'hello'\nmain()\n",
        );
        self.write_file(
            &format!("{pack}/Integrations/HelloWorld/HelloWorld_image.png"),
            vec![0x89u8; 2048],
        );
        self.write_file(
            &format!("{pack}/Integrations/HelloWorld/HelloWorld_description.md"),
            "Use an API key.\n",
        );
        self.write_file(
            &format!("{pack}/Scripts/SayHello/SayHello.yml"),
            "commonfields:\n  id: SayHello\n  version: -1\nname: SayHello\nscript: ''\ntype: python\n\
             subtype: python3\ncomment: Says hello\n",
        );
        self.write_file(
            &format!("{pack}/Scripts/SayHello/SayHello.py"),
            "print('hello')\n",
        );
        self.write_file(
            &format!("{pack}/Playbooks/playbook-Triage.yml"),
            "id: Triage\nname: Triage\ntasks:\n  '0':\n    task:\n      name: Start\n      \
             description: Create an incident for each alert\n  '1':\n    task:\n      name: Escape\n      \
             description: Create an <-incident-> for each alert\n",
        );
        self.write_file(
            &format!("{pack}/README.md"),
            "# Hello World\n![x](https://host/foo.png)\n",
        );
    }

    /// Minimal pack holding only a script
    pub fn create_script_pack(&self, name: &str) {
        self.create_pack(name, &XSOAR_METADATA.replace("Hello World", name));
        self.write_file(
            &format!("Packs/{name}/Scripts/{name}Script/{name}Script.yml"),
            &format!(
                "commonfields:\n  id: {name}Script\n  version: -1\nname: {name}Script\nscript: ''\n\
                 type: python\nsubtype: python3\n"
            ),
        );
        self.write_file(
            &format!("Packs/{name}/Scripts/{name}Script/{name}Script.py"),
            "print('ok')\n",
        );
    }

    /// `packsmith` rooted at this content repository
    pub fn cmd(&self) -> Command {
        let mut cmd = packsmith_cmd();
        cmd.current_dir(&self.path).arg("--content-root").arg(&self.path);
        cmd
    }
}

impl Default for TestContent {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(deprecated)]
pub fn packsmith_cmd() -> Command {
    let mut cmd = Command::cargo_bin("packsmith").expect("packsmith binary");
    cmd.env_remove("PACKSMITH_MARKETPLACE")
        .env_remove("PACKSMITH_WORKERS")
        .env_remove("PACKSMITH_CONTENT_ROOT")
        .env_remove("SOURCE_DATE_EPOCH")
        .env_remove("PACKSMITH_LOG");
    cmd
}

/// Entry names of a zip, in archive order
pub fn zip_entries(bytes: &[u8]) -> Vec<String> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    (0..zip.len())
        .map(|i| zip.by_index(i).expect("zip entry").name().to_string())
        .collect()
}

/// Raw contents of one zip entry
pub fn zip_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    let mut entry = zip.by_name(name).expect("zip entry");
    let mut out = Vec::new();
    entry.read_to_end(&mut out).expect("read zip entry");
    out
}

pub fn zip_entry_text(bytes: &[u8], name: &str) -> String {
    String::from_utf8(zip_entry(bytes, name)).expect("utf-8 entry")
}

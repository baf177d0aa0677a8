//! Sidecar discovery by file-name convention

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::{ContentKind, SidecarKind};
use crate::error::{PackError, Result, fs};

/// Which sidecar, if any, `name` is for an item with file stem `stem`
fn match_sidecar(
    name: &str,
    is_dir: bool,
    stem: &str,
    kind: ContentKind,
    in_item_dir: bool,
) -> Option<SidecarKind> {
    if is_dir {
        return (kind.is_rule_family() && in_item_dir && name == "samples")
            .then_some(SidecarKind::SampleData);
    }
    let rest = name.strip_prefix(stem);

    if kind.carries_code() {
        if matches!(rest, Some(".py" | ".js" | ".ps1")) {
            return Some(SidecarKind::Code);
        }
        if rest == Some("_test.py")
            || (in_item_dir && name.starts_with("test_") && name.ends_with(".py"))
        {
            return Some(SidecarKind::UnitTest);
        }
    }
    if kind.is_rule_family() {
        match rest {
            Some(".xif") => return Some(SidecarKind::RuleSource),
            Some("_schema.json") => return Some(SidecarKind::Schema),
            Some("_testdata.json") => return Some(SidecarKind::SampleData),
            _ => {}
        }
    }
    match rest {
        Some("_image.png") => return Some(SidecarKind::Image),
        Some("_description.md") => return Some(SidecarKind::Description),
        Some("_README.md") => return Some(SidecarKind::Readme),
        Some("_CHANGELOG.md") => return Some(SidecarKind::Changelog),
        _ => {}
    }
    match name {
        "README.md" if in_item_dir => Some(SidecarKind::Readme),
        "CHANGELOG.md" if in_item_dir => Some(SidecarKind::Changelog),
        _ => None,
    }
}

/// Find the sidecars of the item whose primary file is `primary`.
///
/// `in_item_dir` is true when the item owns its folder; depth-one items
/// share the section folder and only match `<stem>_*` names.
pub fn discover(
    primary: &Path,
    kind: ContentKind,
    in_item_dir: bool,
) -> Result<BTreeMap<SidecarKind, PathBuf>> {
    let mut found = BTreeMap::new();
    let Some(dir) = primary.parent() else {
        return Ok(found);
    };
    let stem = primary
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let item_name = stem.clone();

    let mut entries: Vec<(String, bool, PathBuf)> = std::fs::read_dir(dir)
        .map_err(|e| fs::read_failed(dir, &e))?
        .filter_map(std::result::Result::ok)
        .map(|entry| {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            (name, path.is_dir(), path)
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, is_dir, path) in entries {
        if path == primary {
            continue;
        }
        let Some(sidecar) = match_sidecar(&name, is_dir, &stem, kind, in_item_dir) else {
            continue;
        };
        if let Some(first) = found.get(&sidecar) {
            return Err(PackError::DuplicateSidecar {
                item: item_name,
                sidecar: sidecar.to_string(),
                first: file_name(first),
                second: name,
            });
        }
        found.insert(sidecar, path);
    }
    Ok(found)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

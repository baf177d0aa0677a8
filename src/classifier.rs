//! Path classification.
//!
//! Maps a path of the form `Packs/<pack_id>/<section>/[<item_dir>/]<file>`
//! onto a [`ContentKind`], enforcing the depth rules of the pack layout.
//! Contents may then refine the kind through [`refine`].

use std::path::{Component, Path, PathBuf};

use serde_yaml::Value;

use crate::document::Document;
use crate::domain::{ContentKind, Section};
use crate::error::PathError;

/// Files accepted directly under a pack root
pub const DEPTH_ZERO_FILES: [&str; 8] = [
    "pack_metadata.json",
    "README.md",
    "CHANGELOG.md",
    ".pack-ignore",
    ".secrets-ignore",
    "Author_image.png",
    "pack_metadata.md",
    "version_config.json",
];

const UNIFIED_PREFIXES: [&str; 3] = ["script-", "playbook-", "integration-"];

/// Where a file sits and what it is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub pack_id: String,
    pub kind: ContentKind,
    pub section: Option<Section>,
    /// Path relative to the pack root
    pub relative: PathBuf,
    /// Number of folders between the pack root and the file
    pub depth: usize,
}

impl Classification {
    /// Whether this file is the primary file of a content item
    pub fn is_item(&self) -> bool {
        self.kind.is_item() && has_document_extension(&self.relative)
    }
}

fn has_document_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml" | "yaml" | "json")
    )
}

/// Classify a path, consulting the file system only to tell folders from files
pub fn classify(path: &Path) -> Result<Classification, PathError> {
    classify_entry(path, path.is_dir())
}

/// Classify a path whose folder-ness is already known
pub fn classify_entry(path: &Path, is_dir: bool) -> Result<Classification, PathError> {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.iter().any(|p| p == "DeprecatedContent") {
        return Err(PathError::PathUnderDeprecatedContent);
    }
    let packs_at = parts
        .iter()
        .rposition(|p| p == "Packs")
        .ok_or(PathError::PathOutsidePacks)?;
    let pack_id = parts
        .get(packs_at + 1)
        .cloned()
        .ok_or(PathError::PathOutsidePacks)?;
    let rest = &parts[packs_at + 2..];

    let Some((file_name, folders)) = rest.split_last() else {
        return Err(PathError::PathIsFolder);
    };
    let relative: PathBuf = rest.iter().collect();
    let depth = folders.len();

    if depth == 0 {
        if is_dir {
            return match Section::from_dir_name(file_name) {
                Some(_) => Err(PathError::PathIsFolder),
                None => Err(PathError::DepthOneFolderError {
                    folder: file_name.clone(),
                }),
            };
        }
        let kind = depth_zero_kind(file_name).ok_or_else(|| PathError::InvalidDepthZeroFile {
            name: file_name.clone(),
        })?;
        return Ok(Classification {
            pack_id,
            kind,
            section: None,
            relative,
            depth,
        });
    }

    let section_name = &folders[0];
    let section =
        Section::from_dir_name(section_name).ok_or_else(|| PathError::DepthOneFolderError {
            folder: section_name.clone(),
        })?;
    if is_dir {
        return Err(PathError::PathIsFolder);
    }

    let kind = if depth == 1 {
        if !section.allows_depth_one_files() {
            return Err(PathError::DepthOneFileError {
                folder: section_name.clone(),
                name: file_name.clone(),
            });
        }
        depth_one_kind(section, file_name)
    } else {
        if section.holds_code()
            && depth == 2
            && has_document_extension(Path::new(file_name))
            && UNIFIED_PREFIXES.iter().any(|p| file_name.starts_with(p))
        {
            return Err(PathError::PathIsUnified {
                name: file_name.clone(),
            });
        }
        nested_kind(section, &folders[1..], file_name)
    };

    let kind = kind.ok_or_else(|| PathError::UnrecognizedContentKind {
        folder: folders.join("/"),
        name: file_name.clone(),
    })?;

    Ok(Classification {
        pack_id,
        kind,
        section: Some(section),
        relative,
        depth,
    })
}

fn depth_zero_kind(name: &str) -> Option<ContentKind> {
    Some(match name {
        "pack_metadata.json" => ContentKind::PackMetadata,
        "README.md" => ContentKind::Readme,
        "CHANGELOG.md" => ContentKind::Changelog,
        ".pack-ignore" => ContentKind::PackIgnore,
        ".secrets-ignore" => ContentKind::SecretsIgnore,
        "Author_image.png" => ContentKind::Image,
        "pack_metadata.md" | "version_config.json" => ContentKind::Other,
        _ => return None,
    })
}

fn extension(name: &str) -> &str {
    name.rsplit_once('.').map_or("", |(_, ext)| ext)
}

fn is_image(name: &str) -> bool {
    matches!(
        extension(name).to_ascii_lowercase().as_str(),
        "png" | "jpg" | "jpeg" | "gif" | "svg"
    )
}

/// Sidecar-style files recognized in any item folder
fn sidecar_kind(name: &str) -> Option<ContentKind> {
    if name == "README.md" || name.ends_with("_README.md") {
        Some(ContentKind::Readme)
    } else if name == "CHANGELOG.md" || name.ends_with("_CHANGELOG.md") {
        Some(ContentKind::Changelog)
    } else if name.ends_with("_description.md") {
        Some(ContentKind::Description)
    } else if is_image(name) {
        Some(ContentKind::Image)
    } else {
        None
    }
}

fn depth_one_kind(section: Section, name: &str) -> Option<ContentKind> {
    match section {
        Section::DocFiles => Some(if is_image(name) {
            ContentKind::Image
        } else {
            ContentKind::Other
        }),
        Section::ReleaseNotes => match extension(name) {
            "md" | "json" => Some(ContentKind::ReleaseNote),
            _ => None,
        },
        _ if has_document_extension(Path::new(name)) => Some(section.candidate_kind()),
        _ => sidecar_kind(name),
    }
}

fn nested_kind(section: Section, inner: &[String], name: &str) -> Option<ContentKind> {
    if section == Section::DocFiles {
        return depth_one_kind(section, name);
    }
    // deeper than the item folder: fixtures, samples and the like
    if inner.len() > 1 {
        return Some(if inner.iter().any(|f| f == "samples") && extension(name) == "json" {
            ContentKind::SampleData
        } else {
            ContentKind::Other
        });
    }

    if let Some(kind) = sidecar_kind(name) {
        return Some(kind);
    }
    let ext = extension(name);
    if name.ends_with("_test.py") || (name.starts_with("test_") && ext == "py") {
        return Some(ContentKind::UnitTest);
    }
    match ext {
        "py" | "js" | "ps1" | "xif" => Some(ContentKind::Code),
        "yml" | "yaml" => Some(section.candidate_kind()),
        "json" if name.ends_with("_schema.json") => Some(ContentKind::Schema),
        "json" if name.ends_with("_testdata.json") => Some(ContentKind::SampleData),
        "json" if section.holds_code() || section.candidate_kind().is_rule_family() => {
            Some(ContentKind::Other)
        }
        "json" => Some(section.candidate_kind()),
        "txt" | "log" | "toml" | "lock" | "in" | "cfg" | "ini" => Some(ContentKind::Other),
        _ if name == "Pipfile" || name == "command_examples" || name.starts_with('.') => {
            Some(ContentKind::Other)
        }
        _ => None,
    }
}

/// Refine a section-derived kind using the document contents
pub fn refine(kind: ContentKind, body: &Document) -> ContentKind {
    match kind {
        ContentKind::Classifier => match body.get_str("type") {
            Some("mapping-incoming" | "mapping-outgoing") => ContentKind::Mapper,
            _ => ContentKind::Classifier,
        },
        ContentKind::Layout => {
            if body.contains("group") && !body.contains("layout") {
                ContentKind::LayoutContainer
            } else {
                ContentKind::Layout
            }
        }
        ContentKind::IncidentField | ContentKind::IndicatorField => {
            match body.get_str("id") {
                Some(id) if id.starts_with("indicator_") => ContentKind::IndicatorField,
                Some(id) if id.starts_with("incident_") => ContentKind::IncidentField,
                _ => kind,
            }
        }
        ContentKind::TestPlaybook => {
            if !body.contains("tasks") && matches!(body.get("script"), Some(Value::String(_))) {
                ContentKind::Script
            } else {
                ContentKind::TestPlaybook
            }
        }
        ContentKind::ModelingRule | ContentKind::ParsingRule | ContentKind::CorrelationRule => {
            match body.get_str("type") {
                Some("modeling_rule") => ContentKind::ModelingRule,
                Some("parsing_rule") => ContentKind::ParsingRule,
                Some("correlation_rule") => ContentKind::CorrelationRule,
                _ => kind,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str) -> Result<Classification, PathError> {
        classify_entry(Path::new(path), false)
    }

    #[test]
    fn test_integration_yaml() {
        let c = file("Packs/HelloWorld/Integrations/HelloWorld/HelloWorld.yml").unwrap();
        assert_eq!(c.pack_id, "HelloWorld");
        assert_eq!(c.kind, ContentKind::Integration);
        assert_eq!(c.section, Some(Section::Integrations));
        assert_eq!(c.depth, 2);
        assert!(c.is_item());
    }

    #[test]
    fn test_sidecars_in_item_dir() {
        let kind = |p: &str| file(p).unwrap().kind;
        let dir = "Packs/HelloWorld/Integrations/HelloWorld";
        assert_eq!(kind(&format!("{dir}/HelloWorld.py")), ContentKind::Code);
        assert_eq!(kind(&format!("{dir}/HelloWorld_test.py")), ContentKind::UnitTest);
        assert_eq!(kind(&format!("{dir}/HelloWorld_image.png")), ContentKind::Image);
        assert_eq!(
            kind(&format!("{dir}/HelloWorld_description.md")),
            ContentKind::Description
        );
        assert_eq!(kind(&format!("{dir}/README.md")), ContentKind::Readme);
        assert_eq!(kind(&format!("{dir}/test_data/x.json")), ContentKind::Other);
    }

    #[test]
    fn test_depth_zero_files() {
        for name in DEPTH_ZERO_FILES {
            assert!(file(&format!("Packs/A/{name}")).is_ok(), "{name}");
        }
        assert_eq!(
            file("Packs/A/pack_metadata.json").unwrap().kind,
            ContentKind::PackMetadata
        );
        assert_eq!(file("Packs/A/.pack-ignore").unwrap().kind, ContentKind::PackIgnore);
        assert_eq!(
            file("Packs/A/notes.txt").unwrap_err(),
            PathError::InvalidDepthZeroFile {
                name: "notes.txt".into()
            }
        );
    }

    #[test]
    fn test_depth_one_folder_error() {
        assert_eq!(
            file("Packs/A/Stuff/x.yml").unwrap_err(),
            PathError::DepthOneFolderError {
                folder: "Stuff".into()
            }
        );
        assert_eq!(
            classify_entry(Path::new("Packs/A/Stuff"), true).unwrap_err(),
            PathError::DepthOneFolderError {
                folder: "Stuff".into()
            }
        );
    }

    #[test]
    fn test_depth_one_file_rules() {
        assert_eq!(
            file("Packs/A/Playbooks/playbook-X.yml").unwrap().kind,
            ContentKind::Playbook
        );
        assert_eq!(
            file("Packs/A/Integrations/integration-X.yml").unwrap_err(),
            PathError::DepthOneFileError {
                folder: "Integrations".into(),
                name: "integration-X.yml".into()
            }
        );
    }

    #[test]
    fn test_unified_files_rejected() {
        assert_eq!(
            file("Packs/A/Scripts/X/script-X.yml").unwrap_err(),
            PathError::PathIsUnified {
                name: "script-X.yml".into()
            }
        );
        assert_eq!(
            file("Packs/A/Integrations/X/integration-X.yml").unwrap_err(),
            PathError::PathIsUnified {
                name: "integration-X.yml".into()
            }
        );
    }

    #[test]
    fn test_folders_and_outside_paths() {
        assert_eq!(
            classify_entry(Path::new("Packs/A/Integrations"), true).unwrap_err(),
            PathError::PathIsFolder
        );
        assert_eq!(
            classify_entry(Path::new("Packs/A"), true).unwrap_err(),
            PathError::PathIsFolder
        );
        assert_eq!(file("Other/A/x.yml").unwrap_err(), PathError::PathOutsidePacks);
        assert_eq!(
            file("Packs/DeprecatedContent/Scripts/x.yml").unwrap_err(),
            PathError::PathUnderDeprecatedContent
        );
    }

    #[test]
    fn test_unrecognized_kind() {
        assert_eq!(
            file("Packs/A/Playbooks/notes.exe").unwrap_err(),
            PathError::UnrecognizedContentKind {
                folder: "Playbooks".into(),
                name: "notes.exe".into()
            }
        );
    }

    #[test]
    fn test_rule_family_files() {
        let dir = "Packs/A/ModelingRules/Okta";
        assert_eq!(file(&format!("{dir}/Okta.yml")).unwrap().kind, ContentKind::ModelingRule);
        assert_eq!(file(&format!("{dir}/Okta.xif")).unwrap().kind, ContentKind::Code);
        assert_eq!(
            file(&format!("{dir}/Okta_schema.json")).unwrap().kind,
            ContentKind::Schema
        );
        assert_eq!(
            file(&format!("{dir}/Okta_testdata.json")).unwrap().kind,
            ContentKind::SampleData
        );
        assert_eq!(
            file(&format!("{dir}/samples/okta.json")).unwrap().kind,
            ContentKind::SampleData
        );
    }

    #[test]
    fn test_refine_classifier_and_mapper() {
        let mapper = Document::parse_json(r#"{"id": "m", "type": "mapping-incoming"}"#).unwrap();
        assert_eq!(refine(ContentKind::Classifier, &mapper), ContentKind::Mapper);
        let classifier = Document::parse_json(r#"{"id": "c", "type": "classification"}"#).unwrap();
        assert_eq!(refine(ContentKind::Classifier, &classifier), ContentKind::Classifier);
    }

    #[test]
    fn test_refine_layouts_and_fields() {
        let container = Document::parse_json(r#"{"id": "l", "group": "incident", "detailsV2": {}}"#).unwrap();
        assert_eq!(refine(ContentKind::Layout, &container), ContentKind::LayoutContainer);
        let field = Document::parse_json(r#"{"id": "indicator_score"}"#).unwrap();
        assert_eq!(refine(ContentKind::IncidentField, &field), ContentKind::IndicatorField);
    }

    #[test]
    fn test_absolute_paths() {
        let c = file("/repo/content/Packs/A/Layouts/layout-x.json").unwrap();
        assert_eq!(c.pack_id, "A");
        assert_eq!(c.relative, PathBuf::from("Layouts/layout-x.json"));
    }
}

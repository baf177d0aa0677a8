//! Packs: the unit of distribution

use std::path::PathBuf;

use super::item::{ContentItem, SupportLevel};
use super::marketplace::Marketplace;
use super::version::Version;
use crate::document::Document;
use crate::error::{PackError, Result};
use crate::loader::ignore::{PackIgnore, SecretsIgnore};
use crate::specializer::readme::ReadmeImage;

/// Keys every `pack_metadata.json` must carry
pub const REQUIRED_METADATA_KEYS: [&str; 14] = [
    "name",
    "description",
    "support",
    "currentVersion",
    "author",
    "url",
    "email",
    "categories",
    "tags",
    "useCases",
    "keywords",
    "created",
    "updated",
    "dependencies",
];

/// Parsed `pack_metadata.json`
#[derive(Debug, Clone, PartialEq)]
pub struct PackMetadata {
    /// Raw document, key order preserved
    pub document: Document,
    pub name: String,
    pub support: SupportLevel,
    pub current_version: Version,
    pub author: String,
    pub url: Option<String>,
    pub emails: Vec<String>,
    pub missing_keys: Vec<String>,
}

impl PackMetadata {
    /// Validate metadata for `pack_id`.
    ///
    /// An out-of-range version or unknown support level is fatal for the
    /// pack; other missing keys are reported through `missing_keys`.
    pub fn from_document(pack_id: &str, document: Document) -> Result<Self> {
        let invalid = |reason: String| PackError::InvalidMetadata {
            pack: pack_id.to_string(),
            reason,
        };

        let missing_keys: Vec<String> = REQUIRED_METADATA_KEYS
            .iter()
            .filter(|k| !document.contains(k))
            .map(|k| (*k).to_string())
            .collect();

        let version_text = document
            .get_str("currentVersion")
            .ok_or_else(|| invalid("currentVersion is missing".to_string()))?;
        let current_version = Version::parse_pack_version(version_text).ok_or_else(|| {
            invalid(format!(
                "currentVersion '{version_text}' must be X.Y.Z with each part below 100"
            ))
        })?;

        let support = match document.get_str("support") {
            Some(s) => s.parse::<SupportLevel>().map_err(invalid)?,
            None => SupportLevel::default(),
        };

        let name = document.get_str("name").unwrap_or(pack_id).to_string();
        let author = document.get_str("author").unwrap_or_default().to_string();
        let url = document
            .get_str("url")
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let emails = document
            .get_str("email")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            document,
            name,
            support,
            current_version,
            author,
            url,
            emails,
            missing_keys,
        })
    }
}

/// A pack as loaded from disk
#[derive(Debug, Clone, PartialEq)]
pub struct Pack {
    pub pack_id: String,
    pub root: PathBuf,
    pub metadata: PackMetadata,
    pub items: Vec<ContentItem>,
    pub readme: Option<String>,
    pub changelog: Option<String>,
    pub pack_ignore: Option<PackIgnore>,
    pub secrets_ignore: Option<SecretsIgnore>,
    pub author_image: Option<PathBuf>,
    /// Files under `doc_files/`, relative to that folder
    pub doc_files: Vec<PathBuf>,
}

/// A pack unified and specialized for one marketplace
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPack {
    pub pack_id: String,
    pub root: PathBuf,
    pub marketplace: Marketplace,
    pub version: Version,
    /// Final `metadata.json` contents
    pub metadata: Document,
    pub items: Vec<ContentItem>,
    pub readme: Option<String>,
    pub changelog: Option<String>,
    pub author_image: Option<PathBuf>,
    pub doc_files: Vec<PathBuf>,
    pub readme_images: Vec<ReadmeImage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(json: &str) -> Result<PackMetadata> {
        PackMetadata::from_document("HelloWorld", Document::parse_json(json).unwrap())
    }

    #[test]
    fn test_valid_metadata() {
        let meta = metadata(
            r#"{"name": "Hello World", "support": "partner", "currentVersion": "1.2.3",
                "author": "Acme", "email": "a@acme.io, b@acme.io", "url": "https://acme.io"}"#,
        )
        .unwrap();
        assert_eq!(meta.name, "Hello World");
        assert_eq!(meta.support, SupportLevel::Partner);
        assert_eq!(meta.current_version, Version::new(1, 2, 3));
        assert_eq!(meta.emails, vec!["a@acme.io", "b@acme.io"]);
        assert!(meta.missing_keys.contains(&"categories".to_string()));
        assert!(!meta.missing_keys.contains(&"name".to_string()));
    }

    #[test]
    fn test_version_out_of_range_is_fatal() {
        let err = metadata(r#"{"currentVersion": "1.100.0", "support": "xsoar"}"#).unwrap_err();
        assert!(matches!(err, PackError::InvalidMetadata { .. }));
        assert_eq!(err.severity(), crate::diagnostics::Severity::Fatal);
    }

    #[test]
    fn test_invalid_support_is_fatal() {
        let err = metadata(r#"{"currentVersion": "1.0.0", "support": "gold"}"#).unwrap_err();
        assert!(err.to_string().contains("gold"));
    }
}

//! Content loading.
//!
//! Turns a classified primary file into a [`ContentItem`]: parses it through
//! the shared [`ParseCache`], refines its kind from the contents, reads its
//! identity and discovers its sidecars. Pack-level files (metadata, README,
//! ignore files) are loaded here too.

pub mod cache;
pub mod ignore;
pub mod sidecars;

use std::path::Path;

use tracing::debug;

use crate::classifier::{self, Classification};
use crate::document::Document;
use crate::domain::item::read_identity;
use crate::domain::{ContentItem, PackMetadata, SidecarKind, SupportLevel};
use crate::error::{PackError, Result, fs};
use crate::zipper::naming;

pub use cache::ParseCache;
pub use ignore::{PackIgnore, SecretsIgnore};

/// Fields a server download must not overwrite in an existing local file
pub const PRESERVED_FIELDS: [&str; 10] = [
    "fromversion",
    "fromVersion",
    "toversion",
    "toVersion",
    "alt_dockerimages",
    "script.dockerimage45",
    "tests",
    "defaultclassifier",
    "defaultmapperin",
    "defaultmapperout",
];

/// An item plus what the loader noticed but did not fail on
#[derive(Debug, Clone)]
pub struct LoadedItem {
    pub item: ContentItem,
    /// `marketplaces` entries that name no known marketplace
    pub unknown_marketplaces: Vec<String>,
}

fn load_failed(path: &Path, reason: impl Into<String>) -> PackError {
    PackError::LoadFailed {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Whether a code-carrying body already has its code inlined
fn has_inline_code(body: &Document) -> bool {
    body.get_str("script.script")
        .or_else(|| body.get_str("script"))
        .is_some_and(|code| !code.trim().is_empty() && code.trim() != "-")
}

/// Load the item whose primary file is described by `classification`.
///
/// `pack_support` is the support level items inherit unless their body
/// sets `supportlevelheader`.
pub fn load_item(
    cache: &ParseCache,
    pack_root: &Path,
    classification: &Classification,
    pack_support: SupportLevel,
) -> Result<LoadedItem> {
    let path = pack_root.join(&classification.relative);
    let section = classification
        .section
        .ok_or_else(|| load_failed(&path, "item is not inside a pack section"))?;

    let body = cache.load(&path)?;
    let kind = classifier::refine(classification.kind, &body);
    let identity = read_identity(kind, &body).map_err(|reason| load_failed(&path, reason))?;

    let in_item_dir = classification.depth >= 2;
    let sidecars = sidecars::discover(&path, kind, in_item_dir)?;
    let readme = match sidecars.get(&SidecarKind::Readme) {
        Some(readme_path) => Some(fs::read_to_string(readme_path)?),
        None => None,
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let id = identity.id.unwrap_or_else(|| stem.clone());
    let display_name = identity.display_name.unwrap_or_else(|| id.clone());

    let support_level = body
        .get_str("supportlevelheader")
        .and_then(|s| s.parse().ok())
        .unwrap_or(pack_support);
    let is_unified = kind.carries_code()
        && !sidecars.contains_key(&SidecarKind::Code)
        && has_inline_code(&body);

    debug!(
        path = %classification.relative.display(),
        kind = %kind,
        id = %id,
        sidecars = sidecars.len(),
        "loaded item"
    );

    Ok(LoadedItem {
        item: ContentItem {
            kind,
            section,
            id,
            display_name,
            path: classification.relative.clone(),
            body: (*body).clone(),
            sidecars,
            from_version: identity.from_version,
            to_version: identity.to_version,
            marketplaces: identity.marketplaces,
            support_level,
            is_unified,
            specialized_for: None,
            output_name: naming::output_name(kind, &file_name),
            readme,
        },
        unknown_marketplaces: identity.unknown_marketplaces,
    })
}

/// Load and validate `pack_metadata.json`
pub fn load_metadata(cache: &ParseCache, pack_root: &Path, pack_id: &str) -> Result<PackMetadata> {
    let path = pack_root.join("pack_metadata.json");
    if !path.is_file() {
        return Err(PackError::MetadataNotFound {
            pack: pack_id.to_string(),
        });
    }
    let document = cache.load(&path)?;
    PackMetadata::from_document(pack_id, (*document).clone())
}

/// Read a text file if it exists
pub fn read_optional_text(path: &Path) -> Result<Option<String>> {
    if path.is_file() {
        fs::read_to_string(path).map(Some)
    } else {
        Ok(None)
    }
}

/// Parse `.pack-ignore` and `.secrets-ignore` at the pack root, when present
pub fn load_ignore_files(pack_root: &Path) -> Result<(Option<PackIgnore>, Option<SecretsIgnore>)> {
    let pack_ignore = read_optional_text(&pack_root.join(".pack-ignore"))?
        .map(|text| PackIgnore::parse(&text));
    let secrets_ignore = read_optional_text(&pack_root.join(".secrets-ignore"))?
        .map(|text| SecretsIgnore::parse(&text));
    Ok((pack_ignore, secrets_ignore))
}

/// Carry preserved fields from `local` into a freshly downloaded document.
///
/// Local values win. Returns the fields that were written.
pub fn merge_preserved_fields(local: &Document, downloaded: &mut Document) -> Vec<&'static str> {
    let mut written = Vec::new();
    for field in PRESERVED_FIELDS {
        let Some(value) = local.get(field) else {
            continue;
        };
        if downloaded.get(field) == Some(value) {
            continue;
        }
        downloaded.set(field, value.clone());
        if let Some(style) = local.style(field) {
            downloaded.set_style(field, style);
        }
        written.push(field);
    }
    written
}

//! Pack archives.
//!
//! Each prepared pack becomes `<pack_id>.zip` with a fixed inner layout;
//! several packs are then collected into `uploadable_packs.zip` beside a
//! `packs_manifest.json`. Entry order and timestamps are fixed so the same
//! input always yields the same bytes.

pub mod naming;

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::format_timestamp;
use crate::domain::{ContentItem, Marketplace, PreparedPack, Version};
use crate::error::{Result, fs};
use crate::hash::{hash_bytes, verify_hash};
use crate::specializer::readme::ReadmeImage;

/// Name of the zip-of-zips
pub const UPLOADABLE_PACKS_ZIP: &str = "uploadable_packs.zip";

/// Name of the manifest inside the zip-of-zips
pub const MANIFEST_NAME: &str = "packs_manifest.json";

const METADATA_NAME: &str = "metadata.json";

/// One pack zip written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackArchive {
    pub pack_id: String,
    pub version: Version,
    pub path: PathBuf,
    pub digest: String,
    pub readme_images: Vec<ReadmeImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub id: String,
    pub version: String,
    pub digest: String,
    pub readme_images: Vec<ReadmeImage>,
}

/// `packs_manifest.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PacksManifest {
    pub marketplace: String,
    pub timestamp: String,
    pub packs: Vec<ManifestEntry>,
}

impl PacksManifest {
    pub fn new(archives: &[PackArchive], marketplace: Marketplace, timestamp: &DateTime<Utc>) -> Self {
        Self {
            marketplace: marketplace.to_string(),
            timestamp: format_timestamp(timestamp),
            packs: archives
                .iter()
                .map(|a| ManifestEntry {
                    id: a.pack_id.clone(),
                    version: a.version.to_string(),
                    digest: a.digest.clone(),
                    readme_images: a.readme_images.clone(),
                })
                .collect(),
        }
    }
}

/// Fixed options so archives are reproducible
fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644)
}

/// In-memory zip writer that tags failures with the archive being built
struct Archive<'a> {
    target: &'a Path,
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl<'a> Archive<'a> {
    fn new(target: &'a Path) -> Self {
        Self {
            target,
            writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    fn add(&mut self, name: &str, contents: &[u8]) -> Result<()> {
        debug!(archive = %self.target.display(), entry = name, "adding entry");
        self.writer
            .start_file(name, entry_options())
            .map_err(|e| fs::packing_failed(self.target, e))?;
        self.writer
            .write_all(contents)
            .map_err(|e| fs::packing_failed(self.target, e))
    }

    fn finish(self) -> Result<Vec<u8>> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| fs::packing_failed(self.target, e))?;
        Ok(cursor.into_inner())
    }
}

fn item_readme_name(item: &ContentItem) -> String {
    let stem = item
        .output_name
        .rsplit_once('.')
        .map_or(item.output_name.as_str(), |(stem, _)| stem);
    format!("{stem}_README.md")
}

/// Items sorted into upload order, then by file name
fn zip_order(items: &[ContentItem]) -> Vec<&ContentItem> {
    let mut ordered: Vec<&ContentItem> = items.iter().collect();
    ordered.sort_by(|a, b| {
        (a.section.upload_rank(), &a.output_name).cmp(&(b.section.upload_rank(), &b.output_name))
    });
    ordered
}

/// Serialize one prepared pack into zip bytes.
///
/// Layout: `metadata.json`, the section folders in upload order, then the
/// pack README, CHANGELOG, author image and `doc_files/`.
pub fn pack_zip_bytes(pack: &PreparedPack) -> Result<Vec<u8>> {
    let target = PathBuf::from(naming::pack_zip_name(&pack.pack_id));
    let mut archive = Archive::new(&target);

    archive.add(METADATA_NAME, pack.metadata.to_json()?.as_bytes())?;
    for item in zip_order(&pack.items) {
        let dir = item.section.dir_name();
        let text = item.body.to_text()?;
        archive.add(&format!("{dir}/{}", item.output_name), text.as_bytes())?;
        if let Some(readme) = &item.readme {
            archive.add(&format!("{dir}/{}", item_readme_name(item)), readme.as_bytes())?;
        }
    }
    if let Some(readme) = &pack.readme {
        archive.add("README.md", readme.as_bytes())?;
    }
    if let Some(changelog) = &pack.changelog {
        archive.add("CHANGELOG.md", changelog.as_bytes())?;
    }
    if let Some(image) = &pack.author_image {
        archive.add("Author_image.png", &fs::read_bytes(image)?)?;
    }
    for doc in &pack.doc_files {
        let source = pack.root.join("doc_files").join(doc);
        let name = format!("doc_files/{}", doc.display()).replace('\\', "/");
        archive.add(&name, &fs::read_bytes(&source)?)?;
    }
    archive.finish()
}

/// Write `<dir>/<pack_id>.zip` and return its record
pub fn write_pack_zip(pack: &PreparedPack, dir: &Path) -> Result<PackArchive> {
    let bytes = pack_zip_bytes(pack)?;
    let path = dir.join(naming::pack_zip_name(&pack.pack_id));
    fs::write(&path, &bytes)?;
    info!(pack = %pack.pack_id, path = %path.display(), "wrote pack zip");
    Ok(PackArchive {
        pack_id: pack.pack_id.clone(),
        version: pack.version,
        path,
        digest: hash_bytes(&bytes),
        readme_images: pack.readme_images.clone(),
    })
}

/// Collect pack zips into `<out_dir>/uploadable_packs.zip`.
///
/// Packs are stored alphabetically by id, followed by the manifest.
pub fn write_uploadable(
    archives: &[PackArchive],
    out_dir: &Path,
    marketplace: Marketplace,
    timestamp: &DateTime<Utc>,
) -> Result<PathBuf> {
    let target = out_dir.join(UPLOADABLE_PACKS_ZIP);
    let mut sorted: Vec<PackArchive> = archives.to_vec();
    sorted.sort_by(|a, b| a.pack_id.cmp(&b.pack_id));

    let mut archive = Archive::new(&target);
    for pack in &sorted {
        let bytes = fs::read_bytes(&pack.path)?;
        if !verify_hash(&pack.digest, &hash_bytes(&bytes)) {
            return Err(fs::packing_failed(
                &pack.path,
                "pack zip changed on disk after it was written",
            ));
        }
        archive.add(&naming::pack_zip_name(&pack.pack_id), &bytes)?;
    }
    let manifest = PacksManifest::new(&sorted, marketplace, timestamp);
    let manifest_json = serde_json::to_string_pretty(&manifest)?;
    archive.add(MANIFEST_NAME, manifest_json.as_bytes())?;

    let bytes = archive.finish()?;
    fs::write(&target, bytes)?;
    info!(path = %target.display(), packs = sorted.len(), "wrote uploadable packs");
    Ok(target)
}

//! Pack assembly.
//!
//! Walks a pack directory into a [`Pack`], then unifies and specializes its
//! items in upload order into a [`PreparedPack`]. Item-level failures go to
//! the diagnostic sink and the pack carries on; fatal ones end the pack.

pub mod metadata;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::classifier::{self, Classification};
use crate::context::PipelineContext;
use crate::diagnostics::Severity;
use crate::domain::{ContentItem, Pack, PreparedPack};
use crate::error::{PackError, PathError, Result};
use crate::loader::{self, read_optional_text};
use crate::pool::PackJob;
use crate::unifier;

const DOC_FILES: &str = "doc_files";

fn relative_display(pack_root: &Path, path: &Path) -> String {
    path.strip_prefix(pack_root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Primary files of every item in the pack, in path order
fn item_files(ctx: &PipelineContext, pack_id: &str, pack_root: &Path) -> Vec<Classification> {
    let mut items = Vec::new();
    let mut walker = WalkDir::new(pack_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(|p| relative_display(pack_root, p))
                    .unwrap_or_default();
                let err = PackError::IoError {
                    message: err.to_string(),
                };
                ctx.diagnostics.record(Some(pack_id), Some(&path), &err);
                continue;
            }
        };
        let is_dir = entry.file_type().is_dir();
        if is_dir && entry.depth() > 1 {
            continue;
        }
        match classifier::classify_entry(entry.path(), is_dir) {
            Ok(classification) if classification.is_item() => items.push(classification),
            Ok(_) | Err(PathError::PathIsFolder) => {}
            Err(err) => {
                let relative = relative_display(pack_root, entry.path());
                ctx.diagnostics
                    .record(Some(pack_id), Some(&relative), &err.at(relative.clone()));
                if is_dir {
                    walker.skip_current_dir();
                }
            }
        }
    }
    items
}

fn doc_files(pack_root: &Path) -> Vec<PathBuf> {
    let dir = pack_root.join(DOC_FILES);
    let mut files: Vec<PathBuf> = WalkDir::new(&dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.path().strip_prefix(&dir).ok().map(Path::to_path_buf))
        .collect();
    files.sort();
    files
}

/// Load a pack directory.
///
/// Metadata problems are fatal; bad paths and items are recorded and skipped.
pub fn load_pack(ctx: &PipelineContext, pack_root: &Path) -> Result<Pack> {
    let job = PackJob::from_root(pack_root);
    let pack_id = job.pack_id.as_str();
    debug!(pack = %pack_id, "loading pack");

    let metadata = loader::load_metadata(&ctx.parse_cache, pack_root, pack_id)?;
    for key in &metadata.missing_keys {
        let err = PackError::MissingMetadataKey {
            pack: pack_id.to_string(),
            key: key.clone(),
        };
        ctx.diagnostics
            .record(Some(pack_id), Some("pack_metadata.json"), &err);
    }
    let (pack_ignore, secrets_ignore) = loader::load_ignore_files(pack_root)?;

    let mut items: Vec<ContentItem> = Vec::new();
    let mut seen = BTreeSet::new();
    for classification in item_files(ctx, pack_id, pack_root) {
        let relative = classification.relative.display().to_string();
        ctx.cancel.check()?;
        let loaded = match loader::load_item(
            &ctx.parse_cache,
            pack_root,
            &classification,
            metadata.support,
        ) {
            Ok(loaded) => loaded,
            Err(err) => {
                ctx.diagnostics.record(Some(pack_id), Some(&relative), &err);
                continue;
            }
        };
        for value in loaded.unknown_marketplaces {
            ctx.diagnostics.record(
                Some(pack_id),
                Some(&relative),
                &PackError::UnknownMarketplace { value },
            );
        }
        let item = loaded.item;
        if !seen.insert((item.kind, item.id.clone())) {
            let err = PackError::DuplicateId {
                pack: pack_id.to_string(),
                kind: item.kind.to_string(),
                id: item.id.clone(),
            };
            ctx.diagnostics.record(Some(pack_id), Some(&relative), &err);
            continue;
        }
        items.push(item);
    }

    let author_image = Some(pack_root.join("Author_image.png")).filter(|p| p.is_file());
    Ok(Pack {
        pack_id: pack_id.to_string(),
        root: pack_root.to_path_buf(),
        readme: read_optional_text(&pack_root.join("README.md"))?,
        changelog: read_optional_text(&pack_root.join("CHANGELOG.md"))?,
        metadata,
        items,
        pack_ignore,
        secrets_ignore,
        author_image,
        doc_files: doc_files(pack_root),
    })
}

/// Items in upload order, alphabetical by id within a section
pub fn upload_order(items: &[ContentItem]) -> Vec<&ContentItem> {
    let mut ordered: Vec<&ContentItem> = items.iter().collect();
    ordered.sort_by(|a, b| {
        (a.section.upload_rank(), &a.id, &a.path).cmp(&(b.section.upload_rank(), &b.id, &b.path))
    });
    ordered
}

/// Record a non-fatal error, or hand a fatal one back to end the pack
fn record_or_fail(ctx: &PipelineContext, pack_id: &str, path: &str, err: PackError) -> Result<()> {
    if err.severity() == Severity::Fatal {
        return Err(err);
    }
    ctx.diagnostics.record(Some(pack_id), Some(path), &err);
    Ok(())
}

/// Unify and specialize a loaded pack for the context's marketplace
pub fn prepare_pack(ctx: &PipelineContext, pack: &Pack) -> Result<PreparedPack> {
    let target = ctx.marketplace();
    let pack_id = pack.pack_id.as_str();
    let unify_ctx = ctx.unify_context(&pack.root, &pack.metadata);
    let mut specializer = ctx.specializer(pack_id);

    let mut prepared: Vec<ContentItem> = Vec::new();
    let mut output_names = BTreeSet::new();
    for item in upload_order(&pack.items) {
        ctx.cancel.check()?;
        let path = item.display_path();
        if !item.ships_to(target) {
            debug!(pack = %pack_id, item = %item.id, marketplace = %target, "not shipped to marketplace");
            continue;
        }
        let unified = match unifier::unify(&unify_ctx, item) {
            Ok(unified) => unified,
            Err(err) => {
                record_or_fail(ctx, pack_id, &path, err)?;
                continue;
            }
        };
        for warning in unified.warnings {
            record_or_fail(ctx, pack_id, &path, warning)?;
        }
        for unified_item in unified.items {
            let specialized = match specializer.specialize(&unified_item) {
                Ok(specialized) => specialized,
                Err(err) => {
                    record_or_fail(ctx, pack_id, &path, err)?;
                    continue;
                }
            };
            for warning in specialized.warnings {
                record_or_fail(ctx, pack_id, &path, warning)?;
            }
            for out in specialized.items {
                if !output_names.insert((out.section, out.output_name.clone())) {
                    let err = PackError::DuplicateId {
                        pack: pack_id.to_string(),
                        kind: out.kind.to_string(),
                        id: out.output_name.clone(),
                    };
                    record_or_fail(ctx, pack_id, &path, err)?;
                    continue;
                }
                prepared.push(out);
            }
        }
    }

    let built = metadata::build(&pack.metadata, &prepared, &specializer, &ctx.timestamp);
    for warning in built.warnings {
        record_or_fail(ctx, pack_id, "pack_metadata.json", warning)?;
    }
    let readme = pack
        .readme
        .as_deref()
        .map(|text| specializer.specialize_readme(text));

    info!(pack = %pack_id, items = prepared.len(), marketplace = %target, "prepared pack");
    Ok(PreparedPack {
        pack_id: pack_id.to_string(),
        root: pack.root.clone(),
        marketplace: target,
        version: pack.metadata.current_version,
        metadata: built.document,
        items: prepared,
        readme,
        changelog: pack.changelog.clone(),
        author_image: pack.author_image.clone(),
        doc_files: pack.doc_files.clone(),
        readme_images: specializer.into_readme_images(),
    })
}

/// Downgrade this pack's warnings that its `.pack-ignore` suppresses
pub fn apply_pack_ignore(ctx: &PipelineContext, pack: &Pack) {
    let Some(ignore) = &pack.pack_ignore else {
        return;
    };
    ctx.diagnostics.rewrite(|d| {
        if d.severity != Severity::Warning || d.pack_id.as_deref() != Some(pack.pack_id.as_str()) {
            return;
        }
        if let Some(path) = &d.path {
            if ignore.is_ignored(path, &d.rule_id) {
                d.severity = Severity::Info;
            }
        }
    });
}

/// Load and prepare one pack
pub fn assemble(ctx: &PipelineContext, job: &PackJob) -> Result<PreparedPack> {
    let pack = load_pack(ctx, &job.root)?;
    let prepared = prepare_pack(ctx, &pack);
    apply_pack_ignore(ctx, &pack);
    prepared
}

/// Pack root of a path somewhere inside `Packs/<pack_id>/`
pub fn pack_root_of(path: &Path) -> Option<PathBuf> {
    let components: Vec<_> = path.components().collect();
    let packs_at = components
        .iter()
        .rposition(|c| c.as_os_str() == "Packs")?;
    if packs_at + 1 >= components.len() {
        return None;
    }
    Some(components[..=packs_at + 1].iter().collect())
}

/// Unify and specialize the single item whose primary file is `item_path`
pub fn prepare_item(ctx: &PipelineContext, item_path: &Path) -> Result<Vec<ContentItem>> {
    let display = item_path.display().to_string();
    let classification =
        classifier::classify(item_path).map_err(|err| err.at(display.clone()))?;
    if !classification.is_item() {
        return Err(PackError::InvalidInvocation {
            message: format!("'{display}' is not the primary file of a content item"),
        });
    }
    let pack_root = pack_root_of(item_path).ok_or_else(|| PackError::InvalidInvocation {
        message: format!("'{display}' is not inside a pack"),
    })?;
    let pack_id = classification.pack_id.clone();
    let metadata = loader::load_metadata(&ctx.parse_cache, &pack_root, &pack_id)?;

    let loaded = loader::load_item(&ctx.parse_cache, &pack_root, &classification, metadata.support)?;
    let relative = classification.relative.display().to_string();
    for value in loaded.unknown_marketplaces {
        ctx.diagnostics.record(
            Some(&pack_id),
            Some(&relative),
            &PackError::UnknownMarketplace { value },
        );
    }

    let unify_ctx = ctx.unify_context(&pack_root, &metadata);
    let unified = unifier::unify(&unify_ctx, &loaded.item)?;
    for warning in &unified.warnings {
        ctx.diagnostics.record(Some(&pack_id), Some(&relative), warning);
    }

    let mut specializer = ctx.specializer(&pack_id);
    let mut out = Vec::new();
    for item in &unified.items {
        let specialized = specializer.specialize(item)?;
        for warning in &specialized.warnings {
            ctx.diagnostics.record(Some(&pack_id), Some(&relative), warning);
        }
        out.extend(specialized.items);
    }
    Ok(out)
}

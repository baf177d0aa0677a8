//! `metadata.json` for a prepared pack.
//!
//! Starts from `pack_metadata.json`, resolves marketplace suffixes, runs
//! tags and terms over the free-text fields, filters tags by marketplace
//! and appends the computed fields the marketplace indexes on.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_yaml::{Mapping, Value};

use crate::config::format_timestamp;
use crate::document::Document;
use crate::domain::{ContentItem, ContentKind, Marketplace, PackMetadata, SupportLevel, Version};
use crate::error::PackError;
use crate::specializer::{Specializer, suffix};

pub const XSOAR_AUTHOR: &str = "Cortex XSOAR";
pub const XSIAM_AUTHOR: &str = "Cortex XSIAM";

const TAG_USE_CASE: &str = "Use Case";
const TAG_TRANSFORMER: &str = "Transformer";
const TAG_FILTER: &str = "Filter";
const TAG_COLLECTION: &str = "Collection";
const TAG_NEW: &str = "New";
const TAG_FEATURED: &str = "Featured";

/// Days after `created` during which a pack is tagged `New`
const NEW_PACK_DAYS: i64 = 30;

/// Metadata plus what was noticed while building it
#[derive(Debug)]
pub struct BuiltMetadata {
    pub document: Document,
    pub warnings: Vec<PackError>,
}

fn strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn string_seq(items: impl IntoIterator<Item = String>) -> Value {
    Value::Sequence(items.into_iter().map(Value::String).collect())
}

/// Keep untagged tags and `mp1,mp2:Tag` tags whose list names the target
pub fn tags_for_marketplace(tags: &[String], target: Marketplace) -> BTreeSet<String> {
    let mut kept = BTreeSet::new();
    for tag in tags {
        match tag.split_once(':') {
            Some((marketplaces, name)) => {
                let listed = marketplaces
                    .split(',')
                    .filter_map(|m| m.parse::<Marketplace>().ok())
                    .any(|m| m.covers(target));
                if listed && !name.is_empty() {
                    kept.insert(name.to_string());
                }
            }
            None => {
                kept.insert(tag.clone());
            }
        }
    }
    kept
}

fn script_tagged(items: &[ContentItem], tag: &str) -> bool {
    items
        .iter()
        .filter(|i| i.kind == ContentKind::Script)
        .any(|i| strings(i.body.get("tags")).iter().any(|t| t == tag))
}

fn is_collection(items: &[ContentItem]) -> bool {
    items.iter().any(|i| {
        (i.kind == ContentKind::Integration && i.body.get_bool("script.isfetchevents"))
            || matches!(
                i.kind,
                ContentKind::ParsingRule
                    | ContentKind::ModelingRule
                    | ContentKind::CorrelationRule
                    | ContentKind::XDRCTemplate
            )
    })
}

fn is_new(created: Option<&str>, timestamp: &DateTime<Utc>) -> bool {
    created
        .and_then(|c| DateTime::parse_from_rfc3339(c).ok())
        .is_some_and(|c| (*timestamp - c.with_timezone(&Utc)).num_days() <= NEW_PACK_DAYS)
}

/// Tags after marketplace filtering, plus the computed ones
pub fn pack_tags(
    metadata: &Document,
    items: &[ContentItem],
    target: Marketplace,
    timestamp: &DateTime<Utc>,
) -> BTreeSet<String> {
    let mut tags = tags_for_marketplace(&strings(metadata.get("tags")), target);
    if !strings(metadata.get("useCases")).is_empty() {
        tags.insert(TAG_USE_CASE.to_string());
    }
    if script_tagged(items, "transformer") {
        tags.insert(TAG_TRANSFORMER.to_string());
    }
    if script_tagged(items, "filter") {
        tags.insert(TAG_FILTER.to_string());
    }
    if is_collection(items) {
        tags.insert(TAG_COLLECTION.to_string());
    }
    if let Some(created) = metadata.get_str("created") {
        if is_new(Some(created), timestamp) {
            tags.insert(TAG_NEW.to_string());
        } else {
            tags.remove(TAG_NEW);
        }
    }
    tags
}

/// Ranking hint for marketplace search
pub fn search_rank(metadata: &Document, tags: &BTreeSet<String>) -> i64 {
    let mut rank = 0;
    if metadata.get_str("certification") == Some("certified") {
        rank += 10;
    }
    if tags.contains(TAG_FEATURED) {
        rank += 10;
    }
    if metadata.get_bool("deprecated") {
        rank -= 50;
    }
    if metadata
        .get_str("name")
        .is_some_and(|n| n.trim_end().ends_with("(Deprecated)"))
    {
        rank -= 50;
    }
    rank
}

fn author_for(author: &str, support: SupportLevel, target: Marketplace) -> String {
    if target != Marketplace::MarketplaceV2 {
        return author.to_string();
    }
    if author.is_empty() && support == SupportLevel::Xsoar {
        return XSIAM_AUTHOR.to_string();
    }
    author.replace(XSOAR_AUTHOR, XSIAM_AUTHOR)
}

fn support_details(metadata: &Document) -> Value {
    let mut details = Mapping::new();
    for key in ["url", "email"] {
        if let Some(value) = metadata.get_str(key).filter(|v| !v.is_empty()) {
            details.insert(key.into(), value.into());
        }
    }
    Value::Mapping(details)
}

fn summary(item: &ContentItem) -> Mapping {
    let mut entry = Mapping::new();
    entry.insert("id".into(), item.id.clone().into());
    entry.insert("name".into(), item.display_name.clone().into());
    entry.insert(
        "description".into(),
        item.body.get_str("description").unwrap_or_default().into(),
    );
    entry.insert("fromversion".into(), item.from_version.to_string().into());
    let to_version = if item.to_version == Version::MAX {
        String::new()
    } else {
        item.to_version.to_string()
    };
    entry.insert("toversion".into(), to_version.into());
    entry
}

fn to_version_of(entry: &Mapping) -> Version {
    entry
        .get("toversion")
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
        .unwrap_or(Version::MAX)
}

/// `contentItems` and `contentDisplays`, in item order.
///
/// Test playbooks are left out; an id seen twice keeps the entry with the
/// higher `toversion`.
pub fn content_items(items: &[ContentItem]) -> (Mapping, Mapping) {
    let mut collected: Vec<(ContentKind, Vec<Mapping>)> = Vec::new();
    for item in items.iter().filter(|i| i.kind != ContentKind::TestPlaybook) {
        let key = item.kind.metadata_key();
        let position = match collected.iter().position(|(k, _)| k.metadata_key() == key) {
            Some(position) => position,
            None => {
                collected.push((item.kind, Vec::new()));
                collected.len() - 1
            }
        };
        let entries = &mut collected[position].1;
        let entry = summary(item);
        let existing = entries
            .iter_mut()
            .find(|e| e.get("id").and_then(Value::as_str) == Some(item.id.as_str()));
        match existing {
            Some(existing) if item.to_version > to_version_of(existing) => *existing = entry,
            Some(_) => {}
            None => entries.push(entry),
        }
    }

    let mut content = Mapping::new();
    let mut displays = Mapping::new();
    for (kind, entries) in collected {
        let label = kind.display_label();
        let display = if entries.len() == 1 {
            label.to_string()
        } else {
            format!("{label}s")
        };
        displays.insert(kind.metadata_key().into(), display.into());
        content.insert(
            kind.metadata_key().into(),
            Value::Sequence(entries.into_iter().map(Value::Mapping).collect()),
        );
    }
    (content, displays)
}

/// Build `metadata.json` for the items that ship to the specializer's target
pub fn build(
    metadata: &PackMetadata,
    items: &[ContentItem],
    specializer: &Specializer,
    timestamp: &DateTime<Utc>,
) -> BuiltMetadata {
    let target = specializer.target();
    let mut doc = metadata.document.clone();
    let outcome = suffix::apply(doc.root_mut(), target);
    let warnings = outcome
        .unknown_marketplaces
        .into_iter()
        .map(|value| PackError::UnknownMarketplace { value })
        .collect();

    if let Some(description) = doc.get_str("description") {
        let text = specializer.specialize_text(description);
        doc.set_str("description", text);
    }
    for key in ["useCases", "keywords"] {
        if doc.contains(key) {
            let values = strings(doc.get(key))
                .iter()
                .map(|v| specializer.specialize_text(v))
                .collect::<Vec<_>>();
            doc.set(key, string_seq(values));
        }
    }

    let now = format_timestamp(timestamp);
    for key in ["created", "updated"] {
        if doc.get_str(key).is_none_or(str::is_empty) {
            doc.set_str(key, now.clone());
        }
    }

    let tags = pack_tags(&doc, items, target, timestamp);
    let rank = search_rank(&doc, &tags);
    let author = author_for(
        doc.get_str("author").unwrap_or_default(),
        metadata.support,
        target,
    );
    let (content, displays) = content_items(items);
    let item_types = displays.values().cloned().collect();

    doc.set("tags", string_seq(tags));
    doc.set_str("author", author);
    doc.set("searchRank", Value::Number(rank.into()));
    doc.set("supportDetails", support_details(&doc));
    doc.set("contentItems", Value::Mapping(content));
    doc.set("contentDisplays", Value::Mapping(displays));
    doc.set("contentItemTypes", Value::Sequence(item_types));
    doc.prune_styles();

    BuiltMetadata {
        document: doc,
        warnings,
    }
}

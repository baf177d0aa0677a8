//! Modeling, parsing, correlation and assets-modeling rules

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value as JsonValue;

use super::{Unified, UnifyContext};
use crate::document::ScalarStyle;
use crate::domain::{ContentItem, SidecarKind};
use crate::error::{Result, fs, unify};

fn parse_json(item: &ContentItem, path: &Path) -> Result<JsonValue> {
    let text = fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(JsonValue::Object(serde_json::Map::new()));
    }
    serde_json::from_str(&text).map_err(|e| {
        unify::failed(
            item.id.clone(),
            format!("{} is not valid JSON: {e}", path.display()),
        )
    })
}

/// Events of one sample file: a list, or an object holding `data`
fn sample_events(value: JsonValue) -> Vec<JsonValue> {
    match value {
        JsonValue::Array(events) => events,
        JsonValue::Object(mut map) => match map.remove("data") {
            Some(JsonValue::Array(events)) => events,
            Some(other) => vec![other],
            None if map.is_empty() => Vec::new(),
            None => vec![JsonValue::Object(map)],
        },
        JsonValue::Null => Vec::new(),
        other => vec![other],
    }
}

fn text_field(event: &JsonValue, key: &str) -> Option<String> {
    event.get(key).and_then(JsonValue::as_str).map(str::to_string)
}

/// Group sample events by `<vendor>_<product>`
pub fn group_samples(events: Vec<JsonValue>) -> BTreeMap<String, Vec<JsonValue>> {
    let mut grouped: BTreeMap<String, Vec<JsonValue>> = BTreeMap::new();
    for event in events {
        let vendor = text_field(&event, "vendor").unwrap_or_default();
        let product = text_field(&event, "product").unwrap_or_default();
        let payload = match event.get("event_data") {
            Some(data) => data.clone(),
            None => event,
        };
        grouped
            .entry(format!("{vendor}_{product}"))
            .or_default()
            .push(payload);
    }
    grouped
}

fn collect_samples(item: &ContentItem, path: &Path) -> Result<Vec<JsonValue>> {
    if !path.is_dir() {
        return Ok(sample_events(parse_json(item, path)?));
    }
    let mut files: Vec<_> = std::fs::read_dir(path)
        .map_err(|e| fs::read_failed(path, &e))?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .collect();
    files.sort();
    let mut events = Vec::new();
    for file in files {
        events.extend(sample_events(parse_json(item, &file)?));
    }
    Ok(events)
}

fn to_pretty(item: &ContentItem, value: &impl serde::Serialize) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| unify::failed(item.id.clone(), e.to_string()))
}

/// Inline the `.xif` source, schema and samples
pub fn unify(_ctx: &UnifyContext<'_>, mut item: ContentItem) -> Result<Unified> {
    let rules_path = item
        .sidecars
        .get(&SidecarKind::RuleSource)
        .cloned()
        .ok_or_else(|| unify::missing_sidecar(item.id.clone(), "rule source (.xif)"))?;
    let rules = fs::read_to_string(&rules_path)?;
    item.body.set_styled("rules", rules, ScalarStyle::Folded);

    if let Some(schema_path) = item.sidecars.get(&SidecarKind::Schema).cloned() {
        let schema = parse_json(&item, &schema_path)?;
        let text = to_pretty(&item, &schema)?;
        item.body.set_styled("schema", text, ScalarStyle::Folded);
    }

    if let Some(samples_path) = item.sidecars.get(&SidecarKind::SampleData).cloned() {
        let grouped = group_samples(collect_samples(&item, &samples_path)?);
        if !grouped.is_empty() {
            let text = to_pretty(&item, &grouped)?;
            item.body.set_styled("samples", text, ScalarStyle::Folded);
        }
    }
    Ok(Unified::single(item))
}

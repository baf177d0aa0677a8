//! Suffix overrides (`key:marketplacev2`) and per-element marketplace lists

use std::collections::{BTreeMap, BTreeSet};

use serde_yaml::{Mapping, Value};

use crate::domain::Marketplace;
use crate::domain::marketplace::{split_suffix, suffix_rank};

/// What a suffix pass changed besides values
#[derive(Debug, Default)]
pub struct SuffixOutcome {
    /// Dotted key paths moved onto their base key, for carrying scalar styles
    pub renamed: Vec<(String, String)>,
    /// Entries of nested `marketplaces` lists that name no known marketplace
    pub unknown_marketplaces: Vec<String>,
    /// Sequence elements dropped for targeting other marketplaces
    pub dropped_elements: usize,
}

/// Resolve every suffixed key under `value` for `target`
pub fn apply(value: &mut Value, target: Marketplace) -> SuffixOutcome {
    let mut outcome = SuffixOutcome::default();
    walk(value, Some(String::new()), target, &mut outcome);
    outcome
}

fn child(path: Option<&str>, key: &str) -> Option<String> {
    path.map(|p| {
        if p.is_empty() {
            key.to_string()
        } else {
            format!("{p}.{key}")
        }
    })
}

fn walk(value: &mut Value, path: Option<String>, target: Marketplace, out: &mut SuffixOutcome) {
    match value {
        Value::Mapping(map) => {
            resolve_mapping(map, path.as_deref(), target, out);
            for (key, inner) in map.iter_mut() {
                let next = key.as_str().and_then(|k| child(path.as_deref(), k));
                walk(inner, next, target, out);
            }
        }
        Value::Sequence(items) => {
            let before = items.len();
            items.retain(|item| element_ships(item, target, out));
            out.dropped_elements += before - items.len();
            for item in items.iter_mut() {
                walk(item, None, target, out);
            }
        }
        Value::Tagged(tagged) => walk(&mut tagged.value, path, target, out),
        _ => {}
    }
}

/// Whether a sequence element survives its own `marketplaces` list
fn element_ships(item: &Value, target: Marketplace, out: &mut SuffixOutcome) -> bool {
    let Some(Value::Sequence(list)) = item.get("marketplaces") else {
        return true;
    };
    let mut known = Vec::new();
    for entry in list.iter().filter_map(Value::as_str) {
        match entry.parse::<Marketplace>() {
            Ok(mp) => known.push(mp),
            Err(_) => out.unknown_marketplaces.push(entry.to_string()),
        }
    }
    known.is_empty() || known.iter().any(|mp| mp.covers(target))
}

fn resolve_mapping(
    map: &mut Mapping,
    path: Option<&str>,
    target: Marketplace,
    out: &mut SuffixOutcome,
) {
    let mut plain = BTreeSet::new();
    // base key -> (rank, value, suffixed key)
    let mut winners: BTreeMap<String, (u8, Value, String)> = BTreeMap::new();
    let mut has_suffixed = false;

    for (key, value) in map.iter() {
        let Some(key) = key.as_str() else {
            continue;
        };
        let Some((base, suffix)) = split_suffix(key) else {
            plain.insert(key.to_string());
            continue;
        };
        has_suffixed = true;
        let Some(rank) = suffix_rank(suffix, target) else {
            continue;
        };
        if winners.get(base).is_none_or(|(best, _, _)| rank > *best) {
            winners.insert(base.to_string(), (rank, value.clone(), key.to_string()));
        }
    }
    if !has_suffixed {
        return;
    }

    let original = std::mem::take(map);
    for (key, value) in original {
        let text = key.as_str().map(str::to_string);
        let base = text
            .as_deref()
            .and_then(split_suffix)
            .map(|(base, _)| base.to_string());
        match (text, base) {
            (Some(text), None) => match winners.remove(&text) {
                Some((_, winner, from)) => {
                    record_rename(path, &from, &text, out);
                    map.insert(key, winner);
                }
                None => {
                    map.insert(key, value);
                }
            },
            (None, _) => {
                map.insert(key, value);
            }
            (Some(_), Some(base)) => {
                if plain.contains(&base) {
                    continue;
                }
                if let Some((_, winner, from)) = winners.remove(&base) {
                    record_rename(path, &from, &base, out);
                    map.insert(Value::String(base), winner);
                }
            }
        }
    }
}

fn record_rename(path: Option<&str>, from: &str, to: &str, out: &mut SuffixOutcome) {
    if let (Some(from), Some(to)) = (child(path, from), child(path, to)) {
        out.renamed.push((from, to));
    }
}

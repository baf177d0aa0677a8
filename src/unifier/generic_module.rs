//! Generic modules: inline the dashboards their tabs reference

use std::collections::BTreeMap;

use serde_yaml::Value;
use tracing::debug;

use super::{Unified, UnifyContext};
use crate::domain::ContentItem;
use crate::error::{PackError, Result};

/// Dashboards of the pack keyed by id
fn pack_dashboards(ctx: &UnifyContext<'_>) -> Result<BTreeMap<String, Value>> {
    let dir = ctx.pack_root.join("Dashboards");
    let mut dashboards = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(dashboards);
    }
    let mut files: Vec<_> = walkdir::WalkDir::new(&dir)
        .max_depth(1)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .collect();
    files.sort();
    for path in files {
        let document = ctx.parse_cache.load(&path)?;
        if let Some(id) = document.get_str("id") {
            dashboards.insert(id.to_string(), document.root().clone());
        }
    }
    Ok(dashboards)
}

fn referenced_id(dashboard: &Value) -> Option<String> {
    match dashboard {
        Value::String(id) => Some(id.clone()),
        Value::Mapping(map) if map.len() == 1 => {
            map.get("id").and_then(Value::as_str).map(str::to_string)
        }
        _ => None,
    }
}

/// Substitute `views[].tabs[].dashboard` references with dashboard documents
pub fn unify(ctx: &UnifyContext<'_>, mut item: ContentItem) -> Result<Unified> {
    let dashboards = pack_dashboards(ctx)?;
    let mut warnings = Vec::new();

    if let Some(Value::Sequence(views)) = item.body.get_mut("views") {
        for view in views.iter_mut() {
            let Some(Value::Sequence(tabs)) = view.get_mut("tabs") else {
                continue;
            };
            for tab in tabs.iter_mut() {
                let Some(slot) = tab.get_mut("dashboard") else {
                    continue;
                };
                let Some(id) = referenced_id(slot) else {
                    continue;
                };
                match dashboards.get(&id) {
                    Some(dashboard) => {
                        debug!(module = %item.id, dashboard = %id, "inlined dashboard");
                        *slot = dashboard.clone();
                    }
                    None => warnings.push(PackError::UnresolvedReference {
                        item: item.id.clone(),
                        reference: format!("dashboard '{id}'"),
                    }),
                }
            }
        }
    }
    Ok(Unified {
        items: vec![item],
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unifier::test_support::{Fixture, XSOAR_METADATA};

    const MODULE: &str = r#"{"id": "rbvm", "name": "RBVM", "views": [{"name": "Main", "tabs": [
        {"name": "Overview", "dashboard": {"id": "rbvm_dashboard"}},
        {"name": "Missing", "dashboard": {"id": "nowhere"}}
    ]}]}"#;

    #[test]
    fn test_inline_dashboards_and_warn_on_unresolved() {
        let fixture = Fixture::new(XSOAR_METADATA);
        fixture.write("Packs/HelloWorld/GenericModules/genericmodule-RBVM.json", MODULE);
        fixture.write(
            "Packs/HelloWorld/Dashboards/dashboard-RBVM.json",
            r#"{"id": "rbvm_dashboard", "name": "RBVM Dashboard", "layout": []}"#,
        );
        let item = fixture.load("Packs/HelloWorld/GenericModules/genericmodule-RBVM.json");
        let unified = fixture.unify(&item).unwrap();

        let body = &unified.items[0].body;
        let tabs = body.get("views").unwrap()[0]["tabs"].as_sequence().unwrap().clone();
        assert_eq!(tabs[0]["dashboard"]["name"].as_str(), Some("RBVM Dashboard"));
        assert_eq!(tabs[1]["dashboard"]["id"].as_str(), Some("nowhere"));

        assert_eq!(unified.warnings.len(), 1);
        assert!(matches!(
            &unified.warnings[0],
            PackError::UnresolvedReference { reference, .. } if reference.contains("nowhere")
        ));
    }
}

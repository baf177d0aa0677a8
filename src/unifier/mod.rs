//! Unification: fold an item's sidecars into one self-contained document.
//!
//! Dispatch is a per-kind function table; kinds without sidecars to fold
//! pass through with only the common post-processing applied.

pub mod api_module;
pub mod contributors;
pub mod generic_module;
pub mod integration;
pub mod playbook;
pub mod rules;

use std::path::Path;

use serde_yaml::Value;
use tracing::debug;

use crate::domain::{ContentItem, ContentKind, PackMetadata, Version};
use crate::error::{PackError, Result};
use crate::loader::ParseCache;

pub use api_module::ApiModuleCache;

/// Keys dropped when the receiving server restores them from the manifest
pub const SERVER_RESTORED_FIELDS: [&str; 5] = [
    "fromversion",
    "toversion",
    "alt_dockerimages",
    "script.dockerimage45",
    "tests",
];

/// Knobs that change unified output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifyOptions {
    /// Appended to names and ids, e.g. `Foo - Beta`
    pub custom_label: Option<String>,
    /// Prepend `pack version:` comments to inlined code
    pub stamp_version: bool,
    /// Drop [`SERVER_RESTORED_FIELDS`] from unified bodies
    pub strip_server_fields: bool,
}

/// Everything a unifier may consult besides the item itself
#[derive(Debug, Clone, Copy)]
pub struct UnifyContext<'a> {
    /// Directory holding `Packs/`
    pub content_root: &'a Path,
    pub pack_root: &'a Path,
    pub metadata: &'a PackMetadata,
    pub parse_cache: &'a ParseCache,
    pub api_modules: &'a ApiModuleCache,
    pub options: &'a UnifyOptions,
}

/// Output of unifying one item
#[derive(Debug, Default)]
pub struct Unified {
    /// Usually one item; the docker 4.5 split yields two
    pub items: Vec<ContentItem>,
    /// Non-fatal findings such as unresolved references
    pub warnings: Vec<PackError>,
}

impl Unified {
    pub fn single(item: ContentItem) -> Self {
        Self {
            items: vec![item],
            warnings: Vec::new(),
        }
    }
}

type UnifyFn = fn(&UnifyContext<'_>, ContentItem) -> Result<Unified>;

fn unifier_for(kind: ContentKind) -> UnifyFn {
    match kind {
        ContentKind::Integration | ContentKind::Script => integration::unify,
        ContentKind::Playbook | ContentKind::TestPlaybook => playbook::unify,
        ContentKind::ModelingRule
        | ContentKind::ParsingRule
        | ContentKind::CorrelationRule
        | ContentKind::AssetsModelingRule => rules::unify,
        ContentKind::GenericModule => generic_module::unify,
        _ => passthrough,
    }
}

fn passthrough(_ctx: &UnifyContext<'_>, item: ContentItem) -> Result<Unified> {
    Ok(Unified::single(item))
}

/// Unify `item`, leaving the source untouched
pub fn unify(ctx: &UnifyContext<'_>, item: &ContentItem) -> Result<Unified> {
    debug!(item = %item.id, kind = %item.kind, "unifying");
    let mut unified = unifier_for(item.kind)(ctx, item.clone())?;
    for out in &mut unified.items {
        out.sidecars.clear();
        out.is_unified = true;
        if ctx.options.strip_server_fields {
            for field in SERVER_RESTORED_FIELDS {
                out.body.remove(field);
            }
        }
    }
    Ok(unified)
}

/// A scalar as text, for fields authors write either quoted or bare
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Rewrite a version field to its three-part form, if present
pub(crate) fn normalize_version_field(item: &mut ContentItem, key: &str) -> Result<()> {
    let Some(text) = item.body.get(key).and_then(scalar_text) else {
        return Ok(());
    };
    let version: Version = text.parse().map_err(|reason: String| {
        crate::error::unify::failed(item.id.clone(), format!("{key}: {reason}"))
    })?;
    item.body.set_str(key, version.to_string());
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::{Fixture, XSOAR_METADATA};

    #[test]
    fn test_passthrough_clears_sidecars() {
        let fixture = Fixture::new(XSOAR_METADATA);
        fixture.write(
            "Packs/HelloWorld/IncidentFields/incidentfield-Owner.json",
            r#"{"id": "incident_owner", "name": "Owner", "cliName": "owner"}"#,
        );
        fixture.write("Packs/HelloWorld/IncidentFields/incidentfield-Owner_README.md", "x");
        let item = fixture.load("Packs/HelloWorld/IncidentFields/incidentfield-Owner.json");
        assert_eq!(item.sidecars.len(), 1);

        let unified = fixture.unify(&item).unwrap();
        assert_eq!(unified.items.len(), 1);
        assert!(unified.items[0].sidecars.is_empty());
        assert!(unified.items[0].is_unified);
        assert_eq!(unified.items[0].body, item.body);
    }

    #[test]
    fn test_strip_server_fields() {
        let mut fixture = Fixture::new(XSOAR_METADATA);
        fixture.options.strip_server_fields = true;
        fixture.write(
            "Packs/HelloWorld/Playbooks/playbook-Triage.yml",
            "id: Triage\nname: Triage\nfromversion: 6.5.0\ntests:\n- No tests\ntasks: {}\n",
        );
        let item = fixture.load("Packs/HelloWorld/Playbooks/playbook-Triage.yml");
        let unified = fixture.unify(&item).unwrap();
        let body = &unified.items[0].body;
        assert!(!body.contains("fromversion"));
        assert!(!body.contains("tests"));
        assert_eq!(unified.items[0].from_version, crate::domain::Version::new(6, 5, 0));
    }
}

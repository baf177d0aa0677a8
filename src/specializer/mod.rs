//! Marketplace specialization of unified items.
//!
//! Transforms run in a fixed order: suffix overrides and text tags, term
//! substitution, capability filtering, then image rewriting in READMEs and
//! integration descriptions. A [`Specializer`] lives for one pack so scripts
//! renamed early in upload order are followed by the playbooks that call them.

pub mod capabilities;
pub mod hidden;
pub mod readme;
pub mod suffix;
pub mod tags;
pub mod terms;

use std::collections::BTreeSet;

use serde_yaml::Value;
use tracing::debug;

use crate::domain::item::read_identity;
use crate::domain::{ContentItem, ContentKind, Marketplace};
use crate::error::{PackError, Result, unify};
use readme::{ImageLocation, ReadmeImage};

/// Visit every string under `value` with the key that holds it, if any
pub(crate) fn for_each_string(value: &mut Value, f: &mut dyn FnMut(Option<&str>, &mut String)) {
    visit(value, None, f);
}

fn visit(value: &mut Value, key: Option<&str>, f: &mut dyn FnMut(Option<&str>, &mut String)) {
    match value {
        Value::String(s) => f(key, s),
        Value::Mapping(map) => {
            for (k, v) in map.iter_mut() {
                visit(v, k.as_str(), f);
            }
        }
        Value::Sequence(items) => {
            for v in items.iter_mut() {
                visit(v, None, f);
            }
        }
        Value::Tagged(tagged) => visit(&mut tagged.value, key, f),
        _ => {}
    }
}

/// Output of specializing one item
#[derive(Debug, Default)]
pub struct Specialized {
    /// The item, followed by a wrapper script when it was renamed
    pub items: Vec<ContentItem>,
    pub warnings: Vec<PackError>,
}

/// Per-pack specialization state
#[derive(Debug)]
pub struct Specializer {
    target: Marketplace,
    images: ImageLocation,
    renamed_scripts: BTreeSet<String>,
    readme_images: Vec<ReadmeImage>,
}

impl Specializer {
    pub fn new(target: Marketplace, pack_id: impl Into<String>) -> Self {
        Self {
            target,
            images: ImageLocation::new(target, pack_id),
            renamed_scripts: BTreeSet::new(),
            readme_images: Vec::new(),
        }
    }

    /// Serve README images from `bucket` instead of the marketplace default
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.images = self.images.with_bucket(bucket);
        self
    }

    pub fn target(&self) -> Marketplace {
        self.target
    }

    /// Images rewritten so far, in encounter order
    pub fn readme_images(&self) -> &[ReadmeImage] {
        &self.readme_images
    }

    pub fn into_readme_images(self) -> Vec<ReadmeImage> {
        self.readme_images
    }

    /// Tags and terms for free text such as pack descriptions
    pub fn specialize_text(&self, text: &str) -> String {
        let tagged = tags::apply(text, self.target);
        terms::substitute(&tagged, self.target == Marketplace::MarketplaceV2)
    }

    /// Tags, escapes and image links of a README
    pub fn specialize_readme(&mut self, text: &str) -> String {
        let tagged = tags::apply(text, self.target);
        let unwrapped = terms::unwrap(&tagged);
        self.rewrite_images(&unwrapped)
    }

    fn rewrite_images(&mut self, text: &str) -> String {
        let (rewritten, images) = readme::rewrite(text, &self.images);
        for image in images {
            if !self.readme_images.contains(&image) {
                self.readme_images.push(image);
            }
        }
        rewritten
    }

    /// Specialize one unified item.
    ///
    /// Items already specialized for this marketplace come back unchanged.
    pub fn specialize(&mut self, item: &ContentItem) -> Result<Specialized> {
        if let Some(done) = item.specialized_for {
            if done == self.target {
                return Ok(Specialized {
                    items: vec![item.clone()],
                    warnings: Vec::new(),
                });
            }
            return Err(unify::specialization_failed(
                item.id.clone(),
                format!("already specialized for {done}"),
            ));
        }
        debug!(item = %item.id, marketplace = %self.target, "specializing");

        let mut out = item.clone();
        let mut warnings = Vec::new();

        let suffixes = suffix::apply(out.body.root_mut(), self.target);
        for (from, to) in &suffixes.renamed {
            out.body.rename_style(from, to);
        }
        warnings.extend(
            suffixes
                .unknown_marketplaces
                .into_iter()
                .map(|value| PackError::UnknownMarketplace { value }),
        );
        let target = self.target;
        for_each_string(out.body.root_mut(), &mut |_, s| {
            if s.contains("<~") {
                *s = tags::apply(s, target).into_owned();
            }
        });

        let substituted = terms::apply(&mut out, self.target, &self.renamed_scripts);
        warnings.extend(substituted.warnings);
        self.renamed_scripts.extend(substituted.renamed_from);

        capabilities::apply(&mut out, self.target);
        hidden::apply(&mut out, self.target);
        if out.kind == ContentKind::Integration {
            if let Some(text) = out.body.get_str("detaileddescription").map(str::to_string) {
                let rewritten = self.rewrite_images(&text);
                out.body.set_str("detaileddescription", rewritten);
            }
        }

        if let Some(text) = out.readme.take() {
            out.readme = Some(self.specialize_readme(&text));
        }

        let mut items = vec![self.finish(out)?];
        if let Some(mut wrapper) = substituted.wrapper {
            wrapper.readme = None;
            items.push(self.finish(wrapper)?);
        }
        Ok(Specialized { items, warnings })
    }

    fn finish(&self, mut item: ContentItem) -> Result<ContentItem> {
        item.body.prune_styles();
        let identity = read_identity(item.kind, &item.body)
            .map_err(|reason| unify::specialization_failed(item.id.clone(), reason))?;
        if let Some(id) = identity.id {
            item.id = id;
        }
        if let Some(name) = identity.display_name {
            item.display_name = name;
        }
        // stripped version fields keep the values read at load time
        if ["fromversion", "fromVersion"].iter().any(|k| item.body.contains(k)) {
            item.from_version = identity.from_version;
        }
        if ["toversion", "toVersion"].iter().any(|k| item.body.contains(k)) {
            item.to_version = identity.to_version;
        }
        if item.body.contains("marketplaces") {
            item.marketplaces = identity.marketplaces;
        }
        item.specialized_for = Some(self.target);
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, ScalarStyle};
    use crate::domain::{ContentKind, Section, SupportLevel, Version};
    use crate::domain::marketplace::KEY_SUFFIXES;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn unified(kind: ContentKind, body: Document, output_name: &str) -> ContentItem {
        let identity = read_identity(kind, &body).unwrap();
        ContentItem {
            kind,
            section: Section::Playbooks,
            id: identity.id.clone().unwrap_or_default(),
            display_name: identity.display_name.unwrap_or_default(),
            path: PathBuf::from(output_name),
            body,
            sidecars: BTreeMap::new(),
            from_version: identity.from_version,
            to_version: identity.to_version,
            marketplaces: identity.marketplaces,
            support_level: SupportLevel::Xsoar,
            is_unified: true,
            specialized_for: None,
            output_name: output_name.to_string(),
            readme: None,
        }
    }

    fn json_item(json: &str) -> ContentItem {
        unified(ContentKind::Layout, Document::parse_json(json).unwrap(), "layout-a.json")
    }

    fn run(target: Marketplace, item: &ContentItem) -> ContentItem {
        Specializer::new(target, "HelloWorld")
            .specialize(item)
            .unwrap()
            .items
            .remove(0)
    }

    const IDS: &str = r#"{"id":"A","id:marketplacev2":"B","id:xsoar":"C"}"#;

    #[test]
    fn test_suffix_override_marketplacev2() {
        let out = run(Marketplace::MarketplaceV2, &json_item(IDS));
        assert_eq!(out.body.root(), Document::parse_json(r#"{"id":"B"}"#).unwrap().root());
        assert_eq!(out.id, "B");
    }

    #[test]
    fn test_suffix_override_xsoar_saas() {
        let out = run(Marketplace::XsoarSaas, &json_item(IDS));
        assert_eq!(out.body.root(), Document::parse_json(r#"{"id":"C"}"#).unwrap().root());
        assert_eq!(out.specialized_for, Some(Marketplace::XsoarSaas));
    }

    #[test]
    fn test_idempotent() {
        let yaml = "id: pb\nname: Handle <-incident-> queue\ndescription: Create an incident\ndescription:xsoar: Open the incident\ntasks:\n  '0':\n    task:\n      name: Open incident\n";
        let item = unified(ContentKind::Playbook, Document::parse_yaml(yaml).unwrap(), "pb.yml");
        for target in Marketplace::ALL {
            let mut specializer = Specializer::new(target, "HelloWorld");
            let once = specializer.specialize(&item).unwrap().items;
            let twice = specializer.specialize(&once[0]).unwrap().items;
            assert_eq!(once, twice, "{target}");
        }
    }

    #[test]
    fn test_no_residual_suffixes_or_wrappers() {
        let yaml = "id: pb\nname:marketplacev2: Handle <-incident->\nname_x2: legacy\ndescription: An <-Incidents-> list\ninputs:\n- key: a\n  description:xpanse: x\n";
        let item = unified(ContentKind::Playbook, Document::parse_yaml(yaml).unwrap(), "pb.yml");
        for target in Marketplace::ALL {
            let out = run(target, &item);
            let text = out.body.to_yaml();
            assert!(!text.contains("<-"), "{target}: {text}");
            for suffix in KEY_SUFFIXES {
                assert!(!text.contains(&format!("{suffix}:")), "{target}: {text}");
            }
        }
    }

    #[test]
    fn test_term_substitution_order_after_suffix() {
        let yaml = "id: pb\nname: Triage\nname:marketplacev2: Incident Triage\n";
        let item = unified(ContentKind::Playbook, Document::parse_yaml(yaml).unwrap(), "pb.yml");
        let out = run(Marketplace::MarketplaceV2, &item);
        assert_eq!(out.body.get_str("name"), Some("Alert Triage"));
        assert_eq!(out.display_name, "Alert Triage");
    }

    #[test]
    fn test_capability_filter() {
        let yaml = "commonfields:\n  id: Okta\nname: Okta\ndisplay: Okta\nscript:\n  isfetchevents: true\n";
        let item = unified(ContentKind::Integration, Document::parse_yaml(yaml).unwrap(), "integration-Okta.yml");
        let xsoar = run(Marketplace::Xsoar, &item);
        assert_eq!(xsoar.body.get("script.isfetchevents"), Some(&Value::Bool(false)));
        let xsiam = run(Marketplace::MarketplaceV2, &item);
        assert_eq!(xsiam.body.get("script.isfetchevents"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_renamed_script_yields_wrapper_and_playbook_follows() {
        let script = unified(
            ContentKind::Script,
            Document::parse_yaml(
                "commonfields:\n  id: Close Incident\nname: Close Incident\ntype: javascript\nscript: return 1;\n",
            )
            .unwrap(),
            "script-CloseIncident.yml",
        );
        let playbook = unified(
            ContentKind::Playbook,
            Document::parse_yaml("id: pb\nname: pb\ntasks:\n  '0':\n    task:\n      scriptName: Close Incident\n").unwrap(),
            "pb.yml",
        );

        let mut specializer = Specializer::new(Marketplace::MarketplaceV2, "HelloWorld");
        let scripts = specializer.specialize(&script).unwrap().items;
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0].id, "Close Alert");
        assert_eq!(scripts[1].id, "Close Incident");
        assert_eq!(scripts[1].body.get_str("script"), Some("return executeCommand('Close Alert', args)\n"));

        let pb = specializer.specialize(&playbook).unwrap().items.remove(0);
        assert_eq!(pb.body.get_str("tasks.0.task.scriptName"), Some("Close Alert"));
    }

    #[test]
    fn test_style_follows_overridden_key() {
        let mut body = Document::parse_yaml("id: a\ndescription: one\n").unwrap();
        body.set_styled("description:xsoar", "line one\nline two", ScalarStyle::Literal);
        let item = unified(ContentKind::Playbook, body, "a.yml");
        let out = run(Marketplace::Xsoar, &item);
        assert_eq!(out.body.style("description"), Some(ScalarStyle::Literal));
        assert_eq!(out.body.style("description:xsoar"), None);
    }

    #[test]
    fn test_item_readme_rewritten() {
        let mut item = json_item(r#"{"id": "a"}"#);
        item.readme = Some("![x](https://host/foo.png)<~XSOAR> xsoar only</~XSOAR>".to_string());
        let mut specializer = Specializer::new(Marketplace::MarketplaceV2, "HelloWorld");
        let out = specializer.specialize(&item).unwrap().items.remove(0);
        assert_eq!(
            out.readme.as_deref(),
            Some("![x](api/marketplace/file?name=content/packs/HelloWorld/doc_files/foo.png)")
        );
        assert_eq!(specializer.readme_images().len(), 1);
    }

    #[test]
    fn test_integration_description_images_rewritten() {
        let body = Document::parse_yaml(
            "commonfields:\n  id: HelloWorld\nname: HelloWorld\ndetaileddescription: |-\n  Setup:\n  ![setup](https://host/setup.png)\n",
        )
        .unwrap();
        let item = unified(ContentKind::Integration, body, "integration-HelloWorld.yml");
        let mut specializer = Specializer::new(Marketplace::MarketplaceV2, "HelloWorld");
        let out = specializer.specialize(&item).unwrap().items.remove(0);
        assert_eq!(
            out.body.get_str("detaileddescription"),
            Some("Setup:\n![setup](api/marketplace/file?name=content/packs/HelloWorld/doc_files/setup.png)")
        );
        assert_eq!(specializer.readme_images()[0].image_name, "setup.png");
    }

    #[test]
    fn test_other_target_rejected() {
        let out = run(Marketplace::Xsoar, &json_item(IDS));
        let err = Specializer::new(Marketplace::Xpanse, "HelloWorld")
            .specialize(&out)
            .unwrap_err();
        assert!(matches!(err, PackError::SpecializationFailed { .. }));
    }

    #[test]
    fn test_versions_survive_stripped_fields() {
        let mut item = json_item(r#"{"id": "a"}"#);
        item.from_version = Version::new(6, 5, 0);
        let out = run(Marketplace::Xsoar, &item);
        assert_eq!(out.from_version, Version::new(6, 5, 0));
    }

    #[test]
    fn test_specialize_text() {
        let specializer = Specializer::new(Marketplace::MarketplaceV2, "HelloWorld");
        assert_eq!(
            specializer.specialize_text("Manage incidents<~XSOAR> in XSOAR</~XSOAR>"),
            "Manage alerts"
        );
    }
}

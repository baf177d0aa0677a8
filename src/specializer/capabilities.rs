//! Integration capabilities that only some marketplaces support

use serde_yaml::Value;

use crate::domain::{ContentItem, ContentKind, Marketplace};

/// Fetch flags and the marketplaces that honor them
const FETCH_FLAGS: [(&str, &[Marketplace]); 3] = [
    (
        "script.isfetchevents",
        &[Marketplace::MarketplaceV2, Marketplace::Platform],
    ),
    (
        "script.isfetcheventsandassets",
        &[Marketplace::MarketplaceV2, Marketplace::Platform],
    ),
    (
        "script.isfetchassets",
        &[
            Marketplace::MarketplaceV2,
            Marketplace::Xpanse,
            Marketplace::Platform,
        ],
    ),
];

/// Clear unsupported fetch flags and drop quick-action commands
pub fn apply(item: &mut ContentItem, target: Marketplace) {
    if item.kind != ContentKind::Integration {
        return;
    }
    for (flag, allowed) in FETCH_FLAGS {
        if !allowed.contains(&target) && item.body.contains(flag) {
            item.body.set(flag, Value::Bool(false));
        }
    }
    if target == Marketplace::Platform {
        return;
    }
    if let Some(Value::Sequence(commands)) = item.body.get_mut("script.commands") {
        commands.retain(|command| !is_quick_action(command));
    }
}

fn is_quick_action(command: &Value) -> bool {
    match command.get("quickaction") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::domain::{Section, SupportLevel, Version};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn integration(yaml: &str) -> ContentItem {
        ContentItem {
            kind: ContentKind::Integration,
            section: Section::Integrations,
            id: "Okta".to_string(),
            display_name: "Okta".to_string(),
            path: PathBuf::from("Integrations/Okta/Okta.yml"),
            body: Document::parse_yaml(yaml).unwrap(),
            sidecars: BTreeMap::new(),
            from_version: Version::MIN,
            to_version: Version::MAX,
            marketplaces: Default::default(),
            support_level: SupportLevel::Xsoar,
            is_unified: true,
            specialized_for: None,
            output_name: "integration-Okta.yml".to_string(),
            readme: None,
        }
    }

    const OKTA: &str = "script:\n  isfetchevents: true\n  isfetchassets: true\n  commands:\n  - name: okta-get-user\n  - name: okta-quick-lock\n    quickaction: true\n";

    #[test]
    fn test_fetch_events_cleared_for_xsoar() {
        let mut item = integration(OKTA);
        apply(&mut item, Marketplace::Xsoar);
        assert_eq!(item.body.get("script.isfetchevents"), Some(&Value::Bool(false)));
        assert_eq!(item.body.get("script.isfetchassets"), Some(&Value::Bool(false)));
        assert!(!item.body.contains("script.isfetcheventsandassets"));
        assert_eq!(item.body.get("script.commands").unwrap().as_sequence().unwrap().len(), 1);
    }

    #[test]
    fn test_fetch_events_kept_for_marketplacev2() {
        let mut item = integration(OKTA);
        apply(&mut item, Marketplace::MarketplaceV2);
        assert_eq!(item.body.get("script.isfetchevents"), Some(&Value::Bool(true)));
        assert_eq!(item.body.get("script.isfetchassets"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_xpanse_keeps_assets_only() {
        let mut item = integration(OKTA);
        apply(&mut item, Marketplace::Xpanse);
        assert_eq!(item.body.get("script.isfetchevents"), Some(&Value::Bool(false)));
        assert_eq!(item.body.get("script.isfetchassets"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_platform_keeps_quick_actions() {
        let mut item = integration(OKTA);
        apply(&mut item, Marketplace::Platform);
        assert_eq!(item.body.get("script.commands").unwrap().as_sequence().unwrap().len(), 2);
    }
}

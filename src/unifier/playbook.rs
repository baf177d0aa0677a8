//! Playbooks carry no sidecars; only their shape is normalized

use serde_yaml::Value;

use super::{Unified, UnifyContext, normalize_version_field};
use crate::domain::ContentItem;
use crate::error::Result;

fn ensure_list(item: &mut ContentItem, key: &str) {
    match item.body.get(key) {
        Some(Value::Sequence(_)) => {}
        None | Some(Value::Null) => item.body.set(key, Value::Sequence(Vec::new())),
        Some(other) => {
            let single = other.clone();
            item.body.set(key, Value::Sequence(vec![single]));
        }
    }
}

/// Canonical version strings and list-valued `inputs`/`outputs`
pub fn unify(_ctx: &UnifyContext<'_>, mut item: ContentItem) -> Result<Unified> {
    normalize_version_field(&mut item, "fromversion")?;
    normalize_version_field(&mut item, "toversion")?;
    ensure_list(&mut item, "inputs");
    ensure_list(&mut item, "outputs");
    Ok(Unified::single(item))
}

#[cfg(test)]
mod tests {
    use crate::unifier::test_support::{Fixture, XSOAR_METADATA};
    use serde_yaml::Value;

    #[test]
    fn test_versions_and_lists_normalized() {
        let fixture = Fixture::new(XSOAR_METADATA);
        fixture.write(
            "Packs/HelloWorld/Playbooks/playbook-Triage.yml",
            "id: Triage\nname: Triage\nfromversion: '6.5'\ntoversion: 6.9.9\ninputs:\ntasks: {}\n",
        );
        let item = fixture.load("Packs/HelloWorld/Playbooks/playbook-Triage.yml");
        let unified = fixture.unify(&item).unwrap();
        let body = &unified.items[0].body;

        assert_eq!(body.get_str("fromversion"), Some("6.5.0"));
        assert_eq!(body.get_str("toversion"), Some("6.9.9"));
        assert_eq!(body.get("inputs"), Some(&Value::Sequence(Vec::new())));
        assert_eq!(body.get("outputs"), Some(&Value::Sequence(Vec::new())));
        assert_eq!(body.keys().last().map(String::as_str), Some("outputs"));
    }

    #[test]
    fn test_existing_lists_kept() {
        let fixture = Fixture::new(XSOAR_METADATA);
        fixture.write(
            "Packs/HelloWorld/Playbooks/Enrich.yml",
            "id: Enrich\nname: Enrich\ninputs:\n- key: ip\noutputs: []\ntasks: {}\n",
        );
        let item = fixture.load("Packs/HelloWorld/Playbooks/Enrich.yml");
        let unified = fixture.unify(&item).unwrap();
        let inputs = unified.items[0].body.get("inputs").unwrap();
        assert_eq!(inputs[0]["key"].as_str(), Some("ip"));
        assert!(!unified.items[0].body.contains("fromversion"));
    }
}

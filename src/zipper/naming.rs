//! Canonical file names inside a pack zip

use crate::domain::ContentKind;

/// Prefixes the server recognises in front of item file names
const SERVER_PREFIXES: [&str; 38] = [
    "integration",
    "script",
    "automation",
    "playbook",
    "testplaybook",
    "classifier",
    "mapper",
    "incidentfield",
    "indicatorfield",
    "incidenttype",
    "reputation",
    "layoutscontainer",
    "layout",
    "dashboard",
    "widget",
    "report",
    "canvas",
    "connection",
    "genericfield",
    "generictype",
    "genericmodule",
    "genericdefinition",
    "list",
    "job",
    "wizard",
    "pre-process-rule",
    "preprocessrule",
    "modelingrule",
    "parsingrule",
    "correlationrule",
    "xsiamdashboard",
    "xsiamreport",
    "trigger",
    "xdrctemplate",
    "layoutrule",
    "assetsmodelingrule",
    "caselayout",
    "caselayoutrule",
];

/// Prefix written in front of a shipped item of `kind`; playbooks carry none
pub fn file_prefix(kind: ContentKind) -> Option<&'static str> {
    match kind {
        ContentKind::Playbook | ContentKind::TestPlaybook => None,
        ContentKind::Script => Some("script"),
        ContentKind::IndicatorField => Some("incidentfield-indicatorfield"),
        ContentKind::PreProcessRule => Some("pre-process-rule"),
        other if other.is_item() => Some(other.metadata_key()),
        _ => None,
    }
}

fn strip_server_prefixes(name: &str) -> &str {
    let mut name = name;
    // twice, for doubled prefixes like `classifier-mapper-`
    for _ in 0..2 {
        for prefix in SERVER_PREFIXES {
            if let Some(rest) = name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('-'))
            {
                name = rest;
            }
        }
    }
    name
}

/// Output file name for an item whose primary file is `file_name`.
///
/// Existing server prefixes are dropped and the kind's prefix applied, so
/// `automation-X.yml` becomes `script-X.yml` and `playbook-X.yml` becomes `X.yml`.
pub fn output_name(kind: ContentKind, file_name: &str) -> String {
    let bare = strip_server_prefixes(file_name);
    match file_prefix(kind) {
        Some(prefix) => format!("{prefix}-{bare}"),
        None => bare.to_string(),
    }
}

/// Insert `suffix` before the extension: `a.yml` + `_45` is `a_45.yml`
pub fn with_suffix(file_name: &str, suffix: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}{suffix}.{ext}"),
        None => format!("{file_name}{suffix}"),
    }
}

/// Zip entry name for a pack
pub fn pack_zip_name(pack_id: &str) -> String {
    format!("{pack_id}.zip")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_automation_becomes_script() {
        assert_eq!(output_name(ContentKind::Script, "automation-Foo.yml"), "script-Foo.yml");
        assert_eq!(output_name(ContentKind::Script, "Foo.yml"), "script-Foo.yml");
    }

    #[test]
    fn test_playbook_prefix_dropped() {
        assert_eq!(output_name(ContentKind::Playbook, "playbook-Triage.yml"), "Triage.yml");
        assert_eq!(output_name(ContentKind::Playbook, "Triage.yml"), "Triage.yml");
        assert_eq!(
            output_name(ContentKind::TestPlaybook, "playbook-HelloWorld_test.yml"),
            "HelloWorld_test.yml"
        );
    }

    #[test]
    fn test_integration_prefix() {
        assert_eq!(
            output_name(ContentKind::Integration, "HelloWorld.yml"),
            "integration-HelloWorld.yml"
        );
    }

    #[test]
    fn test_doubled_prefix_normalized() {
        assert_eq!(
            output_name(ContentKind::Mapper, "classifier-mapper-Foo.json"),
            "mapper-Foo.json"
        );
        assert_eq!(
            output_name(ContentKind::IndicatorField, "incidentfield-indicatorfield-ip.json"),
            "incidentfield-indicatorfield-ip.json"
        );
    }

    #[test]
    fn test_case_layout_rule_prefix() {
        assert_eq!(
            output_name(ContentKind::CaseLayoutRule, "caselayoutrule-Triage.json"),
            "caselayoutrule-Triage.json"
        );
        assert_eq!(
            output_name(ContentKind::CaseLayout, "caselayout-Triage.json"),
            "caselayout-Triage.json"
        );
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(with_suffix("integration-A.yml", "_45"), "integration-A_45.yml");
        assert_eq!(with_suffix("noext", "_45"), "noext_45");
    }
}

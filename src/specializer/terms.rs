//! Incident to alert term substitution.
//!
//! XSIAM names incidents "alerts". For that marketplace the unescaped words
//! in names and descriptions are rewritten; everywhere else only the
//! `<-incident->` escapes are unwrapped. Scripts whose name changes keep a
//! deprecated wrapper under the old name.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;
use tracing::debug;

use super::for_each_string;
use crate::domain::{ContentItem, ContentKind, Marketplace};
use crate::error::{PackError, unify};
use crate::zipper::naming;

static NOT_WRAPPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(incidents|incident|Incidents|Incident|INCIDENTS|INCIDENT)\b")
        .expect("incident word regex")
});

static WRAPPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<-(incidents|incident|Incidents|Incident|INCIDENTS|INCIDENT)->")
        .expect("wrapped incident regex")
});

static ACCESS_INCIDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bincident\b").expect("access path regex"));

/// Server translation key that must survive verbatim
const SET_INCIDENT_KEY: &str = "commands.local.cmd.set.incident";
const SET_INCIDENT_SCRIPT: &str = "Builtin|||setIncident";
const SET_ALERT_SCRIPT: &str = "Builtin|||setAlert";

fn alert_word(word: &str) -> &'static str {
    match word {
        "incident" => "alert",
        "incidents" => "alerts",
        "Incident" => "Alert",
        "Incidents" => "Alerts",
        "INCIDENT" => "ALERT",
        _ => "ALERTS",
    }
}

/// Replace unescaped incident words with their alert counterparts
pub fn to_alert(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for found in NOT_WRAPPED.find_iter(text) {
        let escaped =
            text[..found.start()].ends_with("<-") || text[found.end()..].starts_with("->");
        out.push_str(&text[last..found.start()]);
        out.push_str(if escaped {
            found.as_str()
        } else {
            alert_word(found.as_str())
        });
        last = found.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Strip `<-incident->` escapes, keeping the word
pub fn unwrap(text: &str) -> String {
    WRAPPED.replace_all(text, "$1").into_owned()
}

/// Substitute, then unwrap
pub fn substitute(text: &str, incident_to_alert: bool) -> String {
    if incident_to_alert {
        unwrap(&to_alert(text))
    } else {
        unwrap(text)
    }
}

/// `X.incident` stays; a bare `incident` path segment becomes `alert`
fn rewrite_access_path(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for found in ACCESS_INCIDENT.find_iter(text) {
        out.push_str(&text[last..found.start()]);
        if text[..found.start()].ends_with('.') {
            out.push_str(found.as_str());
        } else {
            out.push_str("alert");
        }
        last = found.end();
    }
    out.push_str(&text[last..]);
    out
}

fn rewrite_in_place(value: &mut Value, key: &str) {
    if let Some(Value::String(s)) = value.get_mut(key) {
        *s = to_alert(s);
    }
}

/// Result of substituting terms in one item
#[derive(Debug, Default)]
pub struct TermOutcome {
    /// Deprecated script kept under the old name
    pub wrapper: Option<ContentItem>,
    /// Names the item was known by before a rename
    pub renamed_from: Vec<String>,
    pub warnings: Vec<PackError>,
}

/// Substitute terms in `item` for `target`.
///
/// `renamed_scripts` holds the old names of scripts of the same pack that
/// were renamed earlier, so playbooks can follow them.
pub fn apply(
    item: &mut ContentItem,
    target: Marketplace,
    renamed_scripts: &BTreeSet<String>,
) -> TermOutcome {
    let mut outcome = TermOutcome::default();
    if target != Marketplace::MarketplaceV2 {
        for_each_string(item.body.root_mut(), &mut |_, s| {
            if s.contains("<-") {
                *s = unwrap(s);
            }
        });
        return outcome;
    }

    if item.kind == ContentKind::Script {
        rename_script(item, &mut outcome);
    }

    let root = item.body.root_mut();
    match item.kind {
        ContentKind::Playbook | ContentKind::TestPlaybook => {
            rewrite_in_place(root, "name");
            rewrite_playbook_tasks(root);
            rewrite_access_fields(root, renamed_scripts);
        }
        ContentKind::Script => rewrite_set_incident(root),
        kind => {
            rewrite_in_place(root, "name");
            if kind == ContentKind::Integration {
                rewrite_in_place(root, "display");
            }
            rewrite_set_incident(root);
        }
    }
    for_each_string(root, &mut |key, s| {
        if matches!(key, Some("description" | "comment")) && s != SET_INCIDENT_KEY {
            *s = to_alert(s);
        }
    });
    for_each_string(root, &mut |_, s| {
        if s.contains("<-") {
            *s = unwrap(s);
        }
    });
    outcome
}

fn rewrite_set_incident(root: &mut Value) {
    for_each_string(root, &mut |key, s| {
        if key == Some("script") && s == SET_INCIDENT_SCRIPT {
            *s = SET_ALERT_SCRIPT.to_string();
        }
    });
}

fn rewrite_playbook_tasks(root: &mut Value) {
    let Some(Value::Mapping(tasks)) = root.get_mut("tasks") else {
        return;
    };
    for (_, task) in tasks.iter_mut() {
        if let Some(inner) = task.get_mut("task") {
            rewrite_in_place(inner, "name");
        }
    }
}

fn rewrite_access_fields(root: &mut Value, renamed_scripts: &BTreeSet<String>) {
    for_each_string(root, &mut |key, s| match key {
        Some("simple" | "root") if s.contains("incident") => *s = rewrite_access_path(s),
        Some("script") if s == SET_INCIDENT_SCRIPT => *s = SET_ALERT_SCRIPT.to_string(),
        Some("scriptName") if renamed_scripts.contains(s.as_str()) => *s = substitute(s, true),
        _ => {}
    });
}

fn wrapper_code(script_type: &str, old_name: &str, new_name: &str) -> Option<String> {
    match script_type {
        "python" => Some(format!(
            "register_module_line('{old_name}', 'start', __line__())\n\n\
             return_results(demisto.executeCommand('{new_name}', demisto.args()))\n\n\
             register_module_line('{old_name}', 'end', __line__())"
        )),
        "javascript" => Some(format!("return executeCommand('{new_name}', args)\n")),
        _ => None,
    }
}

fn rename_script(item: &mut ContentItem, outcome: &mut TermOutcome) {
    let old_name = item.body.get_str("name").unwrap_or(item.id.as_str()).to_string();
    let old_id = item.id.clone();
    let new_name = substitute(&old_name, true);
    let new_id = substitute(&old_id, true);
    if new_name == unwrap(&old_name) && new_id == unwrap(&old_id) {
        return;
    }

    let script_type = item.body.get_str("type").unwrap_or_default().to_string();
    match wrapper_code(&script_type, &old_name, &new_name) {
        Some(code) => {
            let mut wrapper = item.clone();
            wrapper.body.set_str("script", code);
            wrapper.body.set("deprecated", Value::Bool(true));
            for_each_string(wrapper.body.root_mut(), &mut |_, s| {
                if s.contains("<-") {
                    *s = unwrap(s);
                }
            });
            wrapper.id = unwrap(&old_id);
            debug!(script = %new_name, wrapper = %wrapper.id, "created wrapper script");
            outcome.wrapper = Some(wrapper);
        }
        None => outcome.warnings.push(unify::specialization_failed(
            old_id.clone(),
            format!("no wrapper script for type '{script_type}'; the old name is not kept"),
        )),
    }

    if let Some(Value::String(code)) = item.body.get_mut("script") {
        for state in ["start", "end"] {
            *code = code.replace(
                &format!("register_module_line('{old_name}', '{state}', __line__())"),
                &format!("register_module_line('{new_name}', '{state}', __line__())"),
            );
        }
    }
    item.body.set_str("name", new_name);
    if let Some(Value::String(id)) = item.body.get_mut("commonfields.id") {
        *id = to_alert(id);
    }
    if item.body.get_str("id").is_some() {
        item.body.set_str("id", new_id.clone());
    }
    if !item.body.contains("deprecated") {
        item.body.set("deprecated", Value::Bool(false));
    }

    let renamed_output = to_alert(&item.output_name);
    item.output_name = if renamed_output == item.output_name {
        naming::output_name(ContentKind::Script, &format!("{}.yml", new_id.replace(' ', "")))
    } else {
        renamed_output
    };
    if old_id != old_name {
        outcome.renamed_from.push(old_id);
    }
    outcome.renamed_from.insert(0, old_name);
}

//! Integration parameters hidden on some marketplaces only

use serde_yaml::Value;

use crate::domain::{ContentItem, ContentKind, Marketplace};

const CREDENTIALS_TYPE: u64 = 9;

fn hidden_on(list: &[Value], target: Marketplace) -> bool {
    list.iter()
        .filter_map(Value::as_str)
        .filter_map(|name| name.parse::<Marketplace>().ok())
        .any(|mp| mp.covers(target))
}

/// Turn `hidden: [marketplaces]` into a boolean for `target`.
///
/// Credentials parameters get `hiddenusername` and `hiddenpassword` instead.
pub fn apply(item: &mut ContentItem, target: Marketplace) {
    if item.kind != ContentKind::Integration {
        return;
    }
    let Some(Value::Sequence(params)) = item.body.get_mut("configuration") else {
        return;
    };
    for param in params.iter_mut() {
        let Some(map) = param.as_mapping_mut() else {
            continue;
        };
        let hidden = match map.get("hidden") {
            Some(Value::Sequence(list)) => hidden_on(list, target),
            _ => continue,
        };
        let is_credentials = map.get("name").and_then(Value::as_str) == Some("credentials")
            && map.get("type").and_then(Value::as_u64) == Some(CREDENTIALS_TYPE);
        if is_credentials {
            map.shift_remove("hidden");
            map.insert("hiddenusername".into(), Value::Bool(hidden));
            map.insert("hiddenpassword".into(), Value::Bool(hidden));
        } else {
            map.insert("hidden".into(), Value::Bool(hidden));
        }
    }
}

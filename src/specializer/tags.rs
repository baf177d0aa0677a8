//! Marketplace text tags such as `<~XSIAM>only on XSIAM</~XSIAM>`

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::domain::Marketplace;

struct TextTag {
    pattern: Regex,
    applies: fn(Marketplace) -> bool,
}

fn tag(name: &str, applies: fn(Marketplace) -> bool) -> TextTag {
    let pattern = Regex::new(&format!(r"(?s)<~{name}>(.*?)</~{name}>")).expect("text tag regex");
    TextTag { pattern, applies }
}

static TEXT_TAGS: LazyLock<Vec<TextTag>> = LazyLock::new(|| {
    vec![
        tag("XSOAR", Marketplace::is_xsoar_family),
        tag("XSOAR_SAAS", |m| m == Marketplace::XsoarSaas),
        tag("XSOAR_ON_PREM", |m| {
            matches!(m, Marketplace::XsoarOnPrem | Marketplace::Xsoar)
        }),
        tag("XSIAM", |m| m == Marketplace::MarketplaceV2),
        tag("XPANSE", |m| m == Marketplace::Xpanse),
    ]
});

/// Keep the blocks meant for `target` without their tags and drop the rest
pub fn apply(text: &str, target: Marketplace) -> Cow<'_, str> {
    if !text.contains("<~") {
        return Cow::Borrowed(text);
    }
    let mut out = text.to_string();
    for tag in TEXT_TAGS.iter() {
        let keep = (tag.applies)(target);
        out = tag
            .pattern
            .replace_all(&out, |caps: &Captures<'_>| {
                if keep {
                    caps.get(1).map_or("", |m| m.as_str()).to_string()
                } else {
                    String::new()
                }
            })
            .into_owned();
    }
    Cow::Owned(out)
}

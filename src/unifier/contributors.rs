//! Contribution notices for partner, developer and community packs

use std::sync::LazyLock;

use regex::Regex;

use crate::document::ScalarStyle;
use crate::domain::{ContentItem, PackMetadata, SupportLevel};

const COMMUNITY_DETAILED_DESCRIPTION: &str = "### Community Contributed Integration\n \
     #### Integration Author: {author}\n \
     No support or maintenance is provided by the author. Customers are encouraged \
     to engage with the user community for questions and guidance at the \
     [Cortex XSOAR Live Discussions](https://live.paloaltonetworks.com/\
     t5/cortex-xsoar-discussions/bd-p/Cortex_XSOAR_Discussions).";

static CONTRIBUTED_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"### .* Contributed Integration").expect("contributed header regex"));

/// The block placed above the detailed description
pub fn contributor_description(metadata: &PackMetadata, title: &str) -> String {
    if metadata.support == SupportLevel::Community {
        return COMMUNITY_DETAILED_DESCRIPTION.replace("{author}", &metadata.author);
    }
    let mut text = format!(
        "### {title} Contributed Integration\n\
         #### Integration Author: {}\n\
         Support and maintenance for this integration are provided by the author. \
         Please use the following contact details:",
        metadata.author
    );
    for email in &metadata.emails {
        text.push_str(&format!("\n- **Email**: [{email}](mailto:{email})"));
    }
    if let Some(url) = &metadata.url {
        text.push_str(&format!("\n- **URL**: [{url}]({url})"));
    }
    text
}

/// Mark an integration as contributed when the pack is not vendor supported
pub fn add_support(item: &mut ContentItem, metadata: &PackMetadata) {
    let Some(title) = metadata.support.contribution_title() else {
        return;
    };

    if let Some(display) = item.body.get_str("display") {
        if !display.contains(" Contribution)") {
            let display = format!("{display} ({title} Contribution)");
            item.body.set_str("display", display);
        }
    }

    let existing = item
        .body
        .get_str("detaileddescription")
        .unwrap_or_default()
        .to_string();
    if CONTRIBUTED_HEADER.is_match(&existing) {
        return;
    }
    let description = format!(
        "{}\n***\n{existing}",
        contributor_description(metadata, title)
    );
    item.body
        .set_styled("detaileddescription", description, ScalarStyle::Folded);
}

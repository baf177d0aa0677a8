//! README image links rewritten to the marketplace's storage paths

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::domain::Marketplace;

static MARKDOWN_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[(?P<alt>[^\]]*)\]\((?P<url>[^)\s]+)(?P<title>\s+"[^"]*")?\)"#)
        .expect("markdown image regex")
});

const STORAGE_BASE: &str = "https://storage.googleapis.com";
const SERVER_API_PREFIX: &str = "api/marketplace/file?name=content/packs";
const DOC_FILES: &str = "doc_files";

/// One rewritten image link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadmeImage {
    pub original_url: String,
    pub new_url: String,
    pub image_name: String,
    /// Whether the image lives outside the pack and must be fetched
    pub is_external: bool,
}

/// Where a pack's README images are served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLocation {
    pub marketplace: Marketplace,
    pub pack_id: String,
    pub bucket: String,
}

impl ImageLocation {
    pub fn new(marketplace: Marketplace, pack_id: impl Into<String>) -> Self {
        Self {
            marketplace,
            pack_id: pack_id.into(),
            bucket: marketplace.default_bucket().to_string(),
        }
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    fn base(&self) -> String {
        if self.marketplace.serves_images_via_api() {
            format!("{SERVER_API_PREFIX}/{}/{DOC_FILES}", self.pack_id)
        } else {
            format!(
                "{STORAGE_BASE}/{}/content/packs/{}/{DOC_FILES}",
                self.bucket, self.pack_id
            )
        }
    }

    /// Final URL of an image
    pub fn url_for(&self, image_name: &str) -> String {
        format!("{}/{image_name}", self.base())
    }
}

fn is_external(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Last path segment of a URL, ignoring query and fragment
fn image_name(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

fn refers_to_doc_files(url: &str) -> bool {
    !is_external(url) && url.split('/').any(|segment| segment == DOC_FILES)
}

/// Rewrite image links in `text`, returning the new text and what changed.
///
/// External links and relative `doc_files` links move to the marketplace
/// location; links already pointing there are left alone.
pub fn rewrite(text: &str, location: &ImageLocation) -> (String, Vec<ReadmeImage>) {
    let base = location.base();
    let mut images = Vec::new();
    let rewritten = MARKDOWN_IMAGE.replace_all(text, |caps: &Captures<'_>| {
        let whole = caps.get(0).map_or("", |m| m.as_str()).to_string();
        let Some(url) = caps.name("url").map(|m| m.as_str()) else {
            return whole;
        };
        if url.starts_with(&base) || !(is_external(url) || refers_to_doc_files(url)) {
            return whole;
        }
        let Some(name) = image_name(url) else {
            return whole;
        };
        let new_url = location.url_for(name);
        images.push(ReadmeImage {
            original_url: url.to_string(),
            new_url: new_url.clone(),
            image_name: name.to_string(),
            is_external: is_external(url),
        });
        let alt = caps.name("alt").map_or("", |m| m.as_str());
        let title = caps.name("title").map_or("", |m| m.as_str());
        format!("![{alt}]({new_url}{title})")
    });
    (rewritten.into_owned(), images)
}

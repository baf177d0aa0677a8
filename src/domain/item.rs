//! Content items: one piece of content inside a pack

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde_yaml::Value;

use super::kind::{ContentKind, Section};
use super::marketplace::Marketplace;
use super::version::Version;
use crate::document::Document;

/// Files that travel with an item and get folded into it on unification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SidecarKind {
    Code,
    UnitTest,
    Image,
    Description,
    Readme,
    Changelog,
    Schema,
    SampleData,
    RuleSource,
}

impl SidecarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SidecarKind::Code => "code",
            SidecarKind::UnitTest => "unit test",
            SidecarKind::Image => "image",
            SidecarKind::Description => "description",
            SidecarKind::Readme => "README",
            SidecarKind::Changelog => "CHANGELOG",
            SidecarKind::Schema => "schema",
            SidecarKind::SampleData => "sample data",
            SidecarKind::RuleSource => "rule source",
        }
    }
}

impl fmt::Display for SidecarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who supports a pack or item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SupportLevel {
    #[default]
    Xsoar,
    Partner,
    Developer,
    Community,
    Nonsupported,
}

impl SupportLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SupportLevel::Xsoar => "xsoar",
            SupportLevel::Partner => "partner",
            SupportLevel::Developer => "developer",
            SupportLevel::Community => "community",
            SupportLevel::Nonsupported => "nonsupported",
        }
    }

    /// Title used in contribution notices, for contributor support levels only
    pub fn contribution_title(self) -> Option<&'static str> {
        match self {
            SupportLevel::Partner => Some("Partner"),
            SupportLevel::Developer => Some("Developer"),
            SupportLevel::Community => Some("Community"),
            _ => None,
        }
    }
}

impl FromStr for SupportLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xsoar" => Ok(SupportLevel::Xsoar),
            "partner" => Ok(SupportLevel::Partner),
            "developer" => Ok(SupportLevel::Developer),
            "community" => Ok(SupportLevel::Community),
            "nonsupported" => Ok(SupportLevel::Nonsupported),
            other => Err(format!("invalid support level '{other}'")),
        }
    }
}

impl fmt::Display for SupportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub kind: ContentKind,
    pub section: Section,
    pub id: String,
    pub display_name: String,
    /// Primary file, relative to the pack root
    pub path: PathBuf,
    pub body: Document,
    pub sidecars: BTreeMap<SidecarKind, PathBuf>,
    pub from_version: Version,
    pub to_version: Version,
    /// Empty means every marketplace
    pub marketplaces: BTreeSet<Marketplace>,
    pub support_level: SupportLevel,
    pub is_unified: bool,
    pub specialized_for: Option<Marketplace>,
    /// File name inside the section directory of the pack zip
    pub output_name: String,
    /// README text shipped beside the item
    pub readme: Option<String>,
}

/// Fields read back out of an item body
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Identity {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub from_version: Version,
    pub to_version: Version,
    pub marketplaces: BTreeSet<Marketplace>,
    pub unknown_marketplaces: Vec<String>,
}

impl ContentItem {
    /// Whether this item ships to `target`
    pub fn ships_to(&self, target: Marketplace) -> bool {
        self.marketplaces.is_empty() || self.marketplaces.iter().any(|m| m.covers(target))
    }

    /// Display path for diagnostics
    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    /// Re-read id, name and versions after the body changed
    pub fn refresh_identity(&mut self) -> Result<(), String> {
        let identity = read_identity(self.kind, &self.body)?;
        if let Some(id) = identity.id {
            self.id = id;
        }
        if let Some(name) = identity.display_name {
            self.display_name = name;
        }
        self.from_version = identity.from_version;
        self.to_version = identity.to_version;
        self.marketplaces = identity.marketplaces;
        Ok(())
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn version_field(body: &Document, keys: [&str; 2], default: Version) -> Result<Version, String> {
    keys.iter()
        .find_map(|k| body.get(k).and_then(scalar_string))
        .filter(|s| !s.trim().is_empty())
        .map_or(Ok(default), |s| s.parse())
}

/// Extract id, display name, version range and marketplaces from a body
pub fn read_identity(kind: ContentKind, body: &Document) -> Result<Identity, String> {
    let id = if kind.id_under_commonfields() {
        body.get("commonfields.id").and_then(scalar_string)
    } else {
        body.get("id").and_then(scalar_string)
    };
    let display_name = body
        .get_str("display")
        .filter(|_| kind == ContentKind::Integration)
        .or_else(|| body.get_str("name"))
        .or_else(|| body.get_str("brandName"))
        .map(str::to_string);

    let from_version = version_field(body, ["fromversion", "fromVersion"], Version::MIN)?;
    let to_version = version_field(body, ["toversion", "toVersion"], Version::MAX)?;
    if from_version > to_version {
        return Err(format!(
            "fromversion {from_version} is greater than toversion {to_version}"
        ));
    }

    let mut marketplaces = BTreeSet::new();
    let mut unknown_marketplaces = Vec::new();
    if let Some(Value::Sequence(list)) = body.get("marketplaces") {
        for entry in list.iter().filter_map(Value::as_str) {
            match entry.parse::<Marketplace>() {
                Ok(mp) => {
                    marketplaces.insert(mp);
                }
                Err(_) => unknown_marketplaces.push(entry.to_string()),
            }
        }
    }

    Ok(Identity {
        id,
        display_name,
        from_version,
        to_version,
        marketplaces,
        unknown_marketplaces,
    })
}

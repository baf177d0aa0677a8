//! Run configuration.
//!
//! Settings come from command-line flags (which clap already merges with
//! their environment variables), then an optional `packsmith.yaml` at the
//! content root, then built-in defaults.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Marketplace;
use crate::error::{PackError, Result, fs};

/// Configuration file name, looked up at the content root
pub const CONFIG_FILE: &str = "packsmith.yaml";

/// Upper bound on the default worker count
pub const MAX_DEFAULT_WORKERS: usize = 10;

/// Packs that are never zipped
pub const ALWAYS_IGNORED_PACKS: [&str; 1] = ["ApiModules"];

/// `packsmith.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,

    /// Marketplace name to storage bucket for README image URLs
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bucket_overrides: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_packs: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Parse configuration from YAML; `path` names the source in errors
    pub fn from_yaml(yaml: &str, path: &Path) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| invalid(path, e.to_string()))
    }

    /// Load `packsmith.yaml` from `content_root`, if present
    pub fn load(content_root: &Path) -> Result<Option<Self>> {
        let path = content_root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        if text.trim().is_empty() {
            return Ok(Some(Self::default()));
        }
        Self::from_yaml(&text, &path).map(Some)
    }
}

fn invalid(path: &Path, reason: impl Into<String>) -> PackError {
    PackError::ConfigInvalid {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Values taken from flags or the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub marketplace: Option<Marketplace>,
    pub workers: Option<usize>,
    /// `--strict` can only switch strict mode on
    pub strict: bool,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub marketplace: Marketplace,
    pub workers: usize,
    pub strict: bool,
    pub buckets: BTreeMap<Marketplace, String>,
    pub ignored_packs: BTreeSet<String>,
    pub timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            marketplace: Marketplace::Xsoar,
            workers: default_workers(),
            strict: false,
            buckets: BTreeMap::new(),
            ignored_packs: ALWAYS_IGNORED_PACKS.iter().map(|p| (*p).to_string()).collect(),
            timeout: None,
        }
    }
}

impl Settings {
    /// Merge overrides over the file over defaults
    pub fn resolve(overrides: &Overrides, file: Option<&ConfigFile>) -> Result<Self> {
        let mut settings = Self::default();
        let source = PathBuf::from(CONFIG_FILE);

        if let Some(file) = file {
            if let Some(name) = &file.marketplace {
                settings.marketplace = name
                    .parse()
                    .map_err(|_| invalid(&source, format!("unknown marketplace '{name}'")))?;
            }
            if let Some(workers) = file.workers {
                settings.workers = workers;
            }
            if let Some(strict) = file.strict {
                settings.strict = strict;
            }
            for (name, bucket) in &file.bucket_overrides {
                let marketplace: Marketplace = name.parse().map_err(|_| {
                    invalid(&source, format!("unknown marketplace '{name}' in bucket_overrides"))
                })?;
                settings.buckets.insert(marketplace, bucket.clone());
            }
            settings.ignored_packs.extend(file.ignored_packs.iter().cloned());
            settings.timeout = file.timeout_secs.map(Duration::from_secs);
        }

        if let Some(marketplace) = overrides.marketplace {
            settings.marketplace = marketplace;
        }
        if let Some(workers) = overrides.workers {
            settings.workers = workers;
        }
        settings.strict |= overrides.strict;
        if let Some(secs) = overrides.timeout_secs {
            settings.timeout = Some(Duration::from_secs(secs));
        }

        if settings.workers == 0 {
            return Err(PackError::InvalidInvocation {
                message: "worker count must be at least 1".to_string(),
            });
        }
        Ok(settings)
    }

    /// Storage bucket for README images of the target marketplace
    pub fn bucket(&self) -> &str {
        self.buckets
            .get(&self.marketplace)
            .map_or_else(|| self.marketplace.default_bucket(), String::as_str)
    }

    pub fn is_ignored(&self, pack_id: &str) -> bool {
        self.ignored_packs.contains(pack_id)
    }
}

/// Hardware threads, capped at [`MAX_DEFAULT_WORKERS`]
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map_or(1, std::num::NonZeroUsize::get)
        .min(MAX_DEFAULT_WORKERS)
}

/// Parse a manifest timestamp given as RFC 3339 or unix seconds
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(secs) = text.parse::<i64>() {
        return Utc.timestamp_opt(secs, 0).single().ok_or_else(|| {
            PackError::InvalidInvocation {
                message: format!("timestamp {secs} is out of range"),
            }
        });
    }
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| PackError::InvalidInvocation {
            message: format!("invalid timestamp '{text}': {e}"),
        })
}

/// Timestamp format written into metadata and the manifest
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

//! Shared state for one pipeline run.
//!
//! Built once by the driver and lent to every worker: the parse and
//! ApiModule caches, the diagnostic sink, the cancellation flag and the
//! resolved settings.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::Settings;
use crate::diagnostics::DiagnosticSink;
use crate::domain::{Marketplace, PackMetadata};
use crate::loader::ParseCache;
use crate::pool::CancellationToken;
use crate::specializer::Specializer;
use crate::unifier::{ApiModuleCache, UnifyContext, UnifyOptions};

#[derive(Debug)]
pub struct PipelineContext {
    /// Directory holding `Packs/`
    pub content_root: PathBuf,
    pub settings: Settings,
    pub unify_options: UnifyOptions,
    /// Written into metadata and the outer manifest
    pub timestamp: DateTime<Utc>,
    pub parse_cache: ParseCache,
    pub api_modules: ApiModuleCache,
    pub diagnostics: DiagnosticSink,
    pub cancel: CancellationToken,
}

impl PipelineContext {
    pub fn new(content_root: impl Into<PathBuf>, settings: Settings, timestamp: DateTime<Utc>) -> Self {
        Self {
            content_root: content_root.into(),
            settings,
            unify_options: UnifyOptions {
                stamp_version: true,
                ..UnifyOptions::default()
            },
            timestamp,
            parse_cache: ParseCache::new(),
            api_modules: ApiModuleCache::new(),
            diagnostics: DiagnosticSink::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_unify_options(mut self, options: UnifyOptions) -> Self {
        self.unify_options = options;
        self
    }

    pub fn marketplace(&self) -> Marketplace {
        self.settings.marketplace
    }

    pub fn packs_dir(&self) -> PathBuf {
        self.content_root.join("Packs")
    }

    pub fn pack_root(&self, pack_id: &str) -> PathBuf {
        self.packs_dir().join(pack_id)
    }

    /// Unifier view of this context for one pack
    pub fn unify_context<'a>(
        &'a self,
        pack_root: &'a Path,
        metadata: &'a PackMetadata,
    ) -> UnifyContext<'a> {
        UnifyContext {
            content_root: &self.content_root,
            pack_root,
            metadata,
            parse_cache: &self.parse_cache,
            api_modules: &self.api_modules,
            options: &self.unify_options,
        }
    }

    /// Fresh specializer for one pack, using the configured bucket
    pub fn specializer(&self, pack_id: &str) -> Specializer {
        Specializer::new(self.marketplace(), pack_id).with_bucket(self.settings.bucket())
    }
}

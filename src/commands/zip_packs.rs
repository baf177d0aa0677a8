//! Zip-packs command: prepare packs in parallel and write their archives

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use crate::assembler;
use crate::cli::ZipPacksArgs;
use crate::commands::{self, Status};
use crate::config::{self, ConfigFile, Overrides, Settings};
use crate::context::PipelineContext;
use crate::error::{PackError, Result};
use crate::pool::{PackJob, WorkerPool};
use crate::progress::ProgressDisplay;
use crate::zipper::{self, PackArchive};

/// Turn a pack argument into a pack directory.
///
/// Bare names resolve under `<content_root>/Packs/`; anything else is a path.
fn pack_dir(content_root: &Path, arg: &str) -> Result<PathBuf> {
    let as_path = PathBuf::from(arg);
    let candidate = if as_path.components().count() == 1 && !as_path.is_dir() {
        content_root.join("Packs").join(arg)
    } else {
        as_path
    };
    if !candidate.is_dir() {
        return Err(PackError::InvalidInvocation {
            message: format!("pack '{arg}' not found at '{}'", candidate.display()),
        });
    }
    Ok(dunce::canonicalize(&candidate)?)
}

/// Jobs for the requested packs, minus ignored and repeated ones
fn pack_jobs(content_root: &Path, settings: &Settings, args: &[String]) -> Result<Vec<PackJob>> {
    let mut seen = BTreeSet::new();
    let mut jobs = Vec::new();
    for arg in args {
        let job = PackJob::from_root(pack_dir(content_root, arg)?);
        if settings.is_ignored(&job.pack_id) {
            info!(pack = %job.pack_id, "pack is ignored, skipping");
            continue;
        }
        if seen.insert(job.root.clone()) {
            jobs.push(job);
        }
    }
    Ok(jobs)
}

/// Run zip-packs command
pub fn run(content_root: Option<PathBuf>, args: ZipPacksArgs) -> Result<Status> {
    let content_root = commands::content_root(content_root)?;
    let overrides = Overrides {
        marketplace: commands::parse_marketplace(args.marketplace.as_deref())?,
        workers: args.workers,
        strict: args.strict,
        timeout_secs: args.timeout,
    };
    let file = ConfigFile::load(&content_root)?;
    let settings = Settings::resolve(&overrides, file.as_ref())?;
    let timestamp = match args.timestamp.as_deref() {
        Some(text) => config::parse_timestamp(text)?,
        None => Utc::now(),
    };

    let jobs = pack_jobs(&content_root, &settings, &args.packs)?;
    let zip_all = args.zip_all || jobs.len() > 1;
    let strict = settings.strict;
    let marketplace = settings.marketplace;
    let pool = WorkerPool::new(settings.workers);
    let ctx = PipelineContext::new(&content_root, settings, timestamp);
    if let Some(timeout) = ctx.settings.timeout {
        ctx.cancel.cancel_after(timeout);
    }

    // Pack zips go to a scratch directory when they are collected afterwards.
    let staging = if zip_all {
        Some(tempfile::TempDir::new()?)
    } else {
        None
    };
    let pack_zip_dir = staging
        .as_ref()
        .map_or_else(|| args.output.clone(), |dir| dir.path().to_path_buf());
    debug!(
        packs = jobs.len(),
        marketplace = %marketplace,
        zip_all,
        dir = %pack_zip_dir.display(),
        "zipping packs"
    );

    let progress = ProgressDisplay::new(jobs.len() as u64);
    let results = pool.run(&jobs, &ctx.cancel, &ctx.diagnostics, &progress, |job| {
        let prepared = assembler::assemble(&ctx, job)?;
        zipper::write_pack_zip(&prepared, &pack_zip_dir).inspect_err(|err| {
            if matches!(err, PackError::PackingFailed { .. }) {
                ctx.cancel.cancel();
            }
        })
    });
    let results = match results {
        Ok(results) => results,
        Err(err) => {
            progress.abandon();
            return Err(err);
        }
    };
    progress.finish();

    let any_pack_failed = results.iter().any(Option::is_none);
    let archives: Vec<PackArchive> = results.into_iter().flatten().collect();

    if zip_all && !archives.is_empty() {
        match zipper::write_uploadable(&archives, &args.output, marketplace, &timestamp) {
            Ok(path) => println!("{}", path.display()),
            Err(err) => ctx.diagnostics.record(None, None, &err),
        }
    } else {
        for archive in &archives {
            println!("{}", archive.path.display());
        }
    }

    let diagnostics = ctx.diagnostics.snapshot();
    let failed = commands::report(&diagnostics, strict) || any_pack_failed;
    Ok(Status::from_failed(failed))
}

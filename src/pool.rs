//! Bounded worker pool over packs.
//!
//! Each worker takes one pack at a time end to end. Results come back in
//! input order; failures, panics and cancellation leave `None` in the
//! pack's slot and a diagnostic on the sink.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{PackError, Result};
use crate::progress::ProgressDisplay;

/// Cooperative cancellation flag shared by all workers
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return `Err(Cancelled)` once the flag is set
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PackError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Cancel from a background thread once `timeout` elapses
    pub fn cancel_after(&self, timeout: Duration) {
        let token = self.clone();
        std::thread::spawn(move || {
            std::thread::sleep(timeout);
            if !token.is_cancelled() {
                warn!(timeout_secs = timeout.as_secs(), "pipeline timeout reached, cancelling");
                token.cancel();
            }
        });
    }
}

/// One pack to process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackJob {
    pub pack_id: String,
    pub root: PathBuf,
}

impl PackJob {
    /// Job for the pack directory `root`, named after its folder
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let pack_id = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { pack_id, root }
    }
}

/// Fixed-size pool of pack workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    workers: usize,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `process` over `jobs`, returning one slot per job in input order.
    ///
    /// Jobs not yet started when `token` is cancelled are skipped, and a
    /// single `Cancelled` diagnostic is recorded.
    pub fn run<T, F>(
        &self,
        jobs: &[PackJob],
        token: &CancellationToken,
        sink: &DiagnosticSink,
        progress: &ProgressDisplay,
        process: F,
    ) -> Result<Vec<Option<T>>>
    where
        T: Send,
        F: Fn(&PackJob) -> Result<T> + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("packsmith-worker-{i}"))
            .build()
            .map_err(|e| PackError::IoError {
                message: format!("failed to start worker pool: {e}"),
            })?;
        debug!(workers = self.workers, packs = jobs.len(), "starting worker pool");

        let results: Vec<Option<T>> = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    if token.is_cancelled() {
                        debug!(pack = %job.pack_id, "skipped after cancellation");
                        return None;
                    }
                    let outcome = catch_unwind(AssertUnwindSafe(|| process(job)));
                    progress.pack_done(&job.pack_id);
                    match outcome {
                        Ok(Ok(value)) => Some(value),
                        Ok(Err(PackError::Cancelled)) => None,
                        Ok(Err(err)) => {
                            warn!(pack = %job.pack_id, error = %err, "pack failed");
                            sink.record(Some(&job.pack_id), None, &err);
                            None
                        }
                        Err(payload) => {
                            let err = PackError::WorkerPanicked {
                                pack: job.pack_id.clone(),
                                message: panic_message(payload.as_ref()),
                            };
                            sink.record(Some(&job.pack_id), None, &err);
                            None
                        }
                    }
                })
                .collect()
        });

        if token.is_cancelled() {
            sink.push(Diagnostic::from_error(&PackError::Cancelled));
        }
        Ok(results)
    }
}

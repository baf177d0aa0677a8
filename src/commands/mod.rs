//! Command implementations for Packsmith CLI

pub mod classify;
pub mod completions;
pub mod prepare;
pub mod preserve_fields;
pub mod version;
pub mod zip_packs;

use std::path::{Path, PathBuf};

use crate::diagnostics::{self, Diagnostic};
use crate::domain::Marketplace;
use crate::error::{PackError, Result};

/// Exit code for a failed run
pub const EXIT_FAILED: i32 = 1;
/// Exit code for a bad invocation
pub const EXIT_INVOCATION: i32 = 2;

/// How a command finished when it did not return an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failed,
}

impl Status {
    pub fn from_failed(failed: bool) -> Self {
        if failed { Status::Failed } else { Status::Success }
    }

    pub fn code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Failed => EXIT_FAILED,
        }
    }
}

/// Exit code for an error that escaped a command
pub fn error_code(err: &PackError) -> i32 {
    if err.is_invocation_error() {
        EXIT_INVOCATION
    } else {
        EXIT_FAILED
    }
}

/// Resolve `--content-root`, defaulting to the current directory
pub(crate) fn content_root(flag: Option<PathBuf>) -> Result<PathBuf> {
    let root = match flag {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    if !root.is_dir() {
        return Err(PackError::InvalidInvocation {
            message: format!("content root '{}' is not a directory", root.display()),
        });
    }
    Ok(dunce::canonicalize(&root)?)
}

/// Canonicalize a path argument that must exist
pub(crate) fn existing_path(path: &Path, what: &str) -> Result<PathBuf> {
    if !path.exists() {
        return Err(PackError::InvalidInvocation {
            message: format!("{what} '{}' does not exist", path.display()),
        });
    }
    Ok(dunce::canonicalize(path)?)
}

pub(crate) fn parse_marketplace(value: Option<&str>) -> Result<Option<Marketplace>> {
    value.map(str::parse).transpose()
}

/// Print diagnostics to stderr and report whether they fail the run
pub(crate) fn report(diagnostics: &[Diagnostic], strict: bool) -> bool {
    if !diagnostics.is_empty() {
        eprint!("{}", diagnostics::render(diagnostics));
    }
    diagnostics::has_failures(diagnostics, strict)
}

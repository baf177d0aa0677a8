//! Preserve-fields command: keep local-only fields across a re-download

use std::path::Path;

use tracing::info;

use crate::cli::PreserveFieldsArgs;
use crate::commands::{self, Status};
use crate::document::{Document, DocumentFormat};
use crate::error::{PackError, Result, fs};
use crate::loader;

fn read_document(path: &Path) -> Result<Document> {
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(DocumentFormat::from_extension)
        .ok_or_else(|| PackError::InvalidInvocation {
            message: format!("'{}' is not a YAML or JSON file", path.display()),
        })?;
    let text = fs::read_to_string(path)?;
    Document::parse(&text, format).map_err(|e| PackError::LoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Run preserve-fields command
pub fn run(args: &PreserveFieldsArgs) -> Result<Status> {
    let local_path = commands::existing_path(&args.local, "local file")?;
    let downloaded_path = commands::existing_path(&args.downloaded, "downloaded file")?;

    let local = read_document(&local_path)?;
    let mut downloaded = read_document(&downloaded_path)?;
    let written = loader::merge_preserved_fields(&local, &mut downloaded);
    if written.is_empty() {
        println!("No fields to preserve");
        return Ok(Status::Success);
    }

    fs::write(&downloaded_path, downloaded.to_text()?)?;
    info!(path = %downloaded_path.display(), fields = written.len(), "preserved local fields");
    for field in written {
        println!("{field}");
    }
    Ok(Status::Success)
}

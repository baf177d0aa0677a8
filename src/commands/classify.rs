//! Classify command: report what each path is inside a pack

use std::path::{Path, PathBuf};

use console::Style;

use crate::classifier::{self, Classification};
use crate::cli::ClassifyArgs;
use crate::commands::Status;
use crate::error::{PackError, Result};

/// One output line for a classified path
pub(crate) fn describe(path: &Path, classification: &Classification) -> String {
    let role = if classification.is_item() {
        "item"
    } else {
        "file"
    };
    format!(
        "{}: {} {:?} in pack {}",
        path.display(),
        role,
        classification.kind,
        classification.pack_id
    )
}

fn resolve(content_root: Option<&Path>, path: &Path) -> PathBuf {
    match content_root {
        Some(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    }
}

/// Run classify command
pub fn run(content_root: Option<PathBuf>, args: &ClassifyArgs) -> Result<Status> {
    let error_style = Style::new().red();
    let mut failed = false;
    for arg in &args.paths {
        let path = resolve(content_root.as_deref(), arg);
        let is_dir = path.is_dir();
        match classifier::classify_entry(&path, is_dir) {
            Ok(classification) => println!("{}", describe(arg, &classification)),
            Err(err) => {
                failed = true;
                let err: PackError = err.at(arg.display().to_string());
                println!(
                    "{}: {} [{}]",
                    arg.display(),
                    error_style.apply_to(err.to_string()),
                    err.rule_id()
                );
            }
        }
    }
    Ok(Status::from_failed(failed))
}

//! Path classification errors

use miette::Diagnostic;
use thiserror::Error;

use super::PackError;

/// Why a path does not fit the pack directory grammar
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path is not inside a Packs/<pack> directory")]
    #[diagnostic(code(packsmith::path::outside_packs))]
    PathOutsidePacks,

    #[error("'{name}' is not allowed directly under the pack root")]
    #[diagnostic(
        code(packsmith::path::invalid_depth_zero_file),
        help(
            "Allowed: pack_metadata.json, README.md, CHANGELOG.md, .pack-ignore, \
             .secrets-ignore, Author_image.png, pack_metadata.md, version_config.json"
        )
    )]
    InvalidDepthZeroFile { name: String },

    #[error("'{folder}' is not a known pack section")]
    #[diagnostic(code(packsmith::path::depth_one_folder))]
    DepthOneFolderError { folder: String },

    #[error("'{name}' cannot sit directly under '{folder}'")]
    #[diagnostic(
        code(packsmith::path::depth_one_file),
        help("Items in this section must live in their own item directory")
    )]
    DepthOneFileError { folder: String, name: String },

    #[error("path is a folder, not a file")]
    #[diagnostic(code(packsmith::path::is_folder))]
    PathIsFolder,

    #[error("'{name}' is already unified")]
    #[diagnostic(
        code(packsmith::path::is_unified),
        help("Unified files cannot be unified again; keep the split item directory instead")
    )]
    PathIsUnified { name: String },

    #[error("path is under DeprecatedContent")]
    #[diagnostic(code(packsmith::path::deprecated_content))]
    PathUnderDeprecatedContent,

    #[error("cannot tell what '{name}' in '{folder}' is")]
    #[diagnostic(code(packsmith::path::unrecognized_kind))]
    UnrecognizedContentKind { folder: String, name: String },
}

impl PathError {
    /// Attach the offending path, producing a crate-level error
    pub fn at(self, path: impl Into<String>) -> PackError {
        PackError::PathClassification {
            path: path.into(),
            source: self,
        }
    }
}

//! Error types and handling for Packsmith
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`path`]: Path classification errors
//! - [`fs`]: File system errors
//! - [`unify`]: Unification and specialization errors
//!
//! Every [`PackError`] maps onto a [`Severity`] and a stable rule id (its
//! miette code), which is how component boundaries turn failures into
//! entries of the diagnostic channel.

pub mod fs;
pub mod path;
pub mod unify;


pub use path::PathError;

use miette::Diagnostic;
use thiserror::Error;

use crate::diagnostics::Severity;

/// Main error type for Packsmith operations
#[derive(Error, Diagnostic, Debug)]
pub enum PackError {
    // Classification errors
    #[error("Cannot classify '{path}': {source}")]
    #[diagnostic(code(packsmith::path::classification))]
    PathClassification {
        path: String,
        #[source]
        source: PathError,
    },

    // Load errors
    #[error("Failed to load '{path}': {reason}")]
    #[diagnostic(
        code(packsmith::load::failed),
        help("Check that the file is valid YAML or JSON")
    )]
    LoadFailed { path: String, reason: String },

    #[error("Item '{item}' is missing its {sidecar} file")]
    #[diagnostic(code(packsmith::load::missing_sidecar))]
    MissingSidecar { item: String, sidecar: String },

    #[error("Item '{item}' has more than one {sidecar} file: '{first}' and '{second}'")]
    #[diagnostic(
        code(packsmith::load::duplicate_sidecar),
        help("Keep a single file for each sidecar kind")
    )]
    DuplicateSidecar {
        item: String,
        sidecar: String,
        first: String,
        second: String,
    },

    // Unification errors
    #[error("Item '{item}' declares unsupported script type '{script_type}'")]
    #[diagnostic(
        code(packsmith::unify::unsupported_script_type),
        help("Supported script types: python, python2, python3, javascript, powershell")
    )]
    UnsupportedScriptType { item: String, script_type: String },

    #[error("API module import cycle: {chain}")]
    #[diagnostic(code(packsmith::unify::api_module_cycle))]
    ApiModuleCycle { chain: String },

    #[error("API module '{module}' not found at '{path}'")]
    #[diagnostic(code(packsmith::unify::api_module_not_found))]
    ApiModuleNotFound { module: String, path: String },

    #[error("Item '{item}' already has an image that differs from its image file")]
    #[diagnostic(
        code(packsmith::unify::image_collision),
        help("Remove the inline image field or the image file")
    )]
    ImageCollision { item: String },

    #[error("Failed to unify '{item}': {reason}")]
    #[diagnostic(code(packsmith::unify::failed))]
    UnificationFailed { item: String, reason: String },

    // Specialization errors
    #[error("Failed to specialize '{item}': {reason}")]
    #[diagnostic(code(packsmith::specialize::failed))]
    SpecializationFailed { item: String, reason: String },

    #[error("Unknown marketplace: {value}")]
    #[diagnostic(
        code(packsmith::specialize::unknown_marketplace),
        help("Valid marketplaces: xsoar, xsoar_saas, xsoar_on_prem, marketplacev2, xpanse, platform")
    )]
    UnknownMarketplace { value: String },

    // Integrity warnings
    #[error("Duplicate {kind} id '{id}' in pack '{pack}'")]
    #[diagnostic(code(packsmith::integrity::duplicate_id))]
    DuplicateId {
        pack: String,
        kind: String,
        id: String,
    },

    #[error("Item '{item}' references unknown '{reference}'")]
    #[diagnostic(code(packsmith::integrity::unresolved_reference))]
    UnresolvedReference { item: String, reference: String },

    // Metadata errors
    #[error("Invalid metadata for pack '{pack}': {reason}")]
    #[diagnostic(code(packsmith::metadata::invalid))]
    InvalidMetadata { pack: String, reason: String },

    #[error("Pack '{pack}' has no pack_metadata.json")]
    #[diagnostic(
        code(packsmith::metadata::not_found),
        help("Every pack directory needs a pack_metadata.json at its root")
    )]
    MetadataNotFound { pack: String },

    #[error("Pack metadata for '{pack}' is missing required key '{key}'")]
    #[diagnostic(code(packsmith::metadata::missing_key))]
    MissingMetadataKey { pack: String, key: String },

    // Packing errors
    #[error("Failed to write archive '{path}': {reason}")]
    #[diagnostic(code(packsmith::packing::failed))]
    PackingFailed { path: String, reason: String },

    // Pool errors
    #[error("Run cancelled before all packs were processed")]
    #[diagnostic(code(packsmith::pool::cancelled))]
    Cancelled,

    #[error("Worker processing pack '{pack}' panicked: {message}")]
    #[diagnostic(code(packsmith::pool::panicked))]
    WorkerPanicked { pack: String, message: String },

    // Invocation and configuration errors
    #[error("Invalid invocation: {message}")]
    #[diagnostic(code(packsmith::cli::invalid_invocation))]
    InvalidInvocation { message: String },

    #[error("Invalid configuration in '{path}': {reason}")]
    #[diagnostic(
        code(packsmith::config::invalid),
        help("Check packsmith.yaml against the documented keys")
    )]
    ConfigInvalid { path: String, reason: String },

    // File system errors
    #[error("File not found: {path}")]
    #[diagnostic(code(packsmith::fs::not_found))]
    FileNotFound { path: String },

    #[error("Failed to read file '{path}': {reason}")]
    #[diagnostic(code(packsmith::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file '{path}': {reason}")]
    #[diagnostic(code(packsmith::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(packsmith::fs::io_error))]
    IoError { message: String },

    // Serialization errors
    #[error("YAML error: {message}")]
    #[diagnostic(code(packsmith::format::yaml))]
    YamlError { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(packsmith::format::json))]
    JsonError { message: String },
}

impl PackError {
    /// Severity of this failure on the diagnostic channel
    pub fn severity(&self) -> Severity {
        match self {
            Self::DuplicateId { .. }
            | Self::UnresolvedReference { .. }
            | Self::UnknownMarketplace { .. }
            | Self::MissingMetadataKey { .. }
            | Self::Cancelled => Severity::Warning,
            Self::InvalidMetadata { .. }
            | Self::MetadataNotFound { .. }
            | Self::PackingFailed { .. }
            | Self::WorkerPanicked { .. }
            | Self::InvalidInvocation { .. }
            | Self::ConfigInvalid { .. } => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Stable rule id, taken from the miette code.
    ///
    /// Classification failures report the code of the path rule that fired.
    pub fn rule_id(&self) -> String {
        let code = match self {
            Self::PathClassification { source, .. } => source.code(),
            _ => self.code(),
        };
        code.map_or_else(|| "packsmith::unknown".to_string(), |c| c.to_string())
    }

    /// Whether this error came from the invocation itself rather than content
    pub fn is_invocation_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInvocation { .. }
                | Self::UnknownMarketplace { .. }
                | Self::ConfigInvalid { .. }
        )
    }
}

impl From<std::io::Error> for PackError {
    fn from(err: std::io::Error) -> Self {
        PackError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for PackError {
    fn from(err: serde_yaml::Error) -> Self {
        PackError::YamlError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PackError {
    fn from(err: serde_json::Error) -> Self {
        PackError::JsonError {
            message: err.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for PackError {
    fn from(err: zip::result::ZipError) -> Self {
        PackError::PackingFailed {
            path: String::new(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for pretty errors
pub type Result<T> = miette::Result<T, PackError>;

//! File system errors

use std::path::Path;

use super::PackError;

/// Creates a file not found error
pub fn not_found(path: &Path) -> PackError {
    PackError::FileNotFound {
        path: path.display().to_string(),
    }
}

/// Creates a file read failed error
pub fn read_failed(path: &Path, err: &std::io::Error) -> PackError {
    PackError::FileReadFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates a file write failed error
pub fn write_failed(path: &Path, err: &std::io::Error) -> PackError {
    PackError::FileWriteFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates an archive write error
pub fn packing_failed(path: &Path, reason: impl std::fmt::Display) -> PackError {
    PackError::PackingFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Read a UTF-8 file, mapping failures onto crate errors
pub fn read_to_string(path: &Path) -> Result<String, PackError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => not_found(path),
        _ => read_failed(path, &e),
    })
}

/// Read a binary file, mapping failures onto crate errors
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, PackError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => not_found(path),
        _ => read_failed(path, &e),
    })
}

/// Write a file, creating parent directories as needed
pub fn write(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), PackError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| write_failed(parent, &e))?;
    }
    std::fs::write(path, contents).map_err(|e| write_failed(path, &e))
}

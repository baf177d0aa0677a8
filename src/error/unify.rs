//! Unification and specialization errors

use super::PackError;

/// Creates a missing sidecar error
pub fn missing_sidecar(item: impl Into<String>, sidecar: impl Into<String>) -> PackError {
    PackError::MissingSidecar {
        item: item.into(),
        sidecar: sidecar.into(),
    }
}

/// Creates a generic unification error
pub fn failed(item: impl Into<String>, reason: impl Into<String>) -> PackError {
    PackError::UnificationFailed {
        item: item.into(),
        reason: reason.into(),
    }
}

/// Creates a specialization error
pub fn specialization_failed(item: impl Into<String>, reason: impl Into<String>) -> PackError {
    PackError::SpecializationFailed {
        item: item.into(),
        reason: reason.into(),
    }
}

/// Creates an API module cycle error from the import chain
pub fn api_module_cycle(chain: &[String], repeated: &str) -> PackError {
    let mut links: Vec<&str> = chain.iter().map(String::as_str).collect();
    links.push(repeated);
    PackError::ApiModuleCycle {
        chain: links.join(" -> "),
    }
}

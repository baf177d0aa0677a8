//! Diagnostic channel shared by every pipeline component.
//!
//! Workers append to a [`DiagnosticSink`] through a single mutex; the CLI
//! reads a sorted snapshot once the pool has drained.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use console::Style;

use crate::error::PackError;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    /// Errors and fatals fail a run
    pub fn is_failure(self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structured failure record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub pack_id: Option<String>,
    pub path: Option<String>,
    pub rule_id: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            pack_id: None,
            path: None,
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    /// Build a diagnostic from a crate error, keeping its severity and rule id
    pub fn from_error(err: &PackError) -> Self {
        Self::new(err.severity(), err.rule_id(), err.to_string())
    }

    pub fn with_pack(mut self, pack_id: impl Into<String>) -> Self {
        self.pack_id = Some(pack_id.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    fn sort_key(&self) -> (&str, &str, &str) {
        (
            self.pack_id.as_deref().unwrap_or(""),
            self.path.as_deref().unwrap_or(""),
            self.rule_id.as_str(),
        )
    }
}

/// Thread-safe append-only diagnostic collector
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }

    /// Record an error raised while processing `path` inside `pack_id`
    pub fn record(&self, pack_id: Option<&str>, path: Option<&str>, err: &PackError) {
        let mut diagnostic = Diagnostic::from_error(err);
        diagnostic.pack_id = pack_id.map(str::to_string);
        diagnostic.path = path.map(str::to_string);
        self.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stable-ordered copy by (pack id, path, rule id)
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        entries
    }

    /// Apply a rewrite to every recorded diagnostic
    pub fn rewrite(&self, mut f: impl FnMut(&mut Diagnostic)) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for entry in entries.iter_mut() {
            f(entry);
        }
    }
}

/// Whether these diagnostics fail the run
pub fn has_failures(diagnostics: &[Diagnostic], strict: bool) -> bool {
    diagnostics
        .iter()
        .any(|d| d.severity.is_failure() || (strict && d.severity == Severity::Warning))
}

/// Render diagnostics grouped by pack, errors first, then warnings
pub fn render(diagnostics: &[Diagnostic]) -> String {
    let mut packs: Vec<Option<&str>> = diagnostics.iter().map(|d| d.pack_id.as_deref()).collect();
    packs.dedup();
    packs.sort_unstable();
    packs.dedup();

    let header = Style::new().bold();
    let mut out = String::new();
    for pack in packs {
        out.push_str(&format!(
            "{}\n",
            header.apply_to(pack.map_or_else(|| "(general)".to_string(), str::to_string))
        ));

        let mut group: Vec<&Diagnostic> = diagnostics
            .iter()
            .filter(|d| d.pack_id.as_deref() == pack)
            .collect();
        group.sort_by(|a, b| b.severity.cmp(&a.severity));

        for d in group {
            let style = match d.severity {
                Severity::Fatal | Severity::Error => Style::new().red(),
                Severity::Warning => Style::new().yellow(),
                Severity::Info => Style::new().dim(),
            };
            let location = d
                .path
                .as_deref()
                .map(|p| format!(" {p}:"))
                .unwrap_or_default();
            out.push_str(&format!(
                "  {}{} {} [{}]\n",
                style.apply_to(d.severity.as_str()),
                location,
                d.message,
                d.rule_id
            ));
        }
    }
    out
}

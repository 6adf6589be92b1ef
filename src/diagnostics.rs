//! Structured run diagnostics.
//!
//! Every component reports through a [`Diagnostics`] collector owned by the
//! run's [`crate::Context`]. Each entry is counted per [`Severity`], kept for
//! later inspection and forwarded to `tracing` so an application-installed
//! subscriber sees the same stream.

use core::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// A single recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// Severity of the entry
    pub severity: Severity,
    /// Component that produced the entry ("model", "layout", "access", ...)
    pub scope: String,
    /// Message text
    pub message: String,
}

/// Per-severity counters surfaced at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeverityCounts {
    pub debug: usize,
    pub info: usize,
    pub warning: usize,
    pub error: usize,
    pub critical: usize,
}

impl SeverityCounts {
    /// Count for a given severity.
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Debug => self.debug,
            Severity::Info => self.info,
            Severity::Warning => self.warning,
            Severity::Error => self.error,
            Severity::Critical => self.critical,
        }
    }

    /// True if at least one error or critical entry was recorded.
    pub fn has_errors(&self) -> bool {
        self.error > 0 || self.critical > 0
    }
}

impl fmt::Display for SeverityCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "debug: {}, info: {}, warning: {}, error: {}, critical: {}",
            self.debug, self.info, self.warning, self.error, self.critical
        )
    }
}

/// Thread-safe diagnostics collector.
///
/// Logging only needs a shared reference, so independent messages and
/// signals may be processed concurrently against the same collector.
#[derive(Debug, Default)]
pub struct Diagnostics {
    counters: [AtomicUsize; 5],
    records: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry and forward it to `tracing`.
    pub fn log(&self, severity: Severity, scope: &str, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Debug => tracing::debug!(scope, "{message}"),
            Severity::Info => tracing::info!(scope, "{message}"),
            Severity::Warning => tracing::warn!(scope, "{message}"),
            Severity::Error => tracing::error!(scope, "{message}"),
            Severity::Critical => tracing::error!(scope, critical = true, "{message}"),
        }

        self.counters[severity.index()].fetch_add(1, Ordering::Relaxed);
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Diagnostic {
                severity,
                scope: scope.to_string(),
                message,
            });
    }

    pub fn debug(&self, scope: &str, message: impl Into<String>) {
        self.log(Severity::Debug, scope, message);
    }

    pub fn info(&self, scope: &str, message: impl Into<String>) {
        self.log(Severity::Info, scope, message);
    }

    pub fn warning(&self, scope: &str, message: impl Into<String>) {
        self.log(Severity::Warning, scope, message);
    }

    pub fn error(&self, scope: &str, message: impl Into<String>) {
        self.log(Severity::Error, scope, message);
    }

    pub fn critical(&self, scope: &str, message: impl Into<String>) {
        self.log(Severity::Critical, scope, message);
    }

    /// Snapshot of the per-severity counters.
    pub fn counts(&self) -> SeverityCounts {
        let load = |s: Severity| self.counters[s.index()].load(Ordering::Relaxed);
        SeverityCounts {
            debug: load(Severity::Debug),
            info: load(Severity::Info),
            warning: load(Severity::Warning),
            error: load(Severity::Error),
            critical: load(Severity::Critical),
        }
    }

    /// Copy of every recorded entry, in recording order.
    pub fn records(&self) -> Vec<Diagnostic> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Entries at or above the given severity.
    pub fn at_least(&self, severity: Severity) -> Vec<Diagnostic> {
        self.records()
            .into_iter()
            .filter(|d| d.severity >= severity)
            .collect()
    }

    /// Clear counters and records, e.g. between two runs sharing a context.
    pub fn reset(&self) {
        for severity in Severity::ALL {
            self.counters[severity.index()].store(0, Ordering::Relaxed);
        }
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_track_each_severity() {
        let diag = Diagnostics::new();
        diag.warning("model", "first");
        diag.warning("layout", "second");
        diag.error("access", "third");
        diag.critical("loader", "fourth");

        let counts = diag.counts();
        assert_eq!(counts.warning, 2);
        assert_eq!(counts.error, 1);
        assert_eq!(counts.critical, 1);
        assert_eq!(counts.get(Severity::Debug), 0);
        assert!(counts.has_errors());
        assert_eq!(diag.records().len(), 4);
        assert_eq!(diag.at_least(Severity::Error).len(), 2);
    }

    #[test]
    fn reset_clears_everything() {
        let diag = Diagnostics::new();
        diag.info("model", "hello");
        diag.reset();
        assert_eq!(diag.counts(), SeverityCounts::default());
        assert!(diag.records().is_empty());
    }

    #[test]
    fn summary_display() {
        let diag = Diagnostics::new();
        diag.debug("model", "x");
        assert_eq!(
            diag.counts().to_string(),
            "debug: 1, info: 0, warning: 0, error: 0, critical: 0"
        );
    }
}

//! Copy report model and its mutable builder.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::spec::SpecCopyError;

/// Counters and diagnostics for one `copy_tree` run.
#[derive(Debug, Default, Clone)]
pub struct ReportCopy {
    /// Entries that passed the exclude filters.
    pub cnt_matched: u64,
    /// Entries visited during traversal.
    pub cnt_scanned: u64,
    /// Files, directories and links committed at destination.
    pub cnt_copied: u64,
    /// Entries left alone by the symlink strategy or dry-run.
    pub cnt_skipped: u64,
    pub warnings: Vec<String>,
    pub errors: Vec<SpecCopyError>,
}

impl ReportCopy {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// `true` when no per-entry error was recorded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// One-line summary, e.g. `[COPY] matched=3 scanned=4 ...`.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} matched={} scanned={} copied={} skipped={} errors={} warnings={}",
            self.cnt_matched,
            self.cnt_scanned,
            self.cnt_copied,
            self.cnt_skipped,
            self.error_count(),
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format("[COPY]"))
    }
}

/// Mutable accumulator used while walking and copying.
#[derive(Debug, Default)]
pub(crate) struct ReportCopyBuilder {
    report: ReportCopy,
}

impl ReportCopyBuilder {
    pub(crate) fn add_matched(&mut self) {
        self.report.cnt_matched += 1;
    }

    pub(crate) fn add_scanned(&mut self) {
        self.report.cnt_scanned += 1;
    }

    pub(crate) fn add_copied(&mut self) {
        self.report.cnt_copied += 1;
    }

    pub(crate) fn add_skipped(&mut self) {
        self.report.cnt_skipped += 1;
    }

    pub(crate) fn add_warning(&mut self, warning: String) {
        debug!("copy warning: {warning}");
        self.report.warnings.push(warning);
    }

    /// Record one path-scoped failure.
    pub(crate) fn add_error(&mut self, path: PathBuf, exception: String) {
        warn!("copy failed for {}: {exception}", path.display());
        self.report.errors.push(SpecCopyError { path, exception });
    }

    pub(crate) fn build(self) -> ReportCopy {
        self.report
    }
}

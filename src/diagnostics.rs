//! Build diagnostics and the end-of-run report (C13, §3.1, §4.12).
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        write!(f, "{label}")
    }
}

/// One diagnostic surfaced during a build, distinct from the internal
/// [`crate::types::PackBuildError`] used for control flow.
#[derive(Debug, Clone)]
pub struct ExportMessage {
    pub severity: Severity,
    pub category: &'static str,
    pub text: String,
}

impl ExportMessage {
    pub fn info(category: &'static str, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            category,
            text: text.into(),
        }
    }

    pub fn warning(category: &'static str, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            category,
            text: text.into(),
        }
    }

    pub fn error(category: &'static str, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category,
            text: text.into(),
        }
    }
}

impl fmt::Display for ExportMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.text)
    }
}

/// Accumulates [`ExportMessage`]s plus running totals over the course of a build,
/// producing a final [`BuildReport`].
#[derive(Debug, Default)]
pub struct Diagnostics {
    messages: Vec<ExportMessage>,
    files_written: usize,
    bytes_written: u64,
    encrypted_files: usize,
}

impl Diagnostics {
    pub fn push(&mut self, message: ExportMessage) {
        self.messages.push(message);
    }

    pub fn record_file(&mut self, bytes: u64, encrypted: bool) {
        self.files_written += 1;
        self.bytes_written += bytes;
        if encrypted {
            self.encrypted_files += 1;
        }
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Error)
    }

    pub fn into_report(self, elapsed: Duration) -> BuildReport {
        BuildReport {
            files_written: self.files_written,
            bytes_written: self.bytes_written,
            encrypted_files: self.encrypted_files,
            elapsed,
            messages: self.messages,
        }
    }
}

/// Returned by the driver entry points on success (§3.1).
#[derive(Debug)]
pub struct BuildReport {
    pub files_written: usize,
    pub bytes_written: u64,
    pub encrypted_files: usize,
    pub elapsed: Duration,
    pub messages: Vec<ExportMessage>,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} bytes written ({} encrypted) in {:.2}s",
            self.files_written,
            self.bytes_written,
            self.encrypted_files,
            self.elapsed.as_secs_f64(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_tallies_files_and_encryption() {
        let mut diag = Diagnostics::default();
        diag.record_file(10, false);
        diag.record_file(20, true);
        diag.push(ExportMessage::warning("encryption", "directory encrypted without body encryption"));
        assert!(!diag.has_errors());
        let report = diag.into_report(Duration::from_millis(5));
        assert_eq!(report.files_written, 2);
        assert_eq!(report.bytes_written, 30);
        assert_eq!(report.encrypted_files, 1);
        assert_eq!(report.messages.len(), 1);
    }

    #[test]
    fn error_message_marks_has_errors() {
        let mut diag = Diagnostics::default();
        diag.push(ExportMessage::error("io", "disk full"));
        assert!(diag.has_errors());
    }
}

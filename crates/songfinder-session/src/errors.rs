//! User-visible error reporting.
//!
//! Failures the user should hear about are captured as messages, never
//! propagated: the controller publishes them here and consumers acknowledge
//! them. The controller itself never clears a report.

use std::fmt;

/// How bad a reported failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The app stays usable; show a dismissible notice.
    Nonfatal,
    /// The session cannot continue; show a notice, then terminate.
    Fatal,
}

/// One reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// How bad it is.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Nonfatal => write!(f, "{}", self.message),
            Severity::Fatal => write!(f, "fatal: {}", self.message),
        }
    }
}

/// Latest unacknowledged report of each severity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorChannel {
    nonfatal: Option<String>,
    fatal: Option<String>,
}

impl ErrorChannel {
    /// Publishes a report, replacing any unacknowledged one of the same severity.
    pub fn publish(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(?severity, %message, "session error");
        match severity {
            Severity::Nonfatal => self.nonfatal = Some(message),
            Severity::Fatal => self.fatal = Some(message),
        }
    }

    /// The unacknowledged nonfatal message.
    pub fn nonfatal(&self) -> Option<&str> {
        self.nonfatal.as_deref()
    }

    /// The unacknowledged fatal message.
    pub fn fatal(&self) -> Option<&str> {
        self.fatal.as_deref()
    }

    /// The most severe unacknowledged report.
    pub fn current(&self) -> Option<ErrorReport> {
        let (severity, message) = match (&self.fatal, &self.nonfatal) {
            (Some(message), _) => (Severity::Fatal, message),
            (None, Some(message)) => (Severity::Nonfatal, message),
            (None, None) => return None,
        };
        Some(ErrorReport {
            severity,
            message: message.clone(),
        })
    }

    /// Clears and returns the nonfatal message.
    pub fn acknowledge_nonfatal(&mut self) -> Option<String> {
        self.nonfatal.take()
    }

    /// Clears and returns the fatal message.
    pub fn acknowledge_fatal(&mut self) -> Option<String> {
        self.fatal.take()
    }

    /// Whether nothing is pending.
    pub fn is_clear(&self) -> bool {
        self.nonfatal.is_none() && self.fatal.is_none()
    }
}

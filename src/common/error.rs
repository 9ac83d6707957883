//! Error types for garage-bootstrap

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Which layout write failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStep {
    Stage,
    Apply,
}

impl std::fmt::Display for LayoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutStep::Stage => write!(f, "stage"),
            LayoutStep::Apply => write!(f, "apply"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Orchestration Errors ===
    #[error("Inventory error: {0}")]
    Inventory(String),

    #[error("Node lookup failed: {0}")]
    NodeLookup(String),

    // === Readiness Errors ===
    #[error("{gate} not satisfied after {attempts} attempts: observed {observed}, expected {expected}")]
    Timeout {
        gate: String,
        observed: usize,
        expected: usize,
        attempts: u32,
    },

    // === Admin API Errors ===
    #[error("Admin endpoint {address} unreachable: {reason}")]
    AdminUnreachable { address: String, reason: String },

    #[error("Layout {step} failed: {reason}")]
    LayoutCommit { step: LayoutStep, reason: String },

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration source error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Credential error: {0}")]
    Credential(String),
}

impl Error {
    /// Process exit code for a run aborted by this error.
    ///
    /// Every failure is fatal to a bootstrap run, so there is a single
    /// non-zero code.
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Did the run get past layout staging before failing?
    pub fn leaves_staged_layout(&self) -> bool {
        matches!(
            self,
            Error::LayoutCommit {
                step: LayoutStep::Apply,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_reports_shortfall() {
        let err = Error::Timeout {
            gate: "task readiness".into(),
            observed: 3,
            expected: 5,
            attempts: 150,
        };
        assert_eq!(
            err.to_string(),
            "task readiness not satisfied after 150 attempts: observed 3, expected 5"
        );
        assert_eq!(err.exit_code(), 1);
    }

    fn layout_error(step: LayoutStep, reason: &str) -> Error {
        Error::LayoutCommit {
            step,
            reason: reason.into(),
        }
    }

    #[test]
    fn test_staged_layout_detection() {
        assert!(layout_error(LayoutStep::Apply, "409 Conflict").leaves_staged_layout());
        assert!(!layout_error(LayoutStep::Stage, "400 Bad Request").leaves_staged_layout());
        assert!(!Error::Inventory("gone".into()).leaves_staged_layout());
    }

    #[test]
    fn test_staged_layout_ignores_reason_wording() {
        // Only the step decides, not how the reason happens to be phrased
        assert!(!layout_error(LayoutStep::Stage, "apply-compatible body rejected")
            .leaves_staged_layout());
        assert!(layout_error(LayoutStep::Apply, "connection reset").leaves_staged_layout());
        assert_eq!(
            layout_error(LayoutStep::Apply, "409 Conflict").to_string(),
            "Layout apply failed: 409 Conflict"
        );
    }
}

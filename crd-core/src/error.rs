//! Domain-specific error types for the CRD tray utility.
//!
//! All fallible operations return `Result<T, CrdError>`. Service
//! manager failures are classified by cause so the message shown in
//! the error dialog names what actually went wrong.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::status::ServiceState;

/// The canonical error type for the tray utility.
#[derive(Debug, Error)]
pub enum CrdError {
    // ── Service Manager Errors ───────────────────────────────────
    /// The named service is not installed on this machine.
    #[error("service '{0}' is not installed")]
    ServiceNotFound(String),

    /// The service manager refused the request.
    #[error("access denied to service '{0}'")]
    AccessDenied(String),

    /// Any other failure reported by the service manager.
    #[error("service manager error: {0}")]
    ServiceManager(String),

    /// The service did not reach the expected state in time.
    #[error("service did not reach {target} within {after:?}")]
    Timeout { target: ServiceState, after: Duration },

    // ── Toggle Errors ────────────────────────────────────────────
    /// A toggle is already waiting for the service to settle.
    #[error("a toggle is already in progress")]
    ToggleInFlight,

    // ── Startup Errors ───────────────────────────────────────────
    /// The configuration file exists but could not be parsed.
    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    // ── Shell Errors ─────────────────────────────────────────────
    /// The tray icon file is missing or could not be decoded.
    #[error("cannot load tray icon {}: {reason}", path.display())]
    IconLoad { path: PathBuf, reason: String },

    /// Creating or driving a native window failed.
    #[error("window error: {0}")]
    Window(String),

    /// The current platform has no tray or service manager backend.
    #[error("the tray utility is only supported on Windows")]
    Unsupported,

    /// Filesystem or other I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tokio::task::JoinError> for CrdError {
    fn from(e: tokio::task::JoinError) -> Self {
        CrdError::ServiceManager(format!("service call aborted: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_denied_mentions_access_denied() {
        let e = CrdError::AccessDenied("chromoting".into());
        let text = e.to_string();
        assert!(text.contains("access denied"));
        assert!(text.contains("chromoting"));
    }

    #[test]
    fn timeout_display_names_target() {
        let e = CrdError::Timeout {
            target: ServiceState::Running,
            after: Duration::from_secs(5),
        };
        let text = e.to_string();
        assert!(text.contains("running"));
        assert!(text.contains("5s"));
    }

    #[test]
    fn icon_load_shows_path() {
        let e = CrdError::IconLoad {
            path: PathBuf::from("crd.ico"),
            reason: "file not found".into(),
        };
        assert!(e.to_string().contains("crd.ico"));
    }

    #[test]
    fn config_error_shows_path_and_reason() {
        let e = CrdError::Config {
            path: PathBuf::from("crd-tray.toml"),
            reason: "expected `=`".into(),
        };
        let text = e.to_string();
        assert!(text.contains("crd-tray.toml"));
        assert!(text.contains("expected `=`"));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: CrdError = io_err.into();
        assert!(matches!(e, CrdError::Io(_)));
    }
}

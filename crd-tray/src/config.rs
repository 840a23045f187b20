//! Tray utility configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crd_core::{CrdError, ToggleTiming};

/// Top-level configuration for the tray utility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrayConfig {
    /// Controlled service.
    pub service: ServiceConfig,
    /// Notification area icon.
    pub tray: TrayIconConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name registered with the SCM.
    pub name: String,
    /// Short name used in menu texts ("CRD is enabled").
    pub display_name: String,
    /// How long a toggle waits for the service to settle, in milliseconds.
    pub toggle_timeout_ms: u64,
    /// Status poll interval while waiting, in milliseconds.
    pub poll_interval_ms: u64,
}

/// Tray icon settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrayIconConfig {
    /// Icon file. Relative paths resolve against the executable's directory.
    pub icon: PathBuf,
    /// Hover tooltip.
    pub tooltip: String,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: String,
    /// Optional log file. If empty, logs to stderr.
    pub file: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            tray: TrayIconConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "chromoting".into(),
            display_name: "CRD".into(),
            toggle_timeout_ms: 5000,
            poll_interval_ms: 250,
        }
    }
}

impl Default for TrayIconConfig {
    fn default() -> Self {
        Self {
            icon: PathBuf::from("crd.ico"),
            tooltip: "Chrome Remote Desktop".into(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: String::new(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl TrayConfig {
    /// Load from a TOML file.
    ///
    /// Runs before logging is set up, so it reports instead of logging;
    /// the caller falls back to defaults and passes the error to
    /// [`log_fallback`] once the subscriber is installed.
    pub fn load(path: &Path) -> Result<Self, CrdError> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| CrdError::Config {
            path: path.to_path_buf(),
            reason: e.message().to_string(),
        })
    }

    /// Write default config to a file.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let cfg = Self::default();
        let text = toml::to_string_pretty(&cfg).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    /// Toggle timing derived from the service section. Zero intervals are
    /// raised to 1 ms.
    pub fn toggle_timing(&self) -> ToggleTiming {
        ToggleTiming {
            timeout: Duration::from_millis(self.service.toggle_timeout_ms),
            poll_interval: Duration::from_millis(self.service.poll_interval_ms.max(1)),
        }
    }

    /// Absolute icon path, resolving relative paths against `base`.
    pub fn icon_path(&self, base: &Path) -> PathBuf {
        resolve(base, &self.tray.icon)
    }
}

/// Log why the config at `path` was not used.
pub fn log_fallback(path: &Path, err: &CrdError) {
    match err {
        CrdError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("no config at {}; using defaults", path.display());
        }
        CrdError::Config { .. } => warn!("{err}; using defaults"),
        _ => warn!("cannot read config {}: {err}; using defaults", path.display()),
    }
}

/// Directory containing the running executable, or the working
/// directory if it cannot be determined.
pub fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Join `path` onto `base` unless it is already absolute.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture_logs(f: impl FnOnce()) -> String {
        let buf = Captured::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn default_config_serializes() {
        let cfg = TrayConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("chromoting"));
        assert!(text.contains("toggle_timeout_ms"));
        assert!(text.contains("crd.ico"));
    }

    #[test]
    fn roundtrip_config() {
        let cfg = TrayConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: TrayConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.service.name, "chromoting");
        assert_eq!(parsed.service.display_name, "CRD");
        assert_eq!(parsed.toggle_timing(), ToggleTiming::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let parsed: TrayConfig = toml::from_str("[service]\ntoggle_timeout_ms = 8000\n").unwrap();
        assert_eq!(parsed.service.name, "chromoting");
        assert_eq!(parsed.toggle_timing().timeout, Duration::from_secs(8));
        assert_eq!(parsed.tray.tooltip, "Chrome Remote Desktop");
    }

    #[test]
    fn missing_file_is_reported_as_io() {
        let path = Path::new("definitely/not/here/crd-tray.toml");
        let err = TrayConfig::load(path).unwrap_err();
        assert!(matches!(err, CrdError::Io(_)));

        let logs = capture_logs(|| log_fallback(path, &err));
        assert!(logs.contains("INFO"));
        assert!(logs.contains("no config at"));
    }

    #[test]
    fn invalid_file_logs_warning_after_subscriber_is_installed() {
        let path = std::env::temp_dir().join(format!("crd-tray-invalid-{}.toml", std::process::id()));
        std::fs::write(&path, "[service\nname = ").unwrap();

        // load runs before any subscriber exists, as it does in main
        let err = TrayConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, CrdError::Config { .. }));

        let logs = capture_logs(|| log_fallback(&path, &err));
        assert!(logs.contains("WARN"));
        assert!(logs.contains("invalid config"));
        assert!(logs.contains("using defaults"));
    }

    #[test]
    fn zero_poll_interval_is_raised() {
        let mut cfg = TrayConfig::default();
        cfg.service.poll_interval_ms = 0;
        assert_eq!(cfg.toggle_timing().poll_interval, Duration::from_millis(1));
    }

    #[test]
    fn icon_path_resolution() {
        let cfg = TrayConfig::default();
        let base = Path::new("install");
        assert_eq!(cfg.icon_path(base), base.join("crd.ico"));

        let abs = std::env::temp_dir().join("other.ico");
        assert_eq!(resolve(base, &abs), abs);
    }
}

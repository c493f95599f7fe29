//! Runtime settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `FISSION_FLOW__*` environment variables (e.g.
//! `FISSION_FLOW__BACKEND__BASE_URL=http://10.0.0.5:31314`). Command-line
//! flags are applied on top by the binary.
//!
//! ```toml
//! [backend]
//! base_url = "http://192.168.39.129:31314"
//!
//! [canvas]
//! rank_sep = 160
//!
//! [logging]
//! level = "debug"
//! file = "/tmp/fission-flow.log"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Default backend location (the in-cluster router NodePort).
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:31314";
/// Path of the built-in data-flow function.
pub const DEFAULT_PATH: &str = "/apis/fission-build-in-funcs/fission-data-flow";
/// Value of the `X-Fission-Flow-Source` header.
pub const DEFAULT_SOURCE: &str = "fission-front.data-flow";
/// Value of the `X-Fission-Flow-Source-Type` header.
pub const DEFAULT_SOURCE_TYPE: &str = "fission-front";

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendSettings,
    pub canvas: CanvasSettings,
    pub logging: LoggingSettings,
    /// UI event poll interval in milliseconds.
    pub refresh_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            canvas: CanvasSettings::default(),
            logging: LoggingSettings::default(),
            refresh_ms: 100,
        }
    }
}

/// Where and how to reach the data-flow backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub base_url: String,
    pub path: String,
    /// Caller identification sent in `X-Fission-Flow-Source`.
    pub source: String,
    /// Caller type sent in `X-Fission-Flow-Source-Type`.
    pub source_type: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            path: DEFAULT_PATH.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            source_type: DEFAULT_SOURCE_TYPE.to_string(),
        }
    }
}

impl BackendSettings {
    /// Full endpoint URL.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

/// Fixed drawing-surface parameters.
///
/// Coordinates are virtual units; the scene scales them into whatever
/// terminal area it is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    pub width: f64,
    pub height: f64,
    /// Vertical gap between nodes of the same rank.
    pub node_sep: f64,
    /// Horizontal gap between ranks.
    pub rank_sep: f64,
    /// Scale the drawing to the laid-out graph instead of the full surface.
    pub fit_view: bool,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 1600.0,
            height: 1200.0,
            node_sep: 40.0,
            rank_sep: 120.0,
            fit_view: true,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    /// "pretty", "full", "compact" or "json".
    pub format: String,
    /// Log file for the interactive UI (the terminal belongs to the UI).
    pub file: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: PathBuf::from("fission-flow.log"),
        }
    }
}

impl Settings {
    /// Load settings from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("FISSION_FLOW")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_sources() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.backend.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.canvas.width, 1600.0);
        assert_eq!(settings.canvas.height, 1200.0);
        assert_eq!(settings.refresh_ms, 100);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            refresh_ms = 250

            [backend]
            base_url = "http://10.0.0.5:8888"

            [canvas]
            rank_sep = 200.0
            "#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.backend.base_url, "http://10.0.0.5:8888");
        assert_eq!(settings.backend.path, DEFAULT_PATH);
        assert_eq!(settings.canvas.rank_sep, 200.0);
        assert_eq!(settings.canvas.node_sep, 40.0);
        assert_eq!(settings.refresh_ms, 250);
    }

    #[test]
    fn test_missing_file_is_error() {
        let missing = NamedTempFile::new().unwrap().path().with_extension("toml");
        assert!(Settings::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let backend = BackendSettings {
            base_url: "http://localhost:31314/".to_string(),
            ..BackendSettings::default()
        };
        assert_eq!(
            backend.endpoint(),
            "http://localhost:31314/apis/fission-build-in-funcs/fission-data-flow"
        );
    }
}

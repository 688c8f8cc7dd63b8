//! Capture configuration
//!
//! Settings come from three layers, later ones winning:
//! 1. Built-in defaults (115200 baud, 48 seconds into `dados_sensores.txt`)
//! 2. An optional TOML file passed with `--config`
//! 3. Command-line flags
//!
//! ```toml
//! [capture]
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//! output = "dados_sensores.txt"
//! duration_secs = 48.0
//! read_timeout_ms = 1000
//! poll_interval_ms = 10
//! ```

use crate::capture::CaptureSession;
use crate::serial::port::{default_port_path, DEFAULT_BAUD, DEFAULT_TIMEOUT};
use crate::serial::PortConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default output file name
pub const DEFAULT_OUTPUT: &str = "dados_sensores.txt";

/// Default capture length in seconds
pub const DEFAULT_DURATION_SECS: f64 = 48.0;

/// Default pause between empty polls
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// On-disk layout of a config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Logical configuration of a capture session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Serial endpoint name (e.g., COM3, /dev/ttyUSB0)
    pub port: String,
    /// Baud rate; must match the board
    pub baud_rate: u32,
    /// Output text file
    pub output: PathBuf,
    /// Capture length in seconds
    pub duration_secs: f64,
    /// Serial read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Pause after an empty poll in milliseconds (0 = busy-poll)
    pub poll_interval_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            port: default_port_path().to_string(),
            baud_rate: DEFAULT_BAUD,
            output: PathBuf::from(DEFAULT_OUTPUT),
            duration_secs: DEFAULT_DURATION_SECS,
            read_timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub output: Option<PathBuf>,
    pub duration_secs: Option<f64>,
    pub read_timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

impl CaptureConfig {
    /// Load from a TOML file, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!("loaded capture config from {}", path.display());
        Ok(config)
    }

    /// Parse TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.capture)
    }

    /// Apply command-line values on top of this config
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(baud_rate) = overrides.baud_rate {
            self.baud_rate = baud_rate;
        }
        if let Some(output) = overrides.output {
            self.output = output;
        }
        if let Some(duration_secs) = overrides.duration_secs {
            self.duration_secs = duration_secs;
        }
        if let Some(read_timeout_ms) = overrides.read_timeout_ms {
            self.read_timeout_ms = read_timeout_ms;
        }
        if let Some(poll_interval_ms) = overrides.poll_interval_ms {
            self.poll_interval_ms = poll_interval_ms;
        }
        self
    }

    /// Build the session parameters for [`crate::capture::capture`]
    pub fn to_session(&self) -> CaptureSession {
        CaptureSession {
            port: PortConfig::new(&self.port)
                .with_baud_rate(self.baud_rate)
                .with_timeout(Duration::from_millis(self.read_timeout_ms)),
            output: self.output.clone(),
            duration: duration_from_secs(self.duration_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    /// Render as a config file
    pub fn to_toml(&self) -> Result<String> {
        let file = ConfigFile {
            capture: self.clone(),
        };
        toml::to_string_pretty(&file).context("Failed to serialize config")
    }
}

/// Seconds to a duration. Negative and NaN become zero; huge values saturate.
pub fn duration_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = CaptureConfig::default();
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.output, PathBuf::from("dados_sensores.txt"));
        assert_eq!(config.duration_secs, 48.0);

        let session = config.to_session();
        assert_eq!(session.duration, Duration::from_secs(48));
        assert_eq!(session.port.timeout, Duration::from_secs(1));
        assert_eq!(session.poll_interval, Duration::from_millis(10));
    }

    #[test]
    fn test_parse_partial_file() {
        let config = CaptureConfig::parse(
            r#"
[capture]
port = "COM7"
duration_secs = 5
"#,
        )
        .unwrap();

        assert_eq!(config.port, "COM7");
        assert_eq!(config.duration_secs, 5.0);
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.output, PathBuf::from("dados_sensores.txt"));
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        assert!(CaptureConfig::parse("[capture]\nbaud = 9600\n").is_err());
        assert!(CaptureConfig::parse("[monitor]\nport = \"COM3\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[capture]\nbaud_rate = 9600\noutput = \"bmp280.txt\"").unwrap();

        let config = CaptureConfig::load(Some(&path)).unwrap();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.output, PathBuf::from("bmp280.txt"));
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = CaptureConfig::load(Some(Path::new("/nonexistent/capture.toml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/capture.toml"));
    }

    #[test]
    fn test_overrides_win() {
        let config = CaptureConfig::parse("[capture]\nport = \"COM3\"\nbaud_rate = 9600\n")
            .unwrap()
            .apply(Overrides {
                baud_rate: Some(57600),
                duration_secs: Some(0.5),
                poll_interval_ms: Some(0),
                ..Default::default()
            });

        assert_eq!(config.port, "COM3");
        assert_eq!(config.baud_rate, 57600);

        let session = config.to_session();
        assert_eq!(session.duration, Duration::from_millis(500));
        assert!(session.poll_interval.is_zero());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CaptureConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[capture]"));
        assert_eq!(CaptureConfig::parse(&text).unwrap(), config);
    }

    #[test]
    fn test_duration_from_secs() {
        assert_eq!(duration_from_secs(-3.0), Duration::ZERO);
        assert_eq!(duration_from_secs(0.0), Duration::ZERO);
        assert_eq!(duration_from_secs(f64::NAN), Duration::ZERO);
        assert_eq!(duration_from_secs(1.5), Duration::from_millis(1500));
        assert_eq!(duration_from_secs(f64::INFINITY), Duration::MAX);
    }
}

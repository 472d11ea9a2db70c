//! Application configuration.
//!
//! The acquisition and assembly crates take every parameter explicitly;
//! this file only seeds the defaults used by front-ends such as the CLI.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where frames are stored when none is given.
    pub frames_dir: PathBuf,

    /// Default acquisition settings.
    pub acquisition: AcquisitionDefaults,

    /// Default video assembly settings.
    pub video: VideoDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default acquisition parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionDefaults {
    /// Source catalog entry name.
    pub source: String,

    /// Minutes between two fetches.
    pub interval_minutes: u64,

    /// Number of frames per run.
    pub num_images: u32,

    /// First sequence number of a run.
    pub start_number: u64,

    /// HTTP timeout for a single fetch.
    pub fetch_timeout_secs: u64,
}

/// Default video assembly parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoDefaults {
    /// Output frame rate.
    pub fps: u32,

    /// File name of the video written inside the frames directory.
    pub output_name: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "sunlapse_acquisition=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            frames_dir: dirs_default_frames(),
            acquisition: AcquisitionDefaults::default(),
            video: VideoDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for AcquisitionDefaults {
    fn default() -> Self {
        Self {
            source: "SDO/HMI Continuum".to_string(),
            interval_minutes: 5,
            num_images: 10,
            start_number: 1,
            fetch_timeout_secs: 10,
        }
    }
}

impl Default for VideoDefaults {
    fn default() -> Self {
        Self {
            fps: 24,
            output_name: "output.mp4".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &std::path::Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("sunlapse").join("config.json")
}

/// Default frames directory.
fn dirs_default_frames() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("sunlapse").join("frames")
}

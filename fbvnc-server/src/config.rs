//! Configuration for the fbvnc server.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use fbvnc_core::session::{MAX_FPS, MIN_FPS};

/// Top-level configuration loaded from a TOML file. Immutable after
/// startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Framebuffer device settings.
    pub device: DeviceConfig,
    /// Network settings.
    pub network: NetworkConfig,
    /// Frame streaming settings.
    pub stream: StreamConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Framebuffer device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Path to the framebuffer device.
    pub path: PathBuf,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// TCP port to listen on (conventional VNC display 0 port).
    pub port: u16,
}

/// Frame streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Target frames per second. Values outside 1..=15 are clamped,
    /// never rejected.
    pub fps: u8,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            network: NetworkConfig::default(),
            stream: StreamConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/dev/fb0"),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { port: 5900 }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { fps: 3 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ServerConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}

impl StreamConfig {
    /// The frame rate with the [1,15] clamp applied.
    pub fn clamped_fps(&self) -> u8 {
        self.fps.clamp(MIN_FPS, MAX_FPS)
    }
}

// ── Tests ────────────────────────────────────────────────────────

//! Configuration management
//!
//! Handles loading and validation of configuration from TOML files, with
//! CLI and environment overrides applied by the binary on top.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::framebuffer::PixelFormat;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Session service binding
    #[serde(default)]
    pub session: SessionConfig,
    /// Initial framebuffer geometry
    #[serde(default)]
    pub display: DisplayConfig,
    /// Input queue configuration
    #[serde(default)]
    pub input: InputConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which session service socket to attach to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session identifier, part of the socket and segment names
    pub id: u32,
    /// Endpoint name registered with the service
    pub endpoint: String,
    /// Directory holding the service's listening sockets
    pub pipe_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            id: 1,
            endpoint: "netsurf".to_string(),
            pipe_dir: PathBuf::from("/tmp/.pipe"),
        }
    }
}

/// Framebuffer geometry the demo host asks for
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: PixelFormat,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            format: PixelFormat::Abgr8888,
        }
    }
}

/// Input queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Bounded queue depth between the reader thread and the host
    pub queue_depth: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { queue_depth: 256 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when RUST_LOG and -v are absent
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded configuration
    pub fn with_overrides(
        mut self,
        session_id: Option<u32>,
        endpoint: Option<String>,
        pipe_dir: Option<std::path::PathBuf>,
    ) -> Self {
        if let Some(id) = session_id {
            self.session.id = id;
        }
        if let Some(endpoint) = endpoint {
            self.session.endpoint = endpoint;
        }
        if let Some(pipe_dir) = pipe_dir {
            self.session.pipe_dir = pipe_dir;
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // The endpoint lands in a socket path and a shm object name.
        if self.session.endpoint.is_empty() {
            anyhow::bail!("Endpoint name must not be empty");
        }
        if self.session.endpoint.contains('/') || self.session.endpoint.contains('\0') {
            anyhow::bail!(
                "Endpoint name must not contain path separators: {:?}",
                self.session.endpoint
            );
        }

        if self.display.width == 0 || self.display.height == 0 {
            anyhow::bail!(
                "Display dimensions must be non-zero: {}x{}",
                self.display.width,
                self.display.height
            );
        }

        if self.input.queue_depth == 0 {
            anyhow::bail!("Input queue depth must be non-zero");
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => anyhow::bail!("Invalid log level: {}", other),
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.session.id, 1);
        assert_eq!(config.session.endpoint, "netsurf");
        assert_eq!(config.session.pipe_dir, PathBuf::from("/tmp/.pipe"));
        assert_eq!(config.display.width, 1024);
        assert_eq!(config.display.height, 768);
        assert_eq!(config.display.format, PixelFormat::Abgr8888);
        assert_eq!(config.input.queue_depth, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [session]
            id = 3
            endpoint = "browser"

            [display]
            width = 1920
            height = 1080
            format = "xrgb8888"
            "#,
        )
        .unwrap();

        assert_eq!(config.session.id, 3);
        assert_eq!(config.session.endpoint, "browser");
        // Unset fields keep their defaults.
        assert_eq!(config.session.pipe_dir, PathBuf::from("/tmp/.pipe"));
        assert_eq!(config.display.width, 1920);
        assert_eq!(config.display.format, PixelFormat::Xrgb8888);
        assert_eq!(config.input.queue_depth, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.session.endpoint = String::new();
        assert!(config.validate().is_err());

        config.session.endpoint = "../escape".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        config.display.width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.input.queue_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_overrides() {
        let config = Config::default().with_overrides(
            Some(7),
            Some("browser".to_string()),
            Some(PathBuf::from("/run/freerds/pipe")),
        );
        assert_eq!(config.session.id, 7);
        assert_eq!(config.session.endpoint, "browser");
        assert_eq!(config.session.pipe_dir, PathBuf::from("/run/freerds/pipe"));

        let config = Config::default().with_overrides(None, None, None);
        assert_eq!(config.session.id, 1);
        assert_eq!(config.session.endpoint, "netsurf");
    }
}

//! Daemon configuration management

use anyhow::{Context, Result, anyhow};
use protocol::LedIntensity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncdConfig {
    #[serde(default)]
    pub panel: PanelSettings,
    #[serde(default)]
    pub sim: SimSettings,
    #[serde(default)]
    pub daemon: DaemonSettings,
}

/// Panel hardware settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelSettings {
    /// LED brightness: off, extra_low, low, med, high, extra_high
    ///
    /// Unknown values fall back to extra_low rather than failing the load.
    #[serde(default = "PanelSettings::default_led_intensity")]
    pub led_intensity: String,
    /// Seconds between hot-plug rescan passes
    #[serde(default = "PanelSettings::default_rescan_interval")]
    pub rescan_interval_secs: u64,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            led_intensity: Self::default_led_intensity(),
            rescan_interval_secs: Self::default_rescan_interval(),
        }
    }
}

impl PanelSettings {
    fn default_led_intensity() -> String {
        "extra_low".to_string()
    }

    fn default_rescan_interval() -> u64 {
        2
    }
}

/// Telemetry bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSettings {
    /// Bridge host
    #[serde(default = "SimSettings::default_host")]
    pub host: String,
    /// Bridge UDP port
    #[serde(default = "SimSettings::default_port")]
    pub port: u16,
    /// Requested push interval in milliseconds
    #[serde(default = "SimSettings::default_refresh_ms")]
    pub refresh_ms: u32,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            refresh_ms: Self::default_refresh_ms(),
        }
    }
}

impl SimSettings {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        47720
    }

    fn default_refresh_ms() -> u32 {
        1000
    }
}

/// Daemon process settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonSettings {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "DaemonSettings::default_log_level")]
    pub log_level: String,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

impl DaemonSettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for SyncdConfig {
    fn default() -> Self {
        Self {
            panel: PanelSettings::default(),
            sim: SimSettings::default(),
            daemon: DaemonSettings::default(),
        }
    }
}

impl SyncdConfig {
    /// Load configuration from the specified path
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            // Try standard locations in order
            let candidates = vec![
                Self::default_path(),
                PathBuf::from("/etc/simpanel/syncd.toml"),
            ];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: SyncdConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("simpanel").join("syncd.toml")
        } else {
            PathBuf::from(".config/simpanel/syncd.toml")
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.daemon.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.daemon.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.panel.rescan_interval_secs == 0 {
            return Err(anyhow!("rescan_interval_secs must be at least 1"));
        }

        if self.sim.refresh_ms == 0 {
            return Err(anyhow!("refresh_ms must be at least 1"));
        }

        Ok(())
    }

    /// Configured LED brightness, falling back to extra_low
    pub fn led_intensity(&self) -> LedIntensity {
        LedIntensity::from_name(&self.panel.led_intensity).unwrap_or(LedIntensity::ExtraLow)
    }

    pub fn rescan_interval(&self) -> Duration {
        Duration::from_secs(self.panel.rescan_interval_secs)
    }

    /// Bridge endpoint as a `host:port` pair
    pub fn sim_server(&self) -> String {
        format!("{}:{}", self.sim.host, self.sim.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncdConfig::default();
        assert_eq!(config.daemon.log_level, "info");
        assert_eq!(config.panel.led_intensity, "extra_low");
        assert_eq!(config.panel.rescan_interval_secs, 2);
        assert_eq!(config.sim.refresh_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = SyncdConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: SyncdConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.panel.led_intensity, parsed.panel.led_intensity);
        assert_eq!(config.sim.port, parsed.sim.port);
        assert_eq!(config.daemon.log_level, parsed.daemon.log_level);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        // no [daemon] table at all, sparse [panel] and [sim]
        let config: SyncdConfig = toml::from_str(
            r#"
[panel]
led_intensity = "high"

[sim]
host = "192.168.1.20"
"#,
        )
        .unwrap();

        assert_eq!(config.panel.led_intensity, "high");
        assert_eq!(config.panel.rescan_interval_secs, 2);
        assert_eq!(config.sim.host, "192.168.1.20");
        assert_eq!(config.sim.port, 47720);
        assert_eq!(config.daemon.log_level, "info");
    }

    #[test]
    fn test_empty_config_is_all_defaults() {
        let config: SyncdConfig = toml::from_str("").unwrap();
        assert_eq!(config.panel.led_intensity, "extra_low");
        assert_eq!(config.sim_server(), "127.0.0.1:47720");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = SyncdConfig::default();
        assert!(config.validate().is_ok());

        config.daemon.log_level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.daemon.log_level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_intervals() {
        let mut config = SyncdConfig::default();
        config.panel.rescan_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = SyncdConfig::default();
        config.sim.refresh_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_led_intensity_falls_back_to_extra_low() {
        let mut config = SyncdConfig::default();
        assert_eq!(config.led_intensity(), LedIntensity::ExtraLow);

        config.panel.led_intensity = "HIGH".to_string();
        assert_eq!(config.led_intensity(), LedIntensity::High);

        config.panel.led_intensity = "blinding".to_string();
        assert_eq!(config.led_intensity(), LedIntensity::ExtraLow);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("syncd.toml");

        let mut config = SyncdConfig::default();
        config.panel.led_intensity = "med".to_string();
        config.sim.port = 50000;
        config.save(&path).unwrap();

        let loaded = SyncdConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.panel.led_intensity, "med");
        assert_eq!(loaded.sim.port, 50000);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(SyncdConfig::load(Some(path)).is_err());
    }

    #[test]
    fn test_sim_server_joins_host_and_port() {
        let config = SyncdConfig::default();
        assert_eq!(config.sim_server(), "127.0.0.1:47720");
    }
}

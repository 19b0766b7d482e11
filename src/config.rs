use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::probe::SpeedTestServer;

const CONFIG_DIR_NAME: &str = "NetworkHealthMonitor";
const CONFIG_FILE_NAME: &str = "config.json";

/// How the latency probe reaches the target host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PingMethod {
    /// The operating system's `ping` command.
    #[default]
    System,
    /// ICMP echo requests sent directly.
    Icmp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Auto-test interval in seconds.
    pub interval_secs: u64,
    pub ping_host: String,
    pub dns_domain: String,
    pub server: SpeedTestServer,
    pub ping_method: PingMethod,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            ping_host: "8.8.8.8".to_string(),
            dns_domain: "google.com".to_string(),
            server: SpeedTestServer::Default,
            ping_method: PingMethod::System,
        }
    }
}

impl MonitorConfig {
    pub fn get_config_path() -> Result<PathBuf, SettingsError> {
        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::NoConfigDir)?
            .join(CONFIG_DIR_NAME);

        fs::create_dir_all(&config_dir)?;
        Ok(config_dir.join(CONFIG_FILE_NAME))
    }

    /// Load saved settings, falling back to defaults on any problem.
    pub fn load() -> Self {
        match Self::get_config_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                warn!("Failed to get config path: {e}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Failed to parse config {}: {e}", path.display());
                Self::default()
            }),
            Err(e) => {
                warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::get_config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

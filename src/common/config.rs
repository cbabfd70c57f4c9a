//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Remote connection settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Debugger bridge settings
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Device (adb) settings
    #[serde(default)]
    pub device: DeviceConfig,

    /// Source tree settings
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Scenario discovery settings
    #[serde(default)]
    pub scenarios: ScenariosConfig,
}

/// Remote platform connection settings
#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    /// Device serial passed to the transport (e.g. "emulator-5554")
    pub device: Option<String>,

    /// Port the debug server listens on, on the device
    #[serde(default = "default_port")]
    pub port: u16,

    /// Debugger platform plugin used for remote attach
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Scheme of the platform connect URL
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Total number of platform connect attempts
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    /// Delay between refused connect attempts
    #[serde(default)]
    pub retry_delay_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            device: None,
            port: default_port(),
            platform: default_platform(),
            scheme: default_scheme(),
            connect_attempts: default_connect_attempts(),
            retry_delay_ms: 0,
        }
    }
}

fn default_port() -> u16 {
    1234
}

fn default_platform() -> String {
    "remote-android".to_string()
}

fn default_scheme() -> String {
    "adb".to_string()
}

fn default_connect_attempts() -> u32 {
    2
}

/// Configuration for the debugger bridge process
#[derive(Debug, Deserialize, Default, Clone)]
pub struct BridgeConfig {
    /// Path to the bridge executable
    pub path: Option<PathBuf>,

    /// Additional arguments to pass to the bridge
    #[serde(default)]
    pub args: Vec<String>,
}

/// Device tooling configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DeviceConfig {
    /// Path to adb
    pub adb: Option<PathBuf>,
}

/// Source tree configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    /// Root of the checked-out test sources, used for source remapping
    #[serde(default = "default_source_root")]
    pub root: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            root: default_source_root(),
        }
    }
}

fn default_source_root() -> PathBuf {
    PathBuf::from(".")
}

/// Scenario discovery configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ScenariosConfig {
    /// Directory searched for YAML scenario files
    pub dir: Option<PathBuf>,
}

/// Executable name searched on PATH when no bridge path is configured
const DEFAULT_BRIDGE: &str = "lldb-bridge";

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Resolve the bridge executable
    ///
    /// Falls back to searching PATH if not explicitly configured
    pub fn bridge_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.bridge.path {
            return Ok(path.clone());
        }
        which::which(DEFAULT_BRIDGE).map_err(|_| {
            Error::Config(format!(
                "Debugger bridge '{}' not found on PATH; set [bridge] path in the config file",
                DEFAULT_BRIDGE
            ))
        })
    }

    /// Resolve the adb executable
    pub fn adb_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.device.adb {
            return Ok(path.clone());
        }
        which::which("adb")
            .map_err(|_| Error::Config("adb not found on PATH; set [device] adb".to_string()))
    }
}

// Local configuration file for the daemon: `~/.scriptpad/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root directory for scriptpad global state: `~/.scriptpad/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".scriptpad"))
}

/// Path to the global config file: `~/.scriptpad/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

/// Default directory new scripts are saved into: the user's home directory.
pub fn default_scripts_directory() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub const DEFAULT_OBSERVER_CHANNEL_CAPACITY: usize = 256;

/// Daemon configuration at `~/.scriptpad/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DaemonConfig {
    /// Where scripts without a path are saved on first save.
    pub scripts_directory_path: PathBuf,
    /// Buffer size of each environment's observer channel. Slow observers
    /// that fall further behind than this miss events.
    pub observer_channel_capacity: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            scripts_directory_path: default_scripts_directory(),
            observer_channel_capacity: DEFAULT_OBSERVER_CHANNEL_CAPACITY,
        }
    }
}

impl DaemonConfig {
    /// Load from `~/.scriptpad/config.toml`. Returns defaults if the file
    /// doesn't exist or can't be parsed.
    pub fn load() -> Self {
        global_config_path().and_then(|p| Self::load_from(&p).ok()).unwrap_or_default()
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Save to `~/.scriptpad/config.toml`.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = global_config_path().ok_or_else(|| {
            ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine home directory",
            ))
        })?;
        self.save_to(&path)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[source] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[source] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[source] toml::ser::Error),
}

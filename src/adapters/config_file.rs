//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] by reading an [`EngineConfig`] from a JSON
//! file.  Missing fields take their defaults; a missing file yields the
//! full default config.  Every load is validated before it is returned.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::ConfigPort;
use crate::config::EngineConfig;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `config` back as pretty JSON.  Invalid configs are refused.
    pub fn save(&self, config: &EngineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text = serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(&self.path, text).map_err(|e| ConfigError::Io(e.to_string()))?;
        info!("Config saved to {}", self.path.display());
        Ok(())
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<EngineConfig, ConfigError> {
        let config = match std::fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str::<EngineConfig>(&text)
                .map_err(|e| ConfigError::Parse(e.to_string()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "Config file {} not found, using defaults",
                    self.path.display()
                );
                EngineConfig::default()
            }
            Err(e) => return Err(ConfigError::Io(e.to_string())),
        };
        config.validate()?;
        info!("Config loaded: {}", config.display_name);
        Ok(config)
    }
}

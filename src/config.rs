//! Engine configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::plugin::Quality;

/// Default playback level, also the unity point of the leveler.
pub const LEVEL_DEFAULT: f64 = 0.5;
/// Default balance, centered.
pub const BALANCE_DEFAULT: f64 = 0.5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub level: f64,
    pub balance: f64,
    pub resample_quality: Quality,
    /// Shared libraries loaded into the plugin registry at startup.
    pub plugin_paths: Vec<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            level: LEVEL_DEFAULT,
            balance: BALANCE_DEFAULT,
            resample_quality: Quality::default(),
            plugin_paths: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("Invalid engine config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.level),
            "level {} outside 0.0..=1.0",
            self.level
        );
        ensure!(
            (0.0..=1.0).contains(&self.balance),
            "balance {} outside 0.0..=1.0",
            self.balance
        );
        Ok(())
    }
}

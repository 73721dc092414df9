use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cycle::CycleConfig;
use crate::dedup::DedupConfig;
use crate::elixir::ElixirConfig;
use crate::frame::FrameSize;
use crate::towers::TowerConfig;

/// Tunables for the whole estimation engine. Every field has a default, so a
/// config file only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub frame: FrameSize,
    pub elixir: ElixirConfig,
    pub dedup: DedupConfig,
    pub towers: TowerConfig,
    pub cycle: CycleConfig,
    /// Detections below this confidence are dropped before routing
    pub min_confidence: f64,
    /// Labels never treated as card plays (compared case-insensitively)
    pub ignored_labels: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame: FrameSize::default(),
            elixir: ElixirConfig::default(),
            dedup: DedupConfig::default(),
            towers: TowerConfig::default(),
            cycle: CycleConfig::default(),
            min_confidence: 0.0,
            ignored_labels: vec!["unknown".to_string(), "clock".to_string()],
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "No engine config at {}. Using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!(
            "Engine config loaded: frame {}x{}",
            config.frame.width,
            config.frame.height
        );
        Ok(config)
    }
}

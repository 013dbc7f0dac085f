use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::load::{LoadGovernor, DEFAULT_HEADROOM, DEFAULT_PAUSE};
use crate::rate::DEFAULT_RATE_INTERVAL_SECS;
use crate::tracker::{TrackerSettings, DEFAULT_REFRESH_SECS};

/// Load throttling (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Load average ceiling; `<= 0` disables throttling.
    pub max_load: f64,
    /// Seconds to sleep between load checks while above the ceiling.
    #[serde(default = "default_pause_secs")]
    pub pause_secs: u64,
    /// Throttling starts at `max_load * headroom`.
    #[serde(default = "default_headroom")]
    pub headroom: f64,
}

fn default_pause_secs() -> u64 {
    DEFAULT_PAUSE.as_secs()
}

fn default_headroom() -> f64 {
    DEFAULT_HEADROOM
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_load: 0.0,
            pause_secs: default_pause_secs(),
            headroom: default_headroom(),
        }
    }
}

/// Configuration loaded from `~/.config/progress/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Never try gzip detection.
    pub raw: bool,
    /// Don't print the "starting" line.
    pub wait: bool,
    /// Chunk size for raw copies.
    pub read_buffer_bytes: usize,
    /// Decompressed chunk size for gzip input.
    pub gzip_buffer_bytes: usize,
    /// Maximum seconds between two progress lines.
    pub refresh_secs: u64,
    /// Minimum seconds between two rate recalculations.
    pub rate_interval_secs: u64,
    pub throttle: Option<ThrottleConfig>,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            raw: false,
            wait: false,
            read_buffer_bytes: 512 * 1024,
            gzip_buffer_bytes: 128 * 1024,
            refresh_secs: DEFAULT_REFRESH_SECS,
            rate_interval_secs: DEFAULT_RATE_INTERVAL_SECS,
            throttle: None,
        }
    }
}

impl ProgressConfig {
    /// Set the load ceiling, keeping any configured pause/headroom.
    pub fn set_max_load(&mut self, max_load: f64) {
        self.throttle.get_or_insert_with(ThrottleConfig::default).max_load = max_load;
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            refresh_secs: self.refresh_secs,
            rate_interval_secs: self.rate_interval_secs,
            announce_start: !self.wait,
        }
    }

    /// System-load governor, or `None` when throttling is off.
    pub fn governor(&self) -> Option<LoadGovernor> {
        let throttle = self.throttle.as_ref().filter(|t| t.max_load > 0.0)?;
        Some(
            LoadGovernor::system(throttle.max_load)
                .with_pause(Duration::from_secs(throttle.pause_secs))
                .with_headroom(throttle.headroom),
        )
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("progress")?;
    Ok(xdg_dirs.get_config_home().join("config.toml"))
}

/// Load configuration from `path`.
pub fn load_from_path(path: &Path) -> Result<ProgressConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: ProgressConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

/// Load the user configuration, or defaults if there is none.
pub fn load_or_default() -> Result<ProgressConfig> {
    let path = config_path()?;
    if !path.exists() {
        tracing::debug!("no config at {}, using defaults", path.display());
        return Ok(ProgressConfig::default());
    }
    load_from_path(&path)
}

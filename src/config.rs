// config.rs - Pool, navigation and application settings
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::core::target::Resolution;
use crate::core::view::{NavTuning, View};

/// Largest pool the coordinator accepts
pub const MAX_WORKERS: u32 = 64;
/// Pool size used when the core count cannot be queried
pub const FALLBACK_WORKERS: u32 = 6;

fn default_workers() -> u32 {
    std::thread::available_parallelism()
        .map(|n| (n.get() as u32).min(MAX_WORKERS))
        .unwrap_or(FALLBACK_WORKERS)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub workers: u32,
    pub width: u32,
    pub height: u32,
    /// Upper bound on the wait for one frame's completion flags
    pub completion_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            width: 1280,
            height: 720,
            completion_timeout_ms: 5000,
        }
    }
}

impl PoolConfig {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub pan_scale: f32,
    pub zoom_scale: f32,
    pub zoom_floor: f32,
    /// Half-width of the neutral band around an axis midpoint
    pub dead_zone: u8,
    pub initial_view: View,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        let tuning = NavTuning::default();
        Self {
            pan_scale: tuning.pan_scale,
            zoom_scale: tuning.zoom_scale,
            zoom_floor: tuning.zoom_floor,
            dead_zone: 8,
            initial_view: View::default(),
        }
    }
}

impl NavigationConfig {
    pub fn tuning(&self) -> NavTuning {
        NavTuning {
            pan_scale: self.pan_scale,
            zoom_scale: self.zoom_scale,
            zoom_floor: self.zoom_floor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pool: PoolConfig,
    pub navigation: NavigationConfig,
    /// Directory receiving `mandelNNNN.bmp` snapshots
    pub export_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            navigation: NavigationConfig::default(),
            export_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid configuration JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("In config file: {}", path.display()))
    }

    /// File settings (if `--config` was given) overridden by explicit flags
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(cli);
        Ok(config)
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(workers) = cli.workers {
            self.pool.workers = workers;
        }
        if let Some(width) = cli.width {
            self.pool.width = width;
        }
        if let Some(height) = cli.height {
            self.pool.height = height;
        }
        if let Some(timeout) = cli.timeout_ms {
            self.pool.completion_timeout_ms = timeout;
        }
        if let Some(dir) = &cli.export_dir {
            self.export_dir = dir.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert!(config.pool.workers >= 1 && config.pool.workers <= MAX_WORKERS);
        assert_eq!(config.pool.resolution(), Resolution::new(1280, 720));
        assert_eq!(config.pool.completion_timeout(), Duration::from_secs(5));
        assert_eq!(config.navigation.dead_zone, 8);
        assert_eq!(config.navigation.tuning(), NavTuning::default());
        assert_eq!(config.navigation.initial_view, View::default());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json(r#"{ "pool": { "workers": 3, "width": 320 } }"#).unwrap();
        assert_eq!(config.pool.workers, 3);
        assert_eq!(config.pool.width, 320);
        assert_eq!(config.pool.height, 720);
        assert_eq!(config.navigation, NavigationConfig::default());
    }

    #[test]
    fn initial_view_from_json() {
        let config = AppConfig::from_json(
            r#"{ "navigation": { "initial_view": { "zoom": 0.01, "center_x": -0.75, "center_y": 0.1 } } }"#,
        )
        .unwrap();
        assert_eq!(config.navigation.initial_view, View::new(0.01, -0.75, 0.1));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(AppConfig::from_json("{ pool: ").is_err());
    }

    #[test]
    fn flags_override_file_values() {
        let mut config = AppConfig::from_json(r#"{ "pool": { "workers": 3, "height": 100 } }"#).unwrap();
        let cli = Cli::parse_from(["mandelbrot-pool", "--workers", "5", "--timeout-ms", "250"]);
        config.apply_overrides(&cli);
        assert_eq!(config.pool.workers, 5);
        assert_eq!(config.pool.height, 100);
        assert_eq!(config.pool.completion_timeout_ms, 250);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = AppConfig::load(Path::new("/nonexistent/mandel.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("mandel.json"));
    }
}

// config.rs - Relay and simulation configuration
// Loaded from TOML (or JSON, by extension). Every field has a default, so an
// empty file is a valid configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::grid::{DEFAULT_GRID_SIZE, GridSize};

/// Relay tuning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Abandon a `calculate` whose module call runs longer than this.
    /// `None` waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_timeout_ms: Option<u64>,
}

impl RelayConfig {
    pub fn compute_timeout(&self) -> Option<Duration> {
        self.compute_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_compute_timeout(mut self, timeout: Duration) -> Self {
        self.compute_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }
}

/// Grid dimensions as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_side")]
    pub width: u32,

    #[serde(default = "default_side")]
    pub height: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { width: DEFAULT_GRID_SIZE, height: DEFAULT_GRID_SIZE }
    }
}

impl GridConfig {
    pub fn size(&self) -> Result<GridSize> {
        Ok(GridSize::new(self.width, self.height)?)
    }
}

fn default_side() -> u32 {
    DEFAULT_GRID_SIZE
}

/// Simulation settings for the CLI and viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeConfig {
    /// Module locator sent with `init`.
    #[serde(default = "default_module")]
    pub module: String,

    #[serde(default)]
    pub grid: GridConfig,

    /// Named starting pattern. Random seeding when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Fraction of live cells for random seeding.
    #[serde(default = "default_density")]
    pub density: f64,

    #[serde(default)]
    pub seed: u64,

    #[serde(default = "default_generations")]
    pub generations: u32,

    /// Delay between generations.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Stop once a generation repeats a recent one.
    #[serde(default = "default_true")]
    pub stop_on_cycle: bool,

    #[serde(default)]
    pub relay: RelayConfig,
}

fn default_module() -> String {
    "life".to_string()
}

fn default_density() -> f64 {
    0.33
}

fn default_generations() -> u32 {
    100
}

fn default_interval_ms() -> u64 {
    200
}

fn default_true() -> bool {
    true
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            module: default_module(),
            grid: GridConfig::default(),
            pattern: None,
            density: default_density(),
            seed: 0,
            generations: default_generations(),
            interval_ms: default_interval_ms(),
            stop_on_cycle: true,
            relay: RelayConfig::default(),
        }
    }
}

impl LifeConfig {
    /// Load config from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Save config to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.grid.size().context("invalid [grid] section")?;
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.density),
            "density must be between 0 and 1, got {}",
            self.density
        );
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("life.toml");
        std::fs::write(&path, "").unwrap();
        assert_eq!(LifeConfig::load(&path).unwrap(), LifeConfig::default());
    }

    #[test]
    fn toml_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("life.toml");
        std::fs::write(
            &path,
            r#"
module = "life-torus"
pattern = "Glider"
generations = 12

[grid]
width = 20

[relay]
compute_timeout_ms = 250
"#,
        )
        .unwrap();

        let config = LifeConfig::load(&path).unwrap();
        assert_eq!(config.module, "life-torus");
        assert_eq!(config.pattern.as_deref(), Some("Glider"));
        assert_eq!(config.grid.size().unwrap(), GridSize::new(20, DEFAULT_GRID_SIZE).unwrap());
        assert_eq!(config.relay.compute_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("life.json");
        let config = LifeConfig { seed: 7, ..LifeConfig::default() };
        config.save(&path).unwrap();
        assert_eq!(LifeConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn rejects_zero_grid_and_bad_density() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[grid]\nwidth = 0\n").unwrap();
        assert!(LifeConfig::load(&path).is_err());

        std::fs::write(&path, "density = 1.5\n").unwrap();
        assert!(LifeConfig::load(&path).is_err());
    }
}

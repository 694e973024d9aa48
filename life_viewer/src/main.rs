// main.rs - Conway's Game of Life viewer
// Generations are computed by the background relay; this thread only draws.
// Until the relay reports ready, steps run locally with the same rule.

use eframe::egui;
use egui::Color32;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tracing::{debug, warn};

use life_relay::compute::{RULE_PREFIX, TORUS_SUFFIX};
use life_relay::history::CycleDetector;
use life_relay::patterns::{self, PATTERNS};
use life_relay::{
    AliveSet, Coordinate, GridSize, HostMessage, LifeConfig, LifeModule, RelayHandle,
    RelayMessage, Rule, Topology,
};

mod ui;

/// Game of Life viewer backed by the compute relay
#[derive(Parser)]
#[command(name = "life-viewer", version, about)]
struct Args {
    /// Config file path (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compute module locator, overrides the config file
    #[arg(short, long)]
    module: Option<String>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    life_relay::logging::init_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(path) => LifeConfig::load(path)?,
        None => LifeConfig::default(),
    };
    if let Some(module) = args.module {
        config.module = module;
    }
    let app = GameOfLife::new(&config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 950.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Conway's Game of Life (Relay)",
        options,
        Box::new(move |_cc| Box::new(app)),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}

pub struct GameOfLife {
    pub cells: AliveSet,
    pub grid_size: GridSize,
    pub is_running: bool,
    pub last_update: Instant,
    pub update_interval: Duration,
    pub generation: u32,
    pub live_color: Color32,
    pub dead_color: Color32,
    pub selected_pattern: usize,
    pub density: f64,
    pub status: String,

    relay: RelayHandle,
    relay_ready: bool,
    pending: bool,      // a calculate is in flight
    stale: bool,        // cells were edited while it was in flight
    cycles: CycleDetector,
    seed: u64,
    fallback: LifeModule,
}

impl GameOfLife {
    fn new(config: &LifeConfig) -> anyhow::Result<Self> {
        let grid_size = config.grid.size()?;
        let relay = life_relay::spawn_builtin(config.relay.clone())
            .context("failed to start relay thread")?;
        relay.send(HostMessage::init(config.module.clone()))?;

        let selected_pattern = config
            .pattern
            .as_deref()
            .and_then(|name| PATTERNS.iter().position(|p| p.name.eq_ignore_ascii_case(name)))
            .unwrap_or(0);

        let mut game = Self {
            cells: AliveSet::new(),
            grid_size,
            is_running: false,
            last_update: Instant::now(),
            update_interval: config.interval(),
            generation: 0,
            live_color: Color32::from_rgb(0, 200, 0),
            dead_color: Color32::from_rgb(40, 40, 40),
            selected_pattern,
            density: config.density,
            status: format!("Loading `{}`...", config.module),
            relay,
            relay_ready: false,
            pending: false,
            stale: false,
            cycles: CycleDetector::default(),
            seed: config.seed,
            fallback: fallback_module(&config.module),
        };
        if config.pattern.is_some() {
            game.apply_selected_pattern();
        } else {
            game.apply_random_pattern();
        }
        Ok(game)
    }

    pub fn relay_ready(&self) -> bool {
        self.relay_ready
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    fn reset_history(&mut self) {
        self.generation = 0;
        self.cycles.reset();
        self.cycles.check(&self.cells);
        self.stale = self.pending;
    }

    fn advance(&mut self, cells: AliveSet) {
        self.cells = cells;
        self.generation += 1;
        if self.cycles.check(&self.cells) {
            self.is_running = false;
            self.status = format!("Cycle detected at generation {}", self.generation);
        }
    }
}

/// Local stand-in for the relay's module, resolved from the same locator.
/// Unknown locators fall back to plain B3/S23.
fn fallback_module(locator: &str) -> LifeModule {
    let locator = locator.trim();
    let (body, torus) = match locator.strip_suffix(TORUS_SUFFIX) {
        Some(body) => (body, true),
        None => (locator, locator == "life-torus"),
    };
    let rule = body
        .strip_prefix(RULE_PREFIX)
        .and_then(|notation| notation.parse::<Rule>().ok())
        .unwrap_or_default();
    let topology = if torus { Topology::Toroidal } else { Topology::Bounded };
    LifeModule::new(rule, topology)
}

/// Host-side controls driven by the UI module
pub trait GameOfLifeInterface {
    fn request_generation(&mut self);
    fn poll_relay(&mut self);
    fn clear_grid(&mut self);
    fn apply_selected_pattern(&mut self);
    fn apply_random_pattern(&mut self);
    fn toggle_cell(&mut self, cell: Coordinate);
    fn resize_grid(&mut self, size: GridSize);
}

impl GameOfLifeInterface for GameOfLife {
    fn request_generation(&mut self) {
        // One request in flight at a time
        if self.pending {
            return;
        }
        if !self.relay_ready {
            let next = self.fallback.step(&self.cells, self.grid_size);
            self.advance(next);
            return;
        }
        match self.relay.send(HostMessage::calculate(self.cells.clone(), self.grid_size)) {
            Ok(()) => {
                self.pending = true;
                self.stale = false;
            }
            Err(e) => {
                self.is_running = false;
                self.status = e.to_string();
            }
        }
    }

    fn poll_relay(&mut self) {
        loop {
            let message = match self.relay.try_recv() {
                Ok(Some(message)) => message,
                Ok(None) => break,
                Err(e) => {
                    self.is_running = false;
                    self.relay_ready = false;
                    self.pending = false;
                    self.status = format!("Relay stopped: {e}");
                    break;
                }
            };
            debug!(kind = message.kind(), "relay reply");

            match message {
                RelayMessage::Ready => {
                    self.relay_ready = true;
                    self.status = "Relay ready".to_string();
                }
                RelayMessage::Result { alive_cells } => {
                    self.pending = false;
                    if std::mem::take(&mut self.stale) {
                        continue;
                    }
                    self.advance(alive_cells);
                }
                RelayMessage::Error { error } => {
                    warn!(%error, "relay error");
                    self.pending = false;
                    self.stale = false;
                    self.is_running = false;
                    self.status = error;
                }
            }
        }
    }

    fn clear_grid(&mut self) {
        self.cells.clear();
        self.reset_history();
    }

    fn apply_selected_pattern(&mut self) {
        if let Some(pattern) = PATTERNS.get(self.selected_pattern) {
            self.cells = pattern.place(self.grid_size);
            self.reset_history();
        }
    }

    fn apply_random_pattern(&mut self) {
        self.cells = patterns::random_alive_set(self.grid_size, self.seed, self.density);
        self.seed = self.seed.wrapping_add(1);
        self.reset_history();
    }

    fn toggle_cell(&mut self, cell: Coordinate) {
        if self.grid_size.contains(cell) {
            self.cells.toggle(cell);
            self.stale = self.pending;
        }
    }

    fn resize_grid(&mut self, size: GridSize) {
        if size == self.grid_size {
            return;
        }
        self.grid_size = size;
        self.cells = self.cells.clipped_to(size);
        self.reset_history();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(module: &str, pattern: &str) -> LifeConfig {
        LifeConfig {
            module: module.to_string(),
            pattern: Some(pattern.to_string()),
            ..LifeConfig::default()
        }
    }

    fn cells(list: &[(i32, i32)]) -> AliveSet {
        list.iter().copied().collect()
    }

    #[test]
    fn steps_locally_until_relay_is_ready() {
        // This locator never loads, so the relay never reports ready
        let mut game = GameOfLife::new(&config("/pkg/missing.wasm", "Blinker")).unwrap();
        game.resize_grid(GridSize::new(5, 5).unwrap());
        game.cells = cells(&[(1, 2), (2, 2), (3, 2)]);

        game.request_generation();
        assert!(!game.relay_ready());
        assert!(!game.is_pending());
        assert_eq!(game.generation, 1);
        assert_eq!(game.cells, cells(&[(2, 1), (2, 2), (2, 3)]));
    }

    #[test]
    fn resize_clips_cells_and_clears_history() {
        let mut game = GameOfLife::new(&config("/pkg/missing.wasm", "Blinker")).unwrap();
        game.request_generation();
        assert_eq!(game.generation, 1);

        game.cells = cells(&[(1, 1), (8, 8)]);
        game.resize_grid(GridSize::square(5).unwrap());
        assert_eq!(game.grid_size, GridSize::square(5).unwrap());
        assert_eq!(game.cells, cells(&[(1, 1)]));
        assert_eq!(game.generation, 0);
    }

    #[test]
    fn fallback_follows_locator() {
        assert_eq!(fallback_module("life"), LifeModule::default());
        assert_eq!(fallback_module("life-torus").topology(), Topology::Toroidal);
        let custom = fallback_module("rule:B36/S23@torus");
        assert_eq!(custom.rule().to_string(), "B36/S23");
        assert_eq!(custom.topology(), Topology::Toroidal);
        assert_eq!(fallback_module("/pkg/life.wasm"), LifeModule::default());
    }
}

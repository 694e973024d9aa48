// main.rs - Drive Game of Life generations through the background relay
//
// Commands:
//   life-relay run      - seed a grid and print generations computed by the relay
//   life-relay serve    - speak the relay protocol as JSON lines on stdin/stdout
//   life-relay patterns - list built-in patterns

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tokio::io::BufReader;
use tracing::info;

use life_relay::grid::render_text;
use life_relay::history::CycleDetector;
use life_relay::logging::init_logging;
use life_relay::patterns::{self, PATTERNS};
use life_relay::{AliveSet, GridSize, LifeConfig, Relay, RelayClient};

#[derive(Parser)]
#[command(name = "life-relay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file path (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation and print each generation
    Run(RunArgs),

    /// Serve the relay protocol over stdin/stdout
    Serve(ServeArgs),

    /// List built-in patterns
    Patterns,
}

#[derive(Args)]
struct RunArgs {
    /// Compute module locator (e.g. `life`, `life-torus`, `rule:B36/S23`)
    #[arg(short, long)]
    module: Option<String>,

    /// Starting pattern; random fill when omitted
    #[arg(short, long)]
    pattern: Option<String>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Number of generations to compute
    #[arg(short = 'n', long)]
    generations: Option<u32>,

    /// Seed for random fill
    #[arg(long)]
    seed: Option<u64>,

    /// Fraction of live cells for random fill
    #[arg(long)]
    density: Option<f64>,

    /// Delay between generations in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Abandon a generation that takes longer than this
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Keep going after a cycle is detected
    #[arg(long)]
    no_stop_on_cycle: bool,

    /// Print only the last generation
    #[arg(short, long)]
    quiet: bool,
}

impl RunArgs {
    fn apply(&self, mut config: LifeConfig) -> LifeConfig {
        if let Some(module) = &self.module {
            config.module = module.clone();
        }
        if let Some(pattern) = &self.pattern {
            config.pattern = Some(pattern.clone());
        }
        if let Some(width) = self.width {
            config.grid.width = width;
        }
        if let Some(height) = self.height {
            config.grid.height = height;
        }
        if let Some(generations) = self.generations {
            config.generations = generations;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(density) = self.density {
            config.density = density;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.interval_ms = interval_ms;
        }
        if self.timeout_ms.is_some() {
            config.relay.compute_timeout_ms = self.timeout_ms;
        }
        if self.no_stop_on_cycle {
            config.stop_on_cycle = false;
        }
        config
    }
}

#[derive(Args)]
struct ServeArgs {
    /// Abandon a generation that takes longer than this
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = match &cli.config {
        Some(path) => LifeConfig::load(path)?,
        None => LifeConfig::default(),
    };

    match cli.command {
        Commands::Run(args) => run(args.apply(config), args.quiet).await,
        Commands::Serve(args) => serve(args, config).await,
        Commands::Patterns => {
            for pattern in PATTERNS {
                let (w, h) = pattern.extent();
                println!("{:<20} {:>3} cells  {}x{}", pattern.name, pattern.cells.len(), w, h);
            }
            Ok(())
        }
    }
}

async fn run(config: LifeConfig, quiet: bool) -> Result<()> {
    config.validate()?;
    let grid = config.grid.size()?;

    let mut cells = match config.pattern.as_deref() {
        Some(name) => patterns::find(name)
            .with_context(|| format!("unknown pattern `{name}` (see `life-relay patterns`)"))?
            .place(grid),
        None => patterns::random_alive_set(grid, config.seed, config.density),
    };

    let mut client: RelayClient = life_relay::spawn_builtin(config.relay.clone())
        .context("failed to start relay thread")?
        .into_client();
    client
        .init(&config.module)
        .await
        .with_context(|| format!("relay could not load `{}`", config.module))?;
    info!(module = %config.module, %grid, "relay ready");

    let mut cycles = CycleDetector::default();
    cycles.check(&cells);
    if !quiet {
        print_generation(0, &cells, grid);
    }

    let mut last = 0;
    for generation in 1..=config.generations {
        cells = client
            .calculate(cells, grid)
            .await
            .with_context(|| format!("generation {generation} failed"))?;
        last = generation;

        if !quiet {
            print_generation(generation, &cells, grid);
        }
        if config.stop_on_cycle && cycles.check(&cells) {
            println!("Cycle detected at generation {generation}");
            break;
        }
        if config.interval_ms > 0 && generation < config.generations {
            tokio::time::sleep(config.interval()).await;
        }
    }

    if quiet {
        print_generation(last, &cells, grid);
    }
    Ok(())
}

fn print_generation(generation: u32, cells: &AliveSet, grid: GridSize) {
    let population = cells.len() as f64 / grid.area() as f64 * 100.0;
    println!("Generation: {generation}  Live cells: {}  Population: {population:.1}%", cells.len());
    print!("{}", render_text(cells, grid, '#', '.'));
    println!();
}

async fn serve(args: ServeArgs, mut config: LifeConfig) -> Result<()> {
    if args.timeout_ms.is_some() {
        config.relay.compute_timeout_ms = args.timeout_ms;
    }
    info!(relay = ?config.relay, "serving relay protocol on stdio");

    Relay::builtin(config.relay)
        .serve_lines(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
        .context("relay transport failed")
}

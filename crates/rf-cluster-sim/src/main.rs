//! Cluster-pays simulator CLI
//!
//! Usage:
//!   rf-cluster-sim simulate --spins 1000000 --bet 600   - Parallel RTP run
//!   rf-cluster-sim spin --seed 42                       - One spin, step by step
//!   rf-cluster-sim reconcile --grid grid.json --declared 900
//!   rf-cluster-sim config --format yaml                 - Dump the default config
//!
//! `--config FILE` (JSON or YAML) overrides game settings for every command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use rf_cluster::{GameConfig, Grid, SpinOutcome};
use rf_cluster_sim::{
    ConfigFormat, SimulationConfig, Simulator, load_game_config, render_game_config,
};

#[derive(Parser)]
#[command(name = "rf-cluster-sim", about = "Cluster-pays engine simulator")]
struct Cli {
    /// Game config overrides (.json, .yaml, .yml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a parallel batch simulation
    Simulate {
        /// Total spins
        #[arg(short, long, default_value_t = 100_000)]
        spins: u64,
        /// Base-game bet
        #[arg(short, long, default_value_t = 600.0)]
        bet: f64,
        /// Master seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Worker threads (0 = one per CPU)
        #[arg(short, long, default_value_t = 0)]
        workers: usize,
        /// Write the JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Play one seeded spin and print every cascade step
    Spin {
        #[arg(short, long, default_value_t = 600.0)]
        bet: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Bound a declared payout for a grid file (JSON rows)
    Reconcile {
        #[arg(short, long)]
        grid: PathBuf,
        #[arg(short, long, default_value_t = 600.0)]
        bet: f64,
        /// Payout claimed for the grid
        #[arg(short, long)]
        declared: f64,
    },
    /// Print the effective game config
    Config {
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

impl From<Format> for ConfigFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => ConfigFormat::Json,
            Format::Yaml => ConfigFormat::Yaml,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let game = match &cli.config {
        Some(path) => load_game_config(path)
            .with_context(|| format!("loading game config {}", path.display()))?,
        None => GameConfig::default(),
    };

    match cli.command {
        Commands::Simulate {
            spins,
            bet,
            seed,
            workers,
            output,
        } => simulate(game, spins, bet, seed, workers, output.as_deref()),
        Commands::Spin { bet, seed, json } => spin(game, bet, seed, json),
        Commands::Reconcile {
            grid,
            bet,
            declared,
        } => reconcile(game, &grid, bet, declared),
        Commands::Config { format, output } => dump_config(&game, format, output.as_deref()),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn simulate(
    game: GameConfig,
    spins: u64,
    bet: f64,
    seed: u64,
    workers: usize,
    output: Option<&Path>,
) -> Result<()> {
    let settings = SimulationConfig::default()
        .with_spins(spins)
        .with_bet(bet)
        .with_seed(seed)
        .with_workers(workers);
    let report = Simulator::new(game)?.run(&settings)?;

    println!("{}", report.summary());
    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
        println!("report written to {}", path.display());
    }
    Ok(())
}

fn spin(game: GameConfig, bet: f64, seed: u64, json: bool) -> Result<()> {
    let outcome = Simulator::new(game)?.spin_once(bet, seed)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn print_outcome(outcome: &SpinOutcome) {
    let result = &outcome.result;
    println!("initial grid ({} scatters):", result.scatter_count);
    print!("{}", result.initial_grid);

    for step in &result.steps {
        println!();
        println!("step {}: payout {:.2}", step.step_index, step.payout);
        for win in &step.wins {
            println!(
                "  symbol {} x{} -> {:.2} ({}x bet)",
                win.symbol, win.size, win.amount, win.multiplier
            );
        }
        println!("after clear:");
        print!("{}", step.grid_after_clear);
        println!("after refill:");
        print!("{}", step.grid_after_refill);
    }

    println!();
    println!(
        "total payout {:.2} ({:.2}x bet), {} cascades",
        result.total_payout,
        result.win_ratio,
        result.cascade_count()
    );
    println!("bonus: {:?}", outcome.settlement.event);
}

fn reconcile(game: GameConfig, grid_path: &Path, bet: f64, declared: f64) -> Result<()> {
    let text = fs::read_to_string(grid_path)
        .with_context(|| format!("reading grid {}", grid_path.display()))?;
    let grid: Grid = serde_json::from_str(&text)
        .with_context(|| format!("parsing grid {}", grid_path.display()))?;

    let reconciliation = Simulator::new(game)?.reconcile(&grid, bet, declared)?;
    println!("bound    {:.2}", reconciliation.bound);
    println!("declared {:.2}", reconciliation.declared);
    println!(
        "accepted {:.2}{}",
        reconciliation.accepted,
        if reconciliation.was_clamped() {
            " (clamped)"
        } else {
            ""
        }
    );
    Ok(())
}

fn dump_config(game: &GameConfig, format: Format, output: Option<&Path>) -> Result<()> {
    let text = render_game_config(game, format.into())?;
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("writing config {}", path.display()))?
        }
        None => print!("{}", text),
    }
    Ok(())
}

//! Headless Skirmish Runner
//!
//! Runs one Blue vs Orange match on a map file and prints a summary.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use skirmish_ai::battle::{standard_battle, BattleMap, BattleSummary, DEFAULT_MAP_SIZE};
use skirmish_ai::core::config::TacticsConfig;
use skirmish_ai::core::error::Result;

/// Headless Skirmish Runner - autonomous squads, one match per run
#[derive(Parser, Debug)]
#[command(name = "skirmish_runner")]
#[command(about = "Run a Blue vs Orange squad skirmish and output a summary")]
struct Args {
    /// ASCII map file; an open grid is used when omitted
    #[arg(long)]
    map: Option<PathBuf>,

    /// Tactics config (TOML); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum ticks before timeout (draw)
    #[arg(long, default_value_t = 36_000)]
    max_ticks: u64,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Debug logging and per-event output on stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct RunResult {
    seed: u64,
    map_size: usize,
    #[serde(flatten)]
    summary: BattleSummary,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "skirmish_ai=debug"
    } else {
        "skirmish_ai=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let seed = args.seed.unwrap_or_else(rand::random);

    let config = match &args.config {
        Some(path) => TacticsConfig::load(path)?,
        None => TacticsConfig::default(),
    };
    let map = match &args.map {
        Some(path) => BattleMap::from_ascii(&std::fs::read_to_string(path)?)?,
        None => BattleMap::new(DEFAULT_MAP_SIZE),
    };
    let map_size = map.size;

    let mut state = standard_battle(map, config, seed)?;
    tracing::info!(seed, map_size, "skirmish starting");

    while !state.is_finished() && state.tick < args.max_ticks {
        let events = state.advance_tick();
        if args.verbose {
            for event in &events.events {
                eprintln!("  [{}] {:?}: {}", event.tick, event.event_type, event.description);
            }
        }
    }
    // Timeout ends as a draw
    state.run(args.max_ticks);

    let result = RunResult {
        seed,
        map_size,
        summary: state.summary(),
    };

    match args.format.as_str() {
        "text" => print_text(&result),
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}

fn print_text(result: &RunResult) {
    let summary = &result.summary;
    println!("Skirmish Result");
    println!("===============");
    println!("Outcome: {:?}", summary.outcome);
    println!("Ticks: {}", summary.ticks);
    println!("Survivors: Blue {} / Orange {}", summary.blue_survivors, summary.orange_survivors);
    println!();
    println!("Shots: {}", summary.stats.shots);
    println!("Grenades: {}", summary.stats.grenades);
    println!("Kills: {}", summary.stats.kills);
    println!("Heals: {}", summary.stats.heals);
    println!("Resupplies: {}", summary.stats.resupplies);
    println!(
        "Orders: {} issued, {} refused",
        summary.stats.orders, summary.stats.refused_orders
    );
    println!(
        "Stability: {} loops broken, {} concealment escapes",
        summary.stats.loops_broken, summary.stats.concealment_escapes
    );
    println!();
    println!("Seed: {} ({}x{} map)", result.seed, result.map_size, result.map_size);
}

//! Headless arena runner: simulates a match and logs the scoreboard.

use std::path::PathBuf;

use anyhow::{Context, Result};
use brawl::constants::TILE_SIZE;
use brawl::level::DEMO_ARENA;
use brawl::{init_logging, Arena, SimConfig, TileMap};
use clap::Parser;
use log::info;

/// Runs a headless arena match and prints the scoreboard to the log.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// Number of fixed ticks to simulate
    #[arg(long, default_value_t = 1800)]
    ticks: u64,
    /// Number of AI opponents
    #[arg(long, default_value_t = 3)]
    npcs: usize,
    /// Level file: an ASCII grid, or JSON when the extension is `.json`
    #[arg(long)]
    level: Option<PathBuf>,
    /// JSON simulation config
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(path: Option<&PathBuf>) -> Result<SimConfig> {
    let Some(file) = path else {
        return Ok(SimConfig::default());
    };
    SimConfig::load(file).with_context(|| format!("loading config {}", file.display()))
}

fn load_level(path: Option<&PathBuf>) -> Result<TileMap> {
    match path {
        Some(file) => TileMap::load(file, TILE_SIZE)
            .with_context(|| format!("loading level {}", file.display())),
        None => TileMap::parse(DEMO_ARENA, TILE_SIZE).context("parsing the built-in arena"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_ref())?;
    let map = load_level(args.level.as_ref())?;
    let mut arena = Arena::new(config, map);
    arena.populate(args.npcs);

    let mut kills = 0_usize;
    for _ in 0..args.ticks {
        kills += arena.tick().eliminations.len();
    }

    let seconds = args.ticks / u64::from(arena.config().tick_rate.max(1));
    info!("{} ticks (~{seconds} s), {kills} eliminations", args.ticks);
    for (rank, score) in arena.scoreboard().iter().enumerate() {
        info!("{:>2}. {} {:?}: {} kills", rank + 1, score.id, score.role, score.kills);
    }
    Ok(())
}

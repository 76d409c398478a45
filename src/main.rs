//! Flappy Lookahead entry point
//!
//! Runs one game headless, letting the lookahead search fly the bird.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;

use flappy_lookahead::driver::{self, FrameSink, JsonLinesSink, NullSink, Paced};
use flappy_lookahead::{Config, GameState, ScoringPolicy, SearchTree};

#[derive(Parser, Debug)]
#[command(name = "flappy-lookahead")]
#[command(about = "Side-scrolling bird game flown by a depth-first lookahead search")]
struct Cli {
    /// JSON configuration file (missing fields use defaults)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Run seed (defaults to the current time)
    #[arg(long)]
    seed: Option<u64>,
    /// Stop after this many frames even if the bird survives
    #[arg(long, default_value_t = 10_000)]
    frames: u64,
    /// Override the search depth limit
    #[arg(long)]
    depth: Option<usize>,
    /// Override the scoring policy (threat or center)
    #[arg(long)]
    scoring: Option<ScoringPolicy>,
    /// Write one JSON record per frame to this file
    #[arg(long)]
    trace: Option<PathBuf>,
    /// Pace frames at the simulated time step
    #[arg(long, default_value_t = false)]
    realtime: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(depth) = cli.depth {
        config.search.depth_limit = depth;
    }
    if let Some(scoring) = cli.scoring {
        config.search.scoring = scoring;
    }
    config
        .validate()
        .context("invalid configuration after command line overrides")?;

    let seed = cli.seed.unwrap_or_else(time_seed);
    log::info!(
        "Flappy Lookahead starting with seed {} ({} scoring)",
        seed,
        config.search.scoring.as_str()
    );

    let time_step = config.search.time_step;
    let state = GameState::new(&config, seed);
    let mut tree = SearchTree::new(config, state);

    let sink: Box<dyn FrameSink> = match &cli.trace {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create trace {}", path.display()))?;
            Box::new(JsonLinesSink::new(BufWriter::new(file)))
        }
        None => Box::new(NullSink),
    };
    let mut sink: Box<dyn FrameSink> = if cli.realtime {
        Box::new(Paced::realtime(sink, time_step))
    } else {
        sink
    };

    let summary = driver::run(&mut tree, sink.as_mut(), cli.frames).context("frame loop failed")?;
    let stats = tree.stats();
    println!(
        "{} after {} frames: {} pipes passed ({} expansions, {} climbs)",
        if summary.game_over() { "Game over" } else { "Stopped" },
        summary.frames,
        summary.pass_count,
        stats.expansions,
        stats.climbs
    );
    Ok(())
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

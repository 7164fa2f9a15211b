//! Tsumego Storm: timed Go tactics runs from the command line.
//!
//! ## Usage
//!
//! - `tsumego-storm play --archive puzzles.json` - Start a run on the console
//! - `tsumego-storm demo` - Solve a built-in puzzle set automatically

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tsumego_storm::archive::Archive;
use tsumego_storm::board::Board;
use tsumego_storm::console::Console;
use tsumego_storm::session::{MoveOutcome, Session, SessionConfig};

/// Tsumego Storm: solve as many Go puzzles as you can before the clock runs out
#[derive(Parser)]
#[command(name = "tsumego-storm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a run on the interactive console
    Play {
        /// Puzzle archive: a JSON array of parsed puzzle trees
        #[arg(short, long)]
        archive: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },
    /// Play through a small built-in puzzle set, answering every puzzle correctly
    Demo {
        #[command(flatten)]
        options: RunOptions,
    },
}

#[derive(Args)]
struct RunOptions {
    /// Starting time of the run in seconds
    #[arg(long)]
    duration: Option<u64>,

    /// Puzzles drawn per rank
    #[arg(long)]
    quota: Option<usize>,

    /// Seconds lost on a wrong move
    #[arg(long)]
    malus: Option<i64>,

    /// Seed for reproducible puzzle selection
    #[arg(long)]
    seed: Option<u64>,
}

impl RunOptions {
    fn config(&self) -> SessionConfig {
        let mut config = SessionConfig::default();
        if let Some(secs) = self.duration {
            config.duration = Duration::from_secs(secs);
        }
        if let Some(quota) = self.quota {
            config.puzzles_per_rank = quota;
        }
        if let Some(malus) = self.malus {
            config.malus_secs = malus;
        }
        config.seed = self.seed;
        config
    }
}

const DEMO_ARCHIVE: &str = r#"[
    {"data": {"SZ": ["9"], "PL": ["B"], "BR": ["15K"], "WR": ["15K"],
              "GC": ["Capture the white stone"], "AW": ["aa"], "AB": ["ba"]},
     "children": [{"data": {"B": ["ab"], "C": ["Captured."]}}]},
    {"data": {"SZ": ["9"], "PL": ["W"], "BR": ["10K+"], "WR": ["10K"],
              "GC": ["White to play"], "AB": ["cc", "dc"], "AW": ["bc", "cb", "db"]},
     "children": [{"data": {"W": ["ec"]},
                   "children": [{"data": {"B": ["cd"]},
                                 "children": [{"data": {"W": ["dd"]}}]}]},
                  {"data": {"W": ["cd"], "BM": ["1"]}}]},
    {"data": {"SZ": ["9"], "PL": ["B"], "BR": ["1D"], "WR": ["1D"],
              "GC": ["Black to live"], "AB": ["ab", "bb", "cb"], "AW": ["ac", "bc", "cc", "db"],
              "TR": ["ba"]},
     "children": [{"data": {"B": ["ba"], "TE": ["1"]}}]}
]"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Play { archive, options }) => {
            let archive = Archive::load(&archive)?;
            let session: Session<Board> = Session::new(Arc::new(archive), options.config())
                .context("failed to set up the run")?;
            println!("{}", session.board());
            Console::new(session).run_stdio()
        }
        Some(Commands::Demo { options }) => run_demo(options.config()),
        None => run_demo(SessionConfig::default()),
    }
}

fn run_demo(mut config: SessionConfig) -> Result<()> {
    println!("Tsumego Storm demo\n");
    if config.seed.is_none() {
        config.seed = Some(1);
    }
    config.puzzles_per_rank = config.puzzles_per_rank.min(2);

    let archive = Archive::from_json_str(DEMO_ARCHIVE)?;
    let mut session: Session<Board> =
        Session::new(Arc::new(archive), config).context("failed to set up the demo run")?;
    let t0 = Instant::now();
    let mut step = 0u64;

    while session.records().len() < session.puzzles().len() {
        // Answer with the first acceptable child of the cursor
        let answer = session
            .puzzle()
            .tree
            .children(session.cursor())
            .filter(|n| !n.is_bad_move())
            .find_map(|n| n.stone().ok().flatten());
        let Some((_, vertex)) = answer else {
            break;
        };

        let index = session.puzzle_index();
        let rank = session.puzzle().display_rank().to_string();
        step += 1;
        let outcome = session.attempt_move(vertex, t0 + Duration::from_secs(step * 2));
        println!("puzzle {index} ({rank}) {vertex}: {outcome:?}");
        if matches!(outcome, MoveOutcome::Rejected) {
            break;
        }
    }

    if let Some(summary) = session.summary() {
        println!("\n{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

//! Tsumego Storm: a timed Go tactics trainer.
//!
//! A run draws a fixed number of puzzles per rank, easiest first, and the
//! player solves them against a countdown. Correct moves build a combo that
//! buys extra time; wrong moves cost time and fail the puzzle. When the list
//! is exhausted or time runs out the run switches to review, where every
//! puzzle can be replayed and explored freely.
//!
//! ## Modules
//!
//! - [`constants`] - Run timing, combo and selection defaults
//! - [`coord`] - Two-letter point encoding
//! - [`tree`] - Arena-backed solution trees
//! - [`puzzle`] - Puzzle metadata on top of a tree
//! - [`archive`] - Loaded-once puzzle archive
//! - [`annotations`] - Crop rectangles, markers and review hints
//! - [`selector`] - Per-rank puzzle selection
//! - [`clock`] - Countdown with bonus and malus
//! - [`combo`] - Combo streaks, score and run statistics
//! - [`board`] - Board engine seam and a simple implementation
//! - [`session`] - The session state machine
//! - [`console`] - Line-oriented command console
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Instant;
//!
//! use tsumego_storm::archive::Archive;
//! use tsumego_storm::board::Board;
//! use tsumego_storm::coord::decode;
//! use tsumego_storm::session::{MoveOutcome, Session, SessionConfig};
//!
//! let json = r#"[{"data": {"BR": ["5K"], "PL": ["W"], "AB": ["dd"]},
//!                 "children": [{"data": {"W": ["de"]}}]}]"#;
//! let archive = Arc::new(Archive::from_json_str(json).unwrap());
//! let config = SessionConfig { puzzles_per_rank: 1, ..SessionConfig::default() };
//! let mut session: Session<Board> = Session::new(archive, config).unwrap();
//!
//! let outcome = session.attempt_move(decode("de").unwrap(), Instant::now());
//! assert_eq!(outcome, MoveOutcome::Passed { bonus: None });
//! assert_eq!(session.tracker().score, 1);
//! ```

pub mod annotations;
pub mod archive;
pub mod board;
pub mod clock;
pub mod combo;
pub mod console;
pub mod constants;
pub mod coord;
pub mod error;
pub mod puzzle;
pub mod selector;
pub mod session;
pub mod tree;

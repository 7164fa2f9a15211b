//! Line-oriented command console over a [`Session`].
//!
//! The console is the host event loop for the CLI: each line is one event,
//! and the clock is ticked before every command. Responses follow the GTP
//! convention of `=` for success and `?` for failure, with an optional
//! numeric id echoed back.
//!
//! ## Supported Commands
//!
//! - `play <vertex>` - Click a point, given as two letters (e.g. `dd`)
//! - `back` / `forward` - Walk the tree during review
//! - `load <n>` - Jump to puzzle `n` of the finished run
//! - `status` - JSON snapshot of the session
//! - `showboard` - The cropped board as text
//! - `summary` - Run statistics, once reviewing
//! - `again` - Start a new run
//! - `list_commands`, `known_command <cmd>`, `name`, `version`, `quit`

use std::io::{self, BufRead, Write};
use std::time::Instant;

use anyhow::Result;
use tracing::warn;

use crate::board::{Board, Color};
use crate::clock::ClockStatus;
use crate::coord::{Vertex, decode};
use crate::session::{MoveOutcome, Session};

/// The list of known console commands.
const KNOWN_COMMANDS: &[&str] = &[
    "again",
    "back",
    "forward",
    "known_command",
    "list_commands",
    "load",
    "name",
    "play",
    "quit",
    "showboard",
    "status",
    "summary",
    "version",
];

pub struct Console {
    session: Session<Board>,
}

impl Console {
    pub fn new(session: Session<Board>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session<Board> {
        &self.session
    }

    /// Run the command loop over `input`, writing responses to `output`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            let (success, message) = self.execute(&command, args, Instant::now());

            for warning in self.session.take_warnings() {
                warn!(%warning, "puzzle data");
            }

            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Run against stdin and stdout.
    pub fn run_stdio(&mut self) -> Result<()> {
        let stdin = io::stdin();
        self.run(stdin.lock(), io::stdout())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    /// Execute one command at time `now` and return (success, response).
    pub fn execute(&mut self, command: &str, args: &[&str], now: Instant) -> (bool, String) {
        let status = self.session.tick(now);
        let expired_note = if status == ClockStatus::Expired && command != "status" {
            "time is up\n"
        } else {
            ""
        };

        let (success, message) = match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => match args.first() {
                None => (false, "missing argument".to_string()),
                Some(cmd) => {
                    let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                    (true, known.to_string())
                }
            },

            "quit" => (true, String::new()),

            "play" => match args.first().map(|a| decode(&a.to_lowercase())) {
                None => (false, "missing argument".to_string()),
                Some(Err(e)) => (false, e.to_string()),
                Some(Ok(vertex)) => self.play(vertex, now),
            },

            "back" => match self.session.back() {
                Ok(moved) => (true, if moved { "ok" } else { "at start" }.to_string()),
                Err(e) => (false, e.to_string()),
            },

            "forward" => match self.session.forward() {
                Ok(moved) => (true, if moved { "ok" } else { "at end" }.to_string()),
                Err(e) => (false, e.to_string()),
            },

            "load" => match args.first().map(|a| a.parse::<usize>()) {
                None => (false, "missing argument".to_string()),
                Some(Err(_)) => (false, "invalid puzzle index".to_string()),
                Some(Ok(index)) => match self.session.load_puzzle(index) {
                    Ok(()) => (true, format!("puzzle {index}")),
                    Err(e) => (false, e.to_string()),
                },
            },

            "status" => match serde_json::to_string(&self.session.snapshot()) {
                Ok(json) => (true, json),
                Err(e) => (false, e.to_string()),
            },

            "showboard" => (true, self.render_board()),

            "summary" => match self.session.summary() {
                Some(summary) => match serde_json::to_string(&summary) {
                    Ok(json) => (true, json),
                    Err(e) => (false, e.to_string()),
                },
                None => (false, "run still in progress".to_string()),
            },

            "again" => match self.session.start_run() {
                Ok(()) => (true, "new run".to_string()),
                Err(e) => (false, e.to_string()),
            },

            _ => (false, format!("unknown command: {command}")),
        };

        (success, format!("{expired_note}{message}"))
    }

    fn play(&mut self, vertex: Vertex, now: Instant) -> (bool, String) {
        let before = self.session.puzzle_index();
        let message = match self.session.attempt_move(vertex, now) {
            MoveOutcome::Rejected => return (false, "point not playable".to_string()),
            MoveOutcome::Correct { bonus } => with_bonus("correct", bonus),
            MoveOutcome::Passed { bonus } => with_bonus("solved", bonus),
            MoveOutcome::Failed => format!("wrong (-{}s)", self.session.config().malus_secs),
            MoveOutcome::Aborted => "puzzle data unplayable, skipped".to_string(),
            MoveOutcome::TimeUp => return (false, "time is up".to_string()),
            MoveOutcome::Explored { node, created } => {
                if created {
                    format!("new variation {node}")
                } else {
                    format!("node {node}")
                }
            }
        };
        let after = self.session.puzzle_index();
        if after != before {
            (true, format!("{message}\npuzzle {after}"))
        } else {
            (true, message)
        }
    }

    /// Render the cropped part of the board, with the side to move.
    fn render_board(&self) -> String {
        let board = self.session.board();
        let crop = self.session.crop();
        let mut out = String::new();
        for y in crop.min_y..=crop.max_y {
            for x in crop.min_x..=crop.max_x {
                let ch = match board.get(Vertex::new(x, y)) {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                };
                out.push(ch);
                out.push(' ');
            }
            out.push('\n');
        }
        out.push_str(&format!("{} to play", self.session.to_play()));
        out
    }
}

fn with_bonus(word: &str, bonus: Option<i64>) -> String {
    match bonus {
        Some(seconds) => format!("{word} (+{seconds}s)"),
        None => word.to_string(),
    }
}

//! The puzzle session: a timed run over a list of puzzles, then a review.
//!
//! A session is in one of two modes. While [`Mode::Solving`], each clicked
//! vertex is checked against the children of the cursor node: a match plays
//! the move and the opponent's main-line reply, a miss fails the puzzle. When the list runs out or the clock expires the session switches
//! to [`Mode::Reviewing`] for good, where the same trees can be walked back
//! and forth and new variations can be added without touching the score.
//!
//! All entry points take the host's `now`; the session never reads the time
//! itself.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::annotations::{
    Marker, MoveHint, Rect, bounding_box, display_crop, markers_for_node, move_hints,
};
use crate::archive::Archive;
use crate::board::{Board, BoardState, Color};
use crate::clock::{ClockStatus, SessionClock};
use crate::combo::{ComboTracker, RunSummary, check_levels};
use crate::constants::{
    BONUS_DISPLAY_MILLIS, COMBO_BONUS_SECS, COMBO_LEVELS, COMBO_REPEAT_PERIOD, DURATION_SECS,
    EXCLUDED_CATEGORY, MALUS_SECS, PUZZLES_PER_RANK,
};
use crate::coord::Vertex;
use crate::error::SessionError;
use crate::puzzle::Puzzle;
use crate::selector::select;
use crate::tree::{GameTree, Node, NodeId};

// =============================================================================
// Configuration
// =============================================================================

/// Tunable parameters of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub duration: Duration,
    /// Seconds removed on a wrong move.
    pub malus_secs: i64,
    pub combo_levels: Vec<u32>,
    pub combo_bonus_secs: Vec<i64>,
    pub combo_repeat_period: u32,
    pub puzzles_per_rank: usize,
    /// Puzzles whose category contains this marker are never selected.
    pub excluded_category: String,
    pub bonus_display: Duration,
    /// Fixed seed for reproducible selection.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(DURATION_SECS),
            malus_secs: MALUS_SECS,
            combo_levels: COMBO_LEVELS.to_vec(),
            combo_bonus_secs: COMBO_BONUS_SECS.to_vec(),
            combo_repeat_period: COMBO_REPEAT_PERIOD,
            puzzles_per_rank: PUZZLES_PER_RANK,
            excluded_category: EXCLUDED_CATEGORY.to_string(),
            bonus_display: Duration::from_millis(BONUS_DISPLAY_MILLIS),
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        let invalid = |msg: &str| Err(SessionError::InvalidConfig(msg.to_string()));
        if self.duration.is_zero() {
            return invalid("duration must be positive");
        }
        if self.puzzles_per_rank == 0 {
            return invalid("puzzles per rank must be positive");
        }
        check_levels(
            &self.combo_levels,
            &self.combo_bonus_secs,
            self.combo_repeat_period,
        )
    }
}

// =============================================================================
// Session Types
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Solving,
    Reviewing,
}

impl Mode {
    fn name(self) -> &'static str {
        match self {
            Mode::Solving => "solving",
            Mode::Reviewing => "reviewing",
        }
    }
}

/// Everything needed to undo one move.
#[derive(Clone, Debug)]
pub struct HistoryFrame<B> {
    pub board: B,
    pub node: NodeId,
    pub to_play: Color,
}

/// Outcome of one attempted puzzle, indexed by its position in the run.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct PuzzleRecord {
    pub elapsed_seconds: f64,
    pub passed: bool,
}

/// Problems found in puzzle data. Navigation carries on past them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataWarning {
    /// The root declares no side to move; one was inferred.
    MissingSideToMove { puzzle: usize, assumed: Color },
    /// A node that should carry a move has none.
    MissingMove { puzzle: usize, node: NodeId },
    /// A node's move coordinate could not be decoded.
    MalformedMove {
        puzzle: usize,
        node: NodeId,
        message: String,
    },
    /// The board engine refused a move taken from the tree or a review click.
    IllegalMove {
        puzzle: usize,
        node: Option<NodeId>,
        message: String,
    },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataWarning::MissingSideToMove { puzzle, assumed } => {
                write!(f, "puzzle {puzzle}: no side to move, assuming {assumed}")
            }
            DataWarning::MissingMove { puzzle, node } => {
                write!(f, "puzzle {puzzle}: node {node} has no move")
            }
            DataWarning::MalformedMove {
                puzzle,
                node,
                message,
            } => write!(f, "puzzle {puzzle}: node {node}: {message}"),
            DataWarning::IllegalMove {
                puzzle,
                node: Some(node),
                message,
            } => write!(f, "puzzle {puzzle}: node {node}: {message}"),
            DataWarning::IllegalMove {
                puzzle,
                node: None,
                message,
            } => write!(f, "puzzle {puzzle}: {message}"),
        }
    }
}

/// Result of [`Session::attempt_move`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Vertex occupied or off the board; nothing changed.
    Rejected,
    /// Correct move, puzzle still in progress.
    Correct { bonus: Option<i64> },
    /// Correct move that finished the puzzle.
    Passed { bonus: Option<i64> },
    /// Wrong move; the puzzle is failed.
    Failed,
    /// The board engine refused a move from the tree, or the reply to a
    /// correct move could not be played. The puzzle is failed without malus.
    Aborted,
    /// The clock ran out before the click; the run is over.
    TimeUp,
    /// Review move onto `node`, created if the tree did not have it.
    Explored { node: NodeId, created: bool },
}

/// A marker at a vertex, for snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MarkerAt {
    pub vertex: Vertex,
    pub marker: Marker,
}

/// Read-only view of a session for the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub mode: Mode,
    pub puzzle_index: usize,
    pub puzzle_count: usize,
    pub cursor: NodeId,
    pub to_play: Color,
    pub clock: ClockStatus,
    pub remaining_seconds: f64,
    pub displayed_bonus: Option<i64>,
    pub bonus_seconds: i64,
    pub combo: u32,
    pub max_combo: u32,
    pub combo_progress: (u32, u32),
    pub combo_levels_reached: usize,
    pub score: u32,
    pub num_right: u32,
    pub num_wrong: u32,
    pub history_depth: usize,
    pub last_move_captured: bool,
    pub crop: Rect,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub display_rank: String,
    pub markers: Vec<MarkerAt>,
    pub hints: Vec<MoveHint>,
    pub records: Vec<PuzzleRecord>,
    pub summary: Option<RunSummary>,
}

// =============================================================================
// Session
// =============================================================================

pub struct Session<B: BoardState = Board> {
    archive: Arc<Archive>,
    config: SessionConfig,
    rng: fastrand::Rng,
    mode: Mode,
    puzzles: Vec<Puzzle>,
    index: usize,
    board: B,
    cursor: NodeId,
    to_play: Color,
    /// The side the player solves for in the current puzzle.
    solver: Color,
    history: Vec<HistoryFrame<B>>,
    clock: SessionClock,
    clock_status: ClockStatus,
    tracker: ComboTracker,
    records: Vec<PuzzleRecord>,
    puzzle_started: Option<Instant>,
    total_seconds: Option<f64>,
    crop: Rect,
    last_capture: bool,
    warnings: Vec<DataWarning>,
}

impl<B: BoardState> Session<B> {
    /// Select puzzles from `archive` and load the first one.
    pub fn new(archive: Arc<Archive>, config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let puzzles = select(
            archive.puzzles(),
            config.puzzles_per_rank,
            &config.excluded_category,
            &mut rng,
        )?;

        let tracker = ComboTracker::new(
            config.combo_levels.clone(),
            config.combo_bonus_secs.clone(),
            config.combo_repeat_period,
        )?;

        let mut session = Self {
            clock: SessionClock::new(config.duration, config.bonus_display),
            tracker,
            archive,
            config,
            rng,
            mode: Mode::Solving,
            puzzles,
            index: 0,
            board: B::with_size(1),
            cursor: GameTree::ROOT,
            to_play: Color::Black,
            solver: Color::Black,
            history: Vec::new(),
            clock_status: ClockStatus::Idle,
            records: Vec::new(),
            puzzle_started: None,
            total_seconds: None,
            crop: Rect::full(1),
            last_capture: false,
            warnings: Vec::new(),
        };
        session.load(0, None);
        info!(puzzles = session.puzzles.len(), "run started");
        Ok(session)
    }

    /// Throw the current run away and start a new one from the same archive.
    ///
    /// On error the current session is left as it was.
    pub fn start_run(&mut self) -> Result<(), SessionError> {
        let puzzles = select(
            self.archive.puzzles(),
            self.config.puzzles_per_rank,
            &self.config.excluded_category,
            &mut self.rng,
        )?;
        let tracker = ComboTracker::new(
            self.config.combo_levels.clone(),
            self.config.combo_bonus_secs.clone(),
            self.config.combo_repeat_period,
        )?;
        self.puzzles = puzzles;
        self.mode = Mode::Solving;
        self.clock = SessionClock::new(self.config.duration, self.config.bonus_display);
        self.clock_status = ClockStatus::Idle;
        self.tracker = tracker;
        self.records.clear();
        self.total_seconds = None;
        self.warnings.clear();
        self.load(0, None);
        info!(puzzles = self.puzzles.len(), "run restarted");
        Ok(())
    }

    /// Reset the board and cursor to the root of puzzle `index`.
    fn load(&mut self, index: usize, now: Option<Instant>) {
        let puzzle = &self.puzzles[index];
        let size = puzzle.board_size();

        let to_play = match puzzle.declared_side() {
            Some(side) => side,
            None => {
                // Infer from the main line, Black if even that is missing
                let assumed = puzzle
                    .tree
                    .children(GameTree::ROOT)
                    .find_map(|n| n.stone().ok().flatten())
                    .map(|(color, _)| color)
                    .unwrap_or(Color::Black);
                warn!(puzzle = index, %assumed, "puzzle has no side to move");
                self.warnings.push(DataWarning::MissingSideToMove {
                    puzzle: index,
                    assumed,
                });
                assumed
            }
        };

        self.board = puzzle.initial_board();
        self.crop = display_crop(bounding_box(puzzle), size);
        self.cursor = GameTree::ROOT;
        self.to_play = to_play;
        self.solver = to_play;
        self.history.clear();
        self.index = index;
        self.puzzle_started = now;
        self.last_capture = false;
        debug!(puzzle = index, size, %to_play, "puzzle loaded");
    }

    // -------------------------------------------------------------------------
    // Entry points
    // -------------------------------------------------------------------------

    /// Handle a click on `vertex`.
    ///
    /// While solving this is a graded attempt; while reviewing it explores
    /// the tree, adding the move as a new variation if it is not there yet.
    pub fn attempt_move(&mut self, vertex: Vertex, now: Instant) -> MoveOutcome {
        if !vertex.on_board(self.board_size()) || self.board.is_occupied(vertex) {
            return MoveOutcome::Rejected;
        }
        match self.mode {
            Mode::Solving => self.solve(vertex, now),
            Mode::Reviewing => self.explore(vertex),
        }
    }

    /// Advance the clock. Expiry fails the current puzzle and ends the run.
    ///
    /// Ignored once the session is reviewing.
    pub fn tick(&mut self, now: Instant) -> ClockStatus {
        if self.mode == Mode::Reviewing {
            return self.clock_status;
        }
        self.clock_status = self.clock.tick(now);
        if self.clock_status == ClockStatus::Expired {
            info!(puzzle = self.index, "time is up");
            self.tracker.reset_combo();
            self.record(false, now);
            self.end_run(now);
        }
        self.clock_status
    }

    /// Undo the last move. Returns false if there was nothing to undo.
    pub fn back(&mut self) -> Result<bool, SessionError> {
        self.require_review("step back")?;
        let Some(frame) = self.history.pop() else {
            return Ok(false);
        };
        self.board = frame.board;
        self.cursor = frame.node;
        self.to_play = frame.to_play;
        self.last_capture = false;
        Ok(true)
    }

    /// Play the main-line child of the cursor. Returns false at a leaf.
    pub fn forward(&mut self) -> Result<bool, SessionError> {
        self.require_review("step forward")?;
        let Some(&next) = self.tree().node(self.cursor).children.first() else {
            return Ok(false);
        };
        let Some((color, vertex)) = self.move_of(next) else {
            return Ok(false);
        };
        Ok(self.play(next, color, vertex))
    }

    /// Jump to puzzle `index` of the finished run, at its root.
    pub fn load_puzzle(&mut self, index: usize) -> Result<(), SessionError> {
        self.require_review("jump to a puzzle")?;
        if index >= self.puzzles.len() {
            return Err(SessionError::PuzzleIndexOutOfRange {
                index,
                len: self.puzzles.len(),
            });
        }
        self.load(index, None);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Live play
    // -------------------------------------------------------------------------

    fn solve(&mut self, vertex: Vertex, now: Instant) -> MoveOutcome {
        // A click after the deadline is not graded
        if self.tick(now) == ClockStatus::Expired {
            return MoveOutcome::TimeUp;
        }
        self.clock.start(now);
        self.puzzle_started.get_or_insert(now);

        let Some((child, color)) = self.find_child(vertex, Some(self.solver), false) else {
            debug!(puzzle = self.index, %vertex, "wrong move");
            self.tracker.on_wrong_move();
            self.clock.apply_bonus(-self.config.malus_secs, now);
            self.record(false, now);
            self.advance(now);
            return MoveOutcome::Failed;
        };

        if !self.play(child, color, vertex) {
            // The engine refused a move the tree calls correct
            return self.abort(now);
        }

        let bonus = self.tracker.on_correct_move();
        if let Some(seconds) = bonus {
            self.clock.apply_bonus(seconds, now);
        }

        // The main-line child is the opponent's reply
        if let Some(&reply) = self.tree().node(child).children.first() {
            match self.move_of(reply) {
                Some((reply_color, reply_vertex)) => {
                    if !self.play(reply, reply_color, reply_vertex) {
                        return self.abort(now);
                    }
                }
                // Malformed reply: the cursor stays put, warning already recorded
                None => return MoveOutcome::Correct { bonus },
            }
        }

        if self.tree().node(self.cursor).children.is_empty() {
            debug!(puzzle = self.index, "puzzle solved");
            self.tracker.on_puzzle_passed();
            self.record(true, now);
            self.advance(now);
            MoveOutcome::Passed { bonus }
        } else {
            MoveOutcome::Correct { bonus }
        }
    }

    /// Fail the current puzzle after a board-engine refusal and move on.
    fn abort(&mut self, now: Instant) -> MoveOutcome {
        info!(puzzle = self.index, "puzzle aborted");
        self.tracker.reset_combo();
        self.record(false, now);
        self.advance(now);
        MoveOutcome::Aborted
    }

    /// Store the verdict for the current puzzle. A verdict is never overwritten.
    fn record(&mut self, passed: bool, now: Instant) {
        if self.records.len() != self.index {
            return;
        }
        let elapsed_seconds = self
            .puzzle_started
            .map(|t| now.saturating_duration_since(t).as_secs_f64())
            .unwrap_or(0.0);
        self.records.push(PuzzleRecord {
            elapsed_seconds,
            passed,
        });
    }

    fn advance(&mut self, now: Instant) {
        let next = self.index + 1;
        if next >= self.puzzles.len() {
            self.end_run(now);
        } else {
            self.load(next, Some(now));
        }
    }

    fn end_run(&mut self, now: Instant) {
        let total = self.clock.elapsed(now);
        self.total_seconds = Some(total);
        self.mode = Mode::Reviewing;
        info!(
            score = self.tracker.score,
            total_seconds = total,
            "run over, reviewing"
        );
        self.load(self.index, None);
    }

    // -------------------------------------------------------------------------
    // Review
    // -------------------------------------------------------------------------

    fn explore(&mut self, vertex: Vertex) -> MoveOutcome {
        if let Some((child, color)) = self.find_child(vertex, None, true) {
            return if self.play(child, color, vertex) {
                MoveOutcome::Explored {
                    node: child,
                    created: false,
                }
            } else {
                MoveOutcome::Rejected
            };
        }

        let color = self.to_play;
        let next = match self.board.apply_move(color, vertex) {
            Ok((next, captured)) => {
                self.last_capture = captured;
                next
            }
            Err(e) => {
                self.warn_illegal(None, e.to_string());
                return MoveOutcome::Rejected;
            }
        };
        let parent = self.cursor;
        let node = match self.puzzles[self.index].tree.add_move(parent, color, vertex) {
            Ok(id) => id,
            Err(e) => {
                self.warn_illegal(None, e.to_string());
                return MoveOutcome::Rejected;
            }
        };
        debug!(puzzle = self.index, parent, node, "new variation");
        self.push_frame(next, node, color);
        MoveOutcome::Explored {
            node,
            created: true,
        }
    }

    fn require_review(&self, operation: &'static str) -> Result<(), SessionError> {
        match self.mode {
            Mode::Reviewing => Ok(()),
            mode => Err(SessionError::InvalidTransition {
                operation,
                mode: mode.name(),
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Tree and board helpers
    // -------------------------------------------------------------------------

    fn tree(&self) -> &GameTree {
        &self.puzzles[self.index].tree
    }

    fn board_size(&self) -> usize {
        self.puzzles[self.index].board_size()
    }

    /// Find the child of the cursor that plays at `vertex`.
    ///
    /// `side` restricts the colour; bad-move children only count when
    /// `include_bad` is set.
    fn find_child(
        &mut self,
        vertex: Vertex,
        side: Option<Color>,
        include_bad: bool,
    ) -> Option<(NodeId, Color)> {
        let puzzle = self.index;
        let mut found = None;
        for child in self.puzzles[puzzle].tree.children(self.cursor) {
            if !include_bad && child.is_bad_move() {
                continue;
            }
            match stone_or_warn(puzzle, child, &mut self.warnings) {
                Some((color, v)) if v == vertex && side.is_none_or(|s| s == color) => {
                    found = Some((child.id, color));
                    break;
                }
                _ => {}
            }
        }
        found
    }

    /// The move carried by `node`, recording a warning if it has none.
    fn move_of(&mut self, node: NodeId) -> Option<(Color, Vertex)> {
        let puzzle = self.index;
        stone_or_warn(puzzle, self.puzzles[puzzle].tree.node(node), &mut self.warnings)
    }

    /// Apply `color` at `vertex` and move the cursor to `node`.
    ///
    /// Returns false, with a warning, if the board engine refuses the move.
    fn play(&mut self, node: NodeId, color: Color, vertex: Vertex) -> bool {
        match self.board.apply_move(color, vertex) {
            Ok((next, captured)) => {
                self.last_capture = captured;
                self.push_frame(next, node, color);
                true
            }
            Err(e) => {
                self.warn_illegal(Some(node), e.to_string());
                false
            }
        }
    }

    fn push_frame(&mut self, next: B, node: NodeId, color: Color) {
        let board = std::mem::replace(&mut self.board, next);
        self.history.push(HistoryFrame {
            board,
            node: self.cursor,
            to_play: self.to_play,
        });
        self.cursor = node;
        self.to_play = color.opponent();
    }

    fn warn_illegal(&mut self, node: Option<NodeId>, message: String) {
        warn!(puzzle = self.index, ?node, %message, "board engine refused move");
        self.warnings.push(DataWarning::IllegalMove {
            puzzle: self.index,
            node,
            message,
        });
    }

    // -------------------------------------------------------------------------
    // Read-only access
    // -------------------------------------------------------------------------

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    pub fn current_node(&self) -> &Node {
        self.tree().node(self.cursor)
    }

    pub fn to_play(&self) -> Color {
        self.to_play
    }

    pub fn puzzle_index(&self) -> usize {
        self.index
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzles[self.index]
    }

    pub fn puzzles(&self) -> &[Puzzle] {
        &self.puzzles
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn tracker(&self) -> &ComboTracker {
        &self.tracker
    }

    pub fn records(&self) -> &[PuzzleRecord] {
        &self.records
    }

    pub fn history_depth(&self) -> usize {
        self.history.len()
    }

    pub fn crop(&self) -> Rect {
        self.crop
    }

    pub fn last_move_captured(&self) -> bool {
        self.last_capture
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Markers on the cursor node.
    pub fn markers(&self) -> BTreeMap<Vertex, Marker> {
        markers_for_node(self.current_node())
    }

    /// Ghost stones for the cursor's children; empty while solving.
    pub fn hints(&self) -> Vec<MoveHint> {
        match self.mode {
            Mode::Solving => Vec::new(),
            Mode::Reviewing => move_hints(self.tree(), self.cursor, self.board_size()),
        }
    }

    pub fn comment(&self) -> Option<&str> {
        self.puzzle().comment_for(self.cursor)
    }

    /// Run statistics, available once reviewing.
    pub fn summary(&self) -> Option<RunSummary> {
        let total = self.total_seconds?;
        let highest = self
            .records
            .iter()
            .rposition(|r| r.passed)
            .map(|i| self.puzzles[i].display_rank());
        Some(RunSummary::new(&self.tracker, total, highest))
    }

    /// Drain the data warnings gathered so far.
    pub fn take_warnings(&mut self) -> Vec<DataWarning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let puzzle = self.puzzle();
        SessionSnapshot {
            mode: self.mode,
            puzzle_index: self.index,
            puzzle_count: self.puzzles.len(),
            cursor: self.cursor,
            to_play: self.to_play,
            clock: self.clock_status,
            remaining_seconds: self.clock.remaining_seconds(),
            displayed_bonus: self.clock.displayed_bonus(),
            bonus_seconds: self.clock.bonus_seconds(),
            combo: self.tracker.combo,
            max_combo: self.tracker.max_combo,
            combo_progress: self.tracker.progress(),
            combo_levels_reached: self.tracker.levels_reached(),
            score: self.tracker.score,
            num_right: self.tracker.num_right,
            num_wrong: self.tracker.num_wrong,
            history_depth: self.history.len(),
            last_move_captured: self.last_capture,
            crop: self.crop,
            title: puzzle.title().map(str::to_string),
            comment: self.comment().map(str::to_string),
            display_rank: puzzle.display_rank().to_string(),
            markers: self
                .markers()
                .into_iter()
                .map(|(vertex, marker)| MarkerAt { vertex, marker })
                .collect(),
            hints: self.hints(),
            records: self.records.clone(),
            summary: self.summary(),
        }
    }
}

/// Decode the move on `node`, pushing a warning when it is missing or malformed.
fn stone_or_warn(
    puzzle: usize,
    node: &Node,
    warnings: &mut Vec<DataWarning>,
) -> Option<(Color, Vertex)> {
    match node.stone() {
        Ok(Some(mv)) => Some(mv),
        Ok(None) => {
            warn!(puzzle, node = node.id, "node has no move");
            warnings.push(DataWarning::MissingMove {
                puzzle,
                node: node.id,
            });
            None
        }
        Err(e) => {
            warn!(puzzle, node = node.id, %e, "malformed move");
            warnings.push(DataWarning::MalformedMove {
                puzzle,
                node: node.id,
                message: e.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeData, RawNode};

    fn data(pairs: &[(&str, &str)]) -> NodeData {
        let mut d = NodeData::new();
        for (k, v) in pairs {
            d.entry(k.to_string()).or_default().push(v.to_string());
        }
        d
    }

    fn single_puzzle(root: RawNode) -> Session {
        let archive = Arc::new(Archive::from_forest(&[root]));
        let config = SessionConfig {
            puzzles_per_rank: 1,
            seed: Some(3),
            ..SessionConfig::default()
        };
        Session::new(archive, config).unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(SessionConfig::default().validate().is_ok());

        let bad = SessionConfig {
            combo_levels: vec![5, 5],
            combo_bonus_secs: vec![1, 2],
            ..SessionConfig::default()
        };
        assert!(matches!(bad.validate(), Err(SessionError::InvalidConfig(_))));

        let bad = SessionConfig {
            combo_bonus_secs: vec![1],
            ..SessionConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = SessionConfig {
            puzzles_per_rank: 0,
            ..SessionConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_forced_reply_is_auto_played() {
        // Black plays cc, White's only answer is dc, then Black finishes at cd
        let root = RawNode::new(data(&[("SZ", "9"), ("PL", "B"), ("BR", "5K")])).with_child(
            RawNode::new(data(&[("B", "cc")])).with_child(
                RawNode::new(data(&[("W", "dc")]))
                    .with_child(RawNode::new(data(&[("B", "cd")]))),
            ),
        );
        let mut s = single_puzzle(root);
        let t0 = Instant::now();

        assert_eq!(
            s.attempt_move(Vertex::new(2, 2), t0),
            MoveOutcome::Correct { bonus: None }
        );
        assert_eq!(s.cursor(), 2);
        assert_eq!(s.history_depth(), 2);
        assert_eq!(s.to_play(), Color::Black);
        assert!(s.board().is_occupied(Vertex::new(3, 2)));

        assert_eq!(
            s.attempt_move(Vertex::new(2, 3), t0 + Duration::from_secs(2)),
            MoveOutcome::Passed { bonus: None }
        );
        assert_eq!(s.tracker().combo, 2);
        assert_eq!(s.tracker().score, 1);
        assert_eq!(s.mode(), Mode::Reviewing);
        assert_eq!(s.records()[0].elapsed_seconds, 2.0);
    }

    #[test]
    fn test_branching_reply_plays_main_line() {
        // White has two answers to cc; the first one is played for it
        let root = RawNode::new(data(&[("SZ", "9"), ("PL", "B"), ("BR", "5K")])).with_child(
            RawNode::new(data(&[("B", "cc")]))
                .with_child(
                    RawNode::new(data(&[("W", "dc")]))
                        .with_child(RawNode::new(data(&[("B", "ee")]))),
                )
                .with_child(RawNode::new(data(&[("W", "cd")]))),
        );
        let mut s = single_puzzle(root);
        let t0 = Instant::now();
        let outcome = s.attempt_move(Vertex::new(2, 2), t0);
        assert_eq!(outcome, MoveOutcome::Correct { bonus: None });
        assert_eq!(s.cursor(), 2);
        assert_eq!(s.to_play(), Color::Black);
        assert!(s.board().is_occupied(Vertex::new(3, 2)));
        assert!(!s.board().is_occupied(Vertex::new(2, 3)));

        // White's other answer is not an answer for Black
        assert_eq!(s.attempt_move(Vertex::new(2, 3), t0), MoveOutcome::Failed);
        assert_eq!(s.tracker().num_right, 1);
        assert_eq!(s.tracker().score, 0);
        assert!(!s.records()[0].passed);
    }

    #[test]
    fn test_refused_tree_move_aborts_puzzle() {
        // B aa is suicide against White stones at ba and ab
        let root = RawNode::new(data(&[
            ("SZ", "9"),
            ("PL", "B"),
            ("BR", "5K"),
            ("AW", "ba"),
            ("AW", "ab"),
        ]))
        .with_child(RawNode::new(data(&[("B", "aa")])));
        let mut s = single_puzzle(root);
        assert_eq!(s.attempt_move(Vertex::new(0, 0), Instant::now()), MoveOutcome::Aborted);
        assert_eq!(s.mode(), Mode::Reviewing);
        assert!(!s.records()[0].passed);
        assert_eq!(s.tracker().combo, 0);
        assert_eq!(s.tracker().num_wrong, 0);
        assert_eq!(s.clock().bonus_seconds(), 0);
        assert!(matches!(
            s.take_warnings()[..],
            [DataWarning::IllegalMove { node: Some(1), .. }]
        ));
    }

    #[test]
    fn test_refused_reply_aborts_puzzle() {
        // White's recorded reply lands on a Black setup stone
        let root = RawNode::new(data(&[("SZ", "9"), ("PL", "B"), ("BR", "5K"), ("AB", "dc")]))
            .with_child(
                RawNode::new(data(&[("B", "cc")])).with_child(
                    RawNode::new(data(&[("W", "dc")]))
                        .with_child(RawNode::new(data(&[("B", "ee")]))),
                ),
            );
        let mut s = single_puzzle(root);
        assert_eq!(s.attempt_move(Vertex::new(2, 2), Instant::now()), MoveOutcome::Aborted);
        assert_eq!(s.mode(), Mode::Reviewing);
        assert_eq!(s.records().len(), 1);
        assert!(!s.records()[0].passed);
        assert_eq!(s.tracker().num_right, 1);
        assert_eq!(s.tracker().combo, 0);
        assert_eq!(s.clock().bonus_seconds(), 0);
        assert!(matches!(
            s.take_warnings()[..],
            [DataWarning::IllegalMove { node: Some(2), .. }]
        ));
    }

    #[test]
    fn test_capturing_reply_sets_capture_flag() {
        // White's reply at ab takes the Black stone at aa
        let root = RawNode::new(data(&[
            ("SZ", "9"),
            ("PL", "B"),
            ("BR", "5K"),
            ("AB", "aa"),
            ("AW", "ba"),
        ]))
        .with_child(
            RawNode::new(data(&[("B", "ee")])).with_child(
                RawNode::new(data(&[("W", "ab")])).with_child(RawNode::new(data(&[("B", "ff")]))),
            ),
        );
        let mut s = single_puzzle(root);
        assert!(!s.last_move_captured());
        assert_eq!(
            s.attempt_move(Vertex::new(4, 4), Instant::now()),
            MoveOutcome::Correct { bonus: None }
        );
        assert!(s.last_move_captured());
        assert!(s.snapshot().last_move_captured);
        assert!(!s.board().is_occupied(Vertex::new(0, 0)));
    }

    #[test]
    fn test_click_after_deadline_is_not_graded() {
        let root = RawNode::new(data(&[("SZ", "9"), ("PL", "B"), ("BR", "5K")])).with_child(
            RawNode::new(data(&[("B", "cc")])).with_child(
                RawNode::new(data(&[("W", "dc")])).with_child(RawNode::new(data(&[("B", "cd")]))),
            ),
        );
        let mut s = single_puzzle(root);
        let t0 = Instant::now();
        s.attempt_move(Vertex::new(2, 2), t0);

        // No tick since the first move; the deadline has already passed
        let late = t0 + Duration::from_secs(DURATION_SECS + 5);
        assert_eq!(s.attempt_move(Vertex::new(2, 3), late), MoveOutcome::TimeUp);
        assert_eq!(s.mode(), Mode::Reviewing);
        assert_eq!(s.tracker().score, 0);
        assert_eq!(s.tracker().num_right, 1);
        assert!(!s.records()[0].passed);
        assert_eq!(s.clock().bonus_seconds(), 0);
    }

    #[test]
    fn test_bad_move_child_fails_in_live_play() {
        let root = RawNode::new(data(&[("SZ", "9"), ("PL", "B"), ("BR", "5K")]))
            .with_child(RawNode::new(data(&[("B", "cc")])))
            .with_child(RawNode::new(data(&[("B", "dd"), ("BM", "1")])));
        let mut s = single_puzzle(root);
        assert_eq!(s.attempt_move(Vertex::new(3, 3), Instant::now()), MoveOutcome::Failed);
        assert_eq!(s.tracker().num_wrong, 1);
        assert_eq!(s.clock().bonus_seconds(), -MALUS_SECS);
    }

    #[test]
    fn test_wrong_side_child_does_not_match() {
        let root = RawNode::new(data(&[("SZ", "9"), ("PL", "B"), ("BR", "5K")]))
            .with_child(RawNode::new(data(&[("W", "cc")])));
        let mut s = single_puzzle(root);
        assert_eq!(s.attempt_move(Vertex::new(2, 2), Instant::now()), MoveOutcome::Failed);
    }

    #[test]
    fn test_missing_side_is_inferred_with_warning() {
        let root = RawNode::new(data(&[("SZ", "9"), ("BR", "5K")]))
            .with_child(RawNode::new(data(&[("W", "cc")])));
        let mut s = single_puzzle(root);
        assert_eq!(s.to_play(), Color::White);
        let warnings = s.take_warnings();
        assert_eq!(
            warnings,
            vec![DataWarning::MissingSideToMove {
                puzzle: 0,
                assumed: Color::White
            }]
        );
        assert!(s.take_warnings().is_empty());
    }

    #[test]
    fn test_malformed_reply_skips_auto_advance() {
        let root = RawNode::new(data(&[("SZ", "9"), ("PL", "B"), ("BR", "5K")])).with_child(
            RawNode::new(data(&[("B", "cc")]))
                .with_child(RawNode::new(data(&[("W", "Z9")])).with_child(RawNode::new(
                    data(&[("B", "dd")]),
                ))),
        );
        let mut s = single_puzzle(root);
        let outcome = s.attempt_move(Vertex::new(2, 2), Instant::now());
        assert_eq!(outcome, MoveOutcome::Correct { bonus: None });
        assert_eq!(s.cursor(), 1);
        assert!(matches!(
            s.take_warnings()[..],
            [DataWarning::MalformedMove { node: 2, .. }]
        ));
    }

    #[test]
    fn test_review_only_operations_rejected_while_solving() {
        let root = RawNode::new(data(&[("SZ", "9"), ("PL", "B"), ("BR", "5K")]))
            .with_child(RawNode::new(data(&[("B", "cc")])));
        let mut s = single_puzzle(root);
        for result in [s.back(), s.forward()] {
            assert!(matches!(
                result,
                Err(SessionError::InvalidTransition {
                    mode: "solving",
                    ..
                })
            ));
        }
        assert!(s.load_puzzle(0).is_err());
        assert_eq!(s.history_depth(), 0);
        assert!(s.hints().is_empty());
        assert!(s.summary().is_none());
    }

    #[test]
    fn test_review_explores_bad_moves_and_new_branches() {
        let root = RawNode::new(data(&[("SZ", "9"), ("PL", "B"), ("BR", "5K")]))
            .with_child(RawNode::new(data(&[("B", "cc")])))
            .with_child(RawNode::new(data(&[("B", "dd"), ("BM", "1")])));
        let mut s = single_puzzle(root);
        let t0 = Instant::now();
        s.attempt_move(Vertex::new(2, 2), t0);
        assert_eq!(s.mode(), Mode::Reviewing);
        assert_eq!(s.cursor(), GameTree::ROOT);
        assert_eq!(s.hints().len(), 2);

        // The bad move is reachable in review
        assert_eq!(
            s.attempt_move(Vertex::new(3, 3), t0),
            MoveOutcome::Explored {
                node: 2,
                created: false
            }
        );
        // A reply nobody wrote down is added to the tree
        assert_eq!(
            s.attempt_move(Vertex::new(4, 4), t0),
            MoveOutcome::Explored {
                node: 3,
                created: true
            }
        );
        assert_eq!(s.current_node().first("W"), Some("ee"));
        assert_eq!(s.current_node().parent, Some(2));

        assert_eq!(s.back(), Ok(true));
        assert_eq!(s.back(), Ok(true));
        assert_eq!(s.back(), Ok(false));
        assert_eq!(s.forward(), Ok(true));
        assert_eq!(s.cursor(), 1);
        assert_eq!(s.forward(), Ok(false));

        // Score and counters are untouched by review play
        assert_eq!(s.tracker().score, 1);
        assert_eq!(s.tracker().num_right, 1);
        assert_eq!(s.records().len(), 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let root = RawNode::new(data(&[
            ("SZ", "9"),
            ("PL", "B"),
            ("BR", "5K"),
            ("GC", "Black to live"),
            ("TR", "cc"),
        ]))
        .with_child(RawNode::new(data(&[("B", "cc")])));
        let s = single_puzzle(root);
        let snap = s.snapshot();
        assert_eq!(snap.mode, Mode::Solving);
        assert_eq!(snap.title.as_deref(), Some("Black to live"));
        assert_eq!(snap.markers.len(), 1);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["mode"], "solving");
        assert_eq!(json["markers"][0]["marker"]["type"], "triangle");
    }
}

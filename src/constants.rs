//! Constants for run timing, combo bonuses and puzzle selection.
//!
//! These are the defaults used by [`SessionConfig`](crate::session::SessionConfig);
//! every value here can be overridden per session.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size used when a puzzle does not declare one.
pub const DEFAULT_BOARD_SIZE: usize = 19;

/// Largest board the two-letter coordinate encoding can address.
pub const MAX_BOARD_SIZE: usize = 26;

/// Points of padding added around the bounding box for the display crop.
pub const CROP_PADDING: usize = 1;

// =============================================================================
// Clock Parameters
// =============================================================================

/// Starting time of each run, in seconds.
pub const DURATION_SECS: u64 = 180;

/// Seconds removed from the clock on every wrong move.
pub const MALUS_SECS: i64 = 10;

/// How long a freshly applied bonus or malus stays on display, in milliseconds.
pub const BONUS_DISPLAY_MILLIS: u64 = 1000;

// =============================================================================
// Combo Parameters
// =============================================================================

/// Combo values that award bonus time.
pub const COMBO_LEVELS: [u32; 4] = [5, 12, 20, 30];

/// Bonus seconds awarded at each entry of [`COMBO_LEVELS`].
pub const COMBO_BONUS_SECS: [i64; 4] = [3, 5, 7, 10];

/// Past the last level, the last bonus repeats every this many correct moves.
pub const COMBO_REPEAT_PERIOD: u32 = 10;

// =============================================================================
// Selection Parameters
// =============================================================================

/// Number of puzzles drawn for every rank.
pub const PUZZLES_PER_RANK: usize = 5;

/// Category marker of placement-only puzzles, which have no move to find.
pub const EXCLUDED_CATEGORY: &str = "落子题";

// =============================================================================
// Property Keys
// =============================================================================

/// Black move.
pub const KEY_BLACK: &str = "B";
/// White move.
pub const KEY_WHITE: &str = "W";
/// Black setup stones.
pub const KEY_ADD_BLACK: &str = "AB";
/// White setup stones.
pub const KEY_ADD_WHITE: &str = "AW";
/// Side to move at the root.
pub const KEY_PLAYER: &str = "PL";
/// Board size.
pub const KEY_SIZE: &str = "SZ";
/// Circle marks.
pub const KEY_CIRCLE: &str = "CR";
/// Cross marks.
pub const KEY_CROSS: &str = "MA";
/// Square marks.
pub const KEY_SQUARE: &str = "SQ";
/// Triangle marks.
pub const KEY_TRIANGLE: &str = "TR";
/// Labels, as `vertex:text` entries.
pub const KEY_LABEL: &str = "LB";
/// Node comment.
pub const KEY_COMMENT: &str = "C";
/// General puzzle comment; its first line doubles as the category.
pub const KEY_GAME_COMMENT: &str = "GC";
/// Rank used for selection.
pub const KEY_SELECTION_RANK: &str = "BR";
/// Rank shown to the player.
pub const KEY_DISPLAY_RANK: &str = "WR";
/// Tesuji (good move) tag.
pub const KEY_TESUJI: &str = "TE";
/// Bad move tag.
pub const KEY_BAD_MOVE: &str = "BM";
/// Interesting move tag.
pub const KEY_INTERESTING: &str = "IT";
/// Doubtful move tag.
pub const KEY_DOUBTFUL: &str = "DO";

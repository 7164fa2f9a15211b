//! Puzzle view over the root of a solution tree.

use tracing::warn;

use crate::board::{BoardState, Color};
use crate::constants::{
    DEFAULT_BOARD_SIZE, KEY_ADD_BLACK, KEY_ADD_WHITE, KEY_COMMENT, KEY_DISPLAY_RANK,
    KEY_GAME_COMMENT, KEY_PLAYER, KEY_SELECTION_RANK, KEY_SIZE, MAX_BOARD_SIZE,
};
use crate::coord::{Vertex, decode};
use crate::tree::{GameTree, NodeId, RawNode};

/// One puzzle: a solution tree plus accessors for the root's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub tree: GameTree,
}

impl Puzzle {
    pub fn new(tree: GameTree) -> Self {
        Self { tree }
    }

    pub fn from_raw(raw: &RawNode) -> Self {
        Self::new(GameTree::from_raw(raw))
    }

    /// Declared board size, falling back to 19 when missing or unusable.
    pub fn board_size(&self) -> usize {
        match self.tree.root().first(KEY_SIZE) {
            None => DEFAULT_BOARD_SIZE,
            Some(s) => match s.trim().parse::<usize>() {
                Ok(n) if (1..=MAX_BOARD_SIZE).contains(&n) => n,
                _ => {
                    warn!(size = s, "unusable board size, using default");
                    DEFAULT_BOARD_SIZE
                }
            },
        }
    }

    /// Setup stones placed before the first move. Malformed entries are skipped.
    pub fn setup_stones(&self) -> Vec<(Color, Vertex)> {
        let root = self.tree.root();
        let mut out = Vec::new();
        for (key, color) in [(KEY_ADD_WHITE, Color::White), (KEY_ADD_BLACK, Color::Black)] {
            for code in root.values(key) {
                match decode(code) {
                    Ok(v) => out.push((color, v)),
                    Err(e) => warn!(%e, "skipping setup stone"),
                }
            }
        }
        out
    }

    /// Declared side to move, if the root carries a usable one.
    pub fn declared_side(&self) -> Option<Color> {
        match self.tree.root().first(KEY_PLAYER)?.trim() {
            "B" | "b" => Some(Color::Black),
            "W" | "w" => Some(Color::White),
            _ => None,
        }
    }

    /// Side to move at the root; Black when not declared.
    pub fn side_to_move(&self) -> Color {
        self.declared_side().unwrap_or(Color::Black)
    }

    /// Fresh board with the setup stones applied.
    pub fn initial_board<B: BoardState>(&self) -> B {
        let size = self.board_size();
        let mut board = B::with_size(size);
        for (color, v) in self.setup_stones() {
            if v.on_board(size) {
                board.set(v, color);
            }
        }
        board
    }

    /// Rank the puzzle is filed under for selection.
    pub fn selection_rank(&self) -> Option<&str> {
        self.tree.root().first(KEY_SELECTION_RANK)
    }

    /// Rank shown next to the puzzle, `"?"` when unknown.
    pub fn display_rank(&self) -> &str {
        match self.tree.root().first(KEY_DISPLAY_RANK) {
            Some(r) if !r.is_empty() => r,
            _ => "?",
        }
    }

    /// General comment on the puzzle.
    pub fn general_comment(&self) -> Option<&str> {
        self.tree
            .root()
            .first(KEY_GAME_COMMENT)
            .filter(|c| !c.is_empty())
    }

    /// First line of the general comment.
    pub fn title(&self) -> Option<&str> {
        self.general_comment().and_then(|c| c.lines().next())
    }

    /// True if the puzzle's category tag contains `marker`.
    pub fn in_category(&self, marker: &str) -> bool {
        !marker.is_empty() && self.general_comment().is_some_and(|c| c.contains(marker))
    }

    /// Comment for `node`, falling back to the puzzle's general comment.
    pub fn comment_for(&self, node: NodeId) -> Option<&str> {
        self.tree
            .get(node)
            .and_then(|n| n.first(KEY_COMMENT))
            .filter(|c| !c.is_empty())
            .or_else(|| self.general_comment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::tree::NodeData;

    fn puzzle(pairs: &[(&str, &str)]) -> Puzzle {
        let mut d = NodeData::new();
        for (k, v) in pairs {
            d.entry(k.to_string()).or_default().push(v.to_string());
        }
        Puzzle::from_raw(&RawNode::new(d))
    }

    #[test]
    fn test_defaults() {
        let p = puzzle(&[]);
        assert_eq!(p.board_size(), 19);
        assert_eq!(p.side_to_move(), Color::Black);
        assert_eq!(p.declared_side(), None);
        assert_eq!(p.display_rank(), "?");
        assert_eq!(p.title(), None);
    }

    #[test]
    fn test_metadata() {
        let p = puzzle(&[
            ("SZ", "9"),
            ("PL", "W"),
            ("BR", "5K+"),
            ("WR", "5K"),
            ("GC", "Life and death\nBlack to kill"),
        ]);
        assert_eq!(p.board_size(), 9);
        assert_eq!(p.side_to_move(), Color::White);
        assert_eq!(p.selection_rank(), Some("5K+"));
        assert_eq!(p.display_rank(), "5K");
        assert_eq!(p.title(), Some("Life and death"));
        assert!(p.in_category("death"));
        assert!(!p.in_category("落子题"));
    }

    #[test]
    fn test_bad_size_falls_back() {
        assert_eq!(puzzle(&[("SZ", "abc")]).board_size(), 19);
        assert_eq!(puzzle(&[("SZ", "40")]).board_size(), 19);
    }

    #[test]
    fn test_initial_board_skips_malformed_setup() {
        let p = puzzle(&[("SZ", "9"), ("AB", "dd"), ("AB", "??"), ("AW", "de")]);
        assert_eq!(p.setup_stones().len(), 2);
        let board: Board = p.initial_board();
        assert_eq!(board.get(Vertex::new(3, 3)), Some(Color::Black));
        assert_eq!(board.get(Vertex::new(3, 4)), Some(Color::White));
    }

    #[test]
    fn test_comment_fallback() {
        let p = puzzle(&[("GC", "general"), ("C", "root comment")]);
        assert_eq!(p.comment_for(GameTree::ROOT), Some("root comment"));
        let p = puzzle(&[("GC", "general")]);
        assert_eq!(p.comment_for(GameTree::ROOT), Some("general"));
    }
}

//! Annotation extraction: crop rectangles, markers and review hints.
//!
//! Everything here is a pure function of tree data. Malformed coordinates are
//! skipped so one bad annotation never hides the rest.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::board::Color;
use crate::constants::{
    CROP_PADDING, KEY_ADD_BLACK, KEY_ADD_WHITE, KEY_BLACK, KEY_CIRCLE, KEY_CROSS, KEY_LABEL,
    KEY_SQUARE, KEY_TRIANGLE, KEY_WHITE,
};
use crate::coord::{Vertex, decode, decode_label};
use crate::puzzle::Puzzle;
use crate::tree::{GameTree, MoveQuality, Node, NodeId};

/// Inclusive rectangle of board points.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl Rect {
    pub fn full(size: usize) -> Self {
        let last = size.saturating_sub(1);
        Self {
            min_x: 0,
            min_y: 0,
            max_x: last,
            max_y: last,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "text", rename_all = "lowercase")]
pub enum Marker {
    Circle,
    Cross,
    Square,
    Triangle,
    Label(String),
}

/// A child move shown as a ghost stone during review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MoveHint {
    pub node: NodeId,
    pub vertex: Vertex,
    pub color: Color,
    pub quality: Option<MoveQuality>,
}

/// Every point a node refers to: moves, setup stones, marks and labels.
fn referenced_points(node: &Node) -> impl Iterator<Item = Vertex> + '_ {
    let plain = [
        KEY_BLACK,
        KEY_WHITE,
        KEY_ADD_WHITE,
        KEY_ADD_BLACK,
        KEY_CIRCLE,
        KEY_CROSS,
        KEY_SQUARE,
        KEY_TRIANGLE,
    ]
    .into_iter()
    .flat_map(move |key| node.values(key).iter().map(|code| decode(code)));
    let labels = node
        .values(KEY_LABEL)
        .iter()
        .map(|entry| decode_label(entry).map(|(v, _)| v));

    plain.chain(labels).filter_map(move |r| match r {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(node = node.id, %e, "skipping malformed point");
            None
        }
    })
}

/// Smallest rectangle holding every on-board point referenced anywhere in the puzzle.
///
/// Falls back to the whole board when the puzzle references no points.
pub fn bounding_box(puzzle: &Puzzle) -> Rect {
    let size = puzzle.board_size();
    let last = size.saturating_sub(1);
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (last, last, 0, 0);
    let mut seen = false;

    for node in puzzle.tree.iter() {
        for v in referenced_points(node).filter(|v| v.on_board(size)) {
            seen = true;
            min_x = min_x.min(v.x);
            min_y = min_y.min(v.y);
            max_x = max_x.max(v.x);
            max_y = max_y.max(v.y);
        }
    }

    if !seen {
        return Rect::full(size);
    }
    Rect {
        min_x,
        min_y,
        max_x,
        max_y,
    }
}

/// Grow `rect` by the crop padding on every side, clamped to the board.
pub fn display_crop(rect: Rect, size: usize) -> Rect {
    let last = size.saturating_sub(1);
    Rect {
        min_x: rect.min_x.saturating_sub(CROP_PADDING),
        min_y: rect.min_y.saturating_sub(CROP_PADDING),
        max_x: (rect.max_x + CROP_PADDING).min(last),
        max_y: (rect.max_y + CROP_PADDING).min(last),
    }
}

/// Markers to draw for `node`. Later kinds win on a shared vertex:
/// circle, cross, square, triangle, then label.
pub fn markers_for_node(node: &Node) -> BTreeMap<Vertex, Marker> {
    let mut markers = BTreeMap::new();

    let shapes = [
        (KEY_CIRCLE, Marker::Circle),
        (KEY_CROSS, Marker::Cross),
        (KEY_SQUARE, Marker::Square),
        (KEY_TRIANGLE, Marker::Triangle),
    ];
    for (key, marker) in shapes {
        for code in node.values(key) {
            match decode(code) {
                Ok(v) => {
                    markers.insert(v, marker.clone());
                }
                Err(e) => debug!(node = node.id, %e, "skipping malformed mark"),
            }
        }
    }

    for entry in node.values(KEY_LABEL) {
        match decode_label(entry) {
            Ok((v, text)) => {
                markers.insert(v, Marker::Label(text));
            }
            Err(e) => debug!(node = node.id, %e, "skipping malformed label"),
        }
    }

    markers
}

/// Ghost stones for the children of `node`, skipping moveless or off-board ones.
pub fn move_hints(tree: &GameTree, node: NodeId, size: usize) -> Vec<MoveHint> {
    tree.children(node)
        .filter_map(|child| match child.stone() {
            Ok(Some((color, vertex))) if vertex.on_board(size) => Some(MoveHint {
                node: child.id,
                vertex,
                color,
                quality: child.quality(),
            }),
            _ => None,
        })
        .collect()
}

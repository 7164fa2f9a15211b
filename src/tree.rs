//! Puzzle solution trees stored as an arena of nodes.
//!
//! Nodes are addressed by [`NodeId`], which is also their index in the arena.
//! Ids are handed out in pre-order when a tree is built and monotonically for
//! nodes added later, so a node's id never changes. Nodes are never removed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::Color;
use crate::constants::{
    KEY_BAD_MOVE, KEY_BLACK, KEY_DOUBTFUL, KEY_INTERESTING, KEY_TESUJI, KEY_WHITE,
};
use crate::coord::{Vertex, decode, encode};
use crate::error::FormatError;

/// Index of a node inside its [`GameTree`].
pub type NodeId = usize;

/// Annotation properties of a node: key to one or more raw values.
pub type NodeData = BTreeMap<String, Vec<String>>;

/// A single position-change event in a solution tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    /// Provenance only; the arena owns every node.
    pub parent: Option<NodeId>,
    /// Main line first.
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

impl Node {
    /// First value stored under `key`, if any.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    /// All values stored under `key`.
    pub fn values(&self, key: &str) -> &[String] {
        self.data.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// The stone this node places, if it carries a move.
    ///
    /// Returns `Ok(None)` for setup-only nodes and an error when the move
    /// property is present but its coordinate is malformed.
    pub fn stone(&self) -> Result<Option<(Color, Vertex)>, FormatError> {
        let (color, code) = if let Some(code) = self.first(KEY_BLACK) {
            (Color::Black, code)
        } else if let Some(code) = self.first(KEY_WHITE) {
            (Color::White, code)
        } else {
            return Ok(None);
        };
        Ok(Some((color, decode(code)?)))
    }

    /// Move-quality tag, checked in the order good, bad, interesting, doubtful.
    pub fn quality(&self) -> Option<MoveQuality> {
        if self.has(KEY_TESUJI) {
            Some(MoveQuality::Good)
        } else if self.has(KEY_BAD_MOVE) {
            Some(MoveQuality::Bad)
        } else if self.has(KEY_INTERESTING) {
            Some(MoveQuality::Interesting)
        } else if self.has(KEY_DOUBTFUL) {
            Some(MoveQuality::Doubtful)
        } else {
            None
        }
    }

    pub fn is_bad_move(&self) -> bool {
        self.has(KEY_BAD_MOVE)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveQuality {
    Good,
    Bad,
    Interesting,
    Doubtful,
}

/// Nested node layout handed over by the archive parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    pub data: NodeData,
    #[serde(default)]
    pub children: Vec<RawNode>,
}

impl RawNode {
    pub fn new(data: NodeData) -> Self {
        Self {
            data,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: RawNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Arena-backed game tree. The root is always node 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameTree {
    nodes: Vec<Node>,
}

impl GameTree {
    pub const ROOT: NodeId = 0;

    /// Flatten a nested tree into the arena, assigning ids in pre-order.
    pub fn from_raw(raw: &RawNode) -> Self {
        let mut tree = GameTree { nodes: Vec::new() };
        let mut stack: Vec<(&RawNode, Option<NodeId>)> = vec![(raw, None)];

        while let Some((node, parent)) = stack.pop() {
            let id = tree.push(parent, node.data.clone());
            // Reverse so the main line is popped (and numbered) first
            for child in node.children.iter().rev() {
                stack.push((child, Some(id)));
            }
        }
        tree
    }

    fn push(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            parent,
            children: Vec::new(),
            data,
        });
        if let Some(p) = parent {
            self.nodes[p].children.push(id);
        }
        id
    }

    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of `id`, main line first.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> {
        self.nodes[id].children.iter().map(|&c| &self.nodes[c])
    }

    /// Largest id in the tree.
    pub fn max_id(&self) -> NodeId {
        self.nodes.len().saturating_sub(1)
    }

    /// Every node, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Attach a new leaf under `parent` that places `color` at `vertex`.
    ///
    /// Used to record lines the player discovers that the tree did not have.
    pub fn add_move(
        &mut self,
        parent: NodeId,
        color: Color,
        vertex: Vertex,
    ) -> Result<NodeId, FormatError> {
        let key = match color {
            Color::Black => KEY_BLACK,
            Color::White => KEY_WHITE,
        };
        let mut data = NodeData::new();
        data.insert(key.to_string(), vec![encode(vertex)?]);
        Ok(self.push(Some(parent), data))
    }
}

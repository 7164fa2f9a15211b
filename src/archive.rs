//! Loaded-once puzzle archive.
//!
//! The archive parser hands over an already-parsed forest; on disk that
//! forest is a JSON array of nested `{ "data": {...}, "children": [...] }`
//! nodes. Once built, an [`Archive`] is read-only and is shared with sessions
//! through an `Arc`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::puzzle::Puzzle;
use crate::tree::RawNode;

#[derive(Debug, Clone, Default)]
pub struct Archive {
    puzzles: Vec<Puzzle>,
}

impl Archive {
    pub fn from_forest(forest: &[RawNode]) -> Self {
        Self {
            puzzles: forest.iter().map(Puzzle::from_raw).collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let forest: Vec<RawNode> =
            serde_json::from_str(json).context("archive is not a JSON array of puzzle trees")?;
        Ok(Self::from_forest(&forest))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read archive {}", path.display()))?;
        let archive = Self::from_json_str(&json)
            .with_context(|| format!("failed to parse archive {}", path.display()))?;
        info!(path = %path.display(), puzzles = archive.len(), "archive loaded");
        Ok(archive)
    }

    pub fn puzzles(&self) -> &[Puzzle] {
        &self.puzzles
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }
}

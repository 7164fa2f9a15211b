//! Puzzle selection: a fixed quota per rank, easiest rank first.
//!
//! Puzzles are grouped by their selection rank, ranks are ordered from
//! weakest kyu to strongest dan, and each rank contributes `quota` puzzles
//! drawn uniformly with replacement. Duplicates within a run are allowed.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::SessionError;
use crate::puzzle::Puzzle;

/// A kyu or dan rank.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Rank {
    Kyu(u32),
    Dan(u32),
}

impl Rank {
    /// Difficulty key: kyu before dan, weaker first within each.
    fn difficulty(self) -> (u8, i64) {
        match self {
            Rank::Kyu(n) => (0, -(n as i64)),
            Rank::Dan(n) => (1, n as i64),
        }
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.difficulty().cmp(&other.difficulty())
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Rank {
    type Err = String;

    /// Parses `"15K"`, `"3d"`, `"1D+"`; a trailing `+` is dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_suffix('+').unwrap_or(s);
        let kind = s.chars().last().ok_or_else(|| "empty rank".to_string())?;
        let num = &s[..s.len() - kind.len_utf8()];
        let n: u32 = num.parse().map_err(|_| format!("bad rank '{s}'"))?;
        match kind {
            'K' | 'k' => Ok(Rank::Kyu(n)),
            'D' | 'd' => Ok(Rank::Dan(n)),
            _ => Err(format!("bad rank '{s}'")),
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Kyu(n) => write!(f, "{n}K"),
            Rank::Dan(n) => write!(f, "{n}D"),
        }
    }
}

/// Group puzzles by rank, ordered from easiest to hardest.
///
/// Puzzles without a usable rank are left out.
pub fn group_by_rank(puzzles: &[Puzzle]) -> BTreeMap<Rank, Vec<&Puzzle>> {
    let mut groups: BTreeMap<Rank, Vec<&Puzzle>> = BTreeMap::new();
    for (i, puzzle) in puzzles.iter().enumerate() {
        match puzzle.selection_rank().map(str::parse::<Rank>) {
            Some(Ok(rank)) => groups.entry(rank).or_default().push(puzzle),
            Some(Err(e)) => warn!(index = i, error = %e, "skipping puzzle with unusable rank"),
            None => warn!(index = i, "skipping puzzle without a rank"),
        }
    }
    groups
}

/// Draw `quota` puzzles per rank, skipping puzzles in `excluded_category`.
///
/// Fails with [`SessionError::InsufficientPuzzles`] if some rank has nothing
/// left after filtering.
pub fn select(
    puzzles: &[Puzzle],
    quota: usize,
    excluded_category: &str,
    rng: &mut fastrand::Rng,
) -> Result<Vec<Puzzle>, SessionError> {
    let groups = group_by_rank(puzzles);
    if groups.is_empty() {
        return Err(SessionError::EmptyArchive);
    }

    let mut selected = Vec::with_capacity(groups.len() * quota);
    for (rank, pool) in &groups {
        let eligible: Vec<&Puzzle> = pool
            .iter()
            .copied()
            .filter(|p| !p.in_category(excluded_category))
            .collect();
        if eligible.is_empty() {
            return Err(SessionError::InsufficientPuzzles {
                rank: rank.to_string(),
            });
        }
        debug!(%rank, pool = pool.len(), eligible = eligible.len(), "drawing puzzles");
        for _ in 0..quota {
            selected.push(eligible[rng.usize(..eligible.len())].clone());
        }
    }
    Ok(selected)
}

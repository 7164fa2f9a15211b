//! Board engine used by the session.
//!
//! The session never looks inside a board: it only asks for setup stones,
//! occupancy, and the board that results from a move. [`BoardState`] is that
//! seam, and [`Board`] is the simple 2D implementation shipped with the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coord::Vertex;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "B"),
            Color::White => write!(f, "W"),
        }
    }
}

/// Reason a board engine refused a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// Point is not empty
    Occupied,
    /// Point is off the board
    OffBoard,
    /// Move would leave its own group without liberties
    Suicide,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::Occupied => write!(f, "illegal move: point not empty"),
            MoveError::OffBoard => write!(f, "illegal move: point off the board"),
            MoveError::Suicide => write!(f, "illegal move: suicide"),
        }
    }
}

impl std::error::Error for MoveError {}

/// Capability the session needs from a board engine.
///
/// Boards are replaced, never mutated in place, once play has started:
/// `apply_move` returns a fresh board and leaves `self` untouched so older
/// boards can sit in the history stack.
pub trait BoardState: Clone {
    /// An empty board of the given size.
    fn with_size(size: usize) -> Self;

    /// Place a setup stone without resolving captures.
    fn set(&mut self, vertex: Vertex, color: Color);

    fn is_occupied(&self, vertex: Vertex) -> bool;

    /// Play `color` at `vertex`, returning the new board and whether anything was captured.
    fn apply_move(&self, color: Color, vertex: Vertex) -> Result<(Self, bool), MoveError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    pub size: usize,
    cells: Vec<Option<Color>>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    fn idx(&self, v: Vertex) -> usize {
        v.y * self.size + v.x
    }

    pub fn get(&self, v: Vertex) -> Option<Color> {
        if !v.on_board(self.size) {
            return None;
        }
        self.cells[self.idx(v)]
    }

    fn neighbors(&self, v: Vertex) -> impl Iterator<Item = Vertex> {
        let s = self.size;
        let mut out = Vec::with_capacity(4);
        if v.x > 0 {
            out.push(Vertex::new(v.x - 1, v.y));
        }
        if v.x + 1 < s {
            out.push(Vertex::new(v.x + 1, v.y));
        }
        if v.y > 0 {
            out.push(Vertex::new(v.x, v.y - 1));
        }
        if v.y + 1 < s {
            out.push(Vertex::new(v.x, v.y + 1));
        }
        out.into_iter()
    }

    /// Flood-fill the group at `start`, returning its stones and liberty count.
    fn group(&self, start: Vertex) -> (Vec<Vertex>, usize) {
        let Some(color) = self.get(start) else {
            return (Vec::new(), 0);
        };
        let mut stack = vec![start];
        let mut visited = vec![false; self.size * self.size];
        let mut liberty_seen = vec![false; self.size * self.size];
        let mut stones = Vec::new();
        let mut liberties = 0;

        while let Some(v) = stack.pop() {
            let i = self.idx(v);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            stones.push(v);
            for n in self.neighbors(v) {
                let ni = self.idx(n);
                match self.get(n) {
                    None => {
                        if !liberty_seen[ni] {
                            liberty_seen[ni] = true;
                            liberties += 1;
                        }
                    }
                    Some(c) if c == color && !visited[ni] => stack.push(n),
                    _ => {}
                }
            }
        }
        (stones, liberties)
    }
}

impl BoardState for Board {
    fn with_size(size: usize) -> Self {
        Self::new(size)
    }

    fn set(&mut self, vertex: Vertex, color: Color) {
        if vertex.on_board(self.size) {
            let i = self.idx(vertex);
            self.cells[i] = Some(color);
        }
    }

    fn is_occupied(&self, vertex: Vertex) -> bool {
        self.get(vertex).is_some()
    }

    fn apply_move(&self, color: Color, vertex: Vertex) -> Result<(Self, bool), MoveError> {
        if !vertex.on_board(self.size) {
            return Err(MoveError::OffBoard);
        }
        if self.is_occupied(vertex) {
            return Err(MoveError::Occupied);
        }

        let mut next = self.clone();
        next.set(vertex, color);

        let opp = color.opponent();
        let mut to_remove: Vec<Vertex> = Vec::new();
        for n in next.neighbors(vertex) {
            if next.get(n) == Some(opp) && !to_remove.contains(&n) {
                let (stones, liberties) = next.group(n);
                if liberties == 0 {
                    to_remove.extend(stones);
                }
            }
        }
        for v in &to_remove {
            let i = next.idx(*v);
            next.cells[i] = None;
        }

        if to_remove.is_empty() && next.group(vertex).1 == 0 {
            return Err(MoveError::Suicide);
        }
        Ok((next, !to_remove.is_empty()))
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.size {
            for x in 0..self.size {
                let ch = match self.get(Vertex::new(x, y)) {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

//! Two-letter point encoding used by the puzzle archive.
//!
//! A point is written as two lowercase letters, column first: `"aa"` is the
//! top-left corner and `"dc"` is column 3, row 2. The encoding covers boards
//! up to 26x26.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_BOARD_SIZE;
use crate::error::FormatError;

/// A zero-based `(x, y)` point on the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vertex {
    pub x: usize,
    pub y: usize,
}

impl Vertex {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// True if the vertex lies on a board of the given size.
    #[inline]
    pub fn on_board(self, size: usize) -> bool {
        self.x < size && self.y < size
    }
}

impl From<(usize, usize)> for Vertex {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Parse a two-letter code (e.g. `"dc"`) into a vertex.
pub fn decode(code: &str) -> Result<Vertex, FormatError> {
    let bytes = code.as_bytes();
    if bytes.len() != 2 {
        return Err(FormatError::BadLength {
            code: code.to_string(),
        });
    }

    let axis = |b: u8| -> Result<usize, FormatError> {
        if b.is_ascii_lowercase() {
            Ok((b - b'a') as usize)
        } else {
            Err(FormatError::OutOfRange {
                code: code.to_string(),
            })
        }
    };

    Ok(Vertex::new(axis(bytes[0])?, axis(bytes[1])?))
}

/// Convert a vertex back into its two-letter code.
pub fn encode(vertex: Vertex) -> Result<String, FormatError> {
    if vertex.x >= MAX_BOARD_SIZE || vertex.y >= MAX_BOARD_SIZE {
        return Err(FormatError::NotEncodable {
            x: vertex.x,
            y: vertex.y,
        });
    }
    let letter = |i: usize| (b'a' + i as u8) as char;
    Ok(format!("{}{}", letter(vertex.x), letter(vertex.y)))
}

/// Split a label entry (`"dc:A"`) into its vertex and text.
pub fn decode_label(entry: &str) -> Result<(Vertex, String), FormatError> {
    let (code, text) = entry.split_once(':').ok_or_else(|| FormatError::BadLabel {
        entry: entry.to_string(),
    })?;
    Ok((decode(code)?, text.to_string()))
}

//! Source position tracking for the MWEL front-end.
//!
//! Every token, AST node, and emitted op carries a [`Position`] locating its
//! first byte in the source text. Nodes that stand for several combining
//! operators at once (chained comparisons, flattened `and`/`or`, chained
//! assignments) carry one position per operator; [`SourceLocation`] covers
//! both shapes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A (line, column) pair locating a byte in the source text.
///
/// Lines are 1-based and advance at every consumed `\n`, including newlines
/// inside strings and groupings. Columns are 0-based byte offsets from the
/// start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    /// The position of the first byte of the source.
    pub const START: Position = Position { line: 1, column: 0 };

    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Location payload of an AST node or emitted op.
///
/// Most nodes sit at a single position. Chained comparisons, flattened
/// logical expressions, and chained assignments record one position per
/// combining operator, and the ops lowered from them keep the whole spread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceLocation {
    Single(Position),
    Spread(Vec<Position>),
}

impl SourceLocation {
    /// The first recorded position.
    ///
    /// A `Spread` is never empty: the parser only builds one once it has
    /// seen at least one combining operator.
    pub fn first(&self) -> Position {
        match self {
            SourceLocation::Single(pos) => *pos,
            SourceLocation::Spread(positions) => positions.first().copied().unwrap_or(Position::START),
        }
    }

    /// Number of operator positions recorded (1 for `Single`).
    pub fn len(&self) -> usize {
        match self {
            SourceLocation::Single(_) => 1,
            SourceLocation::Spread(positions) => positions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Position> for SourceLocation {
    fn from(pos: Position) -> Self {
        SourceLocation::Single(pos)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Single(pos) => write!(f, "{pos}"),
            SourceLocation::Spread(positions) => {
                for (index, pos) in positions.iter().enumerate() {
                    if index > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{pos}")?;
                }
                Ok(())
            }
        }
    }
}

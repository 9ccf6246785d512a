//! Source locations attached to every syntax node.

use std::fmt;

/// Line/column position of a node in the source text.
///
/// Both fields are 1-based. `Location::DUMMY` (0:0) marks nodes synthesized
/// by a host rather than parsed from text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    /// Location for generated nodes.
    pub const DUMMY: Location = Location { line: 0, column: 0 };

    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Location { line, column }
    }

    #[inline]
    pub const fn is_dummy(self) -> bool {
        self.line == 0 && self.column == 0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

//! Positions and ranges inside a document.
//!
//! Lines and characters are zero-based. Characters count Unicode scalar
//! values within the line. Ranges are half-open: `[start, end)`.

/// A position in a document (line, character)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

/// A range in a document (start and end positions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    /// A range covering `start..end` characters of a single line
    pub const fn on_line(line: u32, start: u32, end: u32) -> Self {
        Range {
            start: Position::new(line, start),
            end: Position::new(line, end),
        }
    }

    /// Zero-width range at `position`
    pub const fn empty(position: Position) -> Self {
        Range {
            start: position,
            end: position,
        }
    }

    /// Check if this range contains a given position (end inclusive, so a
    /// cursor placed right after a token still counts as "on" it)
    pub fn contains(&self, position: Position) -> bool {
        position >= self.start && position <= self.end
    }

    /// Check if two ranges touch or overlap
    pub fn intersects(&self, other: &Range) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Convert a byte offset within `line` into a character offset
pub fn char_offset(line: &str, byte_offset: usize) -> u32 {
    line[..byte_offset].chars().count() as u32
}

/// Split text into physical lines on `\n` or `\r\n`.
///
/// Unlike `str::lines`, a trailing newline yields a final empty line, so the
/// last entry is always the line the end of the document sits on.
pub fn physical_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Position just past the last character of the document
pub fn end_of_document(text: &str) -> Position {
    let lines = physical_lines(text);
    let last = lines.len().saturating_sub(1);
    let character = lines.last().map_or(0, |line| line.chars().count());
    Position::new(last as u32, character as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_document_tracks_trailing_newline() {
        assert_eq!(end_of_document(""), Position::new(0, 0));
        assert_eq!(end_of_document("HLT"), Position::new(0, 3));
        assert_eq!(end_of_document("INP\nHLT\n"), Position::new(2, 0));
        assert_eq!(end_of_document("INP\r\nOUT"), Position::new(1, 3));
    }

    #[test]
    fn char_offset_counts_scalars() {
        assert_eq!(char_offset("é LDA", 3), 2);
        assert_eq!(char_offset("LDA X", 4), 4);
    }

    #[test]
    fn intersects_is_symmetric_and_inclusive() {
        let a = Range::on_line(0, 2, 5);
        let b = Range::on_line(0, 5, 8);
        let c = Range::on_line(1, 0, 1);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }
}

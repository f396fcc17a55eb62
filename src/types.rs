//! Position and Range conversion for LSP integration
//!
//! The analysis library counts characters as Unicode scalar values. LSP
//! clients count UTF-16 code units unless `utf-32` was negotiated, so every
//! position crossing the protocol boundary goes through a `LineIndex`.

use lmclsp::span::{self, physical_lines};
use tower_lsp::lsp_types::{Position as LspPosition, Range as LspRange};

/// Unit in which the client counts `character` offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionEncoding {
    /// Protocol default
    #[default]
    Utf16,
    Utf32,
}

/// Per-document line table used to translate columns
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    lines: Vec<&'a str>,
    encoding: PositionEncoding,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str, encoding: PositionEncoding) -> Self {
        LineIndex {
            lines: physical_lines(text),
            encoding,
        }
    }

    pub fn to_lsp_position(&self, pos: span::Position) -> LspPosition {
        let character = match (self.encoding, self.lines.get(pos.line as usize)) {
            (PositionEncoding::Utf16, Some(line)) => {
                let wanted = pos.character as usize;
                let units: usize = line.chars().take(wanted).map(char::len_utf16).sum();
                // columns past the end of the line stay one unit per step
                let past_end = wanted.saturating_sub(line.chars().count());
                (units + past_end) as u32
            }
            _ => pos.character,
        };
        LspPosition::new(pos.line, character)
    }

    pub fn to_span_position(&self, pos: LspPosition) -> span::Position {
        let character = match (self.encoding, self.lines.get(pos.line as usize)) {
            (PositionEncoding::Utf16, Some(line)) => {
                let wanted = pos.character as usize;
                let mut units = 0;
                let mut chars = 0;
                for c in line.chars() {
                    if units >= wanted {
                        break;
                    }
                    units += c.len_utf16();
                    chars += 1;
                }
                (chars + wanted.saturating_sub(units)) as u32
            }
            _ => pos.character,
        };
        span::Position::new(pos.line, character)
    }

    pub fn to_lsp_range(&self, range: span::Range) -> LspRange {
        LspRange::new(
            self.to_lsp_position(range.start),
            self.to_lsp_position(range.end),
        )
    }

    pub fn to_span_range(&self, range: LspRange) -> span::Range {
        span::Range::new(
            self.to_span_position(range.start),
            self.to_span_position(range.end),
        )
    }

    /// Text covered by a single-line range
    pub fn text(&self, range: span::Range) -> Option<String> {
        if range.start.line != range.end.line {
            return None;
        }
        let line = self.lines.get(range.start.line as usize)?;
        let start = range.start.character as usize;
        let len = (range.end.character as usize).checked_sub(start)?;
        Some(line.chars().skip(start).take(len).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf32_is_identity() {
        let index = LineIndex::new("\tLDA 😀X\n", PositionEncoding::Utf32);
        let range = span::Range::on_line(0, 5, 7);
        let lsp = index.to_lsp_range(range);
        assert_eq!(lsp.start, LspPosition::new(0, 5));
        assert_eq!(lsp.end, LspPosition::new(0, 7));
        assert_eq!(index.to_span_range(lsp), range);
    }

    #[test]
    fn utf16_counts_surrogate_pairs() {
        let index = LineIndex::new("\tLDA 😀X\n\tHLT", PositionEncoding::Utf16);
        // operand "😀X" is two chars, three UTF-16 units
        let range = span::Range::on_line(0, 5, 7);
        let lsp = index.to_lsp_range(range);
        assert_eq!(lsp.start, LspPosition::new(0, 5));
        assert_eq!(lsp.end, LspPosition::new(0, 8));
        assert_eq!(index.to_span_range(lsp), range);
        assert_eq!(index.text(range).as_deref(), Some("😀X"));

        // other lines are unaffected
        assert_eq!(
            index.to_lsp_position(span::Position::new(1, 4)),
            LspPosition::new(1, 4)
        );
    }

    #[test]
    fn positions_past_line_end_and_document_end() {
        let index = LineIndex::new("é", PositionEncoding::Utf16);
        assert_eq!(
            index.to_lsp_position(span::Position::new(0, 3)),
            LspPosition::new(0, 3)
        );
        assert_eq!(
            index.to_span_position(LspPosition::new(0, 3)),
            span::Position::new(0, 3)
        );
        assert_eq!(
            index.to_lsp_position(span::Position::new(5, 2)),
            LspPosition::new(5, 2)
        );
    }
}

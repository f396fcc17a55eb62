//! Line parser
//!
//! Every physical line is matched on its own against
//! `[label <ws>] mnemonic [<ws> operand]`, after the comment (everything from
//! the first `;`) has been cut off. Labels are a letter followed by word
//! characters, mnemonics are exactly three uppercase letters. Lines that do
//! not fit that shape are skipped without a diagnostic.

use std::sync::OnceLock;

use regex::{Match, Regex};

use crate::instructions;
use crate::span::{char_offset, physical_lines, Range};

/// One parsed line of source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// Zero-based line index
    pub line: u32,
    pub label: Option<String>,
    pub mnemonic: String,
    pub operand: Option<String>,
    /// Character offset of the label (always the start of the line's code)
    pub label_start: u32,
    pub mnemonic_start: u32,
    pub operand_start: Option<u32>,
}

impl SourceLine {
    pub fn label_range(&self) -> Option<Range> {
        self.label.as_ref().map(|label| {
            Range::on_line(
                self.line,
                self.label_start,
                self.label_start + label.chars().count() as u32,
            )
        })
    }

    pub fn mnemonic_range(&self) -> Range {
        Range::on_line(
            self.line,
            self.mnemonic_start,
            self.mnemonic_start + self.mnemonic.chars().count() as u32,
        )
    }

    pub fn operand_range(&self) -> Option<Range> {
        let operand = self.operand.as_ref()?;
        let start = self.operand_start?;
        Some(Range::on_line(
            self.line,
            start,
            start + operand.chars().count() as u32,
        ))
    }
}

fn bare_regex() -> &'static Regex {
    static BARE: OnceLock<Regex> = OnceLock::new();
    BARE.get_or_init(|| {
        Regex::new(r"^\s*([A-Z]{3})\b(?:\s+([^;\s]+))?")
            .expect("bare line grammar is a valid regex")
    })
}

fn labeled_regex() -> &'static Regex {
    static LABELED: OnceLock<Regex> = OnceLock::new();
    LABELED.get_or_init(|| {
        Regex::new(r"^([A-Za-z][A-Za-z0-9_]*)\s+([A-Z]{3})\b(?:\s+([^;\s]+))?")
            .expect("labeled line grammar is a valid regex")
    })
}

/// Strip the comment from a physical line
pub fn code_part(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Parse a single physical line. Returns `None` for blank, comment-only and
/// non-matching lines.
///
/// A leading three-letter word is ambiguous (`ADD ONE` could be label `ADD`
/// on instruction `ONE`). A catalog mnemonic followed by another catalog
/// mnemonic and an operand reads as a label; otherwise a catalog mnemonic in
/// first position wins, and the labeled reading is tried before the bare one.
pub fn parse_line(line_index: u32, line: &str) -> Option<SourceLine> {
    let code = code_part(line);
    if code.trim().is_empty() {
        return None;
    }

    let labeled = labeled_regex().captures(code);
    if let Some(captures) = &labeled {
        if instructions::is_instruction(&captures[2]) && captures.get(3).is_some() {
            return Some(build_line(
                line_index,
                code,
                captures.get(1),
                captures.get(2)?,
                captures.get(3),
            ));
        }
    }
    let bare = bare_regex().captures(code);
    if let Some(captures) = &bare {
        if instructions::is_instruction(&captures[1]) {
            return Some(build_line(line_index, code, None, captures.get(1)?, captures.get(2)));
        }
    }
    if let Some(captures) = labeled {
        return Some(build_line(
            line_index,
            code,
            captures.get(1),
            captures.get(2)?,
            captures.get(3),
        ));
    }
    let captures = bare?;
    Some(build_line(line_index, code, None, captures.get(1)?, captures.get(2)))
}

fn build_line(
    line_index: u32,
    code: &str,
    label: Option<Match<'_>>,
    mnemonic: Match<'_>,
    operand: Option<Match<'_>>,
) -> SourceLine {
    SourceLine {
        line: line_index,
        label: label.map(|m| m.as_str().to_string()),
        label_start: label.map_or(0, |m| char_offset(code, m.start())),
        mnemonic: mnemonic.as_str().to_string(),
        mnemonic_start: char_offset(code, mnemonic.start()),
        operand: operand.map(|m| m.as_str().to_string()),
        operand_start: operand.map(|m| char_offset(code, m.start())),
    }
}

/// Parse every line of a document, in order
pub fn parse_document(text: &str) -> Vec<SourceLine> {
    physical_lines(text)
        .into_iter()
        .enumerate()
        .filter_map(|(idx, line)| parse_line(idx as u32, line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_label_mnemonic_operand() {
        let line = parse_line(3, "LOOP\tLDA COUNT ; fetch").unwrap();
        assert_eq!(line.line, 3);
        assert_eq!(line.label.as_deref(), Some("LOOP"));
        assert_eq!(line.mnemonic, "LDA");
        assert_eq!(line.operand.as_deref(), Some("COUNT"));
        assert_eq!(line.mnemonic_start, 5);
        assert_eq!(line.operand_start, Some(9));
        assert_eq!(line.operand_range(), Some(Range::on_line(3, 9, 14)));
        assert_eq!(line.label_range(), Some(Range::on_line(3, 0, 4)));
    }

    #[test]
    fn indented_instruction_has_no_label() {
        let line = parse_line(0, "    HLT").unwrap();
        assert_eq!(line.label, None);
        assert_eq!(line.mnemonic, "HLT");
        assert_eq!(line.mnemonic_start, 4);
        assert_eq!(line.operand, None);
        assert_eq!(line.operand_start, None);
    }

    #[test]
    fn comment_is_stripped_before_matching() {
        let line = parse_line(0, "STA X;store").unwrap();
        assert_eq!(line.operand.as_deref(), Some("X"));
        assert!(parse_line(0, "; just a comment").is_none());
        assert!(parse_line(0, "   ;indented comment").is_none());
        assert!(parse_line(0, "   ").is_none());
    }

    #[test]
    fn non_matching_lines_are_skipped() {
        assert!(parse_line(0, "lda x").is_none());
        assert!(parse_line(0, "12 34").is_none());
        let lines = parse_document("lda x\nINP\n\n; c\nOUT");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line, 1);
        assert_eq!(lines[1].line, 4);
    }

    #[test]
    fn leading_mnemonic_is_not_a_label() {
        let line = parse_line(0, "ADD ONE").unwrap();
        assert_eq!(line.label, None);
        assert_eq!(line.mnemonic, "ADD");
        assert_eq!(line.operand.as_deref(), Some("ONE"));

        let line = parse_line(0, "BRA MISSING").unwrap();
        assert_eq!(line.mnemonic, "BRA");
        assert_eq!(line.operand.as_deref(), Some("MISSING"));
    }

    #[test]
    fn mnemonic_named_label_before_full_instruction() {
        let line = parse_line(0, "BRA\tLDA X").unwrap();
        assert_eq!(line.label.as_deref(), Some("BRA"));
        assert_eq!(line.mnemonic, "LDA");
        assert_eq!(line.operand.as_deref(), Some("X"));

        // without a third token the first word stays the mnemonic
        let line = parse_line(0, "BRA LDA").unwrap();
        assert_eq!(line.label, None);
        assert_eq!(line.operand.as_deref(), Some("LDA"));

        let analysis = crate::analysis::analyze("BRA\tLDA X\n\tBRA BRA\nX\tDAT 0\n");
        assert!(analysis.diagnostics.is_empty());
    }

    #[test]
    fn short_labels_and_unknown_mnemonics() {
        let line = parse_line(0, "TOP LDA X").unwrap();
        assert_eq!(line.label.as_deref(), Some("TOP"));
        assert_eq!(line.mnemonic, "LDA");

        let line = parse_line(0, "XYZ #1").unwrap();
        assert_eq!(line.label, None);
        assert_eq!(line.mnemonic, "XYZ");
        assert_eq!(line.operand.as_deref(), Some("#1"));

        // mnemonic must end at a word boundary
        assert!(parse_line(0, "STAX 5").is_none());
    }

    #[test]
    fn crlf_line_endings() {
        let lines = parse_document("INP\r\nA DAT 5\r\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].operand.as_deref(), Some("5"));
    }

    #[test]
    fn operand_offset_points_past_mnemonic() {
        // the operand text also occurs inside the label
        let line = parse_line(0, "LDAX LDA LDAX").unwrap();
        assert_eq!(line.mnemonic_start, 5);
        assert_eq!(line.operand_start, Some(9));
    }
}

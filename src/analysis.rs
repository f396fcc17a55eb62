//! Whole-document analysis
//!
//! Parse every line, build the complete label table, then validate. The table
//! is finished before the first reference is checked.

use crate::labels::{build_label_table, LabelTable};
use crate::parser::{parse_document, SourceLine};
use crate::validator::{validate, LmcDiagnostic};

/// Everything one analysis pass learns about a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    pub lines: Vec<SourceLine>,
    pub labels: LabelTable,
    /// Duplicate-label diagnostics first, then per-line diagnostics in
    /// document order
    pub diagnostics: Vec<LmcDiagnostic>,
}

impl Analysis {
    /// The parsed record for a zero-based line, if that line parsed
    pub fn line(&self, line: u32) -> Option<&SourceLine> {
        self.lines
            .binary_search_by_key(&line, |l| l.line)
            .ok()
            .map(|idx| &self.lines[idx])
    }
}

pub fn analyze(text: &str) -> Analysis {
    let lines = parse_document(text);
    let (labels, mut diagnostics) = build_label_table(&lines);
    diagnostics.extend(validate(&lines, &labels));
    Analysis {
        lines,
        labels,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::DiagnosticKind;

    const PROGRAM: &str = "\
; countdown with a few mistakes
        INP
LOOP    OUT
        SUB ONE
        BRP LOOP
        LDA 7
        BRA NOWHERE
LOOP    HLT
ONE     DAT 1
";

    #[test]
    fn analysis_is_idempotent() {
        let first = analyze(PROGRAM);
        let second = analyze(PROGRAM);
        assert_eq!(first.diagnostics, second.diagnostics);
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_labels_come_first() {
        let kinds: Vec<_> = analyze(PROGRAM).diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::DuplicateLabel,
                DiagnosticKind::NumericNeedsHash,
                DiagnosticKind::UndefinedLabel,
            ]
        );
    }

    #[test]
    fn line_lookup() {
        let analysis = analyze(PROGRAM);
        assert_eq!(analysis.line(0), None);
        assert_eq!(analysis.line(4).map(|l| l.mnemonic.as_str()), Some("BRP"));
        assert_eq!(analysis.line(8).and_then(|l| l.label.as_deref()), Some("ONE"));
    }
}

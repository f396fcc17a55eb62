//! Quick-fix engine
//!
//! Turns diagnostics into concrete text edits. Each diagnostic is handled on
//! its own; everything that applies is returned together. The fixes are
//! protocol-free, the server converts them into code actions.

use crate::instructions::{self, MNEMONICS};
use crate::labels::LabelTable;
use crate::parser::parse_document;
use crate::span::{end_of_document, Position, Range};
use crate::templates::TEMPLATES;
use crate::validator::{DiagnosticKind, LmcDiagnostic};

/// Replace `range` with `new_text`. An empty range is an insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixEdit {
    pub range: Range,
    pub new_text: String,
}

impl FixEdit {
    pub fn replace(range: Range, new_text: impl Into<String>) -> Self {
        FixEdit {
            range,
            new_text: new_text.into(),
        }
    }

    pub fn insert(position: Position, new_text: impl Into<String>) -> Self {
        FixEdit::replace(Range::empty(position), new_text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickFix {
    pub title: String,
    pub edits: Vec<FixEdit>,
    /// Index into the diagnostics passed to `suggest_fixes`; `None` for
    /// template insertions
    pub diagnostic: Option<usize>,
    pub is_preferred: bool,
}

impl QuickFix {
    fn for_diagnostic(index: usize, title: impl Into<String>, edit: FixEdit) -> Self {
        QuickFix {
            title: title.into(),
            edits: vec![edit],
            diagnostic: Some(index),
            is_preferred: true,
        }
    }
}

/// Levenshtein distance with unit costs, over chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == *cb { 0 } else { 1 };
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Catalog mnemonics worth offering in place of `token`: same first letter,
/// or at most two edits away. Catalog order.
pub fn mnemonic_suggestions(token: &str) -> Vec<&'static str> {
    let first = token.chars().next();
    MNEMONICS
        .iter()
        .copied()
        .filter(|mnemonic| mnemonic.chars().next() == first || levenshtein(token, mnemonic) <= 2)
        .collect()
}

/// Text that appends a new line at the end of `text`
fn append_line(text: &str, line: &str) -> FixEdit {
    let prefix = if text.is_empty() || text.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    FixEdit::insert(end_of_document(text), format!("{}{}\n", prefix, line))
}

/// Propose fixes for `diagnostics` against the current `text`.
///
/// When `requested` is given, diagnostics outside it are skipped. An empty
/// or whitespace-only document additionally gets one template insertion per
/// catalog entry, regardless of diagnostics.
pub fn suggest_fixes(
    text: &str,
    labels: &LabelTable,
    diagnostics: &[LmcDiagnostic],
    requested: Option<Range>,
) -> Vec<QuickFix> {
    let lines = parse_document(text);
    let mut fixes = Vec::new();

    for (index, diagnostic) in diagnostics.iter().enumerate() {
        if let Some(requested) = requested {
            if !requested.intersects(&diagnostic.range) {
                continue;
            }
        }

        match diagnostic.kind {
            DiagnosticKind::NumericNeedsHash => {
                let replacement = format!("#{}", diagnostic.token);
                fixes.push(QuickFix::for_diagnostic(
                    index,
                    format!("Use immediate value {}", replacement),
                    FixEdit::replace(diagnostic.range, replacement),
                ));
            }
            DiagnosticKind::IncompleteImmediate => {
                fixes.push(QuickFix::for_diagnostic(
                    index,
                    "Complete immediate value as #0",
                    FixEdit::replace(diagnostic.range, "#0"),
                ));
            }
            DiagnosticKind::MissingOperand => {
                // only DAT takes a bare number
                let operand = if diagnostic.token == instructions::DAT {
                    "0"
                } else {
                    "#0"
                };
                fixes.push(QuickFix::for_diagnostic(
                    index,
                    format!("Add operand {}", operand),
                    FixEdit::insert(diagnostic.range.end, format!(" {}", operand)),
                ));
            }
            DiagnosticKind::ImmediateOutOfRange | DiagnosticKind::NumericOutOfRange => {
                fixes.push(QuickFix::for_diagnostic(
                    index,
                    "Replace with #0",
                    FixEdit::replace(diagnostic.range, "#0"),
                ));
            }
            DiagnosticKind::UndefinedLabel | DiagnosticKind::UndefinedLabelReference => {
                let label = diagnostic.token.as_str();
                // stale diagnostic: the label exists by now
                if label.is_empty() || labels.contains(label) {
                    continue;
                }
                let mnemonic = lines
                    .iter()
                    .find(|line| line.line == diagnostic.range.start.line)
                    .map(|line| line.mnemonic.as_str());

                if mnemonic.map_or(false, instructions::is_branch) {
                    let new_text = format!("{}\tHLT\n\n", label);
                    let edit = match lines.iter().find(|line| line.mnemonic == instructions::DAT) {
                        Some(data_line) => {
                            FixEdit::insert(Position::new(data_line.line, 0), new_text)
                        }
                        None => append_line(text, &format!("{}\tHLT\n", label)),
                    };
                    fixes.push(QuickFix::for_diagnostic(
                        index,
                        format!("Create code label '{}'", label),
                        edit,
                    ));
                } else {
                    fixes.push(QuickFix::for_diagnostic(
                        index,
                        format!("Create data label '{}'", label),
                        append_line(text, &format!("{}\tDAT 0", label)),
                    ));
                }
            }
            DiagnosticKind::InvalidInstruction => {
                let candidates: Vec<String> = if diagnostic.candidates.is_empty() {
                    mnemonic_suggestions(&diagnostic.token)
                        .into_iter()
                        .map(str::to_string)
                        .collect()
                } else {
                    diagnostic.candidates.clone()
                };
                for candidate in candidates {
                    if !instructions::is_instruction(&candidate) {
                        continue;
                    }
                    fixes.push(QuickFix {
                        title: format!("Replace with '{}'", candidate),
                        edits: vec![FixEdit::replace(diagnostic.range, candidate)],
                        diagnostic: Some(index),
                        is_preferred: false,
                    });
                }
            }
            DiagnosticKind::DuplicateLabel | DiagnosticKind::DatOperandInvalid => {}
        }
    }

    if text.trim().is_empty() {
        fixes.extend(template_fixes());
    }

    fixes
}

/// One insertion per template, at the start of the document, sorted by name
pub fn template_fixes() -> Vec<QuickFix> {
    let mut names: Vec<&str> = TEMPLATES.keys().copied().collect();
    names.sort_unstable();
    names
        .into_iter()
        .filter_map(|name| {
            let program = TEMPLATES.get(name)?;
            Some(QuickFix {
                title: format!("Insert template: {}", name),
                edits: vec![FixEdit::insert(Position::new(0, 0), *program)],
                diagnostic: None,
                is_preferred: false,
            })
        })
        .collect()
}

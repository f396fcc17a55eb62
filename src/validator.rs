//! Instruction validator
//!
//! Stateless per-line rules. Each parsed line is checked for a known mnemonic
//! and for an operand that fits the instruction's addressing rules. The
//! resulting diagnostics carry a structured kind plus the offending token, so
//! later consumers never have to read the message text.

use crate::instructions::{self, OperandKind};
use crate::labels::LabelTable;
use crate::operand::{parse_value, OperandForm};
use crate::parser::SourceLine;
use crate::quick_fix::mnemonic_suggestions;
use crate::span::Range;

/// Source tag attached to every diagnostic this engine produces
pub const DIAGNOSTIC_SOURCE: &str = "LMC";

/// Largest value accepted anywhere a number is expected
pub const MAX_VALUE: u64 = u64::MAX;

/// Severity of a diagnostic. Every problem is an error in this dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    DuplicateLabel,
    InvalidInstruction,
    ImmediateOutOfRange,
    NumericOutOfRange,
    MissingOperand,
    UndefinedLabel,
    UndefinedLabelReference,
    NumericNeedsHash,
    IncompleteImmediate,
    DatOperandInvalid,
}

impl DiagnosticKind {
    pub const ALL: [DiagnosticKind; 10] = [
        DiagnosticKind::DuplicateLabel,
        DiagnosticKind::InvalidInstruction,
        DiagnosticKind::ImmediateOutOfRange,
        DiagnosticKind::NumericOutOfRange,
        DiagnosticKind::MissingOperand,
        DiagnosticKind::UndefinedLabel,
        DiagnosticKind::UndefinedLabelReference,
        DiagnosticKind::NumericNeedsHash,
        DiagnosticKind::IncompleteImmediate,
        DiagnosticKind::DatOperandInvalid,
    ];

    /// Stable identifier used as the diagnostic code on the wire
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateLabel => "duplicate-label",
            DiagnosticKind::InvalidInstruction => "invalid-instruction",
            DiagnosticKind::ImmediateOutOfRange => "immediate-out-of-range",
            DiagnosticKind::NumericOutOfRange => "numeric-out-of-range",
            DiagnosticKind::MissingOperand => "missing-operand",
            DiagnosticKind::UndefinedLabel => "undefined-label",
            DiagnosticKind::UndefinedLabelReference => "undefined-label-reference",
            DiagnosticKind::NumericNeedsHash => "numeric-needs-hash",
            DiagnosticKind::IncompleteImmediate => "incomplete-immediate",
            DiagnosticKind::DatOperandInvalid => "dat-operand-invalid",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

/// A problem found in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LmcDiagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub range: Range,
    pub message: String,
    /// The offending token: label name, mnemonic or operand text
    pub token: String,
    /// Replacement mnemonics, only filled for `InvalidInstruction`
    pub candidates: Vec<String>,
}

impl LmcDiagnostic {
    pub fn new(
        kind: DiagnosticKind,
        range: Range,
        message: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        LmcDiagnostic {
            kind,
            severity: Severity::Error,
            range,
            message: message.into(),
            token: token.into(),
            candidates: Vec::new(),
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }
}

fn immediate_out_of_range(range: Range, operand: &str) -> LmcDiagnostic {
    LmcDiagnostic::new(
        DiagnosticKind::ImmediateOutOfRange,
        range,
        format!("Immediate value must be between 0 and {}", MAX_VALUE),
        operand,
    )
}

fn numeric_out_of_range(range: Range, operand: &str) -> LmcDiagnostic {
    LmcDiagnostic::new(
        DiagnosticKind::NumericOutOfRange,
        range,
        format!("Numeric value must be between 0 and {}", MAX_VALUE),
        operand,
    )
}

/// Check one parsed line against the label table
pub fn validate_line(line: &SourceLine, labels: &LabelTable, diagnostics: &mut Vec<LmcDiagnostic>) {
    let mnemonic = line.mnemonic.as_str();
    if mnemonic.is_empty() {
        return;
    }

    if !instructions::is_instruction(mnemonic) {
        diagnostics.push(
            LmcDiagnostic::new(
                DiagnosticKind::InvalidInstruction,
                line.mnemonic_range(),
                format!("Invalid instruction: {}", mnemonic),
                mnemonic,
            )
            .with_candidates(
                mnemonic_suggestions(mnemonic)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            ),
        );
    }

    let kind = instructions::operand_kind(mnemonic);
    let (Some(operand), Some(range)) = (line.operand.as_deref(), line.operand_range()) else {
        if kind == OperandKind::Required {
            diagnostics.push(LmcDiagnostic::new(
                DiagnosticKind::MissingOperand,
                line.mnemonic_range(),
                format!("Instruction {} requires an operand", mnemonic),
                mnemonic,
            ));
        }
        return;
    };

    match kind {
        OperandKind::None => {}
        OperandKind::Data => validate_data_operand(operand, range, labels, diagnostics),
        OperandKind::Required => {
            validate_required_operand(mnemonic, operand, range, labels, diagnostics)
        }
    }
}

fn validate_data_operand(
    operand: &str,
    range: Range,
    labels: &LabelTable,
    diagnostics: &mut Vec<LmcDiagnostic>,
) {
    match OperandForm::classify(operand) {
        OperandForm::Immediate(value) => {
            if parse_value(value).is_none() {
                diagnostics.push(immediate_out_of_range(range, operand));
            }
        }
        OperandForm::NumericLiteral(value) => {
            if parse_value(value).is_none() {
                diagnostics.push(numeric_out_of_range(range, operand));
            }
        }
        OperandForm::IndirectRef(_) | OperandForm::DirectRef(_) => {
            if !labels.contains(operand) {
                diagnostics.push(LmcDiagnostic::new(
                    DiagnosticKind::DatOperandInvalid,
                    range,
                    "DAT operand must be a number, a label, or an immediate value prefixed with '#'",
                    operand,
                ));
            }
        }
    }
}

fn validate_required_operand(
    mnemonic: &str,
    operand: &str,
    range: Range,
    labels: &LabelTable,
    diagnostics: &mut Vec<LmcDiagnostic>,
) {
    match OperandForm::classify(operand) {
        OperandForm::NumericLiteral(value) => {
            // out of range masks the missing '#'
            if parse_value(value).is_some() {
                diagnostics.push(LmcDiagnostic::new(
                    DiagnosticKind::NumericNeedsHash,
                    range,
                    format!(
                        "Numeric value {} must be prefixed with '#' for immediate addressing",
                        operand
                    ),
                    operand,
                ));
            } else {
                diagnostics.push(numeric_out_of_range(range, operand));
            }
        }
        OperandForm::Immediate("") => {
            diagnostics.push(LmcDiagnostic::new(
                DiagnosticKind::IncompleteImmediate,
                range,
                format!(
                    "'{}' operand '{}' is incomplete. A value must follow '#'",
                    mnemonic, operand
                ),
                operand,
            ));
        }
        OperandForm::Immediate(value) => {
            if parse_value(value).is_none() {
                diagnostics.push(immediate_out_of_range(range, operand));
            }
        }
        OperandForm::IndirectRef(label) => {
            if !labels.contains(label) {
                diagnostics.push(LmcDiagnostic::new(
                    DiagnosticKind::UndefinedLabelReference,
                    range,
                    format!("Undefined label reference: {}", label),
                    label,
                ));
            }
        }
        OperandForm::DirectRef(label) => {
            if !labels.contains(label) {
                diagnostics.push(LmcDiagnostic::new(
                    DiagnosticKind::UndefinedLabel,
                    range,
                    format!("Undefined label: {}", label),
                    label,
                ));
            }
        }
    }
}

/// Validate every line, in document order
pub fn validate(lines: &[SourceLine], labels: &LabelTable) -> Vec<LmcDiagnostic> {
    let mut diagnostics = Vec::new();
    for line in lines {
        validate_line(line, labels, &mut diagnostics);
    }
    diagnostics
}

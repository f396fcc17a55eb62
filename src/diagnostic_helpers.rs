//! Diagnostic helper utilities
//!
//! Conversion between analysis diagnostics and LSP diagnostics. The kind
//! travels as the diagnostic code and the offending token plus mnemonic
//! candidates travel in `data`, so a code action request can rebuild the
//! analysis diagnostic. The message is only consulted when a client drops
//! the code.

use lmclsp::validator::{DiagnosticKind, LmcDiagnostic, Severity};
use lmclsp::DIAGNOSTIC_SOURCE;
use serde_json::{json, Value};
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString};

use crate::types::LineIndex;

/// Create a unique identity tuple for a diagnostic
///
/// Two diagnostics with the same identity are considered duplicates.
pub fn diagnostic_identity(diag: &Diagnostic) -> (u32, u32, u32, u32, String) {
    (
        diag.range.start.line,
        diag.range.start.character,
        diag.range.end.line,
        diag.range.end.character,
        diag.message.clone(),
    )
}

fn lsp_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
    }
}

pub fn to_lsp_diagnostic(diagnostic: &LmcDiagnostic, index: &LineIndex) -> Diagnostic {
    let mut lsp = Diagnostic::new(
        index.to_lsp_range(diagnostic.range),
        Some(lsp_severity(diagnostic.severity)),
        Some(NumberOrString::String(diagnostic.kind.code().to_string())),
        Some(DIAGNOSTIC_SOURCE.to_string()),
        diagnostic.message.clone(),
        None,
        None,
    );
    lsp.data = Some(json!({
        "token": diagnostic.token,
        "candidates": diagnostic.candidates,
    }));
    lsp
}

/// Recognize a diagnostic kind by its message, for clients that drop codes
fn kind_from_message(message: &str) -> Option<DiagnosticKind> {
    let kind = if message.starts_with("Duplicate label: ") {
        DiagnosticKind::DuplicateLabel
    } else if message.starts_with("Invalid instruction: ") {
        DiagnosticKind::InvalidInstruction
    } else if message.starts_with("Immediate value must be between") {
        DiagnosticKind::ImmediateOutOfRange
    } else if message.starts_with("Numeric value must be between") {
        DiagnosticKind::NumericOutOfRange
    } else if message.ends_with("requires an operand") {
        DiagnosticKind::MissingOperand
    } else if message.starts_with("Undefined label reference: ") {
        DiagnosticKind::UndefinedLabelReference
    } else if message.starts_with("Undefined label: ") {
        DiagnosticKind::UndefinedLabel
    } else if message.contains("must be prefixed with '#'") {
        DiagnosticKind::NumericNeedsHash
    } else if message.contains("is incomplete") {
        DiagnosticKind::IncompleteImmediate
    } else if message.starts_with("DAT operand must be") {
        DiagnosticKind::DatOperandInvalid
    } else {
        return None;
    };
    Some(kind)
}

/// Rebuild an analysis diagnostic from one the client sent back.
///
/// Only diagnostics from this server qualify. The kind comes from the code,
/// or from the message when the code is missing; an unknown code is
/// rejected. When `data` did not survive the round trip, the token is
/// recovered from the document text behind `index`.
pub fn from_lsp_diagnostic(diagnostic: &Diagnostic, index: &LineIndex) -> Option<LmcDiagnostic> {
    if diagnostic.source.as_deref() != Some(DIAGNOSTIC_SOURCE) {
        return None;
    }
    let kind = match diagnostic.code.as_ref() {
        Some(NumberOrString::String(code)) => DiagnosticKind::from_code(code)?,
        Some(NumberOrString::Number(_)) => return None,
        None => kind_from_message(&diagnostic.message)?,
    };

    let range = index.to_span_range(diagnostic.range);
    let data = diagnostic.data.as_ref();
    let token = data
        .and_then(|d| d.get("token"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            let raw = index.text(range)?;
            Some(match kind {
                DiagnosticKind::UndefinedLabelReference => raw.trim_start_matches('@').to_string(),
                _ => raw,
            })
        })
        .unwrap_or_default();
    let candidates = data
        .and_then(|d| d.get("candidates"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(
        LmcDiagnostic::new(
            kind,
            range,
            diagnostic.message.clone(),
            token,
        )
        .with_candidates(candidates),
    )
}

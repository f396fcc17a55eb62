//! LSP Handler Functions
//!
//! Code actions, go-to-definition and document symbols. Each handler reads
//! the current text from the file table and re-analyzes it; the conversion
//! work lives in plain functions so it can be tested without a client.

use std::collections::HashMap;

use lmclsp::instructions;
use lmclsp::operand::OperandForm;
use lmclsp::quick_fix::{suggest_fixes, QuickFix};
use lmclsp::{analyze, Analysis};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;

use crate::diagnostic_helpers::from_lsp_diagnostic;
use crate::types::{LineIndex, PositionEncoding};
use crate::Backend;

fn text_edits(fix: &QuickFix, index: &LineIndex) -> Vec<TextEdit> {
    fix.edits
        .iter()
        .map(|edit| TextEdit::new(index.to_lsp_range(edit.range), edit.new_text.clone()))
        .collect()
}

/// Quick fixes for the diagnostics the client sent along with a code action
/// request. Diagnostics from other sources are ignored.
pub fn code_actions_for(
    uri: &Url,
    text: &str,
    diagnostics: &[Diagnostic],
    requested: Range,
    encoding: PositionEncoding,
) -> Vec<CodeActionOrCommand> {
    let analysis = analyze(text);
    let index = LineIndex::new(text, encoding);

    let (sent, eligible): (Vec<&Diagnostic>, Vec<_>) = diagnostics
        .iter()
        .filter_map(|diagnostic| Some((diagnostic, from_lsp_diagnostic(diagnostic, &index)?)))
        .unzip();

    suggest_fixes(text, &analysis.labels, &eligible, Some(index.to_span_range(requested)))
        .into_iter()
        .map(|fix| {
            CodeActionOrCommand::CodeAction(CodeAction {
                title: fix.title.clone(),
                kind: Some(CodeActionKind::QUICKFIX),
                diagnostics: fix.diagnostic.map(|index| vec![sent[index].clone()]),
                edit: Some(WorkspaceEdit::new(HashMap::from([(
                    uri.clone(),
                    text_edits(&fix, &index),
                )]))),
                is_preferred: Some(fix.is_preferred),
                ..Default::default()
            })
        })
        .collect()
}

pub async fn handle_code_action(
    backend: &Backend,
    params: CodeActionParams,
) -> Result<Option<Vec<CodeActionOrCommand>>> {
    let _timer = crate::performance::TimingGuard::new(&backend.perf_tracker, "lmc.server.code_action");
    backend.perf_tracker.increment("lmc.server.code_action.calls", 1);

    let files = backend.files.read().await;
    let Some(file_data) = files.get(&params.text_document.uri) else {
        return Err(tower_lsp::jsonrpc::Error::invalid_request());
    };
    let document = &file_data.document_data;

    let actions = code_actions_for(
        &document.url,
        &document.content,
        &params.context.diagnostics,
        params.range,
        backend.session.position_encoding(),
    );
    if actions.is_empty() {
        return Ok(None);
    }
    Ok(Some(actions))
}

/// Definition range of the label under `position`, whether the cursor is on
/// a reference or on the definition itself
pub fn definition_at(
    analysis: &Analysis,
    position: lmclsp::span::Position,
) -> Option<lmclsp::span::Range> {
    let line = analysis.line(position.line)?;

    if let (Some(label), Some(range)) = (line.label.as_deref(), line.label_range()) {
        if range.contains(position) {
            return analysis.labels.definition(label);
        }
    }

    let range = line.operand_range()?;
    if !range.contains(position) {
        return None;
    }
    match OperandForm::classify(line.operand.as_deref()?) {
        OperandForm::DirectRef(name) | OperandForm::IndirectRef(name) => {
            analysis.labels.definition(name)
        }
        _ => None,
    }
}

/// Handle goto definition request for navigation
pub async fn handle_goto_definition(
    backend: &Backend,
    params: GotoDefinitionParams,
) -> Result<Option<GotoDefinitionResponse>> {
    let files = backend.files.read().await;
    let Some(file_data) = files.get(&params.text_document_position_params.text_document.uri)
    else {
        return Err(tower_lsp::jsonrpc::Error::invalid_request());
    };
    let document = &file_data.document_data;
    let analysis = analyze(&document.content);
    let index = LineIndex::new(&document.content, backend.session.position_encoding());

    let position = index.to_span_position(params.text_document_position_params.position);
    Ok(definition_at(&analysis, position).map(|range| {
        GotoDefinitionResponse::Scalar(Location::new(
            document.url.clone(),
            index.to_lsp_range(range),
        ))
    }))
}

/// Every label in document order. Labels on `DAT` lines are data, the rest
/// are code.
pub fn label_symbols(
    uri: &Url,
    analysis: &Analysis,
    index: &LineIndex,
) -> Vec<SymbolInformation> {
    analysis
        .labels
        .iter_sorted()
        .into_iter()
        .map(|(name, range)| {
            let is_data = analysis
                .line(range.start.line)
                .map_or(false, |line| line.mnemonic == instructions::DAT);
            let kind = if is_data {
                SymbolKind::VARIABLE
            } else {
                SymbolKind::FUNCTION
            };
            #[allow(deprecated)]
            SymbolInformation {
                name: name.to_string(),
                kind,
                tags: None,
                deprecated: None,
                location: Location::new(uri.clone(), index.to_lsp_range(range)),
                container_name: None,
            }
        })
        .collect()
}

pub async fn handle_document_symbol(
    backend: &Backend,
    params: DocumentSymbolParams,
) -> Result<Option<DocumentSymbolResponse>> {
    let files = backend.files.read().await;
    let uri = params.text_document.uri;

    let Some(file_data) = files.get(&uri) else {
        return Err(tower_lsp::jsonrpc::Error::invalid_request());
    };
    let content = &file_data.document_data.content;
    let analysis = analyze(content);
    let index = LineIndex::new(content, backend.session.position_encoding());

    Ok(Some(DocumentSymbolResponse::Flat(label_symbols(
        &uri, &analysis, &index,
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp_diagnostics::compute_diagnostics_for_text;

    fn uri() -> Url {
        Url::parse("file:///tmp/program.lmc").unwrap()
    }

    const UTF32: PositionEncoding = PositionEncoding::Utf32;

    fn whole_document() -> Range {
        Range::new(Position::new(0, 0), Position::new(u32::MAX, 0))
    }

    fn actions_with(
        text: &str,
        diagnostics: &[Diagnostic],
        encoding: PositionEncoding,
    ) -> Vec<CodeAction> {
        code_actions_for(&uri(), text, diagnostics, whole_document(), encoding)
            .into_iter()
            .filter_map(|action| match action {
                CodeActionOrCommand::CodeAction(action) => Some(action),
                CodeActionOrCommand::Command(_) => None,
            })
            .collect()
    }

    fn actions(text: &str, diagnostics: &[Diagnostic]) -> Vec<CodeAction> {
        actions_with(text, diagnostics, UTF32)
    }

    fn edits_of(action: &CodeAction) -> &Vec<TextEdit> {
        &action.edit.as_ref().unwrap().changes.as_ref().unwrap()[&uri()]
    }

    #[test]
    fn numeric_literal_gets_hash_fix() {
        let text = "\tLDA 5\n";
        let diagnostics = compute_diagnostics_for_text(text, UTF32);
        let actions = actions(text, &diagnostics);
        assert_eq!(actions.len(), 1);
        let action = &actions[0];
        assert_eq!(action.kind, Some(CodeActionKind::QUICKFIX));
        assert_eq!(action.is_preferred, Some(true));
        assert_eq!(action.diagnostics.as_ref(), Some(&diagnostics));

        let edits = edits_of(action);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "#5");
        assert_eq!(
            edits[0].range,
            Range::new(Position::new(0, 5), Position::new(0, 6))
        );
    }

    #[test]
    fn fix_edits_use_utf16_columns() {
        // surrogate pairs in comments must not shift the columns before them
        let text = "; 😀😀\n\tADD 😀\n\tLDA 7 ; 😀\n";
        let encoding = PositionEncoding::Utf16;
        let diagnostics = compute_diagnostics_for_text(text, encoding);
        let actions = actions_with(text, &diagnostics, encoding);

        let hash = actions.iter().find(|a| a.title.contains("#7")).unwrap();
        assert_eq!(
            edits_of(hash)[0].range,
            Range::new(Position::new(2, 5), Position::new(2, 6))
        );

        let create = actions.iter().find(|a| a.title.contains("😀")).unwrap();
        assert_eq!(create.diagnostics.as_ref().unwrap()[0].range.end, Position::new(1, 7));
    }

    #[test]
    fn foreign_diagnostics_get_no_actions() {
        let text = "\tLDA 5\n";
        let mut diagnostics = compute_diagnostics_for_text(text, UTF32);
        for diagnostic in &mut diagnostics {
            diagnostic.source = Some("other".to_string());
        }
        assert!(actions(text, &diagnostics).is_empty());
    }

    #[test]
    fn empty_document_offers_templates() {
        let actions = actions("", &[]);
        let titles: Vec<_> = actions.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Insert template: Add two numbers",
                "Insert template: Countdown",
                "Insert template: Maximum of two",
                "Insert template: Multiply two numbers",
            ]
        );
        assert!(actions.iter().all(|a| a.diagnostics.is_none()));
    }

    #[test]
    fn definition_from_reference_and_definition() {
        let analysis = analyze("\tBRA @LOOP\nLOOP\tHLT\n");
        let at = |line, character| {
            definition_at(&analysis, lmclsp::span::Position::new(line, character))
        };
        let expected = Some(lmclsp::span::Range::on_line(1, 0, 4));
        assert_eq!(at(0, 7), expected);
        assert_eq!(at(1, 2), expected);
        assert_eq!(at(0, 2), None);
    }

    #[test]
    fn symbols_distinguish_code_and_data() {
        let text = "LOOP\tLDA X\n\tBRA LOOP\nX\tDAT 0\n";
        let analysis = analyze(text);
        let symbols = label_symbols(&uri(), &analysis, &LineIndex::new(text, UTF32));
        let summary: Vec<_> = symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        assert_eq!(
            summary,
            vec![("LOOP", SymbolKind::FUNCTION), ("X", SymbolKind::VARIABLE)]
        );
    }
}

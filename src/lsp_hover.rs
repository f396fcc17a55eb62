//! Hover support: instruction documentation on mnemonics, definition
//! summaries on labels and label references.

use lmclsp::operand::OperandForm;
use lmclsp::parser::SourceLine;
use lmclsp::Analysis;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;

use crate::tooltip_documentation::instruction_markdown;
use crate::types::LineIndex;
use crate::Backend;

/// Handle hover requests - delegates to `hover_at`
pub async fn handle_hover(backend: &Backend, params: HoverParams) -> Result<Option<Hover>> {
    let _timer = crate::performance::TimingGuard::new(&backend.perf_tracker, "lmc.server.hover");
    backend.perf_tracker.increment("lmc.server.hover.calls", 1);

    let files = backend.files.read().await;
    let Some(file_data) = files.get(&params.text_document_position_params.text_document.uri)
    else {
        return Err(tower_lsp::jsonrpc::Error::invalid_request());
    };
    let content = &file_data.document_data.content;
    let analysis = lmclsp::analyze(content);
    let index = LineIndex::new(content, backend.session.position_encoding());

    Ok(hover_at(
        &analysis,
        &index,
        params.text_document_position_params.position,
    ))
}

fn markdown(value: String, range: tower_lsp::lsp_types::Range) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: Some(range),
    }
}

/// Rebuilt source of a parsed line, for label summaries
fn render_line(line: &SourceLine) -> String {
    let mut rendered = format!(
        "{}\t{}",
        line.label.as_deref().unwrap_or(""),
        line.mnemonic
    );
    if let Some(operand) = &line.operand {
        rendered.push(' ');
        rendered.push_str(operand);
    }
    rendered
}

fn label_summary(analysis: &Analysis, name: &str) -> String {
    match analysis.labels.definition(name) {
        Some(definition) => {
            let line = definition.start.line;
            let mut md = format!("**Label** `{}` defined on line {}", name, line + 1);
            if let Some(source) = analysis.line(line) {
                md.push_str(&format!("\n\n```lmc\n{}\n```", render_line(source)));
            }
            md
        }
        None => format!("**Label** `{}` is not defined", name),
    }
}

pub fn hover_at(analysis: &Analysis, index: &LineIndex, position: Position) -> Option<Hover> {
    let position = index.to_span_position(position);
    let line = analysis.line(position.line)?;

    if let Some(range) = line.label_range() {
        if range.contains(position) {
            let name = line.label.as_deref()?;
            return Some(markdown(label_summary(analysis, name), index.to_lsp_range(range)));
        }
    }

    let mnemonic_range = line.mnemonic_range();
    if mnemonic_range.contains(position) {
        let value = instruction_markdown(&line.mnemonic)
            .unwrap_or_else(|| format!("`{}` is not an LMC instruction", line.mnemonic));
        return Some(markdown(value, index.to_lsp_range(mnemonic_range)));
    }

    let (operand, range) = (line.operand.as_deref()?, line.operand_range()?);
    if !range.contains(position) {
        return None;
    }
    let name = match OperandForm::classify(operand) {
        OperandForm::DirectRef(name) | OperandForm::IndirectRef(name) => name,
        OperandForm::Immediate(value) => {
            return Some(markdown(
                format!("Immediate value `{}`", value),
                index.to_lsp_range(range),
            ))
        }
        OperandForm::NumericLiteral(_) => return None,
    };
    Some(markdown(label_summary(analysis, name), index.to_lsp_range(range)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PositionEncoding;
    use lmclsp::analyze;

    const PROGRAM: &str = "\tLDA COUNT\n\tSTA @PTR\n\tHLT\nCOUNT\tDAT 3\n";

    fn hover_text(text: &str, line: u32, character: u32) -> Option<String> {
        let analysis = analyze(text);
        let index = LineIndex::new(text, PositionEncoding::Utf32);
        hover_at(&analysis, &index, Position::new(line, character)).map(|hover| match hover.contents {
            HoverContents::Markup(content) => content.value,
            _ => String::new(),
        })
    }

    #[test]
    fn hover_on_mnemonic_shows_documentation() {
        let text = hover_text(PROGRAM, 0, 2).unwrap();
        assert!(text.contains("Load the operand into the accumulator."));
        assert!(text.contains("**Category:** Memory"));
    }

    #[test]
    fn hover_on_reference_shows_definition() {
        let text = hover_text(PROGRAM, 0, 6).unwrap();
        assert!(text.contains("`COUNT` defined on line 4"));
        assert!(text.contains("COUNT\tDAT 3"));

        let text = hover_text(PROGRAM, 1, 6).unwrap();
        assert!(text.contains("`PTR` is not defined"));
    }

    #[test]
    fn hover_on_definition_and_whitespace() {
        assert!(hover_text(PROGRAM, 3, 1).unwrap().contains("`COUNT` defined on line 4"));
        assert!(hover_text(PROGRAM, 2, 6).is_none());
        assert!(hover_text("; comment\n", 0, 2).is_none());
    }

    #[test]
    fn hover_range_in_utf16_units() {
        let text = "\tSTA 😀\n";
        let analysis = analyze(text);
        let index = LineIndex::new(text, PositionEncoding::Utf16);
        let hover = hover_at(&analysis, &index, Position::new(0, 6)).unwrap();
        assert_eq!(
            hover.range,
            Some(Range::new(Position::new(0, 5), Position::new(0, 7)))
        );
    }
}

//! # Completion Handler Module
//!
//! Offers the instruction catalog as keyword completions. The list does not
//! depend on the cursor position or on the document content.

use lmclsp::instructions::{INSTRUCTION_DOCS, MNEMONICS};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;

use crate::performance;
use crate::tooltip_documentation::{instruction_markdown, instruction_signature};

/// One keyword item per mnemonic, in catalog order
pub fn instruction_completions() -> Vec<CompletionItem> {
    MNEMONICS
        .iter()
        .enumerate()
        .map(|(index, mnemonic)| CompletionItem {
            label: mnemonic.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            detail: Some(instruction_signature(mnemonic)),
            documentation: instruction_markdown(mnemonic)
                .map(|value| {
                    Documentation::MarkupContent(MarkupContent {
                        kind: MarkupKind::Markdown,
                        value,
                    })
                })
                .or_else(|| {
                    INSTRUCTION_DOCS
                        .get(mnemonic)
                        .map(|doc| Documentation::String(doc.to_string()))
                }),
            sort_text: Some(format!("{:02}", index)),
            ..Default::default()
        })
        .collect()
}

/// Main completion handler function that processes completion requests
pub async fn handle_completion(
    backend: &crate::Backend,
    params: CompletionParams,
) -> Result<Option<CompletionResponse>> {
    let _timer = performance::TimingGuard::new(&backend.perf_tracker, "lmc.server.completion");
    backend.perf_tracker.increment("lmc.server.completion.calls", 1);

    let uri = params.text_document_position.text_document.uri;
    if !backend.files.read().await.contains_key(&uri) {
        return Err(tower_lsp::jsonrpc::Error::invalid_request());
    }

    Ok(Some(CompletionResponse::Array(instruction_completions())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eleven_keywords_in_catalog_order() {
        let items = instruction_completions();
        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, MNEMONICS.to_vec());
        assert!(items
            .iter()
            .all(|i| i.kind == Some(CompletionItemKind::KEYWORD)));
        assert!(items.iter().all(|i| i.documentation.is_some()));
        assert_eq!(items[0].sort_text.as_deref(), Some("00"));
        assert_eq!(items[10].sort_text.as_deref(), Some("10"));
    }
}

//! LSP Diagnostics Module
//!
//! Runs the analysis for an open document and publishes the result. Results
//! are cached by content hash, truncated to the document's
//! `maxNumberOfProblems`, and dropped when a newer edit arrived meanwhile.

use std::collections::HashSet;

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tower_lsp::lsp_types::{Diagnostic, Url};

use lmclsp::analyze;

use crate::diagnostic_helpers::{diagnostic_identity, to_lsp_diagnostic};
use crate::types::{LineIndex, PositionEncoding};
use crate::Backend;

/// Cache entries kept before half of them are evicted
const DIAGNOSTIC_CACHE_LIMIT: usize = 100;

pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compute diagnostics for a single text buffer.
/// This is a standalone function that doesn't require the Backend.
pub fn compute_diagnostics_for_text(content: &str, encoding: PositionEncoding) -> Vec<Diagnostic> {
    let index = LineIndex::new(content, encoding);
    let mut seen = HashSet::new();
    analyze(content)
        .diagnostics
        .iter()
        .map(|d| to_lsp_diagnostic(d, &index))
        .filter(|d| seen.insert(diagnostic_identity(d)))
        .collect()
}

pub fn store_in_cache(cache: &DashMap<String, Vec<Diagnostic>>, hash: String, diagnostics: Vec<Diagnostic>) {
    if cache.len() >= DIAGNOSTIC_CACHE_LIMIT {
        // simple strategy: clear half when limit reached
        let keys_to_remove: Vec<_> = cache
            .iter()
            .take(DIAGNOSTIC_CACHE_LIMIT / 2)
            .map(|entry| entry.key().clone())
            .collect();
        for key in keys_to_remove {
            cache.remove(&key);
        }
    }
    cache.insert(hash, diagnostics);
}

pub async fn run_diagnostics(backend: &Backend, uri: &Url) {
    let _timer = crate::performance::TimingGuard::new(&backend.perf_tracker, "lmc.server.diagnostics");
    backend.perf_tracker.increment("lmc.server.diagnostics.calls", 1);

    // If diagnostics disabled, clear and bail
    if !*backend.diagnostics_enabled.read().await {
        backend.client.publish_diagnostics(uri.clone(), vec![], None).await;
        return;
    }

    let (content, generation) = {
        let files = backend.files.read().await;
        let Some(file_data) = files.get(uri) else {
            return;
        };
        (
            file_data.document_data.content.clone(),
            file_data.document_data.generation,
        )
    };

    let settings = backend.document_settings(uri).await;
    let hash = content_hash(&content);

    let cached = backend
        .diagnostic_cache
        .get(&hash)
        .map(|entry| entry.value().clone());
    let mut diagnostics = match cached {
        Some(cached) => {
            backend.perf_tracker.increment("lmc.server.diagnostics.cache_hits", 1);
            cached
        }
        None => {
            backend.perf_tracker.increment("lmc.server.diagnostics.cache_misses", 1);
            let computed = {
                let _timer = crate::performance::TimingGuard::new(&backend.perf_tracker, "lmc.server.analyze");
                compute_diagnostics_for_text(&content, backend.session.position_encoding())
            };
            store_in_cache(&backend.diagnostic_cache, hash, computed.clone());
            computed
        }
    };
    diagnostics.truncate(settings.max_number_of_problems);

    // Last write wins: a newer revision publishes its own result
    let version = {
        let mut files = backend.files.write().await;
        let Some(file_data) = files.get_mut(uri) else {
            return;
        };
        if file_data.document_data.generation != generation {
            backend.perf_tracker.increment("lmc.server.diagnostics.superseded", 1);
            return;
        }
        file_data.document_data.version
    };

    backend
        .client
        .publish_diagnostics(uri.to_owned(), diagnostics, version)
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::NumberOrString;

    const UTF32: PositionEncoding = PositionEncoding::Utf32;

    fn codes(diagnostics: &[Diagnostic]) -> Vec<String> {
        diagnostics
            .iter()
            .filter_map(|d| match &d.code {
                Some(NumberOrString::String(code)) => Some(code.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn clean_program_has_no_diagnostics() {
        let program = "\tINP\n\tSTA X\n\tOUT\n\tHLT\nX\tDAT 0\n";
        assert!(compute_diagnostics_for_text(program, UTF32).is_empty());
    }

    #[test]
    fn diagnostics_are_tagged_and_ordered() {
        let program = "A\tDAT 1\nA\tDAT 2\n\tLDA 5\n\tFOO\n\tBRA NOWHERE\n";
        let diagnostics = compute_diagnostics_for_text(program, UTF32);
        assert!(diagnostics.iter().all(|d| d.source.as_deref() == Some("LMC")));
        assert_eq!(
            codes(&diagnostics),
            vec![
                "duplicate-label",
                "numeric-needs-hash",
                "invalid-instruction",
                "missing-operand",
                "undefined-label",
            ]
        );
    }

    #[test]
    fn ranges_follow_client_encoding() {
        let program = "\tSTA 😀\n";
        let utf32 = compute_diagnostics_for_text(program, UTF32);
        let utf16 = compute_diagnostics_for_text(program, PositionEncoding::Utf16);
        assert_eq!(utf32[0].range.end.character, 6);
        assert_eq!(utf16[0].range.end.character, 7);
        assert_eq!(utf32[0].message, utf16[0].message);
    }

    #[test]
    fn cache_evicts_half_at_limit() {
        let cache = DashMap::new();
        for i in 0..DIAGNOSTIC_CACHE_LIMIT {
            store_in_cache(&cache, format!("h{}", i), vec![]);
        }
        assert_eq!(cache.len(), DIAGNOSTIC_CACHE_LIMIT);
        store_in_cache(&cache, "new".to_string(), vec![]);
        assert_eq!(cache.len(), DIAGNOSTIC_CACHE_LIMIT / 2 + 1);
        assert!(cache.contains_key("new"));
    }

    #[test]
    fn hash_depends_on_content() {
        assert_eq!(content_hash("\tHLT\n"), content_hash("\tHLT\n"));
        assert_ne!(content_hash("\tHLT\n"), content_hash("\tHLT"));
        assert_eq!(content_hash("").len(), 64);
    }
}

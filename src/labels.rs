//! Label table construction
//!
//! One forward pass over the parsed lines. The finished table is handed to
//! the validator whole, so a reference may appear before its definition.

use std::collections::HashMap;

use crate::parser::SourceLine;
use crate::span::Range;
use crate::validator::{DiagnosticKind, LmcDiagnostic};

/// Every label defined in a document, keyed by exact (case-sensitive) name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    definitions: HashMap<String, Range>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Range of the first definition of `name`
    pub fn definition(&self, name: &str) -> Option<Range> {
        self.definitions.get(name).copied()
    }

    /// Insert a definition. Returns `false` if the name was already taken,
    /// in which case the first definition is kept.
    pub fn insert(&mut self, name: &str, range: Range) -> bool {
        if self.definitions.contains_key(name) {
            return false;
        }
        self.definitions.insert(name.to_string(), range);
        true
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Label names with their definition ranges, in document order
    pub fn iter_sorted(&self) -> Vec<(&str, Range)> {
        let mut entries: Vec<_> = self
            .definitions
            .iter()
            .map(|(name, range)| (name.as_str(), *range))
            .collect();
        entries.sort_by_key(|(_, range)| range.start);
        entries
    }
}

/// Collect the labels of `lines`, reporting every repeated definition
pub fn build_label_table(lines: &[SourceLine]) -> (LabelTable, Vec<LmcDiagnostic>) {
    let mut table = LabelTable::new();
    let mut diagnostics = Vec::new();

    for line in lines {
        let (Some(label), Some(range)) = (line.label.as_deref(), line.label_range()) else {
            continue;
        };
        if !table.insert(label, range) {
            diagnostics.push(LmcDiagnostic::new(
                DiagnosticKind::DuplicateLabel,
                range,
                format!("Duplicate label: {}", label),
                label,
            ));
        }
    }

    (table, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    #[test]
    fn duplicates_reported_per_repeat() {
        let lines = parse_document("A DAT 1\nB DAT 2\nA DAT 3\nA DAT 4\n");
        let (table, diagnostics) = build_label_table(&lines);
        assert_eq!(table.len(), 2);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::DuplicateLabel && d.token == "A"));
        assert_eq!(diagnostics[0].range, Range::on_line(2, 0, 1));
        assert_eq!(diagnostics[1].range, Range::on_line(3, 0, 1));
        // first definition wins
        assert_eq!(table.definition("A"), Some(Range::on_line(0, 0, 1)));
    }

    #[test]
    fn names_are_case_sensitive() {
        let lines = parse_document("count DAT 0\nCOUNT DAT 0\n");
        let (table, diagnostics) = build_label_table(&lines);
        assert!(diagnostics.is_empty());
        assert!(table.contains("count"));
        assert!(table.contains("COUNT"));
        assert!(!table.contains("Count"));
    }

    #[test]
    fn iter_sorted_follows_document_order() {
        let lines = parse_document("Z HLT\nM DAT 0\nA DAT 0\n");
        let (table, _) = build_label_table(&lines);
        let names: Vec<_> = table.iter_sorted().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Z", "M", "A"]);
    }
}

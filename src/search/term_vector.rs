//! Per-document term vectors for the `content` field.
//!
//! Tantivy keeps positions in its postings but not byte offsets, so the term
//! vector is rebuilt from the stored text with the analyzer that indexed it.
//! That makes it identical, run after run, to what was indexed.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::search::analyzer::Analyzer;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TermStats {
    pub freq: u32,
    pub positions: Vec<usize>,
    /// Byte offsets `(start, end)` into the source text.
    pub offsets: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TermVector {
    terms: BTreeMap<String, TermStats>,
}

impl TermVector {
    pub fn from_text(analyzer: &Analyzer, text: &str) -> Self {
        let mut terms: BTreeMap<String, TermStats> = BTreeMap::new();
        for token in analyzer.tokens(text) {
            let stats = terms.entry(token.text).or_default();
            stats.freq += 1;
            stats.positions.push(token.position);
            stats.offsets.push((token.offset_from, token.offset_to));
        }
        Self { terms }
    }

    pub fn get(&self, term: &str) -> Option<&TermStats> {
        self.terms.get(term)
    }

    pub fn freq(&self, term: &str) -> u32 {
        self.get(term).map(|s| s.freq).unwrap_or(0)
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in byte order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TermStats)> {
        self.terms.iter().map(|(term, stats)| (term.as_str(), stats))
    }
}

//! Ranking strategies.
//!
//! A [`Ranker`] decides which documents make the top `limit` and in what
//! order. Result materialization in the searcher only sees `(score, address)`
//! pairs, so swapping the ranker never touches how results are built.

use tantivy::collector::TopDocs;
use tantivy::query::Query;
use tantivy::{DocAddress, DocId, Score, Searcher, SegmentReader};

use crate::search::schema::YEAR_SORT;

pub trait Ranker: Send + Sync {
    fn name(&self) -> &'static str;

    /// Best `limit` matches of `query`, highest score first. `limit` is at least 1.
    fn top_docs(
        &self,
        searcher: &Searcher,
        query: &dyn Query,
        limit: usize,
    ) -> tantivy::Result<Vec<(Score, DocAddress)>>;
}

/// Tantivy's BM25 scoring, unmodified.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bm25Ranker;

impl Ranker for Bm25Ranker {
    fn name(&self) -> &'static str {
        "bm25"
    }

    fn top_docs(
        &self,
        searcher: &Searcher,
        query: &dyn Query,
        limit: usize,
    ) -> tantivy::Result<Vec<(Score, DocAddress)>> {
        searcher.search(query, &TopDocs::with_limit(limit))
    }
}

/// BM25 boosted towards recent papers.
///
/// The score is multiplied by `1 + weight / (1 + age)` where `age` is the
/// number of years between the paper and `latest_year`, floored at zero.
#[derive(Debug, Clone, Copy)]
pub struct RecencyRanker {
    pub latest_year: i64,
    pub weight: f32,
}

impl RecencyRanker {
    pub fn new(latest_year: i64, weight: f32) -> Self {
        Self {
            latest_year,
            weight,
        }
    }

    pub fn boost(&self, year: Option<i64>) -> Score {
        match year {
            Some(year) => {
                let age = (self.latest_year - year).max(0) as f32;
                1.0 + self.weight / (1.0 + age)
            }
            None => 1.0,
        }
    }
}

impl Ranker for RecencyRanker {
    fn name(&self) -> &'static str {
        "recency"
    }

    fn top_docs(
        &self,
        searcher: &Searcher,
        query: &dyn Query,
        limit: usize,
    ) -> tantivy::Result<Vec<(Score, DocAddress)>> {
        let ranker = *self;
        let collector =
            TopDocs::with_limit(limit).tweak_score(move |segment_reader: &SegmentReader| {
                let years = segment_reader.fast_fields().i64(YEAR_SORT).ok();
                move |doc: DocId, score: Score| {
                    let year = years.as_ref().and_then(|column| column.first(doc));
                    score * ranker.boost(year)
                }
            });
        searcher.search(query, &collector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recency_boost_decays_with_age() {
        let ranker = RecencyRanker::new(2017, 1.0);
        assert_eq!(ranker.boost(Some(2017)), 2.0);
        assert_eq!(ranker.boost(Some(2016)), 1.5);
        assert!(ranker.boost(Some(2000)) < ranker.boost(Some(2010)));
    }

    #[test]
    fn test_recency_boost_neutral_cases() {
        let ranker = RecencyRanker::new(2017, 1.0);
        assert_eq!(ranker.boost(None), 1.0);
        // Papers newer than the reference year get the full boost, not more
        assert_eq!(ranker.boost(Some(2020)), 2.0);
        assert_eq!(RecencyRanker::new(2017, 0.0).boost(Some(1990)), 1.0);
    }
}

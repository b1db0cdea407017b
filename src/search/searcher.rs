//! Read-only search over a committed paper index.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tantivy::collector::{DocSetCollector, TopDocs};
use tantivy::query::{Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{
    DocAddress, IndexReader, Order, ReloadPolicy, Score, Searcher, TantivyDocument, Term,
};
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::search::index::open_committed;
use crate::search::query::{PaperQuery, QueryBuilder};
use crate::search::ranking::{Bm25Ranker, Ranker};
use crate::search::schema::{PaperSchema, PAPER_ID_SORT, PAPER_TITLE_SORT, YEAR_SORT};
use crate::search::term_vector::TermVector;

/// Shapes of result the searcher knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Papers,
}

impl FromStr for ResultKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "papers" => Ok(ResultKind::Papers),
            other => Err(Error::UnsupportedResultType(other.to_string())),
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultKind::Papers => write!(f, "papers"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub paper_id: i64,
    pub title: String,
    pub year: i64,
    pub authors: Vec<String>,
    pub event_type: String,
    pub pdf_name: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Relevance score; zero for results ordered by a sort field.
    pub score: Score,
}

/// Doc-value fields results can be ordered by instead of relevance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Year,
    PaperId,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// A snapshot of the committed index.
///
/// The snapshot is pinned when the searcher is opened; later commits are only
/// visible through [`PaperSearcher::reopen`]. Equal scores come back in
/// tantivy's internal document order, which carries no meaning.
pub struct PaperSearcher {
    config: SearchConfig,
    schema: PaperSchema,
    searcher: Searcher,
    queries: QueryBuilder,
    ranker: Arc<dyn Ranker>,
}

impl PaperSearcher {
    pub fn open(config: &SearchConfig) -> Result<Self> {
        let (index, schema) = open_committed(&config.index_dir, config.analyzer)?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e: tantivy::TantivyError| Error::index_io(&config.index_dir, e))?;
        let searcher = reader.searcher();

        info!(
            "Opened index at {:?} ({} documents)",
            config.index_dir,
            searcher.num_docs()
        );

        Ok(Self {
            config: config.clone(),
            queries: QueryBuilder::new(&schema),
            schema,
            searcher,
            ranker: Arc::new(Bm25Ranker),
        })
    }

    pub fn with_ranker(mut self, ranker: Arc<dyn Ranker>) -> Self {
        self.ranker = ranker;
        self
    }

    /// A fresh searcher over whatever is committed now, keeping this one's ranker.
    pub fn reopen(&self) -> Result<Self> {
        Ok(Self::open(&self.config)?.with_ranker(self.ranker.clone()))
    }

    /// Query builder sharing the analyzer this index was built with.
    pub fn query_builder(&self) -> &QueryBuilder {
        &self.queries
    }

    pub fn num_docs(&self) -> u64 {
        self.searcher.num_docs()
    }

    /// Top `limit` papers for `query`, best first.
    pub fn search(&self, query: &PaperQuery, limit: usize) -> Result<Vec<SearchResult>> {
        if limit == 0 || query.is_match_none() {
            return Ok(Vec::new());
        }

        let compiled = query.to_tantivy(&self.schema.fields);
        debug!("Running {:?} with ranker {}", query, self.ranker.name());

        let top_docs = self.ranker.top_docs(&self.searcher, &*compiled, limit)?;
        debug!("{} matching documents", top_docs.len());

        top_docs
            .into_iter()
            .map(|(score, address)| self.materialize(address, score))
            .collect()
    }

    pub fn search_str(&self, raw: &str, limit: usize) -> Result<Vec<SearchResult>> {
        self.search(&self.queries.build(raw), limit)
    }

    /// Results of the requested kind for a raw query, capped at the configured limit.
    ///
    /// An unknown `result_type` logs a diagnostic and yields no results.
    pub fn results(&self, raw: &str, result_type: &str) -> Result<Vec<SearchResult>> {
        match result_type.parse::<ResultKind>() {
            Ok(kind) => self.results_for(raw, kind),
            Err(e) => {
                warn!("{}", e);
                Ok(Vec::new())
            }
        }
    }

    pub fn results_for(&self, raw: &str, kind: ResultKind) -> Result<Vec<SearchResult>> {
        info!("Searching for: {}", raw);
        match kind {
            ResultKind::Papers => self.search_str(raw, self.config.result_limit),
        }
    }

    /// Matches of `query` ordered by a doc-value field rather than by score.
    ///
    /// Equal titles fall back to paper id.
    pub fn search_sorted(
        &self,
        query: &PaperQuery,
        limit: usize,
        key: SortKey,
        order: SortOrder,
    ) -> Result<Vec<SearchResult>> {
        if limit == 0 || query.is_match_none() {
            return Ok(Vec::new());
        }

        let compiled = query.to_tantivy(&self.schema.fields);
        let field = match key {
            SortKey::Year => YEAR_SORT,
            SortKey::PaperId => PAPER_ID_SORT,
            SortKey::Title => return self.search_by_title(&*compiled, limit, order),
        };

        let collector = TopDocs::with_limit(limit).order_by_fast_field::<i64>(field, order.into());
        self.searcher
            .search(&*compiled, &collector)?
            .into_iter()
            .map(|(_, address)| self.materialize(address, 0.0))
            .collect()
    }

    /// Term ordinals of `paper_title_sort` are only comparable within one
    /// segment, so every match's title is resolved to its bytes before sorting.
    fn search_by_title(
        &self,
        query: &dyn Query,
        limit: usize,
        order: SortOrder,
    ) -> Result<Vec<SearchResult>> {
        let mut addresses: Vec<DocAddress> =
            self.searcher.search(query, &DocSetCollector)?.into_iter().collect();
        addresses.sort_unstable();

        let mut keyed: Vec<(String, i64, DocAddress)> = Vec::with_capacity(addresses.len());
        for segment in addresses.chunk_by(|a, b| a.segment_ord == b.segment_ord) {
            let fast_fields = self
                .searcher
                .segment_reader(segment[0].segment_ord)
                .fast_fields();
            let titles = fast_fields.str(PAPER_TITLE_SORT)?;
            let ids = fast_fields.i64(PAPER_ID_SORT)?;

            for address in segment {
                let mut title = String::new();
                if let Some(column) = titles.as_ref() {
                    if let Some(ord) = column.term_ords(address.doc_id).next() {
                        column
                            .ord_to_str(ord, &mut title)
                            .map_err(tantivy::TantivyError::from)?;
                    }
                }
                let paper_id = ids.first(address.doc_id).unwrap_or_default();
                keyed.push((title, paper_id, *address));
            }
        }

        keyed.sort_unstable();
        if order == SortOrder::Desc {
            keyed.reverse();
        }
        keyed
            .into_iter()
            .take(limit)
            .map(|(_, _, address)| self.materialize(address, 0.0))
            .collect()
    }

    /// Term vector of a paper's `content` field, if the paper is indexed.
    pub fn term_vector(&self, paper_id: i64) -> Result<Option<TermVector>> {
        let query = TermQuery::new(
            Term::from_field_i64(self.schema.fields.paper_id_int, paper_id),
            IndexRecordOption::Basic,
        );
        let hits = self.searcher.search(&query, &TopDocs::with_limit(1))?;
        let Some((_, address)) = hits.into_iter().next() else {
            return Ok(None);
        };

        let doc: TantivyDocument = self.searcher.doc(address)?;
        let content = first_text(&doc, self.schema.fields.content);
        Ok(Some(TermVector::from_text(&self.schema.analyzer, &content)))
    }

    fn materialize(&self, address: DocAddress, score: Score) -> Result<SearchResult> {
        let doc: TantivyDocument = self.searcher.doc(address)?;
        let f = &self.schema.fields;

        let authors = doc
            .get_all(f.author)
            .filter_map(|value| value.as_str())
            .map(str::to_string)
            .collect();

        Ok(SearchResult {
            paper_id: first_text(&doc, f.paper_id_store).parse().unwrap_or_default(),
            title: first_text(&doc, f.title),
            year: doc
                .get_first(f.year_store)
                .and_then(|value| value.as_i64())
                .unwrap_or_default(),
            authors,
            event_type: first_text(&doc, f.event_type),
            pdf_name: first_text(&doc, f.pdf_name),
            abstract_text: first_text(&doc, f.abstract_field),
            score,
        })
    }
}

fn first_text(doc: &TantivyDocument, field: Field) -> String {
    doc.get_first(field)
        .and_then(|value| value.as_str())
        .unwrap_or_default()
        .to_string()
}

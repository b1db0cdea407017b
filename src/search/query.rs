//! Query tree and query-string parsing for papers.
//!
//! Raw query strings are turned into a [`PaperQuery`] by [`QueryBuilder`],
//! then compiled into a tantivy query with [`PaperQuery::to_tantivy`].
//!
//! Query syntax, all of it optional:
//!
//! - bare words match `content` and are ORed together
//! - `"some phrase"` matches the words in sequence
//! - `title:`, `abstract:`, `author:`, `event:`, `pdf:`, `text:`, `id:` and
//!   `content:` scope a word or phrase to one field
//! - `year:2015..2016`, `year:2015..`, `paper:12`, `author_id:7` filter on numbers
//! - a leading `-` excludes a word, phrase or range

use std::ops::{Bound, RangeInclusive};
use std::sync::OnceLock;

use regex::Regex;
use tantivy::query::{
    AllQuery, BooleanQuery, EmptyQuery, Occur, PhraseQuery, Query, RangeQuery, TermQuery,
};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::Term;

use crate::search::analyzer::Analyzer;
use crate::search::schema::{PaperFields, PaperSchema, AUTHOR_ID_INT, PAPER_ID_INT, YEAR_INT};

/// Analyzed text fields a clause can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextField {
    #[default]
    Content,
    Title,
    EventType,
    PdfName,
    Abstract,
    PaperText,
    Author,
    AuthorId,
    PaperId,
}

impl TextField {
    pub fn field(self, fields: &PaperFields) -> Field {
        match self {
            TextField::Content => fields.content,
            TextField::Title => fields.title,
            TextField::EventType => fields.event_type,
            TextField::PdfName => fields.pdf_name,
            TextField::Abstract => fields.abstract_field,
            TextField::PaperText => fields.paper_text,
            TextField::Author => fields.author,
            TextField::AuthorId => fields.author_id,
            TextField::PaperId => fields.paper_id_store,
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "content" => Some(TextField::Content),
            "title" => Some(TextField::Title),
            "event" => Some(TextField::EventType),
            "pdf" => Some(TextField::PdfName),
            "abstract" => Some(TextField::Abstract),
            "text" => Some(TextField::PaperText),
            "author" => Some(TextField::Author),
            "id" => Some(TextField::PaperId),
            _ => None,
        }
    }
}

/// Integer fields that accept exact and range filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    Year,
    PaperId,
    AuthorId,
}

impl NumericField {
    pub fn field_name(self) -> &'static str {
        match self {
            NumericField::Year => YEAR_INT,
            NumericField::PaperId => PAPER_ID_INT,
            NumericField::AuthorId => AUTHOR_ID_INT,
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "year" => Some(NumericField::Year),
            "paper" => Some(NumericField::PaperId),
            "author_id" => Some(NumericField::AuthorId),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaperQuery {
    /// Matches no document.
    MatchNone,
    /// One already-analyzed term.
    Term { field: TextField, term: String },
    /// Already-analyzed terms, each at its position relative to the first.
    ///
    /// Gaps are kept where the analyzer dropped a stop word, since the index
    /// keeps those positions too.
    Phrase {
        field: TextField,
        terms: Vec<(usize, String)>,
    },
    Range {
        field: NumericField,
        lower: Bound<i64>,
        upper: Bound<i64>,
    },
    And(Vec<PaperQuery>),
    /// At least one clause must match. `Not` children exclude from the union
    /// rather than adding their complement to it.
    Or(Vec<PaperQuery>),
    /// Inside `And` or `Or`, excludes matches of the inner query. Standing alone
    /// it matches every document except those.
    Not(Box<PaperQuery>),
}

impl PaperQuery {
    pub fn term(field: TextField, term: impl Into<String>) -> Self {
        PaperQuery::Term {
            field,
            term: term.into(),
        }
    }

    /// Terms that must appear consecutively.
    pub fn phrase<S: Into<String>>(field: TextField, terms: impl IntoIterator<Item = S>) -> Self {
        PaperQuery::Phrase {
            field,
            terms: terms.into_iter().map(Into::into).enumerate().collect(),
        }
    }

    /// Terms at explicit positions, e.g. `[(0, "geometry"), (3, "loss")]`.
    pub fn phrase_with_offsets<S: Into<String>>(
        field: TextField,
        terms: impl IntoIterator<Item = (usize, S)>,
    ) -> Self {
        PaperQuery::Phrase {
            field,
            terms: terms
                .into_iter()
                .map(|(offset, term)| (offset, term.into()))
                .collect(),
        }
    }

    /// Inclusive range on an integer field.
    pub fn int_range(field: NumericField, range: RangeInclusive<i64>) -> Self {
        PaperQuery::Range {
            field,
            lower: Bound::Included(*range.start()),
            upper: Bound::Included(*range.end()),
        }
    }

    pub fn and(clauses: Vec<PaperQuery>) -> Self {
        PaperQuery::And(clauses)
    }

    pub fn or(clauses: Vec<PaperQuery>) -> Self {
        PaperQuery::Or(clauses)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(clause: PaperQuery) -> Self {
        PaperQuery::Not(Box::new(clause))
    }

    pub fn is_match_none(&self) -> bool {
        matches!(self, PaperQuery::MatchNone)
    }

    /// Compile into a tantivy query over the given fields.
    pub fn to_tantivy(&self, fields: &PaperFields) -> Box<dyn Query> {
        match self {
            PaperQuery::MatchNone => Box::new(EmptyQuery),
            PaperQuery::Term { field, term } => term_query(field.field(fields), term),
            PaperQuery::Phrase { field, terms } => {
                let field = field.field(fields);
                match terms.as_slice() {
                    [] => Box::new(EmptyQuery),
                    [(_, single)] => term_query(field, single),
                    _ => Box::new(PhraseQuery::new_with_offset(
                        terms
                            .iter()
                            .map(|(offset, t)| (*offset, Term::from_field_text(field, t)))
                            .collect(),
                    )),
                }
            }
            PaperQuery::Range {
                field,
                lower,
                upper,
            } => Box::new(RangeQuery::new_i64_bounds(
                field.field_name().to_string(),
                *lower,
                *upper,
            )),
            PaperQuery::And(clauses) if clauses.is_empty() => Box::new(EmptyQuery),
            PaperQuery::And(clauses) => Box::new(BooleanQuery::new(
                clauses
                    .iter()
                    .map(|clause| match clause {
                        PaperQuery::Not(inner) => (Occur::MustNot, inner.to_tantivy(fields)),
                        other => (Occur::Must, other.to_tantivy(fields)),
                    })
                    .collect(),
            )),
            PaperQuery::Or(clauses) if clauses.is_empty() => Box::new(EmptyQuery),
            PaperQuery::Or(clauses) => Box::new(BooleanQuery::new(
                clauses
                    .iter()
                    .map(|clause| match clause {
                        PaperQuery::Not(inner) => (Occur::MustNot, inner.to_tantivy(fields)),
                        other => (Occur::Should, other.to_tantivy(fields)),
                    })
                    .collect(),
            )),
            PaperQuery::Not(inner) => Box::new(BooleanQuery::new(vec![
                (Occur::Must, Box::new(AllQuery) as Box<dyn Query>),
                (Occur::MustNot, inner.to_tantivy(fields)),
            ])),
        }
    }
}

fn term_query(field: Field, text: &str) -> Box<dyn Query> {
    Box::new(TermQuery::new(
        Term::from_field_text(field, text),
        IndexRecordOption::WithFreqs,
    ))
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?P<neg>-)?(?:(?P<field>[A-Za-z_]+):)?(?:"(?P<phrase>[^"]*)"|(?P<word>\S+))"#)
            .expect("token pattern is valid")
    })
}

/// Parse `2015`, `2015..2016`, `2015..` or `..2016`.
fn parse_int_range(raw: &str) -> Option<(Bound<i64>, Bound<i64>)> {
    let bound = |s: &str| -> Option<Bound<i64>> {
        if s.is_empty() {
            Some(Bound::Unbounded)
        } else {
            s.parse().ok().map(Bound::Included)
        }
    };

    match raw.split_once("..") {
        Some((lo, hi)) => {
            let (lower, upper) = (bound(lo)?, bound(hi)?);
            if matches!((lower, upper), (Bound::Unbounded, Bound::Unbounded)) {
                None
            } else {
                Some((lower, upper))
            }
        }
        None => {
            let value: i64 = raw.parse().ok()?;
            Some((Bound::Included(value), Bound::Included(value)))
        }
    }
}

/// Turns raw query strings into [`PaperQuery`] trees using the index's analyzer.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    analyzer: Analyzer,
}

impl QueryBuilder {
    pub fn new(schema: &PaperSchema) -> Self {
        Self {
            analyzer: schema.analyzer.clone(),
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Parse `raw` into a query. Empty or whitespace-only input yields [`PaperQuery::MatchNone`].
    pub fn build(&self, raw: &str) -> PaperQuery {
        let mut positives = Vec::new();
        let mut negatives = Vec::new();
        let mut filters = Vec::new();

        for caps in token_pattern().captures_iter(raw) {
            let negated = caps.name("neg").is_some();
            let prefix = caps.name("field").map(|m| m.as_str());
            let phrase = caps.name("phrase").map(|m| m.as_str());
            let word = caps.name("word").map(|m| m.as_str());

            // Numeric filters
            if let (Some(numeric), Some(value)) = (prefix.and_then(NumericField::from_prefix), word)
            {
                if let Some((lower, upper)) = parse_int_range(value) {
                    let range = PaperQuery::Range {
                        field: numeric,
                        lower,
                        upper,
                    };
                    if negated {
                        negatives.push(PaperQuery::not(range));
                    } else {
                        filters.push(range);
                    }
                    continue;
                }
            }

            let (field, text) = match prefix.map(|p| (p, TextField::from_prefix(p))) {
                Some((_, Some(field))) => (field, phrase.or(word).unwrap_or_default().to_string()),
                // Unknown prefixes are ordinary text, e.g. `ratio:1`
                Some((p, None)) => (
                    TextField::Content,
                    match phrase {
                        Some(ph) => format!("{}: {}", p, ph),
                        None => format!("{}:{}", p, word.unwrap_or_default()),
                    },
                ),
                None => (TextField::Content, phrase.or(word).unwrap_or_default().to_string()),
            };

            let tokens = self.analyzer.tokens(&text);
            let Some(first) = tokens.first().map(|t| t.position) else {
                continue;
            };

            // A negated word the analyzer splits, e.g. `-state-of-the-art`,
            // excludes the compound rather than each fragment.
            let clauses: Vec<PaperQuery> = if tokens.len() > 1 && (phrase.is_some() || negated) {
                vec![PaperQuery::phrase_with_offsets(
                    field,
                    tokens.into_iter().map(|t| (t.position - first, t.text)),
                )]
            } else {
                tokens
                    .into_iter()
                    .map(|t| PaperQuery::term(field, t.text))
                    .collect()
            };

            if negated {
                negatives.extend(clauses.into_iter().map(PaperQuery::not));
            } else {
                positives.extend(clauses);
            }
        }

        if positives.is_empty() && filters.is_empty() {
            return PaperQuery::MatchNone;
        }

        let mut required = Vec::new();
        match positives.len() {
            0 => {}
            1 => required.extend(positives),
            _ => required.push(PaperQuery::Or(positives)),
        }
        required.extend(filters);

        if negatives.is_empty() && required.len() == 1 {
            return required.remove(0);
        }
        required.extend(negatives);
        PaperQuery::And(required)
    }
}

//! Text analysis shared by indexing and querying.
//!
//! The same [`Analyzer`] must tokenize documents and queries, otherwise terms
//! never line up. It is registered on the index under [`AnalyzerKind::tokenizer_name`]
//! and the query builder calls [`Analyzer::analyze`] on the very same value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tantivy::tokenizer::{
    LowerCaser, RemoveLongFilter, SimpleTokenizer, StopWordFilter, TextAnalyzer, Token,
    TokenStream, WhitespaceTokenizer,
};
use tantivy::Index;

use crate::error::Error;

/// Tokens longer than this are dropped (mostly base64 blobs and URLs in paper text).
const MAX_TOKEN_LEN: usize = 40;

/// English stop words removed by [`AnalyzerKind::Standard`].
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    /// Split on whitespace only, keeping punctuation such as `?` attached to terms.
    #[default]
    Whitespace,
    /// Split on non-alphanumerics and drop English stop words.
    Standard,
}

impl AnalyzerKind {
    pub fn tokenizer_name(self) -> &'static str {
        match self {
            AnalyzerKind::Whitespace => "paper_whitespace",
            AnalyzerKind::Standard => "paper_standard",
        }
    }

    pub fn from_tokenizer_name(name: &str) -> Option<Self> {
        [AnalyzerKind::Whitespace, AnalyzerKind::Standard]
            .into_iter()
            .find(|kind| kind.tokenizer_name() == name)
    }
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzerKind::Whitespace => write!(f, "whitespace"),
            AnalyzerKind::Standard => write!(f, "standard"),
        }
    }
}

impl FromStr for AnalyzerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whitespace" => Ok(AnalyzerKind::Whitespace),
            "standard" => Ok(AnalyzerKind::Standard),
            other => Err(Error::Config(format!(
                "unknown analyzer '{}' (expected 'whitespace' or 'standard')",
                other
            ))),
        }
    }
}

/// A configured tantivy text analyzer.
#[derive(Clone)]
pub struct Analyzer {
    kind: AnalyzerKind,
    inner: TextAnalyzer,
}

impl Analyzer {
    pub fn new(kind: AnalyzerKind) -> Self {
        let inner = match kind {
            AnalyzerKind::Whitespace => TextAnalyzer::builder(WhitespaceTokenizer::default())
                .filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
                .filter(LowerCaser)
                .build(),
            AnalyzerKind::Standard => TextAnalyzer::builder(SimpleTokenizer::default())
                .filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
                .filter(LowerCaser)
                .filter(StopWordFilter::remove(
                    ENGLISH_STOP_WORDS.iter().map(|w| w.to_string()),
                ))
                .build(),
        };
        Self { kind, inner }
    }

    pub fn kind(&self) -> AnalyzerKind {
        self.kind
    }

    pub fn tokenizer_name(&self) -> &'static str {
        self.kind.tokenizer_name()
    }

    /// Register this analyzer on an index so text fields can refer to it by name.
    pub fn register(&self, index: &Index) {
        index
            .tokenizers()
            .register(self.tokenizer_name(), self.inner.clone());
    }

    /// Full tokens, including positions and byte offsets into `text`.
    pub fn tokens(&self, text: &str) -> Vec<Token> {
        let mut analyzer = self.inner.clone();
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        stream.process(&mut |token: &Token| tokens.push(token.clone()));
        tokens
    }

    /// Normalized terms only.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        self.tokens(text).into_iter().map(|t| t.text).collect()
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer").field("kind", &self.kind).finish()
    }
}

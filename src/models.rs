//! Paper and author records.
//!
//! [`PaperRecord`] is the loose shape delivered by the upstream store (ids and
//! years may arrive as numbers or strings, text columns may be missing).
//! [`Paper`] is the validated form the index is built from.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An integer column that may have been exported as text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum IntField {
    Int(i64),
    Text(String),
}

impl IntField {
    fn parse(&self) -> Option<i64> {
        match self {
            IntField::Int(v) => Some(*v),
            IntField::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for IntField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntField::Int(v) => write!(f, "{}", v),
            IntField::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for IntField {
    fn from(v: i64) -> Self {
        IntField::Int(v)
    }
}

impl From<&str> for IntField {
    fn from(s: &str) -> Self {
        IntField::Text(s.to_string())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthorRecord {
    pub id: IntField,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PaperRecord {
    pub id: IntField,
    pub title: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub pdf_name: Option<String>,
    #[serde(default)]
    pub r#abstract: Option<String>,
    pub paper_text: Option<String>,
    pub year: IntField,
    #[serde(default)]
    pub authors: Vec<AuthorRecord>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Paper {
    pub id: i64,
    pub title: String,
    pub event_type: String,
    pub pdf_name: String,
    pub abstract_text: String,
    pub paper_text: String,
    pub year: i64,
    pub authors: Vec<Author>,
}

impl TryFrom<&PaperRecord> for Paper {
    type Error = Error;

    fn try_from(record: &PaperRecord) -> Result<Self> {
        let id = record
            .id
            .parse()
            .ok_or_else(|| Error::validation(&record.id, "paper id is not an integer"))?;
        let year = record.year.parse().ok_or_else(|| {
            Error::validation(id, format!("year '{}' is not an integer", record.year))
        })?;
        let title = record
            .title
            .clone()
            .ok_or_else(|| Error::validation(id, "title is missing"))?;
        let paper_text = record
            .paper_text
            .clone()
            .ok_or_else(|| Error::validation(id, "paper_text is missing"))?;

        let authors = record
            .authors
            .iter()
            .map(|author| -> Result<Author> {
                let author_id = author.id.parse().ok_or_else(|| {
                    Error::validation(
                        id,
                        format!("author id '{}' of '{}' is not an integer", author.id, author.name),
                    )
                })?;
                Ok(Author {
                    id: author_id,
                    name: author.name.clone(),
                })
            })
            .collect::<Result<Vec<Author>>>()?;

        Ok(Paper {
            id,
            title,
            event_type: record.event_type.clone().unwrap_or_default(),
            pdf_name: record.pdf_name.clone().unwrap_or_default(),
            abstract_text: record.r#abstract.clone().unwrap_or_default(),
            paper_text,
            year,
            authors,
        })
    }
}

impl From<&Paper> for PaperRecord {
    fn from(paper: &Paper) -> Self {
        PaperRecord {
            id: paper.id.into(),
            title: Some(paper.title.clone()),
            event_type: Some(paper.event_type.clone()),
            pdf_name: Some(paper.pdf_name.clone()),
            r#abstract: Some(paper.abstract_text.clone()),
            paper_text: Some(paper.paper_text.clone()),
            year: paper.year.into(),
            authors: paper
                .authors
                .iter()
                .map(|a| AuthorRecord {
                    id: a.id.into(),
                    name: a.name.clone(),
                })
                .collect(),
        }
    }
}

/// Load a mapping of paper id to record from a `.json`, `.yaml` or `.yml` file.
///
/// The mapping is ordered by key so that repeated builds see papers in the same order.
pub fn load_papers(path: &Path) -> Result<BTreeMap<String, PaperRecord>> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::input(path, e))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&raw).map_err(|e| Error::input(path, e)),
        _ => serde_json::from_str(&raw).map_err(|e| Error::input(path, e)),
    }
}

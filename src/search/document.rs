//! Conversion of paper records into index documents.

use tantivy::schema::{Field, Value};
use tantivy::TantivyDocument;

use crate::error::Result;
use crate::models::{Paper, PaperRecord};
use crate::search::schema::{PaperFields, PaperSchema};

/// Build the `content` text: title, event type, pdf name, abstract, paper text,
/// year and every author name, joined by single spaces in that order.
pub fn compose_content(paper: &Paper) -> String {
    let year = paper.year.to_string();
    let mut parts: Vec<&str> = vec![
        paper.title.as_str(),
        paper.event_type.as_str(),
        paper.pdf_name.as_str(),
        paper.abstract_text.as_str(),
        paper.paper_text.as_str(),
        year.as_str(),
    ];
    parts.extend(paper.authors.iter().map(|a| a.name.as_str()));
    parts.join(" ")
}

/// A paper ready to be handed to the index writer.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub paper_id: i64,
    content: String,
    document: TantivyDocument,
}

impl IndexedDocument {
    pub fn content(&self) -> &str {
        &self.content
    }

    /// All text values of `field`, in the order they were added.
    pub fn texts(&self, field: Field) -> Vec<&str> {
        self.document
            .get_all(field)
            .filter_map(|value| value.as_str())
            .collect()
    }

    /// All integer values of `field`, in the order they were added.
    pub fn ints(&self, field: Field) -> Vec<i64> {
        self.document
            .get_all(field)
            .filter_map(|value| value.as_i64())
            .collect()
    }

    pub fn into_document(self) -> TantivyDocument {
        self.document
    }
}

#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    fields: PaperFields,
}

impl DocumentBuilder {
    pub fn new(schema: &PaperSchema) -> Self {
        Self {
            fields: schema.fields,
        }
    }

    /// Validate a record and convert it to an [`IndexedDocument`].
    pub fn build(&self, record: &PaperRecord) -> Result<IndexedDocument> {
        let paper = Paper::try_from(record)?;
        Ok(self.build_paper(&paper))
    }

    pub fn build_paper(&self, paper: &Paper) -> IndexedDocument {
        let f = &self.fields;
        let mut doc = TantivyDocument::new();

        // Stored id and year, plus integer copies for exact and range queries
        doc.add_text(f.paper_id_store, paper.id.to_string());
        doc.add_i64(f.year_store, paper.year);
        doc.add_i64(f.year_int, paper.year);
        doc.add_i64(f.paper_id_int, paper.id);

        doc.add_text(f.title, &paper.title);
        doc.add_text(f.event_type, &paper.event_type);
        doc.add_text(f.pdf_name, &paper.pdf_name);
        doc.add_text(f.abstract_field, &paper.abstract_text);
        doc.add_text(f.paper_text, &paper.paper_text);

        doc.add_text(f.title_sort, &paper.title);
        doc.add_i64(f.paper_id_sort, paper.id);
        doc.add_i64(f.year_sort, paper.year);

        for author in &paper.authors {
            doc.add_text(f.author, &author.name);
            doc.add_text(f.author_id, author.id.to_string());
            doc.add_i64(f.author_id_int, author.id);
        }

        let content = compose_content(paper);
        doc.add_text(f.content, &content);

        IndexedDocument {
            paper_id: paper.id,
            content,
            document: doc,
        }
    }
}

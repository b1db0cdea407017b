//! Tantivy schema definition for papers.

use tantivy::schema::{
    Field, FieldType, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED,
    STORED, STRING,
};

use crate::search::analyzer::{Analyzer, AnalyzerKind};

pub const PAPER_ID_STORE: &str = "paper_id_store";
pub const YEAR_STORE: &str = "year_store";
pub const YEAR_INT: &str = "year_int";
pub const PAPER_ID_INT: &str = "paper_id_int";
pub const PAPER_TITLE: &str = "paper_title";
pub const EVENT_TYPE: &str = "event_type";
pub const PDF_NAME: &str = "pdf_name";
pub const ABSTRACT: &str = "abstract";
pub const PAPER_TEXT: &str = "paper_text";
pub const PAPER_TITLE_SORT: &str = "paper_title_sort";
pub const PAPER_ID_SORT: &str = "paper_id";
pub const YEAR_SORT: &str = "year";
pub const AUTHOR: &str = "author";
pub const AUTHOR_ID: &str = "author_id";
pub const AUTHOR_ID_INT: &str = "author_id_int";
pub const CONTENT: &str = "content";

/// Field handles for the paper index
#[derive(Debug, Clone, Copy)]
pub struct PaperFields {
    pub paper_id_store: Field,
    pub year_store: Field,
    pub year_int: Field,
    pub paper_id_int: Field,
    pub title: Field,
    pub event_type: Field,
    pub pdf_name: Field,
    pub abstract_field: Field,
    pub paper_text: Field,
    pub title_sort: Field,
    pub paper_id_sort: Field,
    pub year_sort: Field,
    pub author: Field,
    pub author_id: Field,
    pub author_id_int: Field,
    pub content: Field,
}

impl PaperFields {
    /// Look up every paper field by name in an existing schema.
    pub fn resolve(schema: &Schema) -> tantivy::Result<Self> {
        let get = |name: &str| schema.get_field(name);

        Ok(Self {
            paper_id_store: get(PAPER_ID_STORE)?,
            year_store: get(YEAR_STORE)?,
            year_int: get(YEAR_INT)?,
            paper_id_int: get(PAPER_ID_INT)?,
            title: get(PAPER_TITLE)?,
            event_type: get(EVENT_TYPE)?,
            pdf_name: get(PDF_NAME)?,
            abstract_field: get(ABSTRACT)?,
            paper_text: get(PAPER_TEXT)?,
            title_sort: get(PAPER_TITLE_SORT)?,
            paper_id_sort: get(PAPER_ID_SORT)?,
            year_sort: get(YEAR_SORT)?,
            author: get(AUTHOR)?,
            author_id: get(AUTHOR_ID)?,
            author_id_int: get(AUTHOR_ID_INT)?,
            content: get(CONTENT)?,
        })
    }
}

/// Create the Tantivy schema for papers, with every analyzed field using `analyzer`.
pub fn create_paper_schema(analyzer: AnalyzerKind) -> (Schema, PaperFields) {
    let mut schema_builder = Schema::builder();

    // Full-text searchable and stored for display. Positions are needed for phrase clauses.
    let text_options = TextOptions::default()
        .set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(analyzer.tokenizer_name())
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        )
        .set_stored();

    let paper_id_store = schema_builder.add_text_field(PAPER_ID_STORE, text_options.clone());
    let year_store = schema_builder.add_i64_field(YEAR_STORE, STORED);
    let year_int = schema_builder.add_i64_field(YEAR_INT, INDEXED);
    let paper_id_int = schema_builder.add_i64_field(PAPER_ID_INT, INDEXED);

    let title = schema_builder.add_text_field(PAPER_TITLE, text_options.clone());
    let event_type = schema_builder.add_text_field(EVENT_TYPE, text_options.clone());
    let pdf_name = schema_builder.add_text_field(PDF_NAME, text_options.clone());
    let abstract_field = schema_builder.add_text_field(ABSTRACT, text_options.clone());
    let paper_text = schema_builder.add_text_field(PAPER_TEXT, text_options.clone());

    // Doc values for sorting
    let title_sort = schema_builder.add_text_field(PAPER_TITLE_SORT, STRING | FAST);
    let paper_id_sort = schema_builder.add_i64_field(PAPER_ID_SORT, FAST);
    let year_sort = schema_builder.add_i64_field(YEAR_SORT, FAST);

    // One value per author, in order
    let author = schema_builder.add_text_field(AUTHOR, text_options.clone());
    let author_id = schema_builder.add_text_field(AUTHOR_ID, text_options.clone());
    let author_id_int = schema_builder.add_i64_field(AUTHOR_ID_INT, INDEXED);

    // Concatenation of everything above, the default search target
    let content = schema_builder.add_text_field(CONTENT, text_options);

    let schema = schema_builder.build();

    let fields = PaperFields {
        paper_id_store,
        year_store,
        year_int,
        paper_id_int,
        title,
        event_type,
        pdf_name,
        abstract_field,
        paper_text,
        title_sort,
        paper_id_sort,
        year_sort,
        author,
        author_id,
        author_id_int,
        content,
    };

    (schema, fields)
}

/// Name of the tokenizer the `content` field was indexed with.
pub fn content_tokenizer(schema: &Schema) -> Option<String> {
    let field = schema.get_field(CONTENT).ok()?;
    match schema.get_field_entry(field).field_type() {
        FieldType::Str(options) => options
            .get_indexing_options()
            .map(|indexing| indexing.tokenizer().to_string()),
        _ => None,
    }
}

/// Schema, field handles and the analyzer they were declared with.
///
/// Document and query builders are both constructed from a `PaperSchema`, so
/// they cannot disagree on how text is tokenized.
#[derive(Debug, Clone)]
pub struct PaperSchema {
    pub schema: Schema,
    pub fields: PaperFields,
    pub analyzer: Analyzer,
}

impl PaperSchema {
    pub fn new(kind: AnalyzerKind) -> Self {
        let (schema, fields) = create_paper_schema(kind);
        Self {
            schema,
            fields,
            analyzer: Analyzer::new(kind),
        }
    }
}

use paper_search::search::{
    remove_index, AnalyzerKind, NumericField, PaperIndexWriter, RecencyRanker, SortKey, SortOrder,
    TextField,
};
use paper_search::{
    build_index, AuthorRecord, Error, IntField, PaperQuery, PaperRecord, PaperSearcher,
    SearchConfig,
};
use std::sync::Arc;
use tempfile::TempDir;

fn paper(id: i64, title: &str, year: i64, text: &str, authors: &[(i64, &str)]) -> PaperRecord {
    PaperRecord {
        id: IntField::from(id),
        title: Some(title.to_string()),
        event_type: Some("Poster".to_string()),
        pdf_name: Some(format!("{}-paper.pdf", id)),
        r#abstract: Some("Abstract Missing".to_string()),
        paper_text: Some(text.to_string()),
        year: IntField::from(year),
        authors: authors
            .iter()
            .map(|(id, name)| AuthorRecord {
                id: IntField::from(*id),
                name: name.to_string(),
            })
            .collect(),
    }
}

fn corpus() -> Vec<PaperRecord> {
    vec![
        paper(
            1,
            "Regret of Bandits",
            2015,
            "bandit bandit bandit bandit bandit arms exploration",
            &[(10, "Alice Smith"), (11, "Bob Jones")],
        ),
        paper(
            2,
            "Exploration Methods",
            2016,
            "bandit arms exploration policy gradient methods study",
            &[(12, "Carol White")],
        ),
        paper(
            3,
            "Kernel Methods",
            2010,
            "kernel machines margin support vectors study today",
            &[],
        ),
    ]
}

fn setup() -> (TempDir, SearchConfig) {
    let dir = TempDir::new().unwrap();
    let config = SearchConfig::default().with_index_dir(dir.path().join("index"));
    build_index(&config, corpus().iter()).unwrap();
    (dir, config)
}

fn ids(results: &[paper_search::SearchResult]) -> Vec<i64> {
    results.iter().map(|r| r.paper_id).collect()
}

#[test]
fn stored_fields_come_back_in_results() {
    let (_dir, config) = setup();
    let searcher = PaperSearcher::open(&config).unwrap();
    assert_eq!(searcher.num_docs(), 3);

    let results = searcher.search_str("regret", 10).unwrap();
    assert_eq!(results.len(), 1);

    let hit = &results[0];
    assert_eq!(hit.paper_id, 1);
    assert_eq!(hit.title, "Regret of Bandits");
    assert_eq!(hit.year, 2015);
    assert_eq!(hit.event_type, "Poster");
    assert_eq!(hit.pdf_name, "1-paper.pdf");
    assert_eq!(hit.abstract_text, "Abstract Missing");
    assert_eq!(hit.authors, vec!["Alice Smith", "Bob Jones"]);
    assert!(hit.score > 0.0);
}

#[test]
fn empty_query_returns_nothing() {
    let (_dir, config) = setup();
    let searcher = PaperSearcher::open(&config).unwrap();

    assert!(searcher.search_str("", 10).unwrap().is_empty());
    assert!(searcher.search_str("   ", 10).unwrap().is_empty());
    assert!(searcher.results("", "papers").unwrap().is_empty());
}

#[test]
fn higher_term_frequency_ranks_first() {
    let (_dir, config) = setup();
    let searcher = PaperSearcher::open(&config).unwrap();

    let results = searcher.search_str("bandit", 10).unwrap();
    assert_eq!(ids(&results), vec![1, 2]);
    assert!(results[0].score > results[1].score);
}

#[test]
fn limit_caps_results() {
    let (_dir, config) = setup();
    let searcher = PaperSearcher::open(&config).unwrap();

    assert_eq!(searcher.search_str("study", 1).unwrap().len(), 1);
    assert!(searcher.search_str("study", 0).unwrap().is_empty());
}

#[test]
fn year_range_filters_papers() {
    let (_dir, config) = setup();
    let searcher = PaperSearcher::open(&config).unwrap();

    let mut found = ids(&searcher.search_str("year:2015..2016", 10).unwrap());
    found.sort();
    assert_eq!(found, vec![1, 2]);

    let query = PaperQuery::and(vec![
        PaperQuery::term(TextField::Content, "study"),
        PaperQuery::int_range(NumericField::Year, 2015..=2016),
    ]);
    assert_eq!(ids(&searcher.search(&query, 10).unwrap()), vec![2]);

    assert_eq!(
        ids(&searcher.search_str("year:2010", 10).unwrap()),
        vec![3]
    );
}

#[test]
fn field_scoped_phrase_and_negated_queries() {
    let (_dir, config) = setup();
    let searcher = PaperSearcher::open(&config).unwrap();

    assert_eq!(
        ids(&searcher.search_str("title:kernel", 10).unwrap()),
        vec![3]
    );
    // Titles only carry the plural "bandits"
    assert!(searcher.search_str("title:bandit", 10).unwrap().is_empty());

    assert_eq!(
        ids(&searcher.search_str("author:carol", 10).unwrap()),
        vec![2]
    );
    assert_eq!(
        ids(&searcher.search_str("\"policy gradient\"", 10).unwrap()),
        vec![2]
    );
    assert!(searcher
        .search_str("\"gradient policy\"", 10)
        .unwrap()
        .is_empty());

    assert_eq!(
        ids(&searcher.search_str("bandit -regret", 10).unwrap()),
        vec![2]
    );
    assert_eq!(
        ids(&searcher.search_str("author_id:12", 10).unwrap()),
        vec![2]
    );
}

#[test]
fn unsupported_result_type_is_empty_not_error() {
    let (_dir, config) = setup();
    let searcher = PaperSearcher::open(&config).unwrap();

    assert!(searcher.results("bandit", "authors").unwrap().is_empty());
    assert_eq!(searcher.results("bandit", "papers").unwrap().len(), 2);
}

#[test]
fn sorted_search_orders_by_field() {
    let (_dir, config) = setup();
    let searcher = PaperSearcher::open(&config).unwrap();
    let query = searcher.query_builder().build("study bandit");

    let by_year = searcher
        .search_sorted(&query, 10, SortKey::Year, SortOrder::Desc)
        .unwrap();
    assert_eq!(ids(&by_year), vec![2, 1, 3]);
    assert!(by_year.iter().all(|r| r.score == 0.0));

    let by_id = searcher
        .search_sorted(&query, 10, SortKey::PaperId, SortOrder::Asc)
        .unwrap();
    assert_eq!(ids(&by_id), vec![1, 2, 3]);

    let by_title = searcher
        .search_sorted(&query, 10, SortKey::Title, SortOrder::Asc)
        .unwrap();
    assert_eq!(ids(&by_title), vec![2, 3, 1]);
}

#[test]
fn title_order_holds_across_segments() {
    let dir = TempDir::new().unwrap();
    let mut config = SearchConfig::default().with_index_dir(dir.path().join("index"));
    config.writer_threads = 2;

    let titles = ["Delta", "alpha", "Charlie", "Bravo", "Echo", "Alpha"];
    let papers: Vec<PaperRecord> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| paper(i as i64 + 1, title, 2017, "shared words", &[]))
        .collect();
    build_index(&config, papers.iter()).unwrap();

    let searcher = PaperSearcher::open(&config).unwrap();
    let query = searcher.query_builder().build("shared");

    // Byte order: uppercase sorts before lowercase
    let asc = searcher
        .search_sorted(&query, 10, SortKey::Title, SortOrder::Asc)
        .unwrap();
    assert_eq!(ids(&asc), vec![6, 4, 3, 1, 5, 2]);

    let desc = searcher
        .search_sorted(&query, 2, SortKey::Title, SortOrder::Desc)
        .unwrap();
    assert_eq!(ids(&desc), vec![2, 5]);
}

#[test]
fn recency_ranker_favours_newer_papers() {
    let (_dir, config) = setup();
    let searcher = PaperSearcher::open(&config)
        .unwrap()
        .with_ranker(Arc::new(RecencyRanker::new(2016, 100.0)));

    let results = searcher.search_str("bandit", 10).unwrap();
    assert_eq!(ids(&results), vec![2, 1]);
}

#[test]
fn term_vector_counts_content_terms() {
    let (_dir, config) = setup();
    let searcher = PaperSearcher::open(&config).unwrap();

    let vector = searcher.term_vector(1).unwrap().unwrap();
    assert_eq!(vector.freq("bandit"), 5);
    assert_eq!(vector.freq("2015"), 1);
    assert_eq!(vector.freq("alice"), 1);
    assert_eq!(vector.freq("kernel"), 0);

    assert!(searcher.term_vector(99).unwrap().is_none());
}

#[test]
fn search_before_build_is_index_not_found() {
    let dir = TempDir::new().unwrap();
    let config = SearchConfig::default().with_index_dir(dir.path().join("missing"));

    assert!(matches!(
        PaperSearcher::open(&config),
        Err(Error::IndexNotFound(_))
    ));
}

#[test]
fn uncommitted_build_is_invisible() {
    let dir = TempDir::new().unwrap();
    let config = SearchConfig::default().with_index_dir(dir.path().join("index"));

    {
        let mut writer = PaperIndexWriter::open(&config).unwrap();
        writer.add_paper(&corpus()[0]).unwrap();
        assert_eq!(writer.staged(), 1);
    }
    assert!(matches!(
        PaperSearcher::open(&config),
        Err(Error::IndexNotFound(_))
    ));

    build_index(&config, corpus().iter()).unwrap();
    {
        let mut writer = PaperIndexWriter::open(&config).unwrap();
        writer.add_paper(&corpus()[0]).unwrap();
    }
    assert_eq!(PaperSearcher::open(&config).unwrap().num_docs(), 3);
}

#[test]
fn invalid_record_keeps_previous_index() {
    let (_dir, config) = setup();

    let mut bad = corpus();
    bad.push(paper(4, "Broken", 2017, "text", &[]));
    bad[3].year = IntField::from("twenty");

    assert!(matches!(
        build_index(&config, bad.iter()),
        Err(Error::Validation { .. })
    ));
    assert_eq!(PaperSearcher::open(&config).unwrap().num_docs(), 3);
}

#[test]
fn second_writer_is_rejected() {
    let (_dir, config) = setup();

    let first = PaperIndexWriter::open(&config).unwrap();
    assert!(matches!(
        PaperIndexWriter::open(&config),
        Err(Error::IndexIo { .. })
    ));
    drop(first);

    assert!(PaperIndexWriter::open(&config).is_ok());
}

#[test]
fn open_searcher_keeps_its_snapshot_until_reopened() {
    let (_dir, config) = setup();
    let old = PaperSearcher::open(&config).unwrap();

    let mut rebuilt = corpus();
    rebuilt.truncate(1);
    build_index(&config, rebuilt.iter()).unwrap();

    assert_eq!(old.num_docs(), 3);
    assert_eq!(ids(&old.search_str("kernel", 10).unwrap()), vec![3]);

    let fresh = old.reopen().unwrap();
    assert_eq!(fresh.num_docs(), 1);
    assert!(fresh.search_str("kernel", 10).unwrap().is_empty());
}

#[test]
fn searcher_requires_matching_analyzer() {
    let (_dir, config) = setup();
    let standard = config.clone().with_analyzer(AnalyzerKind::Standard);

    assert!(matches!(
        PaperSearcher::open(&standard),
        Err(Error::AnalyzerMismatch { .. })
    ));
}

#[test]
fn standard_analyzer_drops_stop_words() {
    let dir = TempDir::new().unwrap();
    let config = SearchConfig::default()
        .with_index_dir(dir.path().join("index"))
        .with_analyzer(AnalyzerKind::Standard);
    build_index(&config, corpus().iter()).unwrap();

    let searcher = PaperSearcher::open(&config).unwrap();
    assert!(searcher.search_str("of", 10).unwrap().is_empty());
    assert_eq!(ids(&searcher.search_str("Regret", 10).unwrap()), vec![1]);
}

#[test]
fn standard_analyzer_phrases_span_stop_words() {
    let dir = TempDir::new().unwrap();
    let config = SearchConfig::default()
        .with_index_dir(dir.path().join("index"))
        .with_analyzer(AnalyzerKind::Standard);
    let papers = vec![
        paper(
            4,
            "Geometry of the loss surface",
            2017,
            "a state-of-the-art model",
            &[],
        ),
        paper(5, "Art Models", 2017, "state space model history of art", &[]),
    ];
    build_index(&config, papers.iter()).unwrap();
    let searcher = PaperSearcher::open(&config).unwrap();

    assert_eq!(
        ids(&searcher
            .search_str("\"geometry of the loss surface\"", 10)
            .unwrap()),
        vec![4]
    );
    assert_eq!(
        ids(&searcher
            .search_str("title:\"Geometry of the Loss Surface\"", 10)
            .unwrap()),
        vec![4]
    );
    // Dropped stop words still hold their positions
    assert!(searcher
        .search_str("\"geometry loss surface\"", 10)
        .unwrap()
        .is_empty());

    // Only the exact compound is excluded, not papers with its fragments
    assert_eq!(
        ids(&searcher.search_str("model -state-of-the-art", 10).unwrap()),
        vec![5]
    );
}

#[test]
fn negation_inside_or_only_excludes() {
    let (_dir, config) = setup();
    let searcher = PaperSearcher::open(&config).unwrap();

    let query = PaperQuery::or(vec![
        PaperQuery::term(TextField::Content, "bandit"),
        PaperQuery::not(PaperQuery::term(TextField::Content, "regret")),
    ]);
    assert_eq!(ids(&searcher.search(&query, 10).unwrap()), vec![2]);

    let only_negated = PaperQuery::or(vec![PaperQuery::not(PaperQuery::term(
        TextField::Content,
        "regret",
    ))]);
    assert!(searcher.search(&only_negated, 10).unwrap().is_empty());
}

#[test]
fn force_rebuild_removes_every_generation() {
    let (_dir, config) = setup();

    remove_index(&config.index_dir).unwrap();
    assert!(matches!(
        PaperSearcher::open(&config),
        Err(Error::IndexNotFound(_))
    ));

    build_index(&config, corpus().iter()).unwrap();
    assert_eq!(PaperSearcher::open(&config).unwrap().num_docs(), 3);
}

#[test]
fn force_rebuild_is_refused_during_a_build() {
    let (_dir, config) = setup();

    let mut writer = PaperIndexWriter::open(&config).unwrap();
    writer.add_paper(&corpus()[2]).unwrap();

    assert!(matches!(
        remove_index(&config.index_dir),
        Err(Error::IndexIo { .. })
    ));
    assert!(matches!(
        PaperIndexWriter::open(&config),
        Err(Error::IndexIo { .. })
    ));

    assert_eq!(writer.commit().unwrap(), 1);
    let searcher = PaperSearcher::open(&config).unwrap();
    assert_eq!(ids(&searcher.search_str("kernel", 10).unwrap()), vec![3]);
}

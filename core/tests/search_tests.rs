use pubsearch_core::{DocId, IndexStore, Record};

fn publication(title: &str, year: &str) -> Record {
    Record::new().with("title", title).with("year", year)
}

fn sample_store() -> IndexStore {
    let mut store = IndexStore::default();
    store.extend(vec![
        Record::new()
            .with("title", "Machine Learning Approaches for Mathematics and Data Analysis")
            .with("authors", vec!["Dr. John Smith", "Dr. Jane Doe", "Prof. Michael Johnson"])
            .with("year", "2023")
            .with("abstract", "This paper presents novel machine learning algorithms for mathematical data analysis and computational modeling.")
            .with("keywords", vec!["mathematics", "machine learning", "data analysis"])
            .with("publication_link", "https://example.org/publications/ml-mathematics-2023"),
        Record::new()
            .with("title", "Advanced Neural Networks and Deep Learning in Applied Mathematics")
            .with("authors", vec!["Prof. Michael Johnson", "Dr. Sarah Williams"])
            .with("year", "2023")
            .with("abstract", "Deep learning methods for solving differential equations and complex mathematical problems using neural networks.")
            .with("keywords", vec!["mathematics", "neural networks", "deep learning"]),
        Record::new()
            .with("title", "Computational Mathematics: Algorithms and Scientific Applications")
            .with("authors", vec!["Dr. Robert Brown", "Dr. Emily Davis"])
            .with("year", "2022")
            .with("abstract", "Computational methods for solving complex mathematical and scientific problems using advanced algorithms.")
            .with("keywords", vec!["mathematics", "computational", "algorithms"]),
    ]);
    store
}

#[test]
fn machine_learning_ranks_matching_title_first() {
    let mut store = IndexStore::default();
    store.insert(0, publication("Machine Learning for Mathematics", "2023"));
    store.insert(1, publication("Deep Learning Methods", "2023"));

    let hits = store.search("machine learning");
    let ids: Vec<DocId> = hits.iter().map(|h| h.doc_id).collect();
    assert_eq!(ids, vec![0, 1]);
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn title_phrase_always_finds_its_document() {
    let store = sample_store();
    for (doc_id, record) in store.documents() {
        let title = record.text("title").to_string();
        let hits = store.search(&title);
        let hit = hits.iter().find(|h| h.doc_id == doc_id).expect("document missing from its own title query");
        assert!(hit.score > 0.0);
    }
}

#[test]
fn title_match_beats_abstract_match() {
    let mut store = IndexStore::default();
    store.insert(0, Record::new().with("abstract", "topology"));
    store.insert(1, Record::new().with("title", "topology"));
    let hits = store.search("topology");
    assert_eq!(hits[0].doc_id, 1);
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn reinserting_an_id_keeps_only_latest_record() {
    let mut store = IndexStore::default();
    store.insert(4, publication("Graph Colouring", "2020"));
    store.insert(4, publication("Graph Colouring", "2024"));
    assert_eq!(store.doc_count(), 1);
    assert_eq!(store.document(4).unwrap().text("year"), "2024");
}

#[test]
fn reinserting_an_id_inflates_weights() {
    let mut once = IndexStore::default();
    once.insert(0, publication("Graph Colouring", "2020"));
    let mut twice = IndexStore::default();
    twice.insert(0, publication("Graph Colouring", "2020"));
    twice.insert(0, publication("Graph Colouring", "2020"));

    let w1 = once.postings("graph").unwrap()[0].weight;
    let w2 = twice.postings("graph").unwrap()[0].weight;
    assert!(w2 > w1);
    assert_eq!(w2, 2.0 * w1);
}

#[test]
fn stopword_and_empty_queries_return_nothing() {
    let store = sample_store();
    assert!(store.search("").is_empty());
    assert!(store.search("the and of").is_empty());
    assert!(store.search("?!").is_empty());
}

#[test]
fn empty_index() {
    let store = IndexStore::default();
    assert_eq!(store.statistics().total_documents, 0);
    assert!(store.search("machine learning").is_empty());
}

#[test]
fn year_queries_match_year_field() {
    let store = sample_store();
    let ids: Vec<DocId> = store.search("2022").iter().map(|h| h.doc_id).collect();
    assert_eq!(ids, vec![2]);
}

#[test]
fn hits_carry_full_record() {
    let store = sample_store();
    let hits = store.search("neural networks");
    assert_eq!(hits[0].doc_id, 1);
    assert_eq!(hits[0].record.authors(), vec!["Prof. Michael Johnson", "Dr. Sarah Williams"]);
}

#[test]
fn statistics_over_sample() {
    let stats = sample_store().statistics();
    assert_eq!(stats.total_documents, 3);
    assert_eq!(stats.total_authors, Some(6));
    assert_eq!(
        stats.publications_by_year.unwrap(),
        vec![("2023".to_string(), 2), ("2022".to_string(), 1)]
    );
}

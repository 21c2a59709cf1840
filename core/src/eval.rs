//! Offline evaluation of a built index: query throughput, collection
//! coverage and an overall 0-100 health score.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::FieldWeights;
use crate::index::IndexStore;
use crate::persist;
use crate::record::{Field, Record};
use crate::stats::{IndexStats, TermWeight};

pub const DEFAULT_QUERIES: &[&str] = &[
    "machine learning",
    "mathematics",
    "artificial intelligence",
    "data analysis",
    "computational",
    "neural networks",
    "deep learning",
    "algorithm",
    "2023",
    "research",
];

#[derive(Debug, Clone, Serialize)]
pub struct QueryRun {
    pub query: String,
    pub results: usize,
    pub response_time_s: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub total_queries: usize,
    pub queries_with_results: usize,
    /// Percentage of queries returning at least one hit.
    pub success_rate: f64,
    pub avg_results_per_query: f64,
    pub avg_response_time_s: f64,
    pub runs: Vec<QueryRun>,
}

impl SearchReport {
    pub fn fastest(&self, n: usize) -> Vec<&QueryRun> {
        let mut runs: Vec<&QueryRun> = self.runs.iter().collect();
        runs.sort_by(|a, b| a.response_time_s.partial_cmp(&b.response_time_s).unwrap_or(Ordering::Equal));
        runs.truncate(n);
        runs
    }

    pub fn most_productive(&self, n: usize) -> Vec<&QueryRun> {
        let mut runs: Vec<&QueryRun> = self.runs.iter().collect();
        runs.sort_by(|a, b| b.results.cmp(&a.results));
        runs.truncate(n);
        runs
    }
}

pub fn evaluate_queries<S: AsRef<str>>(store: &IndexStore, queries: &[S]) -> SearchReport {
    let runs: Vec<QueryRun> = queries
        .iter()
        .map(|q| {
            let start = Instant::now();
            let results = store.search(q.as_ref()).len();
            QueryRun { query: q.as_ref().to_string(), results, response_time_s: start.elapsed().as_secs_f64() }
        })
        .collect();

    let total = runs.len();
    let with_results = runs.iter().filter(|r| r.results > 0).count();
    let (success_rate, avg_results, avg_time) = if total > 0 {
        let n = total as f64;
        (
            with_results as f64 / n * 100.0,
            runs.iter().map(|r| r.results).sum::<usize>() as f64 / n,
            runs.iter().map(|r| r.response_time_s).sum::<f64>() / n,
        )
    } else {
        (0.0, 0.0, 0.0)
    };
    tracing::info!(total, with_results, "search evaluation complete");

    SearchReport {
        total_queries: total,
        queries_with_results: with_results,
        success_rate,
        avg_results_per_query: avg_results,
        avg_response_time_s: avg_time,
        runs,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub total_publications: usize,
    pub unique_authors: usize,
    pub years_covered: usize,
    /// Percentage of records with non-empty title, authors, year and abstract.
    pub complete_metadata_pct: f64,
    pub avg_publications_per_author: Option<f64>,
    pub max_publications_per_author: Option<usize>,
    pub min_publications_per_author: Option<usize>,
    /// Most productive authors, most publications first.
    pub top_authors: Vec<(String, usize)>,
}

fn has_metadata(record: &Record) -> bool {
    [Field::Title, Field::Authors, Field::Year, Field::Abstract]
        .into_iter()
        .all(|f| record.field_text(f).is_some())
}

pub fn evaluate_collection(store: &IndexStore) -> CollectionReport {
    let mut per_author: HashMap<String, usize> = HashMap::new();
    let mut years: BTreeSet<String> = BTreeSet::new();
    let mut complete = 0usize;
    let mut total = 0usize;

    for (_, record) in store.documents() {
        total += 1;
        if has_metadata(record) {
            complete += 1;
        }
        for author in record.authors() {
            *per_author.entry(author.trim().to_string()).or_insert(0) += 1;
        }
        if let Some(year) = record.field_text(Field::Year) {
            years.insert(year);
        }
    }

    let counts: Vec<usize> = per_author.values().copied().collect();
    let mut top_authors: Vec<(String, usize)> = per_author.into_iter().collect();
    top_authors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_authors.truncate(10);

    CollectionReport {
        total_publications: total,
        unique_authors: counts.len(),
        years_covered: years.len(),
        complete_metadata_pct: if total > 0 { complete as f64 / total as f64 * 100.0 } else { 0.0 },
        avg_publications_per_author: (!counts.is_empty())
            .then(|| counts.iter().sum::<usize>() as f64 / counts.len() as f64),
        max_publications_per_author: counts.iter().max().copied(),
        min_publications_per_author: counts.iter().min().copied(),
        top_authors,
    }
}

/// Presence and size of a file the deployment depends on.
#[derive(Debug, Clone, Serialize)]
pub struct FileCheck {
    pub name: String,
    pub path: PathBuf,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_kb: Option<f64>,
}

pub fn check_files(files: &[(&str, &Path)]) -> Vec<FileCheck> {
    files
        .iter()
        .map(|(name, path)| {
            let size_kb = fs::metadata(path).ok().filter(|m| m.is_file()).map(|m| m.len() as f64 / 1024.0);
            FileCheck { name: name.to_string(), path: path.to_path_buf(), exists: size_kb.is_some(), size_kb }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Rating {
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            Rating::Excellent
        } else if score >= 60 {
            Rating::Good
        } else if score >= 40 {
            Rating::Fair
        } else {
            Rating::Poor
        }
    }
}

/// Score out of 100, in four bands:
///
/// * collection (30): has records, more than 80% complete metadata, more than 5 authors
/// * index (30): has documents, more than 100 terms, more than 1000 postings
/// * search (30): success rate above 50%, any results on average, under 100ms on average
/// * files (10): every checked file exists
pub fn overall_score(collection: &CollectionReport, index: &IndexStats, search: &SearchReport, files: &[FileCheck]) -> u32 {
    let mut score = 0;
    if collection.total_publications > 0 {
        score += 10;
        if collection.complete_metadata_pct > 80.0 {
            score += 10;
        }
        if collection.unique_authors > 5 {
            score += 10;
        }
    }
    if index.total_documents > 0 {
        score += 10;
        if index.unique_terms > 100 {
            score += 10;
        }
        if index.total_postings > 1000 {
            score += 10;
        }
    }
    if search.success_rate > 50.0 {
        score += 10;
    }
    if search.avg_results_per_query > 0.0 {
        score += 10;
    }
    if search.avg_response_time_s < 0.1 {
        score += 10;
    }
    if files.iter().all(|f| f.exists) {
        score += 10;
    }
    score.min(100)
}

/// Everything `indexer evaluate` reports, in one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub timestamp: String,
    pub collection: CollectionReport,
    pub index: IndexStats,
    pub field_weights: FieldWeights,
    pub top_terms: Vec<TermWeight>,
    pub search: SearchReport,
    pub fastest_queries: Vec<String>,
    pub most_productive_queries: Vec<String>,
    pub files: Vec<FileCheck>,
    pub overall_score: u32,
    pub rating: Rating,
}

impl EvaluationReport {
    pub fn save(&self, path: &Path) -> persist::Result<()> {
        persist::write_json(path, self)?;
        tracing::info!(path = %path.display(), overall_score = self.overall_score, "evaluation report saved");
        Ok(())
    }
}

pub fn evaluate<S: AsRef<str>>(store: &IndexStore, queries: &[S], files: Vec<FileCheck>) -> EvaluationReport {
    let collection = evaluate_collection(store);
    let index = store.statistics();
    let search = evaluate_queries(store, queries);
    let overall_score = overall_score(&collection, &index, &search, &files);
    let names = |runs: Vec<&QueryRun>| runs.into_iter().map(|r| r.query.clone()).collect::<Vec<_>>();

    EvaluationReport {
        timestamp: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        fastest_queries: names(search.fastest(5)),
        most_productive_queries: names(search.most_productive(5)),
        field_weights: *store.weights(),
        top_terms: store.top_terms(20),
        collection,
        index,
        search,
        files,
        overall_score,
        rating: Rating::from_score(overall_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> IndexStore {
        let mut s = IndexStore::default();
        s.insert(
            0,
            Record::new()
                .with("title", "Machine Learning for Mathematics")
                .with("authors", vec!["Dr. John Smith", "Dr. Jane Doe"])
                .with("year", "2023")
                .with("abstract", "Learning algorithms."),
        );
        s.insert(1, Record::new().with("title", "Neural Networks").with("authors", vec!["Dr. John Smith"]));
        s
    }

    #[test]
    fn counts_successful_queries() {
        let report = evaluate_queries(&store(), &["machine learning", "zzzz", "the"]);
        assert_eq!(report.total_queries, 3);
        assert_eq!(report.queries_with_results, 1);
        assert!((report.success_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.most_productive(1)[0].query, "machine learning");
        assert_eq!(report.fastest(5).len(), 3);
    }

    #[test]
    fn no_queries_yields_zeroes() {
        let report = evaluate_queries::<&str>(&store(), &[]);
        assert_eq!(report.success_rate, 0.0);
        assert!(report.runs.is_empty());
    }

    fn search_report(success_rate: f64, avg_results: f64, avg_time: f64) -> SearchReport {
        SearchReport {
            total_queries: 10,
            queries_with_results: 0,
            success_rate,
            avg_results_per_query: avg_results,
            avg_response_time_s: avg_time,
            runs: Vec::new(),
        }
    }

    #[test]
    fn overall_score_bands() {
        let s = store();
        let collection = evaluate_collection(&s);
        let index = s.statistics();

        // 10 collection + 10 index + 30 search + 10 files
        let score = overall_score(&collection, &index, &search_report(60.0, 1.0, 0.01), &[]);
        assert_eq!(score, 60);
        assert_eq!(Rating::from_score(score), Rating::Good);

        let missing = FileCheck { name: "Index File".into(), path: "/nonexistent".into(), exists: false, size_kb: None };
        let score = overall_score(&collection, &index, &search_report(50.0, 0.0, 0.5), &[missing]);
        assert_eq!(score, 20);
        assert_eq!(Rating::from_score(score), Rating::Poor);

        let empty = IndexStore::default();
        let score =
            overall_score(&evaluate_collection(&empty), &empty.statistics(), &search_report(0.0, 0.0, 1.0), &[]);
        assert_eq!(score, 10);
    }

    #[test]
    fn rating_thresholds() {
        assert_eq!(Rating::from_score(100), Rating::Excellent);
        assert_eq!(Rating::from_score(80), Rating::Excellent);
        assert_eq!(Rating::from_score(79), Rating::Good);
        assert_eq!(Rating::from_score(40), Rating::Fair);
        assert_eq!(Rating::from_score(39), Rating::Poor);
    }

    #[test]
    fn file_checks_report_size_and_absence() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("index.bin");
        fs::write(&present, vec![0u8; 2048]).unwrap();
        let absent = dir.path().join("index.meta.json");
        let checks = check_files(&[
            ("Index File", present.as_path()),
            ("Meta File", absent.as_path()),
            ("Data Directory", dir.path()),
        ]);
        assert!(checks[0].exists);
        assert_eq!(checks[0].size_kb, Some(2.0));
        assert!(!checks[1].exists);
        assert!(!checks[2].exists);
    }

    #[test]
    fn report_is_saved_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/evaluation_results.json");
        let report = evaluate(&store(), &["machine learning", "zzzz"], Vec::new());
        assert_eq!(report.fastest_queries.len(), 2);
        assert_eq!(report.most_productive_queries[0], "machine learning");
        report.save(&path).unwrap();

        let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["overall_score"], report.overall_score);
        assert_eq!(saved["index"]["total_documents"], 2);
        assert_eq!(saved["search"]["total_queries"], 2);
        assert!(saved["index"]["avg_term_frequency"].as_f64().unwrap() >= 1.0);
    }

    #[test]
    fn collection_coverage() {
        let report = evaluate_collection(&store());
        assert_eq!(report.total_publications, 2);
        assert_eq!(report.unique_authors, 2);
        assert_eq!(report.years_covered, 1);
        assert_eq!(report.complete_metadata_pct, 50.0);
        assert_eq!(report.max_publications_per_author, Some(2));
        assert_eq!(report.min_publications_per_author, Some(1));
        assert_eq!(report.top_authors[0], ("Dr. John Smith".to_string(), 2));
    }
}

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use crate::index::IndexStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub total_documents: u32,
    pub unique_terms: usize,
    pub total_postings: usize,
    /// Sum of all posting weights over the document count.
    pub avg_document_length: f64,
    /// Postings per unique term, i.e. how many documents a term reaches on average.
    pub avg_term_frequency: f64,
    /// Only present for a non-empty index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_authors: Option<usize>,
    /// Year label to document count, newest first. Only present for a non-empty index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publications_by_year: Option<Vec<(String, usize)>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermWeight {
    pub term: String,
    pub weight: f64,
}

impl IndexStore {
    pub fn statistics(&self) -> IndexStats {
        let index = &self.index;
        let total_weight: f64 = index.postings.values().flatten().map(|p| p.weight).sum();
        let avg_document_length = if index.num_docs > 0 { total_weight / index.num_docs as f64 } else { 0.0 };
        let unique_terms = index.postings.len();
        let total_postings = index.total_postings();
        let avg_term_frequency =
            if unique_terms > 0 { total_postings as f64 / unique_terms as f64 } else { 0.0 };

        let mut stats = IndexStats {
            total_documents: index.num_docs,
            unique_terms,
            total_postings,
            avg_document_length,
            avg_term_frequency,
            total_authors: None,
            publications_by_year: None,
        };

        if !index.docs.is_empty() {
            let mut years: BTreeMap<String, usize> = BTreeMap::new();
            let mut authors: HashSet<&str> = HashSet::new();
            for record in index.docs.values() {
                *years.entry(record.year_label()).or_insert(0) += 1;
                authors.extend(record.authors());
            }
            stats.total_authors = Some(authors.len());
            stats.publications_by_year = Some(years.into_iter().rev().collect());
        }
        stats
    }

    /// Terms ranked by their summed posting weight, heaviest first.
    pub fn top_terms(&self, n: usize) -> Vec<TermWeight> {
        let mut terms: Vec<TermWeight> = self
            .index
            .postings
            .iter()
            .map(|(term, plist)| TermWeight { term: term.clone(), weight: plist.iter().map(|p| p.weight).sum() })
            .collect();
        terms.sort_by(|a, b| {
            b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal).then_with(|| a.term.cmp(&b.term))
        });
        terms.truncate(n);
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[test]
    fn empty_index_has_no_histogram() {
        let stats = IndexStore::default().statistics();
        assert_eq!(stats.total_documents, 0);
        assert_eq!(stats.avg_document_length, 0.0);
        assert_eq!(stats.avg_term_frequency, 0.0);
        assert!(stats.total_authors.is_none());
        assert!(stats.publications_by_year.is_none());
    }

    #[test]
    fn years_newest_first_and_distinct_authors() {
        let mut s = IndexStore::default();
        s.insert(0, Record::new().with("title", "Graph").with("year", "2021").with("authors", vec!["Ada", "Alan"]));
        s.insert(1, Record::new().with("title", "Graph").with("year", "2023").with("authors", vec!["Ada"]));
        s.insert(2, Record::new().with("title", "Graph").with("year", "2021"));
        s.insert(3, Record::new().with("title", "Graph"));
        let stats = s.statistics();
        assert_eq!(stats.total_authors, Some(2));
        assert_eq!(
            stats.publications_by_year.unwrap(),
            vec![("N/A".to_string(), 1), ("2023".to_string(), 1), ("2021".to_string(), 2)]
        );
        // graph, 2021, 2023, ada, alan
        assert_eq!(stats.unique_terms, 5);
        assert_eq!(stats.total_postings, 4 + 2 + 1 + 2 + 1);
        assert!((stats.avg_term_frequency - 10.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn top_terms_by_weight() {
        let mut s = IndexStore::default();
        s.insert(0, Record::new().with("title", "Graph").with("abstract", "topology"));
        s.insert(1, Record::new().with("abstract", "graph"));
        let top = s.top_terms(1);
        assert_eq!(top, vec![TermWeight { term: "graph".into(), weight: 4.0 }]);
    }
}

//! Query evaluation: field-weighted TF-IDF plus ranking boosts.
//!
//! For each distinct query token found in the index, every posting adds
//! `weight * ln(N / df + 1)` to its document. Each scored document is then
//! boosted once:
//!
//! 1. `x 1.5` when `title` is among the matched posting fields,
//! 2. `+ 5` per distinct matched field,
//! 3. `x (1 + coverage)`, coverage being the share of query tokens it matched.
//!
//! Results are ordered by score descending, ties by ascending document id.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::index::{DocId, IndexStore};
use crate::record::{Field, Record};

pub const TITLE_BOOST: f64 = 1.5;
pub const FIELD_MATCH_BONUS: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct SearchHit<'a> {
    pub doc_id: DocId,
    pub record: &'a Record,
    pub score: f64,
}

#[derive(Default)]
struct DocScore {
    score: f64,
    matched_terms: usize,
    fields: BTreeSet<Field>,
}

/// Inverse document frequency, `ln(N / df + 1)`.
pub fn idf(num_docs: u32, df: usize) -> f64 {
    (num_docs as f64 / df as f64 + 1.0).ln()
}

/// Apply the title, field-count and coverage boosts to a base TF-IDF score.
pub fn boost(base: f64, fields: &BTreeSet<Field>, matched_terms: usize, query_terms: usize) -> f64 {
    let mut score = base;
    if fields.contains(&Field::Title) {
        score *= TITLE_BOOST;
    }
    score += FIELD_MATCH_BONUS * fields.len() as f64;
    let coverage = matched_terms as f64 / query_terms as f64;
    score * (1.0 + coverage)
}

impl IndexStore {
    /// Rank documents against free text. A query with no usable tokens yields
    /// an empty list.
    pub fn search(&self, query: &str) -> Vec<SearchHit<'_>> {
        let tokens = distinct(self.normalizer.normalize(query));
        if tokens.is_empty() {
            tracing::warn!(query, "query produced no valid tokens");
            return Vec::new();
        }
        tracing::debug!(query, ?tokens, "search");

        let num_docs = self.index.num_docs;
        let mut scores: HashMap<DocId, DocScore> = HashMap::new();
        for token in &tokens {
            let Some(plist) = self.index.postings.get(token) else { continue };
            let token_idf = idf(num_docs, plist.len());
            for p in plist {
                let acc = scores.entry(p.doc_id).or_default();
                acc.score += p.weight * token_idf;
                acc.matched_terms += 1;
                acc.fields.insert(p.field);
            }
        }

        let mut ranked: Vec<(DocId, f64)> = scores
            .into_iter()
            .map(|(doc_id, acc)| (doc_id, boost(acc.score, &acc.fields, acc.matched_terms, tokens.len())))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));

        let hits: Vec<SearchHit<'_>> = ranked
            .into_iter()
            .filter_map(|(doc_id, score)| {
                self.index.docs.get(&doc_id).map(|record| SearchHit { doc_id, record, score })
            })
            .collect();
        tracing::debug!(query, hits = hits.len(), "search complete");
        hits
    }

    /// Like [`IndexStore::search`], keeping the `k` best hits.
    pub fn search_top(&self, query: &str, k: usize) -> Vec<SearchHit<'_>> {
        let mut hits = self.search(query);
        hits.truncate(k);
        hits
    }
}

fn distinct(tokens: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    for t in tokens {
        if !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

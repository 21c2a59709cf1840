use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::config::{FieldWeights, IndexConfig};
use crate::normalizer::Normalizer;
use crate::record::{Field, Record};

pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    /// Field-weighted frequency, summed over every merge into this posting.
    pub weight: f64,
    /// The field that last contributed to `weight`.
    pub field: Field,
}

/// Token postings plus the document table. This is the part that gets persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    /// token -> postings in insertion order, at most one per document
    pub postings: HashMap<String, Vec<Posting>>,
    pub docs: BTreeMap<DocId, Record>,
    pub num_docs: u32,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to the (token, doc) posting, creating it if absent.
    /// The posting's field tag becomes `field` either way.
    fn merge(&mut self, token: &str, doc_id: DocId, weight: f64, field: Field) {
        let plist = self.postings.entry(token.to_string()).or_default();
        match plist.iter_mut().find(|p| p.doc_id == doc_id) {
            Some(existing) => {
                existing.weight += weight;
                existing.field = field;
            }
            None => plist.push(Posting { doc_id, weight, field }),
        }
    }

    pub fn total_postings(&self) -> usize {
        self.postings.values().map(Vec::len).sum()
    }
}

/// An owned, single-writer index: the inverted index together with the
/// configuration it was built with. Snapshots carry that configuration, so a
/// loaded store tokenizes and weights exactly like the one that was saved.
///
/// Concurrent use is the caller's business: either build a fresh store and
/// swap it in, or guard it with a read/write lock.
pub struct IndexStore {
    pub(crate) index: InvertedIndex,
    pub(crate) normalizer: Normalizer,
    pub(crate) config: IndexConfig,
}

impl Default for IndexStore {
    fn default() -> Self {
        Self::new(&IndexConfig::default())
    }
}

impl IndexStore {
    pub fn new(config: &IndexConfig) -> Self {
        Self::from_parts(InvertedIndex::new(), config.clone())
    }

    pub(crate) fn from_parts(index: InvertedIndex, config: IndexConfig) -> Self {
        Self { index, normalizer: Normalizer::new(&config.normalizer), config }
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn weights(&self) -> &FieldWeights {
        &self.config.field_weights
    }

    pub fn doc_count(&self) -> u32 {
        self.index.num_docs
    }

    pub fn document(&self, doc_id: DocId) -> Option<&Record> {
        self.index.docs.get(&doc_id)
    }

    pub fn documents(&self) -> impl Iterator<Item = (DocId, &Record)> {
        self.index.docs.iter().map(|(id, rec)| (*id, rec))
    }

    pub fn postings(&self, token: &str) -> Option<&[Posting]> {
        self.index.postings.get(token).map(Vec::as_slice)
    }

    /// Insert a whole document.
    ///
    /// The record replaces any earlier record under `doc_id`, while token
    /// weights are added to whatever postings the id already has. Inserting
    /// the same document twice therefore doubles its weights.
    pub fn insert(&mut self, doc_id: DocId, record: Record) {
        let fields = record.searchable_fields();
        self.index.docs.insert(doc_id, record);

        for (field, text) in fields {
            let tokens = self.normalizer.normalize(&text);
            if tokens.is_empty() {
                continue;
            }
            let weight = self.config.field_weights.weight(field);
            for (token, freq) in term_frequencies(&tokens) {
                self.index.merge(token, doc_id, freq as f64 * weight, field);
            }
        }

        self.index.num_docs = self.index.docs.len() as u32;
    }

    /// Insert records with ids `0..n` in iteration order.
    pub fn extend<I: IntoIterator<Item = Record>>(&mut self, records: I) {
        for (i, record) in records.into_iter().enumerate() {
            self.insert(i as DocId, record);
        }
        tracing::info!(num_docs = self.index.num_docs, num_terms = self.index.postings.len(), "indexed documents");
    }
}

/// Raw frequency of each distinct token, in order of first occurrence.
fn term_frequencies(tokens: &[String]) -> Vec<(&str, u32)> {
    let mut order: Vec<(&str, u32)> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    for t in tokens {
        match slot.get(t.as_str()) {
            Some(&i) => order[i].1 += 1,
            None => {
                slot.insert(t.as_str(), order.len());
                order.push((t.as_str(), 1));
            }
        }
    }
    order
}

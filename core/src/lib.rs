//! Field-weighted inverted index for publication metadata.

pub mod config;
pub mod eval;
pub mod export;
pub mod index;
mod lemmas;
pub mod normalizer;
pub mod persist;
pub mod record;
pub mod search;
pub mod stats;

pub use config::{FieldWeights, IndexConfig, NormalizerConfig};
pub use index::{DocId, IndexStore, InvertedIndex, Posting};
pub use normalizer::Normalizer;
pub use persist::PersistError;
pub use record::{Field, FieldValue, Record};
pub use search::SearchHit;
pub use stats::IndexStats;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::config::IndexConfig;
use crate::index::{IndexStore, InvertedIndex};

/// Leading bytes of every index snapshot.
const SNAPSHOT_MAGIC: &[u8; 4] = b"PSIX";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode index: {0}")]
    Encode(#[source] bincode::Error),
    #[error("failed to decode index: {0}")]
    Decode(#[source] bincode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not an index snapshot")]
    BadMagic,
    #[error("unsupported snapshot version {found} (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

pub type Result<T> = std::result::Result<T, PersistError>;

/// Human-readable sidecar written next to a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

pub fn save_meta(path: &Path, meta: &MetaFile) -> Result<()> {
    write_json(path, meta)
}

pub fn load_meta(path: &Path) -> Result<MetaFile> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Path of the meta sidecar for a snapshot, e.g. `index.bin` -> `index.meta.json`.
pub fn meta_path(snapshot: &Path) -> PathBuf {
    snapshot.with_extension("meta.json")
}

/// Pretty-printed JSON, written atomically.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &json)
}

/// Snapshot payload: the configuration travels with the index it shaped.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    config: &'a IndexConfig,
    index: &'a InvertedIndex,
}

#[derive(Deserialize)]
struct Snapshot {
    config: IndexConfig,
    index: InvertedIndex,
}

impl InvertedIndex {
    fn validate(&self) -> Result<()> {
        if self.num_docs as usize != self.docs.len() {
            return Err(PersistError::InvalidSnapshot(format!(
                "document count {} does not match {} stored documents",
                self.num_docs,
                self.docs.len()
            )));
        }
        for (token, plist) in &self.postings {
            let mut seen = HashSet::with_capacity(plist.len());
            for p in plist {
                if !self.docs.contains_key(&p.doc_id) {
                    return Err(PersistError::InvalidSnapshot(format!(
                        "posting for {token:?} references unknown document {}",
                        p.doc_id
                    )));
                }
                if !seen.insert(p.doc_id) {
                    return Err(PersistError::InvalidSnapshot(format!(
                        "duplicate posting for {token:?} in document {}",
                        p.doc_id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Write to a uniquely named temp file beside `path`, sync, then rename over
/// it. Concurrent writers never share a temp file, and an earlier file
/// survives a failed write.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir
        }
        None => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl IndexStore {
    /// Snapshot layout: magic, little-endian format version, bincode payload
    /// of the configuration and the index.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let snapshot = SnapshotRef { config: &self.config, index: &self.index };
        let payload = bincode::serialize(&snapshot).map_err(PersistError::Encode)?;
        let mut out = Vec::with_capacity(payload.len() + 8);
        out.extend_from_slice(SNAPSHOT_MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() < 8 || &raw[..4] != SNAPSHOT_MAGIC {
            return Err(PersistError::BadMagic);
        }
        let found = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
        if found != FORMAT_VERSION {
            return Err(PersistError::VersionMismatch { found, expected: FORMAT_VERSION });
        }
        let snapshot: Snapshot = bincode::deserialize(&raw[8..]).map_err(PersistError::Decode)?;
        snapshot.index.validate()?;
        Ok(IndexStore::from_parts(snapshot.index, snapshot.config))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let saved = self.to_bytes().and_then(|bytes| {
            write_atomic(path, &bytes)?;
            Ok(bytes.len())
        });
        match saved {
            Ok(bytes) => {
                tracing::info!(path = %path.display(), bytes, num_docs = self.index.num_docs, "index saved");
                Ok(())
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to save index");
                Err(e)
            }
        }
    }

    /// Open a snapshot as a new store, configured the way it was when saved.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let loaded = fs::read(path).map_err(PersistError::from).and_then(|raw| Self::from_bytes(&raw));
        match loaded {
            Ok(store) => {
                tracing::info!(path = %path.display(), num_docs = store.index.num_docs, "index loaded");
                Ok(store)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to load index");
                Err(e)
            }
        }
    }

    /// Replace this store, configuration included, with a snapshot. On
    /// failure nothing changes.
    pub fn reload<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        *self = Self::load(path)?;
        Ok(())
    }
}

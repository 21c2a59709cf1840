use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use parking_lot::RwLock;
use pubsearch_core::{DocId, IndexConfig, IndexStats, IndexStore, Normalizer, Record, SearchHit};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchResult>,
}

#[derive(Serialize)]
pub struct SearchResult {
    pub doc_id: DocId,
    pub score: f64,
    pub title: String,
    pub year: String,
    pub url: Option<String>,
    pub snippet: Option<String>,
    pub record: serde_json::Value,
}

#[derive(Deserialize)]
pub struct BatchDoc {
    pub id: DocId,
    pub record: serde_json::Value,
}

pub struct ServerConfig {
    /// Snapshot served, committed to, and reloaded from.
    pub index_path: PathBuf,
    pub index_config: IndexConfig,
    pub admin_token: Option<String>,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<IndexStore>>,
    pub index_path: PathBuf,
    pub admin_token: Option<String>,
}

impl AppState {
    /// Open the snapshot at `config.index_path`, or start empty with
    /// `config.index_config` when there is none yet. A snapshot brings its own
    /// configuration.
    pub fn open(config: &ServerConfig) -> Result<Self> {
        let store = if config.index_path.exists() {
            IndexStore::load(&config.index_path)?
        } else {
            tracing::warn!(path = %config.index_path.display(), "no index snapshot, starting empty");
            IndexStore::new(&config.index_config)
        };
        Ok(Self {
            store: Arc::new(RwLock::new(store)),
            index_path: config.index_path.clone(),
            admin_token: config.admin_token.clone(),
        })
    }
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    let state = AppState::open(&config)?;
    Ok(router(state, &config.cors_origins))
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    let origins: Vec<_> = cors_origins.iter().filter_map(|s| s.trim().parse().ok()).collect();
    let cors = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/stats", get(stats_handler))
        .route("/index/batch", post(index_batch))
        .route("/index/commit", post(index_commit))
        .route("/index/reload", post(index_reload))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let store = state.store.read();
    let hits = store.search(&params.q);
    let total_hits = hits.len();
    let k = params.k.clamp(1, MAX_K);

    let highlight = highlight_regex(&highlight_terms(&params.q, store.normalizer()));
    let results: Vec<SearchResult> = hits.iter().take(k).map(|hit| to_result(hit, highlight.as_ref())).collect();

    let elapsed = start.elapsed();
    Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, results })
}

fn to_result(hit: &SearchHit<'_>, highlight: Option<&Regex>) -> SearchResult {
    let record = hit.record;
    let url = match record.text("publication_link") {
        "" => None,
        link => Some(link.to_string()),
    };
    SearchResult {
        doc_id: hit.doc_id,
        score: hit.score,
        title: record.text("title").to_string(),
        year: record.year_label(),
        url,
        snippet: snippet_from_text(record.text("abstract"), highlight),
        record: record.to_json(),
    }
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let store = state.store.read();
    match store.document(doc_id) {
        Some(record) => Ok(Json(serde_json::json!({ "doc_id": doc_id, "record": record.to_json() }))),
        None => Err((StatusCode::NOT_FOUND, format!("document {doc_id} not found"))),
    }
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<IndexStats> {
    Json(state.store.read().statistics())
}

/// Query words worth highlighting: those the normalizer keeps, so stopwords
/// and short words are never marked up.
fn highlight_terms(query: &str, normalizer: &Normalizer) -> Vec<String> {
    query
        .split_whitespace()
        .filter(|w| !normalizer.normalize(w).is_empty())
        .map(str::to_string)
        .collect()
}

/// One case-insensitive alternation over all terms, longest first.
fn highlight_regex(terms: &[String]) -> Option<Regex> {
    let mut terms: Vec<&str> = terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
    if terms.is_empty() {
        return None;
    }
    terms.sort_by_key(|t| std::cmp::Reverse(t.len()));
    let pattern = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    RegexBuilder::new(&pattern).case_insensitive(true).build().ok()
}

/// Window of up to ~300 bytes around the first highlighted term, terms wrapped in `<em>`.
fn snippet_from_text(text: &str, highlight: Option<&Regex>) -> Option<String> {
    if text.is_empty() { return None; }
    let first_idx = highlight.and_then(|re| re.find(text)).map(|m| m.start());
    let snippet = match first_idx {
        Some(idx) => {
            let mut start = idx.saturating_sub(100);
            while !text.is_char_boundary(start) { start -= 1; }
            let mut end = (idx + 200).min(text.len());
            while !text.is_char_boundary(end) { end += 1; }
            text[start..end].to_string()
        }
        None => text.chars().take(200).collect(),
    };
    Some(match highlight {
        Some(re) => re.replace_all(&snippet, "<em>$0</em>").into_owned(),
        None => snippet,
    })
}

// --- Admin endpoints ---
async fn index_batch(State(state): State<AppState>, headers: HeaderMap, Json(docs): Json<Vec<BatchDoc>>) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let mut records = Vec::with_capacity(docs.len());
    for doc in docs {
        let record = Record::from_json(doc.record)
            .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("record {} is not a JSON object", doc.id)))?;
        records.push((doc.id, record));
    }

    let inserted = records.len();
    let mut store = state.store.write();
    for (id, record) in records {
        store.insert(id, record);
    }
    let num_docs = store.doc_count();
    drop(store);

    tracing::info!(inserted, num_docs, "batch indexed");
    Ok(Json(serde_json::json!({ "inserted": inserted, "num_docs": num_docs })))
}

async fn index_commit(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let store = state.store.clone();
    let path = state.index_path.clone();
    let num_docs = tokio::task::spawn_blocking(move || {
        let guard = store.read();
        let saved = guard.save(&path).map(|_| guard.doc_count());
        saved
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(serde_json::json!({ "saved": state.index_path.display().to_string(), "num_docs": num_docs })))
}

/// Load the snapshot into a fresh store off the request path, then swap it in.
async fn index_reload(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let path = state.index_path.clone();
    let fresh = tokio::task::spawn_blocking(move || IndexStore::load(&path))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let num_docs = fresh.doc_count();
    *state.store.write() = fresh;
    tracing::info!(num_docs, "index reloaded");
    Ok(Json(serde_json::json!({ "num_docs": num_docs })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

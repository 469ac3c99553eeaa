use anyhow::Result;
use axum::{extract::{Query as QueryParams, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use parking_lot::RwLock;
use search_core::persist::{load_index, load_scores, IndexPaths};
use search_core::{Engine, Hit, NoSynonyms, Query, QueryError, RankedHit, SynonymSource, SynonymTable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub ranked: bool,
}
fn default_mode() -> String { "AND".to_string() }

#[derive(Serialize)]
#[serde(untagged)]
pub enum Rows {
    Boolean(Vec<Hit>),
    Ranked(Vec<RankedHit>),
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: String,
    pub ranked: bool,
    pub took_s: f64,
    /// Matched documents, not counting biword or skip-path rows.
    pub total_hits: usize,
    pub results: Rows,
}

#[derive(Clone)]
pub struct AppState {
    pub index_root: PathBuf,
    /// Current snapshot. Reloads build a new engine and swap the pointer.
    pub engine: Arc<RwLock<Arc<Engine>>>,
    pub synonyms: Arc<dyn SynonymSource>,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn snapshot(&self) -> Arc<Engine> {
        self.engine.read().clone()
    }
}

/// Load index, optional TF-IDF table and attach the synonym source.
pub fn load_engine(root: &PathBuf, synonyms: Arc<dyn SynonymSource>) -> Result<Engine> {
    let paths = IndexPaths::new(root);
    let index = load_index(&paths)?;
    let mut engine = Engine::new(index).with_shared_synonyms(synonyms);
    match load_scores(&paths)? {
        Some(scores) => engine = engine.with_scores(scores),
        None => tracing::warn!(root = %root.display(), "no tf-idf table found, ranked search disabled"),
    }
    Ok(engine)
}

pub fn build_app(index_dir: String, synonyms_path: Option<String>) -> Result<Router> {
    let synonyms: Arc<dyn SynonymSource> = match synonyms_path {
        Some(path) => Arc::new(SynonymTable::load(path)?),
        None => Arc::new(NoSynonyms),
    };
    let index_root = PathBuf::from(&index_dir);
    let engine = load_engine(&index_root, synonyms.clone())?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let app_state = AppState { index_root, engine: Arc::new(RwLock::new(Arc::new(engine))), synonyms, admin_token };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let query = Query::parse(&params.q, &params.mode).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let engine = state.snapshot();

    let (total_hits, results) = if params.ranked {
        let rows = engine.rank(&query).map_err(|e| match e {
            QueryError::ScoresUnavailable => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
            QueryError::UnknownMode(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        })?;
        (rows.len(), Rows::Ranked(rows))
    } else {
        let rows = engine.search(&query);
        let hits = rows.iter().filter(|h| !h.biword && !h.skip_path).count();
        (hits, Rows::Boolean(rows))
    };

    Ok(Json(SearchResponse {
        query: params.q,
        mode: query.mode().to_string(),
        ranked: params.ranked,
        took_s: start.elapsed().as_secs_f64(),
        total_hits,
        results,
    }))
}

async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    // Readers keep the old snapshot until the new one is fully loaded.
    let engine = load_engine(&state.index_root, state.synonyms.clone()).map_err(|e| {
        tracing::error!(error = %e, "index reload failed, keeping previous snapshot");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("reload failed: {e}"))
    })?;
    let num_docs = engine.index().num_docs;
    *state.engine.write() = Arc::new(engine);
    tracing::info!(num_docs, "index snapshot swapped");
    Ok(Json(serde_json::json!({ "reloaded": true, "num_docs": num_docs })))
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

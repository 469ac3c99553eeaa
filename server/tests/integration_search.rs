use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use search_core::persist::{save_index, save_scores, IndexPaths, MetaFile};
use search_core::{Corpus, IndexBuilder, TfIdfTable, Tokenizer};
use serde_json::Value;
use std::path::Path;
use tempfile::tempdir;
use tower::ServiceExt;

fn write_index(dir: &Path, docs: &[(&str, &str)], with_scores: bool) {
    let tokenizer = Tokenizer::default();
    let mut corpus = Corpus::new();
    for (id, text) in docs {
        corpus.insert(*id, tokenizer.tokenize(text));
    }
    let index = IndexBuilder::new().build(&corpus);
    let paths = IndexPaths::new(dir);
    save_index(&paths, &index, &MetaFile::for_index(&index, "2024-01-01T00:00:00Z".into())).unwrap();
    if with_scores {
        save_scores(&paths, &TfIdfTable::build(&corpus, &index.inverted)).unwrap();
    }
}

const SCENARIO: &[(&str, &str)] = &[("D1", "cat sat mat"), ("D2", "dog sat log"), ("D3", "cat dog")];

async fn call(app: Router, method: Method, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header("X-ADMIN-TOKEN", t);
    }
    let resp = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::String(String::from_utf8_lossy(&body).into_owned()));
    (status, json)
}

fn primary_docs(json: &Value) -> Vec<String> {
    json["results"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| !r["biword"].as_bool().unwrap() && !r["skip_path"].as_bool().unwrap())
        .map(|r| r["doc_id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn boolean_search_returns_rows() {
    let dir = tempdir().unwrap();
    write_index(dir.path(), SCENARIO, true);
    let app = server::build_app(dir.path().to_string_lossy().to_string(), None).unwrap();

    let (status, json) = call(app.clone(), Method::GET, "/search?q=cat%20dog&mode=and", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["mode"], "AND");
    assert_eq!(json["total_hits"], 1);
    assert_eq!(primary_docs(&json), vec!["D3"]);
    let biword: Vec<&Value> = json["results"].as_array().unwrap().iter().filter(|r| r["biword"] == true).collect();
    assert_eq!(biword.len(), 1);
    assert_eq!(biword[0]["matched"], "cat dog");
    assert_eq!(biword[0]["query"], "cat dog");

    let (_, json) = call(app, Method::GET, "/search?q=Cat&mode=AND", None).await;
    assert_eq!(json["mode"], "OR");
    assert_eq!(primary_docs(&json), vec!["D1", "D3"]);
}

#[tokio::test]
async fn ranked_search_orders_by_score() {
    let dir = tempdir().unwrap();
    write_index(dir.path(), SCENARIO, true);
    let app = server::build_app(dir.path().to_string_lossy().to_string(), None).unwrap();

    let (status, json) = call(app, Method::GET, "/search?q=log%20cat&mode=OR&ranked=true", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = json["results"].as_array().unwrap().iter().map(|r| r["doc_id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["D2", "D1", "D3"]);
}

#[tokio::test]
async fn bad_mode_and_missing_scores_are_reported() {
    let dir = tempdir().unwrap();
    write_index(dir.path(), SCENARIO, false);
    let app = server::build_app(dir.path().to_string_lossy().to_string(), None).unwrap();

    let (status, _) = call(app.clone(), Method::GET, "/search?q=cat&mode=XOR", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(app.clone(), Method::GET, "/search?q=cat&ranked=true", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let (status, json) = call(app, Method::GET, "/search?q=cat", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(primary_docs(&json), vec!["D1", "D3"]);
}

#[tokio::test]
async fn synonyms_file_expands_queries() {
    let dir = tempdir().unwrap();
    write_index(dir.path(), SCENARIO, true);
    let syn_path = dir.path().join("synonyms.json");
    std::fs::write(&syn_path, r#"{"hound": [["hound", "dog"]]}"#).unwrap();
    let app = server::build_app(
        dir.path().to_string_lossy().to_string(),
        Some(syn_path.to_string_lossy().to_string()),
    )
    .unwrap();

    let (_, json) = call(app, Method::GET, "/search?q=hound", None).await;
    assert_eq!(primary_docs(&json), vec!["D2", "D3"]);
    assert_eq!(json["results"][0]["matched"], "dog");
}

#[tokio::test]
async fn reload_swaps_snapshot() {
    std::env::set_var("ADMIN_TOKEN", "secret");
    let dir = tempdir().unwrap();
    write_index(dir.path(), SCENARIO, true);
    let app = server::build_app(dir.path().to_string_lossy().to_string(), None).unwrap();

    let (status, _) = call(app.clone(), Method::POST, "/index/reload", Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    write_index(dir.path(), &[("D4", "bird cat")], true);
    let (_, json) = call(app.clone(), Method::GET, "/search?q=bird", None).await;
    assert_eq!(json["total_hits"], 0);

    let (status, json) = call(app.clone(), Method::POST, "/index/reload", Some("secret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 1);
    let (_, json) = call(app.clone(), Method::GET, "/search?q=bird", None).await;
    assert_eq!(primary_docs(&json), vec!["D4"]);

    // a broken artifact leaves the current snapshot in place
    std::fs::write(dir.path().join("inverted.bin"), b"garbage").unwrap();
    let (status, _) = call(app.clone(), Method::POST, "/index/reload", Some("secret")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let (_, json) = call(app, Method::GET, "/search?q=bird", None).await;
    assert_eq!(primary_docs(&json), vec!["D4"]);
}

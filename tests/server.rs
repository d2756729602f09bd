use context_ranker::cache::CorpusCache;
use context_ranker::config::parse_config;
use context_ranker::server::{router, AppState};
use context_ranker::source::StaticCorpusSource;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn export() -> String {
    let mut export = String::from(
        "# ICM Overview\nURL: /docs/cross-chain/icm\nICM is Interchain Messaging.\n\n",
    );
    for i in 0..20 {
        export.push_str(&format!(
            "# ICM Guide {i}\nURL: /docs/cross-chain/icm-guide-{i}\nSend icm messages, part {i}.\n\n"
        ));
    }
    export
}

/// Serve the router on an ephemeral port and return its base URL.
async fn spawn_server(config_text: &str) -> String {
    let config = parse_config(config_text, None).unwrap();
    let cache = CorpusCache::new(
        Box::new(StaticCorpusSource::new(export())),
        Duration::from_secs(3600),
        Duration::from_secs(60),
    );
    let state = AppState::new(Arc::new(cache), Arc::new(config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

const CONFIG: &str = "[corpus]\nfile = \"unused.txt\"\n[retrieval]\ncontext_limit = 3\n";

#[tokio::test]
async fn test_health() {
    let base = spawn_server(CONFIG).await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_status_before_and_after_load() {
    let base = spawn_server(CONFIG).await;
    let client = reqwest::Client::new();

    let status: Value = client
        .get(format!("{}/status", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["epoch"], 0);
    assert_eq!(status["documents"], 0);
    assert_eq!(status["source"], "static");

    client
        .post(format!("{}/search", base))
        .json(&json!({"query": "icm"}))
        .send()
        .await
        .unwrap();

    let status: Value = client
        .get(format!("{}/status", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["epoch"], 1);
    assert_eq!(status["documents"], 21);
    assert_eq!(status["indexed"], true);
    assert_eq!(status["fetch_attempts"], 1);
    assert!(status["built_at"].is_string());
}

#[tokio::test]
async fn test_search_returns_sorted_results() {
    let base = spawn_server(CONFIG).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/search", base))
        .json(&json!({"query": "what is icm", "explain": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    let results = body["results"].as_array().unwrap();
    assert!(!results.is_empty());
    assert!(results.len() <= 25);
    assert_eq!(results[0]["title"], "ICM Overview");
    assert!(results[0]["explain"]["total"].is_number());

    let scores: Vec<f64> = results.iter().map(|r| r["score"].as_f64().unwrap()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_search_limit() {
    let base = spawn_server(CONFIG).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/search", base))
        .json(&json!({"query": "icm", "limit": 2}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert!(body["results"][0].get("explain").is_none());

    let resp = client
        .post(format!("{}/search", base))
        .json(&json!({"query": "icm", "limit": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_invalid_body_is_bad_request() {
    let base = spawn_server(CONFIG).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/search", base))
        .json(&json!({"q": "icm"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_empty_query_is_empty_not_error() {
    let base = spawn_server(CONFIG).await;
    let body: Value = reqwest::Client::new()
        .post(format!("{}/search", base))
        .json(&json!({"query": "   "}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_context_splits_prompt_and_related() {
    let base = spawn_server(CONFIG).await;
    let body: Value = reqwest::Client::new()
        .post(format!("{}/context", base))
        .json(&json!({"query": "icm"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let context = body["context"].as_array().unwrap();
    let related = body["related"].as_array().unwrap();
    assert_eq!(context.len(), 3);
    assert!(!related.is_empty());
    assert!(related[0]["url"].is_string());
    assert!(related[0].get("content").is_none());
}

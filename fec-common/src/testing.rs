//! In-process FEC API double for integration tests
//!
//! Serves scripted envelopes on `127.0.0.1:<random>` with axum. Offset and
//! keyset routes answer from the request's own cursor, so the server is
//! stateless across runs; `Sequence` scripts replies by hit count.

use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use crate::api::{FecClient, RequestPolicy};
use crate::config::ApiKey;

/// API key accepted by `ApiKey::new`
pub const TEST_API_KEY: &str = "test-key-0123456789abcdef";

#[derive(Debug, Clone)]
pub enum MockRoute {
    /// `page=N` → `pages[N-1]`, with `pagination.pages = pages.len()`
    Offset(Vec<Vec<Value>>),
    /// No cursor → `pages[0]`; `last_index=k` → `pages[k]`
    Keyset(Vec<Vec<Value>>),
    /// Fixed status and body
    Json(u16, Value),
    /// Reply `n` (0-based hit count); the last entry repeats
    Sequence(Vec<MockRoute>),
}

impl MockRoute {
    /// One-page detail response
    pub fn detail(record: Value) -> Self {
        MockRoute::Json(200, json!({ "results": [record] }))
    }

    pub fn status(code: u16) -> Self {
        MockRoute::Json(code, json!({ "error": format!("status {}", code) }))
    }

    fn reply(&self, query: &HashMap<String, String>, hit: usize) -> (StatusCode, Value) {
        match self {
            MockRoute::Offset(pages) => {
                let page = query
                    .get("page")
                    .and_then(|p| p.parse::<usize>().ok())
                    .unwrap_or(1)
                    .max(1);
                let rows = pages.get(page - 1).cloned().unwrap_or_default();
                let count: usize = pages.iter().map(Vec::len).sum();
                (
                    StatusCode::OK,
                    json!({
                        "results": rows,
                        "pagination": {
                            "page": page,
                            "pages": pages.len(),
                            "per_page": 100,
                            "count": count
                        }
                    }),
                )
            }
            MockRoute::Keyset(pages) => {
                let index = query
                    .get("last_index")
                    .and_then(|p| p.parse::<usize>().ok())
                    .unwrap_or(0);
                let rows = pages.get(index).cloned().unwrap_or_default();
                let last_indexes = if index + 1 < pages.len() {
                    json!({
                        "last_index": (index + 1).to_string(),
                        "last_contribution_receipt_date": format!("2026-01-{:02}", (index % 28) + 1)
                    })
                } else {
                    Value::Null
                };
                (
                    StatusCode::OK,
                    json!({
                        "results": rows,
                        "pagination": { "per_page": 100, "last_indexes": last_indexes }
                    }),
                )
            }
            MockRoute::Json(code, body) => (
                StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                body.clone(),
            ),
            MockRoute::Sequence(steps) => match steps.get(hit).or_else(|| steps.last()) {
                Some(step) => step.reply(query, hit),
                None => (StatusCode::INTERNAL_SERVER_ERROR, json!({})),
            },
        }
    }
}

struct MockState {
    routes: HashMap<String, MockRoute>,
    hits: Mutex<Vec<(String, String)>>,
}

/// Running mock server; aborted on drop
pub struct MockFec {
    base_url: String,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockFec {
    pub async fn start<I, P>(routes: I) -> Self
    where
        I: IntoIterator<Item = (P, MockRoute)>,
        P: Into<String>,
    {
        let state = Arc::new(MockState {
            routes: routes.into_iter().map(|(p, r)| (p.into(), r)).collect(),
            hits: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(serve).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock FEC listener");
        let addr = listener.local_addr().expect("mock FEC local addr");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client pointed at this server with no delays and millisecond backoff
    pub fn client(&self) -> FecClient {
        self.client_with(fast_policy())
    }

    pub fn client_with(&self, policy: RequestPolicy) -> FecClient {
        let key = ApiKey::new(TEST_API_KEY).expect("test api key");
        FecClient::new(self.base_url.clone(), key, policy).expect("mock FEC client")
    }

    /// Requests seen so far as `(path, query)`
    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.hits.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn hit_count(&self, path: &str) -> usize {
        self.requests().iter().filter(|(p, _)| p == path).count()
    }
}

impl Drop for MockFec {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Zero delays, 1 ms backoff, 3 retries
pub fn fast_policy() -> RequestPolicy {
    use std::time::Duration;
    RequestPolicy {
        listing_delay: Duration::ZERO,
        itemized_delay: Duration::ZERO,
        max_retries: 3,
        backoff_base: Duration::from_millis(1),
        backoff_max: Duration::from_millis(4),
        timeout: Duration::from_secs(5),
    }
}

async fn serve(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let path = uri.path().to_string();
    let hit = {
        let mut hits = match state.hits.lock() {
            Ok(h) => h,
            Err(poisoned) => poisoned.into_inner(),
        };
        let previous = hits.iter().filter(|(p, _)| *p == path).count();
        hits.push((path.clone(), uri.query().unwrap_or_default().to_string()));
        previous
    };

    match state.routes.get(&path) {
        Some(route) => {
            let (status, body) = route.reply(&query, hit);
            (status, Json(body)).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "results": [] }))).into_response(),
    }
}

//! Test fixtures: a mock WordPress site with OAuth1 discovery, both token
//! endpoints, and one REST route, recording what each endpoint received.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct MockSite {
    pub base: String,
    seen: Arc<Mutex<HashMap<String, String>>>,
}

impl MockSite {
    /// What an endpoint received: `request` / `access` / `get` for the
    /// Authorization header, `get_query` for the REST query string.
    pub fn seen(&self, key: &str) -> String {
        self.seen
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, key: &str, value: String) {
        self.seen.lock().unwrap().insert(key.to_string(), value);
    }

    fn record_auth(&self, key: &str, headers: &HeaderMap) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        self.record(key, auth);
    }
}

async fn index(State(site): State<MockSite>) -> impl IntoResponse {
    let base = site.base;
    axum::Json(serde_json::json!({
        "name": "Mock Site",
        "url": base,
        "authentication": {
            "oauth1": {
                "request": format!("{base}/oauth1/request"),
                "authorize": format!("{base}/oauth1/authorize"),
                "access": format!("{base}/oauth1/access"),
                "version": "0.1",
            }
        }
    }))
}

async fn request_endpoint(State(site): State<MockSite>, headers: HeaderMap) -> impl IntoResponse {
    site.record_auth("request", &headers);
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )],
        "oauth_token=T&oauth_token_secret=RTS&oauth_callback_confirmed=true",
    )
}

async fn access_endpoint(State(site): State<MockSite>, headers: HeaderMap) -> impl IntoResponse {
    site.record_auth("access", &headers);
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )],
        "oauth_token=P&oauth_token_secret=S",
    )
}

async fn users_me(
    State(site): State<MockSite>,
    axum::extract::RawQuery(query): axum::extract::RawQuery,
    headers: HeaderMap,
) -> impl IntoResponse {
    site.record_auth("get", &headers);
    site.record("get_query", query.unwrap_or_default());
    axum::Json(serde_json::json!({
        "body": {"id": 1, "name": "debugger"},
        "status": 200,
        "headers": {"Allow": "GET"},
    }))
}

/// Bind an ephemeral port, serve the mock site, and return its handle.
pub async fn start_mock_site() -> MockSite {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let site = MockSite {
        base: format!("http://{addr}"),
        seen: Arc::new(Mutex::new(HashMap::new())),
    };

    let app = Router::new()
        .route("/wp-json/", get(index))
        .route("/oauth1/request", post(request_endpoint))
        .route("/oauth1/access", post(access_endpoint))
        .route("/wp-json/wp/v2/users/me", get(users_me))
        .with_state(site.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    site
}

//! OAuth1 endpoint set and REST-index discovery
//!
//! The WP-API OAuth1 plugin advertises its three endpoints in the site's
//! REST index under `authentication.oauth1`. Discovery is strict: a
//! reachable index without that block is an explicit error rather than a
//! guess at conventional paths — against a debugging tool, a wrong guess
//! just produces a confusing 404 two steps later.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::signature;

/// The three OAuth1 endpoints a site advertises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Request-token exchange endpoint
    pub request: String,
    /// User-facing authorization page
    pub authorize: String,
    /// Access-token exchange endpoint
    pub access: String,
}

impl Endpoints {
    /// The URL to send the user to after obtaining a request token.
    ///
    /// Discovered authorize URLs may already carry a query string (sites
    /// without pretty permalinks advertise `?oauth1=authorize`), so the
    /// token parameter joins with `&` in that case.
    pub fn authorize_url(&self, token_key: &str) -> String {
        let separator = if self.authorize.contains('?') { '&' } else { '?' };
        format!(
            "{}{}oauth_token={}",
            self.authorize,
            separator,
            signature::percent_encode(token_key)
        )
    }
}

/// Join a site root and a relative path into a REST URL.
///
/// `rest_url("https://example.com/", "wp/v2/users/me")` →
/// `https://example.com/wp-json/wp/v2/users/me`. An empty path yields the
/// REST index URL.
pub fn rest_url(root_url: &str, path: &str) -> String {
    let root = root_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        format!("{root}/wp-json/")
    } else {
        format!("{root}/wp-json/{path}")
    }
}

/// Fetch the REST index and read the advertised OAuth1 endpoints.
pub async fn discover(http: &reqwest::Client, root_url: &str) -> Result<Endpoints> {
    let index_url = rest_url(root_url, "");

    let response = http
        .get(&index_url)
        .send()
        .await
        .map_err(|e| Error::Http(format!("REST index request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Discovery(format!(
            "REST index at {index_url} returned {status}"
        )));
    }

    let index: serde_json::Value = response
        .json()
        .await
        .map_err(|e| Error::Discovery(format!("invalid REST index at {index_url}: {e}")))?;

    let oauth1 = index.pointer("/authentication/oauth1").ok_or_else(|| {
        Error::Discovery(format!(
            "{index_url} does not advertise OAuth1 authentication (is the OAuth1 plugin active?)"
        ))
    })?;

    let endpoints: Endpoints = serde_json::from_value(oauth1.clone())
        .map_err(|e| Error::Discovery(format!("malformed OAuth1 endpoint block: {e}")))?;

    debug!(
        request = %endpoints.request,
        authorize = %endpoints.authorize,
        access = %endpoints.access,
        "discovered OAuth1 endpoints"
    );

    Ok(endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_url_normalizes_slashes() {
        assert_eq!(
            rest_url("https://example.com/", "/wp/v2/posts"),
            "https://example.com/wp-json/wp/v2/posts"
        );
        assert_eq!(
            rest_url("https://example.com", "wp/v2/posts"),
            "https://example.com/wp-json/wp/v2/posts"
        );
        assert_eq!(rest_url("https://example.com/", ""), "https://example.com/wp-json/");
    }

    #[test]
    fn authorize_url_appends_token() {
        let endpoints = Endpoints {
            request: "https://example.com/oauth1/request".into(),
            authorize: "https://example.com/oauth1/authorize".into(),
            access: "https://example.com/oauth1/access".into(),
        };
        assert_eq!(
            endpoints.authorize_url("tok/1"),
            "https://example.com/oauth1/authorize?oauth_token=tok%2F1"
        );
    }

    #[test]
    fn authorize_url_joins_existing_query_with_ampersand() {
        let endpoints = Endpoints {
            request: "https://example.com/?oauth1=request".into(),
            authorize: "https://example.com/?oauth1=authorize".into(),
            access: "https://example.com/?oauth1=access".into(),
        };
        assert_eq!(
            endpoints.authorize_url("tok"),
            "https://example.com/?oauth1=authorize&oauth_token=tok"
        );
    }

    #[tokio::test]
    async fn discover_reads_advertised_endpoints() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base = format!("http://{addr}");
        let index_base = base.clone();

        tokio::spawn(async move {
            let app = axum::Router::new().route(
                "/wp-json/",
                axum::routing::get(move || {
                    let base = index_base.clone();
                    async move {
                        axum::Json(serde_json::json!({
                            "name": "Test Site",
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
                }),
            );
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let endpoints = discover(&reqwest::Client::new(), &base).await.unwrap();
        assert_eq!(endpoints.request, format!("{base}/oauth1/request"));
        assert_eq!(endpoints.access, format!("{base}/oauth1/access"));
    }

    #[tokio::test]
    async fn discover_rejects_index_without_oauth1_block() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base = format!("http://{addr}");

        tokio::spawn(async move {
            let app = axum::Router::new().route(
                "/wp-json/",
                axum::routing::get(|| async {
                    axum::Json(serde_json::json!({"name": "Plain Site", "authentication": {}}))
                }),
            );
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let err = discover(&reqwest::Client::new(), &base).await.unwrap_err();
        assert!(
            err.to_string().contains("OAuth1 plugin"),
            "error should name the missing plugin, got: {err}"
        );
    }

    #[tokio::test]
    async fn discover_surfaces_unreachable_site_as_http_error() {
        // Nothing listens on port 1
        let err = discover(&reqwest::Client::new(), "http://127.0.0.1:1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)), "got: {err:?}");
    }
}

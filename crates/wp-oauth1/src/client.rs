//! Stateful OAuth1 client handle
//!
//! One `Client` instance covers a whole three-legged flow: it is built
//! from the consumer credentials, holds the token pair obtained at each
//! exchange, and signs every request with whatever pair it currently
//! holds. The access-token exchange signs with the *request* token's
//! secret, so the same instance must survive from `request_token()` to
//! `access_token()` — rebuilding in between loses that secret.

use std::collections::HashMap;

use common::Secret;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::endpoints::{self, Endpoints, rest_url};
use crate::error::{Error, Result};
use crate::signature;

/// Consumer-side configuration for a client instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Site root URL, e.g. `https://example.com/`
    pub root_url: String,
    /// OAuth1 consumer key from the site's Applications screen
    pub client_key: String,
    /// OAuth1 consumer secret
    pub client_secret: Secret<String>,
    /// Callback the site redirects to after authorization
    pub callback_url: String,
}

/// A token credential pair: request token first, access token after the
/// verifier exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub key: String,
    pub secret: String,
}

/// Result of the request-token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestToken {
    pub key: String,
    pub secret: String,
    /// Authorization page URL to send the user to
    pub redirect_url: String,
}

/// The WP `_envelope=true` response shape: HTTP metadata bundled with the
/// body. Non-enveloped responses are wrapped into the same shape from the
/// actual HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: u16,
    #[serde(default)]
    pub headers: serde_json::Value,
    pub body: serde_json::Value,
}

/// OAuth1 client for one WordPress site.
pub struct Client {
    http: reqwest::Client,
    config: ClientConfig,
    endpoints: Option<Endpoints>,
    token: Option<TokenPair>,
}

impl Client {
    /// Build a client from consumer configuration. No I/O happens until
    /// the first exchange; endpoints are discovered lazily.
    pub fn new(http: reqwest::Client, config: ClientConfig) -> Self {
        Self {
            http,
            config,
            endpoints: None,
            token: None,
        }
    }

    /// Seed the held token pair, for reconstructing a client from a saved
    /// session that already progressed past step 1.
    pub fn with_token(mut self, token: TokenPair) -> Self {
        self.token = Some(token);
        self
    }

    /// The token pair the client currently signs with.
    pub fn token(&self) -> Option<&TokenPair> {
        self.token.as_ref()
    }

    /// Overwrite the held token's public half in place, keeping its
    /// secret. This is how the `oauth_token` from the authorization
    /// callback is injected before the access-token exchange.
    pub fn set_token_key(&mut self, key: &str) {
        match &mut self.token {
            Some(pair) => pair.key = key.to_string(),
            None => {
                self.token = Some(TokenPair {
                    key: key.to_string(),
                    secret: String::new(),
                })
            }
        }
    }

    /// Discover endpoints on first use; cached for the client's lifetime.
    async fn endpoints(&mut self) -> Result<Endpoints> {
        if let Some(endpoints) = &self.endpoints {
            return Ok(endpoints.clone());
        }
        let discovered = endpoints::discover(&self.http, &self.config.root_url).await?;
        self.endpoints = Some(discovered.clone());
        Ok(discovered)
    }

    /// Base oauth_* parameters shared by every signed request.
    fn oauth_params(&self) -> Vec<(String, String)> {
        vec![
            (
                "oauth_consumer_key".into(),
                self.config.client_key.clone(),
            ),
            ("oauth_nonce".into(), signature::generate_nonce()),
            ("oauth_signature_method".into(), "HMAC-SHA1".into()),
            (
                "oauth_timestamp".into(),
                signature::unix_timestamp().to_string(),
            ),
            ("oauth_version".into(), "1.0".into()),
        ]
    }

    /// Sign and POST to a token endpoint, parsing the form-encoded
    /// response into a parameter map.
    async fn token_exchange(
        &self,
        url: &str,
        mut oauth_params: Vec<(String, String)>,
        token_secret: Option<&str>,
    ) -> Result<HashMap<String, String>> {
        let base = signature::base_string("POST", url, &oauth_params);
        let key = signature::signing_key(self.config.client_secret.expose(), token_secret);
        oauth_params.push(("oauth_signature".into(), signature::sign(&base, &key)));

        let response = self
            .http
            .post(url)
            .header(
                reqwest::header::AUTHORIZATION,
                signature::authorization_header(&oauth_params),
            )
            .send()
            .await
            .map_err(|e| Error::Http(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(Error::TokenExchange(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::TokenExchange(format!("reading token response: {e}")))?;

        Ok(url::form_urlencoded::parse(text.as_bytes())
            .into_owned()
            .collect())
    }

    /// Pull a required parameter out of a token-endpoint response.
    fn required_param(params: &HashMap<String, String>, name: &str) -> Result<String> {
        params.get(name).cloned().ok_or_else(|| {
            Error::TokenExchange(format!("token response missing {name} parameter"))
        })
    }

    /// First leg: obtain a request token and the authorize-redirect URL.
    ///
    /// Stores the returned pair as the client's held token so the
    /// access-token exchange can sign with its secret.
    pub async fn request_token(&mut self) -> Result<RequestToken> {
        let endpoints = self.endpoints().await?;

        let mut params = self.oauth_params();
        params.push(("oauth_callback".into(), self.config.callback_url.clone()));

        let response = self.token_exchange(&endpoints.request, params, None).await?;
        let key = Self::required_param(&response, "oauth_token")?;
        let secret = Self::required_param(&response, "oauth_token_secret")?;

        self.token = Some(TokenPair {
            key: key.clone(),
            secret: secret.clone(),
        });

        info!(token = %key, "obtained request token");

        Ok(RequestToken {
            redirect_url: endpoints.authorize_url(&key),
            key,
            secret,
        })
    }

    /// Third leg: exchange the verifier for an access token, signing with
    /// the held request token. The new pair replaces the held token.
    pub async fn access_token(&mut self, verifier: &str) -> Result<TokenPair> {
        let held = self.token.clone().ok_or_else(|| {
            Error::TokenExchange("no token held — obtain a request token first".into())
        })?;
        let endpoints = self.endpoints().await?;

        let mut params = self.oauth_params();
        params.push(("oauth_token".into(), held.key.clone()));
        params.push(("oauth_verifier".into(), verifier.to_string()));

        let response = self
            .token_exchange(&endpoints.access, params, Some(&held.secret))
            .await?;
        let pair = TokenPair {
            key: Self::required_param(&response, "oauth_token")?,
            secret: Self::required_param(&response, "oauth_token_secret")?,
        };

        self.token = Some(pair.clone());
        info!(token = %pair.key, "obtained access token");

        Ok(pair)
    }

    /// Signed GET against the site's REST root plus `path`.
    ///
    /// With `envelope` set, `_envelope=true` is added and the enveloped
    /// JSON is returned as-is; otherwise (or when the server ignores the
    /// parameter) the envelope is synthesized from the HTTP response.
    pub async fn get(&self, path: &str, envelope: bool) -> Result<ResponseEnvelope> {
        let held = self.token.clone().ok_or_else(|| {
            Error::Request("no token held — complete the authorization flow first".into())
        })?;

        let (path_part, query) = match path.split_once('?') {
            Some((p, q)) => (p, q),
            None => (path, ""),
        };
        let url = rest_url(&self.config.root_url, path_part);

        let mut request_params: Vec<(String, String)> =
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect();
        if envelope {
            request_params.push(("_envelope".into(), "true".into()));
        }

        let mut oauth_params = self.oauth_params();
        oauth_params.push(("oauth_token".into(), held.key.clone()));

        let mut all_params = request_params.clone();
        all_params.extend(oauth_params.iter().cloned());

        let base = signature::base_string("GET", &url, &all_params);
        let key = signature::signing_key(self.config.client_secret.expose(), Some(&held.secret));
        oauth_params.push(("oauth_signature".into(), signature::sign(&base, &key)));

        debug!(%url, params = request_params.len(), "sending signed GET");

        let response = self
            .http
            .get(&url)
            .query(&request_params)
            .header(
                reqwest::header::AUTHORIZATION,
                signature::authorization_header(&oauth_params),
            )
            .send()
            .await
            .map_err(|e| Error::Http(format!("REST request failed: {e}")))?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Request(format!("reading REST response: {e}")))?;

        let value: serde_json::Value =
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text.clone()));

        if envelope && value.get("body").is_some() && value.get("status").is_some() {
            return serde_json::from_value(value)
                .map_err(|e| Error::Request(format!("invalid envelope response: {e}")));
        }

        if !status.is_success() {
            return Err(Error::Request(format!(
                "REST request returned {status}: {text}"
            )));
        }

        let mut header_map = serde_json::Map::new();
        for (name, val) in &headers {
            header_map.insert(
                name.to_string(),
                serde_json::Value::String(val.to_str().unwrap_or("").to_string()),
            );
        }

        Ok(ResponseEnvelope {
            status: status.as_u16(),
            headers: serde_json::Value::Object(header_map),
            body: value,
        })
    }
}

//! Flow controller
//!
//! `AuthFlowController` owns the session and the OAuth client handle and
//! exposes one operation per flow step. Step failures are stored on the
//! session (and surfaced by the page), never returned: the only errors a
//! caller sees are precondition violations and persistence failures.
//!
//! Client lifetime rules:
//! - rebuilt from the current configuration on every step-1 attempt, and
//!   once at startup when a saved session exists (seeded with the most
//!   advanced stored token);
//! - between step 1 and step 2 the same instance is mutated in place —
//!   the access-token exchange signs with the request token's secret,
//!   which only that instance holds.

use serde::Deserialize;
use tracing::{info, warn};
use wp_oauth1::{Client, ClientConfig, TokenPair};

use common::Secret;

use crate::session::{Session, SessionStore};

/// One of the four user-entered configuration fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigField {
    SiteUrl,
    ClientKey,
    ClientSecret,
    CallbackUrl,
}

/// Controller-level errors. Step failures are NOT here — they are stored
/// on the session per step.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("no request token yet — obtain one in step 1 first")]
    MissingRequestToken,

    #[error("no access token yet — complete step 2 first")]
    MissingAccessToken,

    #[error("failed to persist session: {0}")]
    Persist(#[from] common::Error),
}

/// Token and verifier extracted from the step-2 input.
#[derive(Debug, PartialEq, Eq)]
struct AuthorizationInput {
    token: Option<String>,
    verifier: Option<String>,
}

/// Parse the redirected URL (or bare verifier) the user pasted.
///
/// Input with a `?` is treated as a callback URL: the query string is
/// parsed and `oauth_token` / `oauth_verifier` extracted. Anything else
/// is taken as an out-of-band verifier and doubles as the token key.
/// Deliberately permissive — this is a paste field on a debugging tool,
/// not protocol validation.
fn parse_authorization_input(input: &str) -> AuthorizationInput {
    match input.split_once('?') {
        Some((_, query)) => {
            // Browsers sometimes keep a fragment on the callback URL
            let query = query.split('#').next().unwrap_or(query);
            let mut token = None;
            let mut verifier = None;
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                match key.as_ref() {
                    "oauth_token" => token = Some(value.into_owned()),
                    "oauth_verifier" => verifier = Some(value.into_owned()),
                    _ => {}
                }
            }
            AuthorizationInput { token, verifier }
        }
        None => AuthorizationInput {
            token: Some(input.to_string()),
            verifier: Some(input.to_string()),
        },
    }
}

/// Owns all flow state: the session, its store, and the client handle.
pub struct AuthFlowController {
    http: reqwest::Client,
    store: SessionStore,
    session: Session,
    client: Option<Client>,
}

impl AuthFlowController {
    /// Wrap a loaded session. If it carries configuration (i.e. it was
    /// restored rather than fresh), the OAuth client is reconstructed
    /// eagerly so step 2/3 keep working across a restart.
    pub fn new(http: reqwest::Client, store: SessionStore, session: Session) -> Self {
        let mut controller = Self {
            http,
            store,
            session,
            client: None,
        };
        if controller.session.has_configuration() {
            controller.rebuild_client();
            info!(
                stage = ?controller.session.stage(),
                "reconstructed OAuth client from saved session"
            );
        }
        controller
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Persist the current snapshot (also called by every mutating
    /// operation; this is for the final save at shutdown).
    pub async fn persist(&self) -> Result<(), FlowError> {
        self.store.save(&self.session).await?;
        Ok(())
    }

    /// Build a fresh client from the session's configuration, seeding it
    /// with the most advanced stored token.
    fn rebuild_client(&mut self) -> &mut Client {
        let mut client = Client::new(
            self.http.clone(),
            ClientConfig {
                root_url: self.session.site_url.clone(),
                client_key: self.session.client_key.clone(),
                client_secret: self.session.client_secret.clone(),
                callback_url: self.session.callback_url.clone(),
            },
        );
        if let Some(access) = &self.session.access_token {
            client = client.with_token(access.clone());
        } else if let Some(request) = &self.session.request_token {
            client = client.with_token(TokenPair {
                key: request.key.clone(),
                secret: request.secret.clone(),
            });
        }
        self.client.insert(client)
    }

    /// Store one configuration value. The client is not touched here; it
    /// is rebuilt at the next step-1 attempt.
    pub async fn update_configuration(
        &mut self,
        field: ConfigField,
        value: String,
    ) -> Result<(), FlowError> {
        match field {
            ConfigField::SiteUrl => self.session.site_url = value,
            ConfigField::ClientKey => self.session.client_key = value,
            ConfigField::ClientSecret => self.session.client_secret = Secret::new(value),
            ConfigField::CallbackUrl => self.session.callback_url = value,
        }
        self.store.save(&self.session).await?;
        Ok(())
    }

    /// Step 1: obtain a request token. Rebuilds the client from the
    /// current configuration, then stores either the token or the error.
    pub async fn request_request_token(&mut self) -> Result<(), FlowError> {
        self.session.request_token_error = None;

        let result = self.rebuild_client().request_token().await;
        match result {
            Ok(token) => {
                self.session.request_token = Some(token);
            }
            Err(e) => {
                warn!(error = %e, "request token exchange failed");
                self.session.request_token = None;
                self.session.request_token_error = Some(e.to_string());
            }
        }

        self.store.save(&self.session).await?;
        Ok(())
    }

    /// Step 2: exchange the pasted redirect (or bare verifier) for an
    /// access token, mutating the existing client's token key in place.
    pub async fn request_access_token(&mut self, input: &str) -> Result<(), FlowError> {
        if self.session.request_token.is_none() {
            return Err(FlowError::MissingRequestToken);
        }

        let input = input.trim();
        self.session.access_token_error = None;
        self.session.redirected_url = input.to_string();

        let parsed = parse_authorization_input(input);
        let Some(verifier) = parsed.verifier else {
            self.session.access_token = None;
            self.session.access_token_error =
                Some("redirected URL has no oauth_verifier parameter".into());
            self.store.save(&self.session).await?;
            return Ok(());
        };

        let client = self.client.as_mut().ok_or(FlowError::MissingRequestToken)?;
        if let Some(token_key) = parsed.token.as_deref() {
            client.set_token_key(token_key);
        }

        let result = client.access_token(&verifier).await;
        match result {
            Ok(pair) => {
                self.session.access_token = Some(pair);
            }
            Err(e) => {
                warn!(error = %e, "access token exchange failed");
                self.session.access_token = None;
                self.session.access_token_error = Some(e.to_string());
            }
        }

        self.store.save(&self.session).await?;
        Ok(())
    }

    /// Step 3: signed GET against the site's REST root, enveloped.
    pub async fn send_authenticated_request(&mut self, path: &str) -> Result<(), FlowError> {
        if self.session.access_token.is_none() {
            return Err(FlowError::MissingAccessToken);
        }

        let path = path.trim();
        self.session.request_error = None;
        self.session.endpoint_path = path.to_string();

        let client = self.client.as_ref().ok_or(FlowError::MissingAccessToken)?;
        let result = client.get(path, true).await;
        match result {
            Ok(envelope) => {
                self.session.response = Some(envelope);
            }
            Err(e) => {
                warn!(error = %e, "authenticated request failed");
                self.session.response = None;
                self.session.request_error = Some(e.to_string());
            }
        }

        self.store.save(&self.session).await?;
        Ok(())
    }
}

//! Flow session state and file persistence
//!
//! The `Session` is the whole of the tool's state: the user-entered
//! configuration plus each step's input and stored result-or-error. It is
//! one flat serde struct so a partial or older session file merges over
//! defaults on load. Credentials are persisted in plaintext on purpose —
//! this is a local debugging tool and the user needs to see exactly what
//! was exchanged.
//!
//! `SessionStore` persists the snapshot as a single JSON file. Writes are
//! atomic (temp file + rename) with 0600 permissions.

use std::path::{Path, PathBuf};

use common::{Result, Secret};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wp_oauth1::{RequestToken, ResponseEnvelope, TokenPair};

/// All state for one debugging session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    // Configuration (step 1 form)
    pub site_url: String,
    pub client_key: String,
    pub client_secret: Secret<String>,
    pub callback_url: String,

    // Step 1: request token
    pub request_token: Option<RequestToken>,
    pub request_token_error: Option<String>,

    // Step 2: access token
    pub redirected_url: String,
    pub access_token: Option<TokenPair>,
    pub access_token_error: Option<String>,

    // Step 3: authenticated request
    pub endpoint_path: String,
    pub response: Option<ResponseEnvelope>,
    pub request_error: Option<String>,
}

/// How far the flow has progressed. Derived from which results are
/// stored, which makes the forward-only ordering structural: a later
/// stage is unreachable without the earlier results existing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStage {
    Unconfigured,
    RequestTokenObtained,
    AccessTokenObtained,
    Authenticated,
}

impl Session {
    pub fn stage(&self) -> FlowStage {
        if self.access_token.is_some() && self.response.is_some() {
            FlowStage::Authenticated
        } else if self.access_token.is_some() {
            FlowStage::AccessTokenObtained
        } else if self.request_token.is_some() {
            FlowStage::RequestTokenObtained
        } else {
            FlowStage::Unconfigured
        }
    }

    /// Whether the user has entered any configuration worth rebuilding a
    /// client for (a fresh session has nothing to reconstruct).
    pub fn has_configuration(&self) -> bool {
        !self.site_url.is_empty()
    }
}

/// Session file manager. One session per file, whole-snapshot writes.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the session from disk.
    ///
    /// A missing file is a cold start: the default session is written out
    /// so future loads take the normal path. A file that exists but does
    /// not parse is an error — silently discarding a session mid-flow
    /// would lose a request token the user may be about to authorize.
    pub async fn load(&self) -> Result<Session> {
        if self.path.exists() {
            let contents = tokio::fs::read_to_string(&self.path).await?;
            let session: Session = serde_json::from_str(&contents)?;
            info!(path = %self.path.display(), stage = ?session.stage(), "loaded session");
            Ok(session)
        } else {
            info!(path = %self.path.display(), "no session file, starting fresh");
            let session = Session::default();
            self.save(&session).await?;
            Ok(session)
        }
    }

    /// Persist the session snapshot atomically.
    pub async fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;

        let dir = self.path.parent().ok_or_else(|| {
            common::Error::Config("session path has no parent directory".into())
        })?;
        let tmp_path = dir.join(format!(".wp-oauth-session.tmp.{}", std::process::id()));

        tokio::fs::write(&tmp_path, json.as_bytes()).await?;

        // 0600: the file holds the client secret and tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&tmp_path, perms).await?;
        }

        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!(path = %self.path.display(), "persisted session");
        Ok(())
    }
}

//! Error types for OAuth1 client operations
//!
//! Every variant's Display output is what the debugger shows the user for
//! a failed step, so messages carry the upstream status and body verbatim.

/// Errors from OAuth1 client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("endpoint discovery failed: {0}")]
    Discovery(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("REST request failed: {0}")]
    Request(String),
}

/// Result alias for OAuth1 operations.
pub type Result<T> = std::result::Result<T, Error>;

//! OAuth 1.0a client for the WordPress REST API
//!
//! Implements the three-legged flow against a site running the WP-API
//! OAuth1 server plugin: endpoint discovery from the REST index, the
//! request-token and access-token exchanges, and signed GET requests to
//! REST routes. Signing is HMAC-SHA1 per RFC 5849 (the only method the
//! plugin accepts); protocol parameters travel in the `Authorization`
//! header.
//!
//! Flow:
//! 1. `Client::new()` with the consumer credentials and callback URL
//! 2. `Client::request_token()` — discovers endpoints, returns the token
//!    and the authorize-redirect URL for the user to visit
//! 3. `Client::set_token_key()` with the `oauth_token` from the callback
//! 4. `Client::access_token()` with the `oauth_verifier`
//! 5. `Client::get()` for authenticated REST requests

pub mod client;
pub mod endpoints;
pub mod error;
pub mod signature;

pub use client::{Client, ClientConfig, RequestToken, ResponseEnvelope, TokenPair};
pub use endpoints::{Endpoints, discover, rest_url};
pub use error::{Error, Result};

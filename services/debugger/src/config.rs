//! Configuration loading
//!
//! Path precedence: `--config` CLI flag > `CONFIG_PATH` env var > the
//! default `wp-oauth-debugger.toml`. Unlike a deployed service, the tool
//! must run with zero setup, so only an explicitly named file is required
//! to exist — a missing default file just means defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default config file looked for in the working directory
const DEFAULT_CONFIG_FILE: &str = "wp-oauth-debugger.toml";

/// Tool configuration
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the debugger page and API listen on
    pub listen_addr: SocketAddr,
    /// Where the session snapshot is persisted
    pub session_path: PathBuf,
    /// Timeout for outbound requests to the WordPress site
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8920".parse().expect("static default address"),
            session_path: PathBuf::from("wp-oauth-session.json"),
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Resolve and load configuration with the documented precedence.
    pub fn resolve(cli_path: Option<&str>) -> common::Result<Self> {
        if let Some(path) = Self::explicit_path(cli_path) {
            return Self::load(&path);
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::load(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// A path named explicitly via CLI or env, if any. CLI wins.
    fn explicit_path(cli_path: Option<&str>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(PathBuf::from(p));
        }
        std::env::var("CONFIG_PATH").ok().map(PathBuf::from)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(common::Error::Config(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

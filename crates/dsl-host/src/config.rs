//! Host configuration: an optional TOML file, then environment overrides.
//!
//! ```toml
//! [http]
//! timeout_ms = 5000
//! user_agent = "dsl-run/0.1"
//! ```

use crate::error::HostError;
use serde::Deserialize;
use std::path::Path;

pub const ENV_HTTP_TIMEOUT_MS: &str = "DSL_HTTP_TIMEOUT_MS";
pub const ENV_HTTP_USER_AGENT: &str = "DSL_HTTP_USER_AGENT";

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Applies to connect, read and write separately.
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_ms: 30_000,
            user_agent: concat!("dsl-host/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HostConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, HostError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads `path` when given (defaults otherwise) and applies the process
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, HostError> {
        let config = match path {
            Some(path) => {
                let text =
                    std::fs::read_to_string(path).map_err(|err| HostError::io(path, err))?;
                HostConfig::from_toml_str(&text)?
            }
            None => HostConfig::default(),
        };
        config.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies `DSL_HTTP_*` overrides read through `lookup`.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, HostError> {
        if let Some(raw) = lookup(ENV_HTTP_TIMEOUT_MS) {
            self.http.timeout_ms = raw.trim().parse().map_err(|_| {
                HostError::Config(format!("{ENV_HTTP_TIMEOUT_MS} must be an integer, got {raw:?}"))
            })?;
        }
        if let Some(agent) = lookup(ENV_HTTP_USER_AGENT) {
            self.http.user_agent = agent;
        }
        if self.http.timeout_ms == 0 {
            return Err(HostError::Config("http.timeout_ms must be positive".into()));
        }
        Ok(self)
    }
}

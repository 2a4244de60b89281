//! Gateway construction parameters.

use std::path::PathBuf;
use std::time::Duration;

use outlay_types::env_utils::{env_string_or, env_var_or};
use outlay_types::Fault;

/// Everything needed to construct the remote clients.
///
/// Built explicitly and passed in at construction; there is no ambient
/// global client. `from_env` is a convenience for the CLI.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Service base URL, e.g. `https://abc123.example-backend.co`.
    pub endpoint: String,
    /// Public API key sent with every request.
    pub api_key: String,
    /// Overall per-request timeout.
    pub timeout: Duration,
    /// Connection-establishment timeout.
    pub connect_timeout: Duration,
    /// Where to persist the auth session, if anywhere.
    pub session_file: Option<PathBuf>,
}

impl GatewayConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

    /// Config with default timeouts and no session persistence.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(Self::DEFAULT_CONNECT_TIMEOUT_SECS),
            session_file: None,
        }
    }

    /// Read config from `OUTLAY_ENDPOINT` / `OUTLAY_API_KEY`, with optional
    /// `OUTLAY_HTTP_TIMEOUT_SECS` / `OUTLAY_CONNECT_TIMEOUT_SECS` overrides.
    pub fn from_env() -> Result<Self, Fault> {
        let endpoint = env_string_or("OUTLAY_ENDPOINT", "");
        if endpoint.trim().is_empty() {
            return Err(Fault::validation("OUTLAY_ENDPOINT is not set"));
        }
        let api_key = env_string_or("OUTLAY_API_KEY", "");
        if api_key.trim().is_empty() {
            return Err(Fault::validation("OUTLAY_API_KEY is not set"));
        }
        Ok(Self {
            endpoint,
            api_key,
            timeout: Duration::from_secs(env_var_or(
                "OUTLAY_HTTP_TIMEOUT_SECS",
                Self::DEFAULT_TIMEOUT_SECS,
            )),
            connect_timeout: Duration::from_secs(env_var_or(
                "OUTLAY_CONNECT_TIMEOUT_SECS",
                Self::DEFAULT_CONNECT_TIMEOUT_SECS,
            )),
            session_file: None,
        })
    }

    /// Persist the auth session at the given path.
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    /// The base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    pub(crate) fn build_agent(&self) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout(self.timeout)
            .timeout_connect(self.connect_timeout)
            .build()
    }
}

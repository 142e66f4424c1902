//! Client configuration
//!
//! Every setting can be passed explicitly through [`ClientConfigBuilder`];
//! unset ones fall back to environment variables, then to defaults.

use std::env;
use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::http::HttpRetry;

/// Default API root URL
pub const API_HOST: &str = "https://api.deepomatic.com";

/// Default API version
pub const API_VERSION: &str = "0.7";

pub const ENV_API_URL: &str = "DEEPOMATIC_API_URL";
pub const ENV_API_KEY: &str = "DEEPOMATIC_API_KEY";
pub const ENV_APP_ID: &str = "DEEPOMATIC_APP_ID";
pub const ENV_VERIFY_TLS: &str = "DEEPOMATIC_API_VERIFY_TLS";

/// Per-request timeout presets
pub struct RequestTimeout;

impl RequestTimeout {
    pub const FAST: Duration = Duration::from_secs(8);
    pub const MEDIUM: Duration = Duration::from_secs(60);
    pub const SLOW: Duration = Duration::from_secs(600);
}

/// Resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root URL, always ending with `/`
    pub host: String,
    /// Version path segment (`v0.7`), empty for none
    pub version: String,
    pub api_key: String,
    pub app_id: Option<String>,
    pub verify_tls: bool,
    pub user_agent: String,
    /// Validate create/update arguments against resource templates
    pub check_query_parameters: bool,
    /// Idle connections kept per host
    pub pool_max_idle: usize,
    /// Timeout of a single HTTP request
    pub request_timeout: Duration,
    /// Transport-level retry, `None` to disable
    pub http_retry: Option<HttpRetry>,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        Self::builder().build()
    }

    /// Prefix prepended to relative resource paths
    pub fn resource_prefix(&self) -> String {
        format!("{}{}", self.host, self.version)
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    host: Option<String>,
    version: Option<String>,
    api_key: Option<String>,
    app_id: Option<String>,
    verify_tls: Option<bool>,
    user_agent_prefix: Option<String>,
    check_query_parameters: Option<bool>,
    pool_max_idle: Option<usize>,
    request_timeout: Option<Duration>,
    http_retry: Option<Option<HttpRetry>>,
}

impl ClientConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// API version, numeric (`0.7`) or textual (`"v0.7"`, `""` for none)
    pub fn version(mut self, version: impl fmt::Display) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = Some(verify);
        self
    }

    /// Identify the calling application, e.g. `my-app/1.0.0`
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    pub fn check_query_parameters(mut self, check: bool) -> Self {
        self.check_query_parameters = Some(check);
        self
    }

    pub fn pool_max_idle(mut self, size: usize) -> Self {
        self.pool_max_idle = Some(size);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Transport-level retry; `None` disables it
    pub fn http_retry(mut self, retry: Option<HttpRetry>) -> Self {
        self.http_retry = Some(retry);
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let host = self
            .host
            .or_else(|| env_var(ENV_API_URL))
            .unwrap_or_else(|| API_HOST.to_string());
        let host = normalize_host(&host)?;

        let api_key = self
            .api_key
            .or_else(|| env_var(ENV_API_KEY))
            .ok_or(Error::MissingCredentials)?;
        let app_id = self
            .app_id
            .or_else(|| env_var(ENV_APP_ID))
            .filter(|id| !id.is_empty());
        let verify_tls = self
            .verify_tls
            .unwrap_or_else(|| env_var(ENV_VERIFY_TLS).map_or(true, |v| v == "1"));

        let version = format_version(self.version.as_deref().unwrap_or(API_VERSION));

        Ok(ClientConfig {
            host,
            version,
            api_key,
            app_id,
            verify_tls,
            user_agent: user_agent(self.user_agent_prefix.as_deref()),
            check_query_parameters: self.check_query_parameters.unwrap_or(true),
            pool_max_idle: self.pool_max_idle.unwrap_or(20),
            request_timeout: self.request_timeout.unwrap_or(RequestTimeout::FAST),
            http_retry: self.http_retry.unwrap_or_else(|| Some(HttpRetry::default())),
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok()
}

/// `0.7` becomes `v0.7`, a leading `v` is kept, empty stays empty
pub fn format_version(version: &str) -> String {
    let version = version.trim();
    if version.is_empty() || version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{}", version)
    }
}

fn normalize_host(host: &str) -> Result<String> {
    let url = Url::parse(host).map_err(|e| Error::Config(format!("invalid host '{}': {}", host, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "host '{}' must use http or https",
            host
        )));
    }
    let mut host = host.to_string();
    if !host.ends_with('/') {
        host.push('/');
    }
    Ok(host)
}

fn user_agent(prefix: Option<&str>) -> String {
    let mut parts = Vec::with_capacity(4);
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        parts.push(prefix.to_string());
    }
    parts.push(format!(
        "deepomatic-rust-client/{}",
        env!("CARGO_PKG_VERSION")
    ));
    parts.push("reqwest".to_string());
    parts.push(format!("rust/{}-{}", env::consts::OS, env::consts::ARCH));
    parts.join(" ")
}

//! HTTP helper
//!
//! Wraps a blocking `reqwest` client with the API's authentication headers,
//! URL prefixing, status mapping and the transport-level retry policy.

mod params;
mod retry;

pub use params::{format_params, QueryParams};
pub use retry::{HttpRetry, RETRY_STATUS_CODES};

use std::time::Duration;

use deepomatic_core::retry::{
    RetryError, RetryExecutorBuilder, RetryIfTransient, RetryPredicateExt, StatusCode,
    TracingObserver,
};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, HttpError};

/// Decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// `204 No Content`
    Empty,
    Json(Value),
    Bytes { content_type: String, data: Vec<u8> },
}

impl Body {
    /// The JSON document, `null` for an empty body
    pub fn into_json(self) -> Result<Value, HttpError> {
        match self {
            Body::Json(value) => Ok(value),
            Body::Empty => Ok(Value::Null),
            Body::Bytes { content_type, .. } => Err(HttpError::NotJson { content_type }),
        }
    }
}

/// Transport retry used by one request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RetrySetting {
    /// The client's configured retry
    #[default]
    Inherit,
    Disabled,
    Custom(HttpRetry),
}

/// Per-request overrides of the client configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub retry: RetrySetting,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn without_retry(mut self) -> Self {
        self.retry = RetrySetting::Disabled;
        self
    }

    pub fn with_retry(mut self, retry: HttpRetry) -> Self {
        self.retry = RetrySetting::Custom(retry);
        self
    }
}

/// Response wrapper exposing its status to retry predicates
struct RawResponse(Response);

impl StatusCode for RawResponse {
    fn status_code(&self) -> u16 {
        self.0.status().as_u16()
    }
}

/// Blocking HTTP helper shared by every resource
#[derive(Debug, Clone)]
pub struct HttpHelper {
    client: Client,
    config: ClientConfig,
}

impl HttpHelper {
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .default_headers(default_headers(&config)?)
            .danger_accept_invalid_certs(!config.verify_tls)
            .pool_max_idle_per_host(config.pool_max_idle)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether create/update arguments are checked against templates
    pub fn check_query_parameters(&self) -> bool {
        self.config.check_query_parameters
    }

    /// Absolute URL of a resource path; absolute URLs are kept as-is
    pub fn url(&self, resource: &str) -> Result<Url, HttpError> {
        if resource.starts_with("http://") || resource.starts_with("https://") {
            return Ok(Url::parse(resource)?);
        }
        let path = resource.trim_start_matches('/');
        let full = if self.config.version.is_empty() {
            format!("{}{}", self.config.host, path)
        } else {
            format!("{}/{}", self.config.resource_prefix(), path)
        };
        Ok(Url::parse(&full)?)
    }

    pub fn get(&self, resource: &str, params: &Map<String, Value>) -> Result<Body, HttpError> {
        self.request(
            Method::GET,
            resource,
            &format_params(params),
            None,
            &RequestOptions::default(),
        )
    }

    pub fn post(
        &self,
        resource: &str,
        data: &Value,
        options: &RequestOptions,
    ) -> Result<Body, HttpError> {
        self.request(Method::POST, resource, &Vec::new(), Some(data), options)
    }

    pub fn put(&self, resource: &str, data: &Value) -> Result<Body, HttpError> {
        self.request(
            Method::PUT,
            resource,
            &Vec::new(),
            Some(data),
            &RequestOptions::default(),
        )
    }

    pub fn patch(&self, resource: &str, data: &Value) -> Result<Body, HttpError> {
        self.request(
            Method::PATCH,
            resource,
            &Vec::new(),
            Some(data),
            &RequestOptions::default(),
        )
    }

    pub fn delete(&self, resource: &str) -> Result<Body, HttpError> {
        self.request(
            Method::DELETE,
            resource,
            &Vec::new(),
            None,
            &RequestOptions::default(),
        )
    }

    /// Send a request and decode its response
    ///
    /// `204` yields [`Body::Empty`]; other non-2xx statuses are mapped to
    /// client, server or bad-status errors. JSON responses are decoded, any
    /// other content is returned as bytes.
    pub fn request(
        &self,
        method: Method,
        resource: &str,
        params: &QueryParams,
        data: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Body, HttpError> {
        let url = self.url(resource)?;
        let timeout = options.timeout.unwrap_or(self.config.request_timeout);

        let send = || -> Result<RawResponse, HttpError> {
            debug!(method = %method, url = %url, "sending request");
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .query(params)
                .timeout(timeout);
            if let Some(data) = data {
                request = request.header(ACCEPT, "application/json").json(data);
            }
            Ok(RawResponse(request.send()?))
        };

        let retry = match &options.retry {
            RetrySetting::Inherit => self.config.http_retry.as_ref(),
            RetrySetting::Disabled => None,
            RetrySetting::Custom(retry) => Some(retry),
        };
        let response = match retry {
            Some(retry) => send_with_retry(retry, &format!("{} {}", method, url.path()), send)?,
            None => send()?.0,
        };

        read_body(response)
    }
}

fn send_with_retry<F>(retry: &HttpRetry, operation: &str, send: F) -> Result<Response, HttpError>
where
    F: FnMut() -> Result<RawResponse, HttpError>,
{
    let executor = RetryExecutorBuilder::new(retry.policy.clone())
        .with_predicate(retry.status_predicate().or(RetryIfTransient))
        .with_observer(TracingObserver::new(operation))
        .build();

    match executor.execute(send) {
        Ok(response) => Ok(response.0),
        Err(RetryError::NonRetryable(err)) => Err(err),
        Err(RetryError::Timeout { attempts, last, .. }) => {
            let source = match last.outcome {
                Ok(response) => status_error(response.0),
                Err(err) => err,
            };
            Err(HttpError::RetryExhausted {
                attempts,
                source: Box::new(source),
            })
        }
    }
}

fn default_headers(config: &ClientConfig) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header_value("User-Agent", &config.user_agent)?);
    headers.insert("X-API-KEY", header_value("X-API-KEY", &config.api_key)?);
    if let Some(app_id) = &config.app_id {
        headers.insert("X-APP-ID", header_value("X-APP-ID", app_id)?);
    }
    Ok(headers)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::Config(format!("invalid {} header: {}", name, e)))
}

fn read_body(response: Response) -> Result<Body, HttpError> {
    let status = response.status();
    if status == reqwest::StatusCode::NO_CONTENT {
        return Ok(Body::Empty);
    }
    if !status.is_success() {
        return Err(status_error(response));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let data = response.bytes()?;
    if content_type.contains("application/json") {
        Ok(Body::Json(serde_json::from_slice(&data)?))
    } else {
        Ok(Body::Bytes {
            content_type,
            data: data.to_vec(),
        })
    }
}

fn status_error(response: Response) -> HttpError {
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    HttpError::from_status(status, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helper(version: &str) -> HttpHelper {
        let config = ClientConfig::builder()
            .api_key("test-key")
            .app_id("42")
            .host("http://localhost:8000")
            .version(version)
            .build()
            .unwrap();
        HttpHelper::new(config).unwrap()
    }

    #[test]
    fn test_url_prefixing() {
        let helper = helper("0.7");
        assert_eq!(
            helper.url("/networks/12/").unwrap().as_str(),
            "http://localhost:8000/v0.7/networks/12/"
        );
        assert_eq!(
            helper.url("tasks/").unwrap().as_str(),
            "http://localhost:8000/v0.7/tasks/"
        );
    }

    #[test]
    fn test_url_without_version() {
        let helper = helper("");
        assert_eq!(
            helper.url("/tasks/1/").unwrap().as_str(),
            "http://localhost:8000/tasks/1/"
        );
    }

    #[test]
    fn test_absolute_url_is_kept() {
        let helper = helper("0.7");
        let next = "http://localhost:8000/v0.7/networks/?offset=100&limit=100";
        assert_eq!(helper.url(next).unwrap().as_str(), next);
    }

    #[test]
    fn test_default_headers() {
        let helper = helper("0.7");
        let headers = default_headers(helper.config()).unwrap();
        assert_eq!(headers["X-API-KEY"], "test-key");
        assert_eq!(headers["X-APP-ID"], "42");
        assert!(headers[USER_AGENT]
            .to_str()
            .unwrap()
            .contains("deepomatic-rust-client/"));
    }

    #[test]
    fn test_invalid_header_value() {
        let mut config = helper("0.7").config().clone();
        config.api_key = "bad\nkey".to_string();
        assert!(matches!(HttpHelper::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_body_into_json() {
        assert_eq!(Body::Empty.into_json().unwrap(), Value::Null);
        assert!(matches!(
            Body::Bytes {
                content_type: "image/png".into(),
                data: vec![1, 2]
            }
            .into_json(),
            Err(HttpError::NotJson { .. })
        ));
    }

    #[test]
    fn test_request_options() {
        let options = RequestOptions::new()
            .with_timeout(Duration::from_secs(600))
            .without_retry();
        assert_eq!(options.timeout, Some(Duration::from_secs(600)));
        assert_eq!(options.retry, RetrySetting::Disabled);
    }
}

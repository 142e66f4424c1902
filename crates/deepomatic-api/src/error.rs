//! Error types for deepomatic-api

use deepomatic_core::retry::TransientError;
use deepomatic_core::task::TaskError;
use thiserror::Error;

/// Result type alias using deepomatic-api's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of one HTTP exchange with the API
#[derive(Error, Debug)]
pub enum HttpError {
    /// 4xx: the request was rejected
    #[error("Client error {status} with body {body}")]
    ClientError { status: u16, body: String },

    /// 5xx: the server could not handle a valid request
    #[error("Server error {status} with body {body}")]
    ServerError { status: u16, body: String },

    /// Any other non-2xx status
    #[error("Bad status code {status} with body {body}")]
    BadStatus { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A JSON document was expected but the response had another content type
    #[error("Expected a JSON response, got {content_type}")]
    NotJson { content_type: String },

    /// The HTTP retry policy gave up
    #[error("HTTP retry gave up after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: u32,
        source: Box<HttpError>,
    },
}

impl HttpError {
    /// Classify a non-2xx status
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            400..=499 => HttpError::ClientError { status, body },
            500..=599 => HttpError::ServerError { status, body },
            _ => HttpError::BadStatus { status, body },
        }
    }

    /// HTTP status of a status error, looking through retry exhaustion
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::ClientError { status, .. }
            | HttpError::ServerError { status, .. }
            | HttpError::BadStatus { status, .. } => Some(*status),
            HttpError::RetryExhausted { source, .. } => source.status(),
            HttpError::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl TransientError for HttpError {
    /// Server errors, exhausted HTTP retries, and connection or timeout
    /// failures are worth another try. Client errors, malformed requests,
    /// redirect loops and undecodable bodies are not.
    fn is_transient(&self) -> bool {
        match self {
            HttpError::ServerError { .. } | HttpError::RetryExhausted { .. } => true,
            HttpError::Request(err) => !(err.is_builder() || err.is_redirect() || err.is_decode()),
            HttpError::ClientError { .. }
            | HttpError::BadStatus { .. }
            | HttpError::Json(_)
            | HttpError::Url(_)
            | HttpError::NotJson { .. } => false,
        }
    }
}

/// API client errors
#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "Please specify 'api_key' either by passing it to the client \
         or by defining the DEEPOMATIC_API_KEY environment variable"
    )]
    MissingCredentials,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unexpected keyword argument: {0}")]
    UnexpectedArgument(String),

    #[error("Missing keyword argument: {0}")]
    MissingArgument(String),

    #[error("Immutable keyword argument: {0}")]
    ImmutableArgument(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A response lacked a field the client relies on
    #[error("Missing field '{0}' in response")]
    MissingField(String),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Task(#[from] TaskError<HttpError>),
}

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(HttpError::Request(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Http(HttpError::Json(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(
            HttpError::from_status(404, "not found"),
            HttpError::ClientError { status: 404, .. }
        ));
        assert!(matches!(
            HttpError::from_status(503, ""),
            HttpError::ServerError { status: 503, .. }
        ));
        assert!(matches!(
            HttpError::from_status(302, ""),
            HttpError::BadStatus { status: 302, .. }
        ));
    }

    #[test]
    fn test_transient_classification() {
        assert!(HttpError::from_status(500, "").is_transient());
        assert!(!HttpError::from_status(400, "").is_transient());
        assert!(!HttpError::from_status(301, "").is_transient());
        assert!(!HttpError::NotJson {
            content_type: "text/html".into()
        }
        .is_transient());

        let exhausted = HttpError::RetryExhausted {
            attempts: 4,
            source: Box::new(HttpError::from_status(502, "bad gateway")),
        };
        assert!(exhausted.is_transient());
        assert_eq!(exhausted.status(), Some(502));
    }

    #[test]
    fn test_display() {
        let err = HttpError::from_status(403, "{\"error\":\"forbidden\"}");
        assert_eq!(
            err.to_string(),
            "Client error 403 with body {\"error\":\"forbidden\"}"
        );

        let err = Error::UnexpectedArgument("colour".into());
        assert_eq!(err.to_string(), "Unexpected keyword argument: colour");
    }

    #[test]
    fn test_missing_credentials_message() {
        assert!(Error::MissingCredentials
            .to_string()
            .contains("DEEPOMATIC_API_KEY"));
    }
}

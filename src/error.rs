// error.rs

use reqwest::StatusCode;
use std::fmt;

/// Main error type for Arkime client operations
#[derive(Debug, Clone)]
pub enum ArkimeError {
    /// Request options carried no url
    MissingUrl,
    /// Parse URL failed
    InvalidUrl(String),
    /// HTTP status outside [200, 300) with the server supplied message
    RequestFailed { status: StatusCode, message: String },
    /// Server reported a query build (bsq) error inside a successful response
    QueryBuild(String),
    /// Caller cancelled the request through its signal
    Cancelled,
    /// Network/connection error (e.g., timeout, DNS failure)
    ConnectionError(String),
    /// JSON or data serialization/deserialization error
    SerializationError(String),
    /// Invalid configuration
    ConfigurationError(String),
    /// File not found (e.g., CA cert file)
    FileNotFound(String),
    /// Generic IO error wrapper
    IoError(String),
    /// Generic error (use sparingly)
    Other(String),
}

impl ArkimeError {
    /// The human-readable message surfaced to callers.
    ///
    /// For server-side failures this is the server text alone, without any prefix.
    pub fn message(&self) -> String {
        match self {
            Self::RequestFailed { message, .. } => message.clone(),
            Self::QueryBuild(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status of a failed request, if the failure came from the server
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ArkimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUrl => write!(f, "Missing url in request options"),
            Self::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            Self::RequestFailed { status, message } => {
                write!(f, "HTTP request failed with status {}: {}", status, message)
            }
            Self::QueryBuild(msg) => write!(f, "Query build error: {}", msg),
            Self::Cancelled => write!(f, "Request cancelled"),
            Self::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            Self::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Self::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            Self::FileNotFound(msg) => write!(f, "File not found: {}", msg),
            Self::IoError(msg) => write!(f, "IO error: {}", msg),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ArkimeError {}

// Conversion implementations
impl From<url::ParseError> for ArkimeError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}

impl From<reqwest::Error> for ArkimeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            Self::ConnectionError(err.to_string())
        } else if let Some(status) = err.status() {
            Self::RequestFailed { status, message: err.to_string() }
        } else if err.is_builder() {
            Self::ConfigurationError(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

impl From<std::io::Error> for ArkimeError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound(err.to_string()),
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::TimedOut => Self::ConnectionError(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ArkimeError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<http::Error> for ArkimeError {
    fn from(err: http::Error) -> Self {
        Self::Other(err.to_string())
    }
}

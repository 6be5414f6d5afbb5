//! Relay error taxonomy and its HTTP mapping.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Payload-free tag for each relay error, used for logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingOrigin,
    MissingQuery,
    UnsupportedMethod,
    PatternCompileError,
    OriginMismatch,
    NetworkError,
    BodyReadError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingOrigin => "missing_origin",
            ErrorKind::MissingQuery => "missing_query",
            ErrorKind::UnsupportedMethod => "unsupported_method",
            ErrorKind::PatternCompileError => "pattern_compile_error",
            ErrorKind::OriginMismatch => "origin_mismatch",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::BodyReadError => "body_read_error",
        }
    }
}

/// Errors that terminate a relay request.
///
/// The `Display` text is the plain-text body sent back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// No `Origin` header, or an empty one.
    #[error("Missing origin header")]
    MissingOrigin,

    /// Empty raw query string, so there is no target URL.
    #[error("Missing request query")]
    MissingQuery,

    /// Anything other than `GET`.
    #[error("Method not allowed")]
    UnsupportedMethod,

    /// The configured allowed-origin pattern is not a valid regular expression.
    #[error("Error parsing origin")]
    PatternCompile { reason: String },

    /// The `Origin` header does not match the allowed-origin pattern.
    #[error("Origin mismatch")]
    OriginMismatch,

    /// The outbound fetch failed before a usable response arrived.
    #[error("Error: {message}")]
    Network { status: StatusCode, message: String },

    /// The upstream answered but its body could not be read to the end.
    #[error("Error: {0}")]
    BodyRead(String),
}

impl RelayError {
    /// HTTP status reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingOrigin | RelayError::MissingQuery | RelayError::OriginMismatch => {
                StatusCode::BAD_REQUEST
            }
            RelayError::UnsupportedMethod => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::PatternCompile { .. } | RelayError::BodyRead(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::Network { status, .. } => *status,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::MissingOrigin => ErrorKind::MissingOrigin,
            RelayError::MissingQuery => ErrorKind::MissingQuery,
            RelayError::UnsupportedMethod => ErrorKind::UnsupportedMethod,
            RelayError::PatternCompile { .. } => ErrorKind::PatternCompileError,
            RelayError::OriginMismatch => ErrorKind::OriginMismatch,
            RelayError::Network { .. } => ErrorKind::NetworkError,
            RelayError::BodyRead(_) => ErrorKind::BodyReadError,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let allow_get = matches!(self, RelayError::UnsupportedMethod);

        let mut response = (status, self.to_string()).into_response();
        if allow_get {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET"));
        }
        response
    }
}

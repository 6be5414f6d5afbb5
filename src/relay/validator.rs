//! Inbound request validation.
//!
//! # Responsibilities
//! - Require a non-empty `Origin` header
//! - Require a non-empty raw query (the target URL)
//! - Accept `GET` only
//! - Match `Origin` against the allowed-origin pattern
//!
//! # Design Decisions
//! - Checks run in a fixed order and the first failure wins
//! - Pattern search is unanchored; the pattern itself decides anchoring
//! - Read-only: the request is never modified

use axum::http::{header, HeaderValue, Method, Request};
use regex::bytes::Regex;

use crate::relay::error::RelayError;

/// What a validated request hands to the fetch stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovedRequest {
    /// Inbound `Origin`, echoed back in `Access-Control-Allow-Origin`.
    pub origin: HeaderValue,
    /// Raw query string, used verbatim as the upstream URL.
    pub target_url: String,
}

/// Result of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Approved(ApprovedRequest),
    Rejected(RelayError),
}

impl ValidationOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, ValidationOutcome::Approved(_))
    }

    pub fn into_result(self) -> Result<ApprovedRequest, RelayError> {
        match self {
            ValidationOutcome::Approved(approved) => Ok(approved),
            ValidationOutcome::Rejected(err) => Err(err),
        }
    }
}

/// Raw query component of the request URI, or `""` when there is none.
pub fn raw_query<B>(request: &Request<B>) -> &str {
    request.uri().query().unwrap_or("")
}

/// Decide whether `request` may be relayed.
pub fn validate<B>(request: &Request<B>, allowed_origin_pattern: &str) -> ValidationOutcome {
    let origin = match request.headers().get(header::ORIGIN) {
        Some(origin) if !origin.is_empty() => origin,
        _ => return ValidationOutcome::Rejected(RelayError::MissingOrigin),
    };

    let target_url = raw_query(request);
    if target_url.is_empty() {
        return ValidationOutcome::Rejected(RelayError::MissingQuery);
    }

    if request.method() != Method::GET {
        return ValidationOutcome::Rejected(RelayError::UnsupportedMethod);
    }

    // Header values are bytes, not necessarily UTF-8.
    let allowed = match Regex::new(allowed_origin_pattern) {
        Ok(re) => re,
        Err(e) => {
            return ValidationOutcome::Rejected(RelayError::PatternCompile {
                reason: e.to_string(),
            })
        }
    };
    if !allowed.is_match(origin.as_bytes()) {
        return ValidationOutcome::Rejected(RelayError::OriginMismatch);
    }

    ValidationOutcome::Approved(ApprovedRequest {
        origin: origin.clone(),
        target_url: target_url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::error::ErrorKind;
    use axum::http::StatusCode;

    const GOOD_URL: &str = "http://test.com/?https://what.the.what";
    const BAD_URL: &str = "http://test.com/";
    const GOOD_ORIGIN: &str = "https://you.com";
    const BAD_ORIGIN: &str = "https://me.com";
    const PATTERN: &str = r"^https?://.*you\.com";

    fn request(method: &str, uri: &str, origin: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(origin) = origin {
            builder = builder.header("Origin", origin);
        }
        builder.body(()).unwrap()
    }

    fn rejection(outcome: ValidationOutcome) -> (StatusCode, ErrorKind) {
        match outcome {
            ValidationOutcome::Rejected(err) => (err.status(), err.kind()),
            ValidationOutcome::Approved(a) => panic!("expected rejection, got approval for {:?}", a),
        }
    }

    #[test]
    fn test_validate_request_table() {
        let cases = [
            ("missing origin header", "GET", GOOD_URL, None, Some((StatusCode::BAD_REQUEST, ErrorKind::MissingOrigin))),
            ("missing query string", "GET", BAD_URL, Some(GOOD_ORIGIN), Some((StatusCode::BAD_REQUEST, ErrorKind::MissingQuery))),
            ("wrong verb", "POST", GOOD_URL, Some(GOOD_ORIGIN), Some((StatusCode::METHOD_NOT_ALLOWED, ErrorKind::UnsupportedMethod))),
            ("origin mismatch", "GET", GOOD_URL, Some(BAD_ORIGIN), Some((StatusCode::BAD_REQUEST, ErrorKind::OriginMismatch))),
            ("valid request", "GET", GOOD_URL, Some(GOOD_ORIGIN), None),
        ];

        for (title, method, uri, origin, expected) in cases {
            let outcome = validate(&request(method, uri, origin), PATTERN);
            match expected {
                Some(want) => assert_eq!(rejection(outcome), want, "{}", title),
                None => assert!(outcome.is_approved(), "{}: got {:?}", title, outcome),
            }
        }
    }

    #[test]
    fn test_approval_carries_origin_and_target() {
        let approved = validate(&request("GET", GOOD_URL, Some(GOOD_ORIGIN)), PATTERN)
            .into_result()
            .unwrap();
        assert_eq!(approved.origin, GOOD_ORIGIN);
        assert_eq!(approved.target_url, "https://what.the.what");
    }

    #[test]
    fn test_target_keeps_its_own_query() {
        let uri = "http://test.com/?https://api.example.org/items?page=2&limit=10";
        let approved = validate(&request("GET", uri, Some(GOOD_ORIGIN)), PATTERN)
            .into_result()
            .unwrap();
        assert_eq!(approved.target_url, "https://api.example.org/items?page=2&limit=10");
    }

    #[test]
    fn test_missing_origin_wins_over_everything() {
        for method in ["GET", "POST", "DELETE"] {
            for uri in [GOOD_URL, BAD_URL] {
                let outcome = validate(&request(method, uri, None), "(");
                assert_eq!(rejection(outcome), (StatusCode::BAD_REQUEST, ErrorKind::MissingOrigin));
            }
        }
    }

    #[test]
    fn test_empty_origin_is_missing() {
        let outcome = validate(&request("GET", GOOD_URL, Some("")), PATTERN);
        assert_eq!(rejection(outcome), (StatusCode::BAD_REQUEST, ErrorKind::MissingOrigin));
    }

    #[test]
    fn test_missing_query_checked_before_method() {
        let outcome = validate(&request("POST", BAD_URL, Some(GOOD_ORIGIN)), PATTERN);
        assert_eq!(rejection(outcome), (StatusCode::BAD_REQUEST, ErrorKind::MissingQuery));
    }

    #[test]
    fn test_non_get_methods_rejected() {
        for method in ["POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"] {
            let outcome = validate(&request(method, GOOD_URL, Some(GOOD_ORIGIN)), PATTERN);
            assert_eq!(
                rejection(outcome),
                (StatusCode::METHOD_NOT_ALLOWED, ErrorKind::UnsupportedMethod),
                "{}",
                method
            );
        }
    }

    #[test]
    fn test_method_checked_before_pattern() {
        let outcome = validate(&request("POST", GOOD_URL, Some(BAD_ORIGIN)), "(");
        assert_eq!(rejection(outcome).1, ErrorKind::UnsupportedMethod);
    }

    #[test]
    fn test_invalid_pattern() {
        let outcome = validate(&request("GET", GOOD_URL, Some(GOOD_ORIGIN)), "(unclosed");
        assert_eq!(
            rejection(outcome),
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::PatternCompileError)
        );
    }

    #[test]
    fn test_pattern_controls_anchoring() {
        let origin = Some("https://notyou.com");
        assert!(validate(&request("GET", GOOD_URL, origin), r"you\.com").is_approved());
        assert!(!validate(&request("GET", GOOD_URL, origin), r"^https://you\.com$").is_approved());
    }

    #[test]
    fn test_empty_pattern_allows_any_origin() {
        assert!(validate(&request("GET", GOOD_URL, Some(BAD_ORIGIN)), "").is_approved());
    }

    #[test]
    fn test_matching_origins() {
        for origin in ["http://you.com", "https://you.com", "https://app.you.com"] {
            assert!(
                validate(&request("GET", GOOD_URL, Some(origin)), PATTERN).is_approved(),
                "{}",
                origin
            );
        }
    }

    #[test]
    fn test_validation_is_idempotent() {
        let req = request("GET", GOOD_URL, Some(BAD_ORIGIN));
        assert_eq!(validate(&req, PATTERN), validate(&req, PATTERN));

        let req = request("GET", GOOD_URL, Some(GOOD_ORIGIN));
        let first = validate(&req, PATTERN);
        let second = validate(&req, PATTERN);
        assert_eq!(first, second);
        assert_eq!(req.headers().get("origin").unwrap(), GOOD_ORIGIN);
        assert_eq!(req.uri(), GOOD_URL);
    }
}

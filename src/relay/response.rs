//! Outbound response assembly.
//!
//! # Responsibilities
//! - Attach the fixed CORS headers to every relayed response
//! - Append upstream headers value by value (multi-valued headers survive)
//! - Relay upstream status and body verbatim
//! - Render fetch failures as plain-text errors
//!
//! # Design Decisions
//! - Every upstream header is relayed except `Connection` and
//!   `Transfer-Encoding`; the body is re-framed by our own server
//! - Upstream headers are appended, never overwrite an existing value

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::Response,
};

use crate::relay::fetcher::FetchResult;

/// Value of `Access-Control-Max-Age`: one day.
pub const CORS_MAX_AGE_SECS: &str = "86400";


/// Insert the three fixed CORS headers, echoing `origin`.
pub fn write_cors_headers(headers: &mut HeaderMap, origin: &HeaderValue) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(CORS_MAX_AGE_SECS),
    );
}

/// Append every upstream header onto `headers`, minus connection framing.
pub fn merge_upstream_headers(headers: &mut HeaderMap, upstream: &HeaderMap) {
    for (name, value) in upstream.iter() {
        if is_framing(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
}

/// Headers the outbound connection sets for itself.
fn is_framing(name: &HeaderName) -> bool {
    name == header::CONNECTION || name == header::TRANSFER_ENCODING
}

/// Build the response for an approved request from its fetch result.
pub fn assemble(origin: &HeaderValue, result: FetchResult) -> Response {
    match result {
        FetchResult::Success(upstream) => {
            let mut response = Response::new(Body::from(upstream.body));
            *response.status_mut() = upstream.status;
            write_cors_headers(response.headers_mut(), origin);
            merge_upstream_headers(response.headers_mut(), &upstream.headers);
            response
        }
        FetchResult::Failure(err) => {
            let mut response = Response::new(Body::from(err.to_string()));
            *response.status_mut() = err.status();
            write_cors_headers(response.headers_mut(), origin);
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
            response
        }
    }
}

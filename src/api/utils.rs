//! API utility functions
//!
//! Pure, stateless helpers for HTTP request processing, kept apart from the
//! handlers so they can be unit tested.

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Uri, header};
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::api::error::ApiError;

/// Parses and validates Content-Type header for application/json
///
/// Accepts `application/json` with or without a charset parameter and
/// rejects look-alikes such as `application/jsonp` or `text/json`.
pub fn parse_content_type(content_type: &str) -> Result<mime::Mime, ApiError> {
    let media_type: mime::Mime = content_type.parse().map_err(|_| {
        ApiError::InvalidPayload(format!("invalid Content-Type: {}", content_type))
    })?;

    if media_type.type_() != mime::APPLICATION || media_type.subtype() != mime::JSON {
        return Err(ApiError::InvalidPayload(format!(
            "Content-Type must be application/json, got: {}/{}",
            media_type.type_(),
            media_type.subtype()
        )));
    }

    Ok(media_type)
}

/// Collects at most `max_size` bytes of a request body
///
/// Reading stops at the first frame that crosses the limit, so an oversize
/// body is never buffered in full.
pub async fn read_limited_body(body: Body, max_size: usize) -> Result<Bytes, ApiError> {
    let collected = Limited::new(body, max_size).collect().await.map_err(|err| {
        if err.is::<LengthLimitError>() {
            ApiError::PayloadTooLarge(max_size)
        } else {
            ApiError::InvalidPayload(format!("cannot read request body: {}", err))
        }
    })?;

    Ok(collected.to_bytes())
}

/// Raw `Authorization` header value, if present and valid UTF-8
pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

/// Request target for logs, with the value of any `token` query pair masked
pub fn redacted_target(uri: &Uri) -> String {
    let Some(query) = uri.query() else {
        return uri.path().to_string();
    };

    let pairs: Vec<&str> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some(("token", _)) => "token=<redacted>",
            _ => pair,
        })
        .collect();
    format!("{}?{}", uri.path(), pairs.join("&"))
}

/// Byte comparison whose running time does not depend on where the first
/// mismatch occurs
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

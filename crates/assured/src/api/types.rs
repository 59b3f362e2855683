//! Response types and helpers for the stub API.

use crate::stub::StubError;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::{HeaderMap, Request, Response, StatusCode};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Header carrying the status code a stub should answer with
pub const ASSURED_STATUS_HEADER: &str = "Assured-Status";

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorDetail>,
}

/// Individual error detail
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

// =============================================================================
// Response helper functions
// =============================================================================

/// Create a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string_pretty(body).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(status, [("Content-Type", "application/json")], json)
}

/// Build an HTTP response with the given status and body.
///
/// Falls back to a bare response if the builder rejects its input.
pub fn build_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Build an HTTP response with headers.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Create an error response
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let error = ErrorResponse {
        errors: vec![ErrorDetail {
            code: status.as_str().to_string(),
            message: message.to_string(),
        }],
    };
    json_response(status, &error)
}

/// Map a dispatcher error to its HTTP response
pub fn stub_error_response(err: &StubError) -> Response<Full<Bytes>> {
    let status = match err {
        StubError::MissingMethod | StubError::MissingPath | StubError::InvalidStatus(_) => {
            StatusCode::BAD_REQUEST
        }
        StubError::NotFound(_) => StatusCode::NOT_FOUND,
    };
    error_response(status, &err.to_string())
}

/// Create a not found response
pub fn not_found() -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

/// Empty 200 response
pub fn ok() -> Response<Full<Bytes>> {
    build_response(StatusCode::OK, Bytes::new())
}

/// Collect request body into bytes
pub async fn collect_body<B>(req: Request<B>) -> Result<Bytes, String>
where
    B: Body,
    B::Error: Display,
{
    req.into_body()
        .collect()
        .await
        .map(|c| c.to_bytes())
        .map_err(|e| format!("Failed to read request body: {e}"))
}

/// Flatten request headers into name/value pairs. Repeated headers are joined with `, `.
pub fn headers_to_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        map.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    map
}

/// Parse the `Assured-Status` header. Absent or `0` means the default status.
pub fn parse_status_header(headers: &HeaderMap) -> Result<Option<u16>, StubError> {
    let Some(value) = headers.get(ASSURED_STATUS_HEADER) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| StubError::InvalidStatus("non-ASCII value".to_string()))?
        .trim();
    let status: u16 = raw
        .parse()
        .map_err(|_| StubError::InvalidStatus(raw.to_string()))?;
    if status == 0 {
        return Ok(None);
    }
    StatusCode::from_u16(status).map_err(|_| StubError::InvalidStatus(raw.to_string()))?;
    Ok(Some(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    #[test]
    fn test_error_response_format() {
        let resp = error_response(StatusCode::BAD_REQUEST, "Test error");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_json_response() {
        let body = serde_json::json!({"test": "value"});
        let resp = json_response(StatusCode::OK, &body);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_stub_error_statuses() {
        assert_eq!(
            stub_error_response(&StubError::MissingMethod).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            stub_error_response(&StubError::InvalidStatus("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            stub_error_response(&StubError::NotFound("GET:/foo".into())).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_parse_status_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_status_header(&headers), Ok(None));

        headers.insert(ASSURED_STATUS_HEADER, HeaderValue::from_static("201"));
        assert_eq!(parse_status_header(&headers), Ok(Some(201)));

        headers.insert(ASSURED_STATUS_HEADER, HeaderValue::from_static("0"));
        assert_eq!(parse_status_header(&headers), Ok(None));

        headers.insert(ASSURED_STATUS_HEADER, HeaderValue::from_static("abc"));
        assert!(parse_status_header(&headers).is_err());

        headers.insert(ASSURED_STATUS_HEADER, HeaderValue::from_static("42"));
        assert!(parse_status_header(&headers).is_err());
    }

    #[test]
    fn test_headers_to_map_joins_repeats() {
        let mut headers = HeaderMap::new();
        headers.append("x-trace", HeaderValue::from_static("a"));
        headers.append("x-trace", HeaderValue::from_static("b"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));

        let map = headers_to_map(&headers);
        assert_eq!(map.get("x-trace").map(String::as_str), Some("a, b"));
        assert_eq!(
            map.get("content-type").map(String::as_str),
            Some("text/plain")
        );
    }
}

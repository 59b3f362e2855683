//! Route dispatch logic for the stub API.
//!
//! Every route except `/health` and `/clear` carries the stub path after its
//! verb prefix, and the request method names the stub's method.

use crate::api::handlers::{calls, stubs, system};
use crate::api::types::{error_response, not_found};
use crate::stub::StubStore;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;
use tracing::debug;

/// Parsed route
#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    /// GET /health
    Health,
    /// ANY /given/{path}
    Given(&'a str),
    /// ANY /when/{path}
    When(&'a str),
    /// ANY /verify/{path}
    Verify(&'a str),
    /// ANY /clear/{path}
    Clear(&'a str),
    /// DELETE /clear
    ClearAll,
}

impl<'a> Route<'a> {
    /// Parse a route from the request path
    fn parse(path: &'a str) -> Option<Self> {
        if path == "/health" {
            return Some(Route::Health);
        }
        if let Some(rest) = strip_verb(path, "given") {
            return Some(Route::Given(rest));
        }
        if let Some(rest) = strip_verb(path, "when") {
            return Some(Route::When(rest));
        }
        if let Some(rest) = strip_verb(path, "verify") {
            return Some(Route::Verify(rest));
        }
        match strip_verb(path, "clear") {
            Some(rest) if rest.trim_matches('/').is_empty() => Some(Route::ClearAll),
            Some(rest) => Some(Route::Clear(rest)),
            None => None,
        }
    }
}

/// Strip `/{verb}` from the start of `path`, returning what follows the next `/`
fn strip_verb<'a>(path: &'a str, verb: &str) -> Option<&'a str> {
    let rest = path.strip_prefix('/')?.strip_prefix(verb)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

/// Main request router
pub async fn route_request<B>(
    req: Request<B>,
    store: Arc<StubStore>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Stub API: {} {}", method, path);

    let Some(route) = Route::parse(&path) else {
        return Ok(not_found());
    };

    let response = match (&method, route) {
        (&Method::GET, Route::Health) => system::handle_health(store),
        (_, Route::Health) => not_found(),
        (_, Route::Given(stub_path)) => stubs::handle_given(stub_path, req, store).await,
        (_, Route::When(stub_path)) => stubs::handle_when(stub_path, req, store).await,
        (_, Route::Verify(stub_path)) => calls::handle_verify(&method, stub_path, store),
        (_, Route::Clear(stub_path)) => calls::handle_clear(&method, stub_path, store),
        (&Method::DELETE, Route::ClearAll) => calls::handle_clear_all(store),
        (_, Route::ClearAll) => error_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "Clearing all stubs requires DELETE",
        ),
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ASSURED_STATUS_HEADER;
    use crate::stub::{Call, StubKey};
    use http_body_util::BodyExt;

    fn request(method: Method, uri: &str, body: &'static str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    async fn send(store: &Arc<StubStore>, req: Request<Full<Bytes>>) -> (StatusCode, Bytes) {
        let resp = route_request(req, Arc::clone(store)).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    }

    #[test]
    fn test_route_parse() {
        assert_eq!(Route::parse("/health"), Some(Route::Health));
        assert_eq!(Route::parse("/given/foo"), Some(Route::Given("foo")));
        assert_eq!(Route::parse("/given/foo/bar"), Some(Route::Given("foo/bar")));
        assert_eq!(Route::parse("/given"), Some(Route::Given("")));
        assert_eq!(Route::parse("/when/foo"), Some(Route::When("foo")));
        assert_eq!(Route::parse("/verify/foo"), Some(Route::Verify("foo")));
        assert_eq!(Route::parse("/clear/foo"), Some(Route::Clear("foo")));
        assert_eq!(Route::parse("/clear"), Some(Route::ClearAll));
        assert_eq!(Route::parse("/clear/"), Some(Route::ClearAll));

        // Invalid routes
        assert_eq!(Route::parse("/givenfoo"), None);
        assert_eq!(Route::parse("/unknown"), None);
        assert_eq!(Route::parse("/"), None);
    }

    #[tokio::test]
    async fn test_given_when_verify_clear_scenario() {
        let store = Arc::new(StubStore::new());

        let mut given = request(Method::GET, "/given/foo", "ok");
        given
            .headers_mut()
            .insert(ASSURED_STATUS_HEADER, "201".parse().unwrap());
        let (status, body) = send(&store, given).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        let (status, body) = send(&store, request(Method::GET, "/when/foo", "")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(&body[..], b"ok");

        let (status, body) = send(&store, request(Method::GET, "/verify/foo", "")).await;
        assert_eq!(status, StatusCode::OK);
        let calls: Vec<Call> = serde_json::from_slice(&body).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "GET");
        assert_eq!(calls[0].path, "/foo");

        let (status, _) = send(&store, request(Method::GET, "/clear/foo", "")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&store, request(Method::GET, "/verify/foo", "")).await;
        assert_eq!(status, StatusCode::OK);
        let calls: Vec<Call> = serde_json::from_slice(&body).unwrap();
        assert!(calls.is_empty());

        let (status, _) = send(&store, request(Method::GET, "/when/foo", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_when_defaults_status_and_records_body() {
        let store = Arc::new(StubStore::new());
        send(&store, request(Method::POST, "/given/items", "created")).await;

        let (status, body) =
            send(&store, request(Method::POST, "/when/items?page=2", "payload")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"created");

        let calls = store.verify(&StubKey::new("POST", "/items").unwrap());
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].response, b"payload");
        assert_eq!(calls[0].query.as_deref(), Some("page=2"));
        assert_eq!(calls[0].status_code, None);
        assert!(calls[0].timestamp.is_some());
    }

    #[tokio::test]
    async fn test_method_is_part_of_key() {
        let store = Arc::new(StubStore::new());
        send(&store, request(Method::GET, "/given/foo", "")).await;

        let (status, _) = send(&store, request(Method::POST, "/when/foo", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(store.recorder().total(), 0);
    }

    #[tokio::test]
    async fn test_given_rejects_empty_path() {
        let store = Arc::new(StubStore::new());
        let (status, _) = send(&store, request(Method::GET, "/given/", "")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&store, request(Method::GET, "/given", "")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(store.registry().is_empty());
    }

    #[tokio::test]
    async fn test_when_without_path_is_not_found() {
        let store = Arc::new(StubStore::new());
        for uri in ["/when/", "/when"] {
            let (status, body) = send(&store, request(Method::GET, uri, "")).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(
                body["errors"][0]["message"],
                "no stub registered for GET:/"
            );
        }
        assert_eq!(store.recorder().total(), 0);
    }

    #[tokio::test]
    async fn test_given_rejects_bad_status_header() {
        let store = Arc::new(StubStore::new());
        let mut given = request(Method::GET, "/given/foo", "");
        given
            .headers_mut()
            .insert(ASSURED_STATUS_HEADER, "teapot".parse().unwrap());
        let (status, _) = send(&store, given).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(store.registry().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_requires_delete() {
        let store = Arc::new(StubStore::new());
        send(&store, request(Method::GET, "/given/foo", "")).await;

        let (status, _) = send(&store, request(Method::GET, "/clear", "")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(store.registry().len(), 1);

        let (status, _) = send(&store, request(Method::DELETE, "/clear", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(store.registry().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let store = Arc::new(StubStore::new());
        let (status, _) = send(&store, request(Method::GET, "/nope", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&store, request(Method::POST, "/health", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

//! Stub handlers: `given` registers a stub, `when` invokes it.

use crate::api::types::{
    build_response, collect_body, error_response, headers_to_map, ok, parse_status_header,
    stub_error_response,
};
use crate::stub::{Call, StubError, StubKey, StubStore};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use std::fmt::Display;
use std::sync::Arc;
use tracing::warn;

/// ANY /given/{path} - Register a stub
pub async fn handle_given<B>(
    path: &str,
    req: Request<B>,
    store: Arc<StubStore>,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Display,
{
    let method = req.method().as_str().to_string();
    let status = match parse_status_header(req.headers()) {
        Ok(s) => s,
        Err(e) => {
            warn!(method = %method, path = path, "Rejected stub: {}", e);
            return stub_error_response(&e);
        }
    };

    let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    let mut call = Call::new(method.as_str(), path).with_response(body.to_vec());
    call.status_code = status;

    match store.stub(call) {
        Ok(_) => ok(),
        Err(e) => {
            warn!(method = %method, path = path, "Rejected stub: {}", e);
            stub_error_response(&e)
        }
    }
}

/// ANY /when/{path} - Invoke a stub and record the call
pub async fn handle_when<B>(
    path: &str,
    req: Request<B>,
    store: Arc<StubStore>,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Display,
{
    let method = req.method().as_str().to_string();
    let key = match StubKey::new(&method, path) {
        Ok(k) => k,
        Err(e) => {
            warn!(method = %method, path = path, "Invalid invocation: {}", e);
            // No stub can exist for an incomplete key
            let key = format!("{}:/{}", method, path.trim_start_matches('/'));
            return stub_error_response(&StubError::NotFound(key));
        }
    };

    let query = req.uri().query().map(str::to_string);
    let headers = headers_to_map(req.headers());
    let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    let mut observed = Call::new(key.method(), key.path()).with_response(body.to_vec());
    observed.query = query;
    observed.headers = headers;
    observed.timestamp = Some(chrono::Utc::now().to_rfc3339());

    match store.invoke(&key, observed) {
        Ok(stub) => {
            let status = StatusCode::from_u16(stub.effective_status()).unwrap_or(StatusCode::OK);
            build_response(status, stub.response)
        }
        Err(e) => {
            warn!(key = %key, "No stub for invocation");
            stub_error_response(&e)
        }
    }
}

//! Call handlers: `verify` lists recorded calls, `clear` drops stubs and calls.

use crate::api::types::{json_response, ok, stub_error_response};
use crate::stub::{StubKey, StubStore};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Method, Response, StatusCode};
use std::sync::Arc;
use tracing::debug;

/// ANY /verify/{path} - List calls recorded for the request method and path
pub fn handle_verify(method: &Method, path: &str, store: Arc<StubStore>) -> Response<Full<Bytes>> {
    match StubKey::new(method.as_str(), path) {
        Ok(key) => {
            let calls = store.verify(&key);
            debug!(key = %key, count = calls.len(), "Verify");
            json_response(StatusCode::OK, &calls)
        }
        Err(e) => stub_error_response(&e),
    }
}

/// ANY /clear/{path} - Clear the stub and calls for the request method and path
pub fn handle_clear(method: &Method, path: &str, store: Arc<StubStore>) -> Response<Full<Bytes>> {
    match StubKey::new(method.as_str(), path) {
        Ok(key) => {
            store.clear(&key);
            ok()
        }
        Err(e) => stub_error_response(&e),
    }
}

/// DELETE /clear - Clear every stub and call
pub fn handle_clear_all(store: Arc<StubStore>) -> Response<Full<Bytes>> {
    store.clear_all();
    ok()
}

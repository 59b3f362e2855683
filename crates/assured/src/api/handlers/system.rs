//! System handlers: health.

use crate::api::types::json_response;
use crate::stub::StubStore;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use std::sync::Arc;

/// GET /health - Health check with store sizes
pub fn handle_health(store: Arc<StubStore>) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "status": "ok",
            "stubs": store.registry().len(),
            "calls": store.recorder().total(),
        }),
    )
}

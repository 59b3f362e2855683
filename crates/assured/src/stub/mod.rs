//! Stub registry and call recording.
//!
//! This module provides:
//! - `StubKey`: normalized (method, path) identity of a stub slot
//! - `StubRegistry`: stubbed responses, one per key
//! - `CallRecorder`: calls received per key, in arrival order
//! - `StubStore`: both stores as owned by one server instance
//!
//! ## Module Structure
//!
//! - `types`: `Call`, `StubKey` and `StubError`
//! - `registry`: `StubRegistry`
//! - `recorder`: `CallRecorder`
//! - `store`: `StubStore` and the operations spanning both stores

mod recorder;
mod registry;
mod store;
mod types;


pub use recorder::CallRecorder;
pub use registry::StubRegistry;
pub use store::StubStore;
pub use types::{normalize_method, normalize_path, Call, StubError, StubKey, DEFAULT_STATUS};

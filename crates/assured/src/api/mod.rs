//! HTTP API of the stub server.
//!
//! This module provides the routes used by tests and by the system-under-test:
//! - `/given/{path}`: register a stub for the request method and path
//! - `/when/{path}`: invoke a stub, recording the call
//! - `/verify/{path}`: list the calls recorded for the request method and path
//! - `/clear/{path}` and `DELETE /clear`: drop stubs and recorded calls
//! - `/health`: liveness and store sizes

mod handlers;
mod router;
mod server;
pub mod types;

pub use router::route_request;
pub use server::{ServerHandle, StubServer};

//! Programmable HTTP stub server for integration tests.
//!
//! A test registers a response for a method and path (`given`), the
//! system-under-test calls it (`when`), and the test then checks which calls
//! were received (`verify`) before resetting state (`clear`).

pub mod api;
pub mod client;
pub mod config;
pub mod logging;
pub mod stub;

pub use api::{ServerHandle, StubServer};
pub use client::{Client, ClientError};
pub use config::ServerConfig;
pub use stub::{Call, StubError, StubKey, StubStore};

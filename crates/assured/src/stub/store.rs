//! StubStore - the registry and recorder owned by one server instance.
//!
//! Operations that touch both stores take their locks in a fixed order
//! (registry, then recorder).

use super::recorder::CallRecorder;
use super::registry::StubRegistry;
use super::types::{Call, StubError, StubKey};
use tracing::{debug, info};

/// Stubs and recorded calls for one server instance
#[derive(Default)]
pub struct StubStore {
    registry: StubRegistry,
    recorder: CallRecorder,
}

impl StubStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &StubRegistry {
        &self.registry
    }

    pub fn recorder(&self) -> &CallRecorder {
        &self.recorder
    }

    /// Register `call` as the stub for its method and path
    pub fn stub(&self, call: Call) -> Result<StubKey, StubError> {
        let key = call.key()?;
        let call = Call {
            method: key.method().to_string(),
            path: key.path().to_string(),
            ..call
        };
        info!(
            key = %key,
            status = ?call.status_code,
            bytes = call.response.len(),
            "Stub registered"
        );
        self.registry.put(key.clone(), call);
        Ok(key)
    }

    /// Serve an invocation: when a stub exists for `key`, record `observed` and return the stub.
    ///
    /// The registry read lock is held while recording, so a concurrent clear
    /// cannot leave a log behind for a stub it already removed.
    pub fn invoke(&self, key: &StubKey, observed: Call) -> Result<Call, StubError> {
        let stubs = self.registry.read();
        let stub = stubs
            .get(key)
            .cloned()
            .ok_or_else(|| StubError::NotFound(key.to_string()))?;
        self.recorder.record(key.clone(), observed);
        drop(stubs);
        debug!(key = %key, "Invocation recorded");
        Ok(stub)
    }

    /// Calls recorded for `key`, oldest first
    pub fn verify(&self, key: &StubKey) -> Vec<Call> {
        self.recorder.list(key)
    }

    /// Remove the stub and the log for `key` in one step
    pub fn clear(&self, key: &StubKey) {
        let mut stubs = self.registry.write();
        let mut calls = self.recorder.write();
        stubs.remove(key);
        calls.remove(key);
        debug!(key = %key, "Cleared stub and calls");
    }

    /// Remove every stub and every log in one step
    pub fn clear_all(&self) {
        let mut stubs = self.registry.write();
        let mut calls = self.recorder.write();
        stubs.clear();
        calls.clear();
        info!("Cleared all stubs and calls");
    }
}

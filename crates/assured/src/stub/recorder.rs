//! Recorder for calls received against stubbed keys.

use super::types::{Call, StubKey};
use parking_lot::{RwLock, RwLockWriteGuard};
use std::collections::HashMap;

/// Concurrency-safe map of stub key to the calls received for it, in arrival order
#[derive(Default)]
pub struct CallRecorder {
    calls: RwLock<HashMap<StubKey, Vec<Call>>>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call to the log for `key`
    pub fn record(&self, key: StubKey, call: Call) {
        self.calls.write().entry(key).or_default().push(call);
    }

    /// Calls recorded for `key`, oldest first. Empty when nothing was recorded.
    pub fn list(&self, key: &StubKey) -> Vec<Call> {
        self.calls.read().get(key).cloned().unwrap_or_default()
    }

    /// Drop the log for `key`, if any
    pub fn delete(&self, key: &StubKey) {
        self.calls.write().remove(key);
    }

    /// Drop every log
    pub fn delete_all(&self) {
        self.calls.write().clear();
    }

    /// Number of calls recorded for `key`
    pub fn count(&self, key: &StubKey) -> usize {
        self.calls.read().get(key).map_or(0, Vec::len)
    }

    /// Number of calls recorded across all keys
    pub fn total(&self) -> usize {
        self.calls.read().values().map(Vec::len).sum()
    }

    pub(super) fn write(&self) -> RwLockWriteGuard<'_, HashMap<StubKey, Vec<Call>>> {
        self.calls.write()
    }
}

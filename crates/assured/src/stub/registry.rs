//! Registry of stubbed responses keyed by method and path.

use super::types::{Call, StubKey};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;

/// Concurrency-safe map of stub key to stubbed call. Last write wins.
#[derive(Default)]
pub struct StubRegistry {
    stubs: RwLock<HashMap<StubKey, Call>>,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the stub for `key`
    pub fn put(&self, key: StubKey, call: Call) {
        self.stubs.write().insert(key, call);
    }

    /// Look up the stub for `key`
    pub fn get(&self, key: &StubKey) -> Option<Call> {
        self.stubs.read().get(key).cloned()
    }

    /// Remove the stub for `key`, if any
    pub fn delete(&self, key: &StubKey) {
        self.stubs.write().remove(key);
    }

    /// Remove every stub
    pub fn delete_all(&self) {
        self.stubs.write().clear();
    }

    pub fn len(&self) -> usize {
        self.stubs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.read().is_empty()
    }

    pub(super) fn read(&self) -> RwLockReadGuard<'_, HashMap<StubKey, Call>> {
        self.stubs.read()
    }

    pub(super) fn write(&self) -> RwLockWriteGuard<'_, HashMap<StubKey, Call>> {
        self.stubs.write()
    }
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Expectations tracker (C1).
//!
//! A process-local mapping from reconciliation key to a small bounded set of
//! pending creations and deletions the controller itself initiated. Before
//! each reconcile the orchestrator asks [`ExpectationsTracker::satisfied`]
//! whether all of a key's self-initiated creates/deletes have been observed
//! through the watch cache; if not, the reconcile returns immediately rather
//! than acting on stale state and risking a double-create or double-delete.
//!
//! Expectations clear either when the matching informer event arrives
//! (`observed_creation`/`observed_deletion`) or when a per-entry deadline
//! elapses, so a missed or coalesced watch event can never wedge a key
//! forever.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How long an unobserved expectation is allowed to block reconciliation
/// before it is treated as satisfied anyway.
const EXPECTATION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Default)]
struct KeyExpectations {
    pending_creates: Vec<Instant>,
    pending_deletes: Vec<Instant>,
}

impl KeyExpectations {
    fn is_satisfied(&self, now: Instant) -> bool {
        self.pending_creates
            .iter()
            .all(|t| now.duration_since(*t) >= EXPECTATION_TIMEOUT)
            && self
                .pending_deletes
                .iter()
                .all(|t| now.duration_since(*t) >= EXPECTATION_TIMEOUT)
    }

    fn is_empty(&self) -> bool {
        self.pending_creates.is_empty() && self.pending_deletes.is_empty()
    }
}

/// Process-wide tracker of self-initiated creates/deletes, keyed by
/// reconciliation key (typically `"<namespace>/<name>"`).
#[derive(Clone, Default)]
pub struct ExpectationsTracker {
    inner: std::sync::Arc<Mutex<HashMap<String, KeyExpectations>>>,
}

impl ExpectationsTracker {
    /// Creates a new, empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the controller just created `count` objects on behalf of
    /// `key` and expects to observe them through the watch cache.
    pub fn expect_creations(&self, key: &str, count: usize) {
        let mut guard = self.inner.lock().expect("expectations mutex poisoned");
        let entry = guard.entry(key.to_string()).or_default();
        let now = Instant::now();
        entry.pending_creates.extend(std::iter::repeat_n(now, count));
    }

    /// Records that the controller just deleted `count` objects on behalf of
    /// `key` and expects to observe their removal through the watch cache.
    pub fn expect_deletions(&self, key: &str, count: usize) {
        let mut guard = self.inner.lock().expect("expectations mutex poisoned");
        let entry = guard.entry(key.to_string()).or_default();
        let now = Instant::now();
        entry.pending_deletes.extend(std::iter::repeat_n(now, count));
    }

    /// Clears one outstanding creation expectation for `key`, called from the
    /// watch mapper when a create event for a tracked kind arrives.
    pub fn observed_creation(&self, key: &str) {
        let mut guard = self.inner.lock().expect("expectations mutex poisoned");
        if let Some(entry) = guard.get_mut(key) {
            if !entry.pending_creates.is_empty() {
                entry.pending_creates.remove(0);
            }
            if entry.is_empty() {
                guard.remove(key);
            }
        }
    }

    /// Clears one outstanding deletion expectation for `key`.
    pub fn observed_deletion(&self, key: &str) {
        let mut guard = self.inner.lock().expect("expectations mutex poisoned");
        if let Some(entry) = guard.get_mut(key) {
            if !entry.pending_deletes.is_empty() {
                entry.pending_deletes.remove(0);
            }
            if entry.is_empty() {
                guard.remove(key);
            }
        }
    }

    /// True if `key` has no outstanding expectations, or every outstanding
    /// expectation has exceeded [`EXPECTATION_TIMEOUT`].
    #[must_use]
    pub fn satisfied(&self, key: &str) -> bool {
        let guard = self.inner.lock().expect("expectations mutex poisoned");
        match guard.get(key) {
            None => true,
            Some(entry) => entry.is_satisfied(Instant::now()),
        }
    }

    /// Number of distinct keys with at least one outstanding expectation.
    /// Exported as a gauge so a tracker that never drains is visible.
    #[must_use]
    pub fn pending_key_count(&self) -> usize {
        self.inner.lock().expect("expectations mutex poisoned").len()
    }
}

#[cfg(test)]
#[path = "expectations_tests.rs"]
mod expectations_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Condition algebra for `ClusterDeployment` and its satellite resources.
//!
//! This module is the sole place that mutates a resource's `status.conditions`
//! list. It owns three invariants: `LastTransitionTime` moves only when
//! `Status` itself changes, `LastProbeTime` moves on every evaluation (even a
//! no-op one), and conditions are kept sorted by `Type` so status diffs are
//! stable across passes.
//!
//! # Example
//!
//! ```rust,no_run
//! use cdoperator::reconcilers::status::{set_condition, UpdateMode};
//! use cdoperator::crd::Condition;
//!
//! let mut conditions: Vec<Condition> = Vec::new();
//! let changed = set_condition(
//!     &mut conditions,
//!     "DNSNotReady",
//!     "False",
//!     "ZoneAvailable",
//!     "DNSZone bar is available",
//!     UpdateMode::IfTransition,
//! );
//! assert!(changed);
//! ```

use crate::crd::Condition;
use chrono::Utc;

/// Governs when `set_condition` treats a call as a change worth writing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateMode {
    /// Always record the probe, even if nothing about the condition changed.
    Always,
    /// Record a change only if `reason` or `message` differs from the stored value.
    IfReasonOrMessageChange,
    /// Record a change only if `status` itself differs from the stored value.
    IfTransition,
}

/// Condition types emitted by a now-retired reconciler generation. Any of
/// these found on a CD's status are dropped the next time conditions are
/// rewritten, regardless of `UpdateMode`.
pub const LEGACY_CONDITION_TYPES: &[&str] = &["IngressCertificateNotSet", "ControlPlaneCertificateNotSet"];

/// Insert or update a condition in `conditions`, honoring the contract in the
/// module documentation.
///
/// `LastProbeTime` is stamped to now unconditionally. `LastTransitionTime` is
/// carried over from the existing entry unless `status` changed, in which
/// case it is also stamped to now. Whether the write is applied at all is
/// governed by `mode`: under `IfTransition`, a call whose `status` matches the
/// existing entry is a complete no-op (not even the probe time moves), since
/// the orchestrator re-evaluates every condition on every pass and most
/// reconcile passes produce no observable change.
///
/// Returns `true` if `status`, `reason`, or `message` changed relative to the
/// existing entry (or the entry is new).
pub fn set_condition(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
    mode: UpdateMode,
) -> bool {
    let now = Utc::now().to_rfc3339();
    let existing_index = conditions.iter().position(|c| c.r#type == condition_type);

    let transitioned = existing_index
        .map(|i| conditions[i].status != status)
        .unwrap_or(true);
    let reason_or_message_changed = existing_index
        .map(|i| {
            conditions[i].reason.as_deref() != Some(reason)
                || conditions[i].message.as_deref() != Some(message)
        })
        .unwrap_or(true);

    let should_write = match mode {
        UpdateMode::Always => true,
        UpdateMode::IfReasonOrMessageChange => transitioned || reason_or_message_changed,
        UpdateMode::IfTransition => transitioned,
    };

    if !should_write {
        return false;
    }

    let last_transition_time = if transitioned {
        now.clone()
    } else {
        existing_index
            .and_then(|i| conditions[i].last_transition_time.clone())
            .unwrap_or_else(|| now.clone())
    };

    let updated = Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_probe_time: Some(now),
        last_transition_time: Some(last_transition_time),
    };

    match existing_index {
        Some(i) => conditions[i] = updated,
        None => conditions.push(updated),
    }

    sort_conditions(conditions);
    transitioned || reason_or_message_changed
}

/// Remove any condition whose type is in [`LEGACY_CONDITION_TYPES`].
///
/// Returns `true` if anything was removed.
pub fn strip_legacy_conditions(conditions: &mut Vec<Condition>) -> bool {
    let before = conditions.len();
    conditions.retain(|c| !LEGACY_CONDITION_TYPES.contains(&c.r#type.as_str()));
    conditions.len() != before
}

/// Sort conditions by `Type` so status output is stable across passes.
pub fn sort_conditions(conditions: &mut [Condition]) {
    conditions.sort_by(|a, b| a.r#type.cmp(&b.r#type));
}

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// True if the condition's status is `"True"`.
#[must_use]
pub fn is_true(conditions: &[Condition], condition_type: &str) -> bool {
    find_condition(conditions, condition_type).is_some_and(|c| c.status == "True")
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;

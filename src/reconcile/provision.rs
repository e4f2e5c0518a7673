// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Provision attempt manager (§4.6): drives the `ClusterProvision` state
//! machine for a `ClusterDeployment` — creating attempts, adopting the
//! running one, retrying terminal failures per a backoff schedule and a
//! retry-reason allowlist, and pruning stale attempts.

use crate::config::RetryReasonsConfig;
use crate::constants::{PROVISION_STUCK_THRESHOLD_SECS, STALE_PROVISION_RETENTION_SECS};
use crate::context::Context;
use crate::crd::{
    ClusterDeployment, ClusterDeploymentStatus, ClusterProvision, ClusterProvisionSpec, Condition,
    LocalObjectReference,
};
use crate::errors::ProvisionError;
use crate::labels::CLUSTER_NAME_LABEL;
use crate::reconcilers::retry::provision_backoff_duration;
use crate::reconcilers::status::{set_condition, UpdateMode};
use crate::status_reasons::{
    CONDITION_TYPE_INSTALL_LAUNCH_ERROR, CONDITION_TYPE_PROVISION_STOPPED, CONDITION_TYPE_PROVISIONED,
    REASON_ATTEMPTS_LIMIT_REACHED, REASON_FAILURE_REASON_NOT_RETRYABLE, REASON_POD_IN_PENDING_PHASE,
    REASON_PROVISION_FAILED_RETRYING, REASON_PROVISION_PENDING, REASON_PROVISION_STOPPED,
    REASON_PROVISIONING,
};
use chrono::{DateTime, Utc};
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Resource, ResourceExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// What the orchestrator should do after a provisioning pass.
pub struct ProvisionOutcome {
    /// Set once a provision is first observed to have succeeded; the caller
    /// (post-install reconciler) is responsible for copying its metadata and
    /// computing the final `Provisioned=True` summary condition.
    pub succeeded_provision: Option<Arc<ClusterProvision>>,
    /// Delay before the next pass should re-evaluate this CD's provisioning.
    pub requeue_after: Option<Duration>,
}

/// Decision produced by the retry-reason/attempts-limit policy (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Stopped(&'static str),
}

/// Runs one pass of the provision state machine.
pub async fn reconcile(
    ctx: &Context,
    cd: &ClusterDeployment,
    status: &mut ClusterDeploymentStatus,
    conditions: &mut Vec<Condition>,
) -> Result<ProvisionOutcome, ProvisionError> {
    let namespace = cd.namespace().unwrap_or_default();
    let name = cd.name_any();
    let now = Utc::now();

    let provisions = ctx.stores.provisions_for_cluster_deployment(&name, &namespace);
    prune_stale_provisions(ctx, &namespace, &provisions, now).await;

    match select_active_provision(&provisions, cd) {
        None => handle_no_provision(ctx, &namespace, cd, status, conditions).await,
        Some(provision) if is_terminal_success(provision) => {
            set_condition(
                conditions,
                CONDITION_TYPE_INSTALL_LAUNCH_ERROR,
                "False",
                REASON_PROVISIONING,
                "install pod launched successfully",
                UpdateMode::IfReasonOrMessageChange,
            );
            Ok(ProvisionOutcome {
                succeeded_provision: Some(provision.clone()),
                requeue_after: None,
            })
        }
        Some(provision) if is_terminal_failure(provision) => {
            handle_terminal_failure(ctx, &namespace, cd, status, conditions, provision, now).await
        }
        Some(provision) => {
            handle_running(status, conditions, provision, now);
            Ok(ProvisionOutcome {
                succeeded_provision: None,
                requeue_after: Some(Duration::from_secs(60)),
            })
        }
    }
}

async fn handle_no_provision(
    ctx: &Context,
    namespace: &str,
    cd: &ClusterDeployment,
    status: &mut ClusterDeploymentStatus,
    conditions: &mut Vec<Condition>,
) -> Result<ProvisionOutcome, ProvisionError> {
    let attempt = status.install_restarts;

    if let Some(limit) = cd.spec.install_attempts_limit {
        if attempt >= limit {
            stop_provisioning(
                conditions,
                REASON_ATTEMPTS_LIMIT_REACHED,
                &format!("install attempts limit ({limit}) reached"),
            );
            return Err(ProvisionError::AttemptsExhausted {
                cd_name: cd.name_any(),
                limit,
            });
        }
    }

    create_provision_attempt(ctx, namespace, cd, attempt)
        .await
        .map_err(|reason| ProvisionError::AttemptCreationFailed {
            cd_name: cd.name_any(),
            attempt,
            reason,
        })?;

    status.provision_ref = Some(LocalObjectReference {
        name: provision_name(&cd.name_any(), attempt),
    });

    set_condition(
        conditions,
        CONDITION_TYPE_PROVISIONED,
        "False",
        REASON_PROVISION_PENDING,
        &format!("created ClusterProvision attempt {attempt}"),
        UpdateMode::IfReasonOrMessageChange,
    );

    Ok(ProvisionOutcome {
        succeeded_provision: None,
        requeue_after: Some(Duration::from_secs(30)),
    })
}

async fn handle_terminal_failure(
    ctx: &Context,
    namespace: &str,
    cd: &ClusterDeployment,
    status: &mut ClusterDeploymentStatus,
    conditions: &mut Vec<Condition>,
    provision: &ClusterProvision,
    now: DateTime<Utc>,
) -> Result<ProvisionOutcome, ProvisionError> {
    let failure_time = provision
        .status
        .as_ref()
        .and_then(|s| s.failed_time.as_ref())
        .map(|t| t.0)
        .unwrap_or(now);

    let attempt = provision.spec.attempt;

    if !backoff_elapsed(failure_time, attempt, now) {
        let remaining = remaining_backoff(failure_time, attempt, now);
        set_condition(
            conditions,
            CONDITION_TYPE_PROVISIONED,
            "False",
            REASON_PROVISIONING,
            "waiting for backoff before retrying the failed provision",
            UpdateMode::IfReasonOrMessageChange,
        );
        return Ok(ProvisionOutcome {
            succeeded_provision: None,
            requeue_after: Some(remaining),
        });
    }

    let failure_reason = provision
        .status
        .as_ref()
        .and_then(|s| s.failure_reason.as_deref());

    match evaluate_retry(attempt, cd.spec.install_attempts_limit, failure_reason, &ctx.retry_reasons) {
        RetryDecision::Stopped(reason) => {
            stop_provisioning(
                conditions,
                reason,
                &format!("provision attempt {attempt} will not be retried"),
            );
            Err(ProvisionError::AttemptsExhausted {
                cd_name: cd.name_any(),
                limit: cd.spec.install_attempts_limit.unwrap_or(attempt + 1),
            })
        }
        RetryDecision::Retry => {
            let next_attempt = status.install_restarts + 1;
            status.install_restarts = next_attempt;
            status.provision_ref = None;

            create_provision_attempt(ctx, namespace, cd, next_attempt)
                .await
                .map_err(|reason| ProvisionError::AttemptCreationFailed {
                    cd_name: cd.name_any(),
                    attempt: next_attempt,
                    reason,
                })?;

            status.provision_ref = Some(LocalObjectReference {
                name: provision_name(&cd.name_any(), next_attempt),
            });

            set_condition(
                conditions,
                CONDITION_TYPE_PROVISIONED,
                "False",
                REASON_PROVISION_FAILED_RETRYING,
                &format!("attempt {attempt} failed; retrying as attempt {next_attempt}"),
                UpdateMode::IfReasonOrMessageChange,
            );

            Ok(ProvisionOutcome {
                succeeded_provision: None,
                requeue_after: Some(Duration::from_secs(30)),
            })
        }
    }
}

fn handle_running(
    status: &mut ClusterDeploymentStatus,
    conditions: &mut Vec<Condition>,
    provision: &ClusterProvision,
    now: DateTime<Utc>,
) {
    status.provision_ref = Some(LocalObjectReference {
        name: provision.name_any(),
    });

    if is_stuck(provision, now) {
        set_condition(
            conditions,
            CONDITION_TYPE_INSTALL_LAUNCH_ERROR,
            "True",
            REASON_POD_IN_PENDING_PHASE,
            "install pod has been stuck in Pending past the stuck-install threshold",
            UpdateMode::IfReasonOrMessageChange,
        );
    } else {
        set_condition(
            conditions,
            CONDITION_TYPE_INSTALL_LAUNCH_ERROR,
            "False",
            REASON_PROVISIONING,
            "install is progressing normally",
            UpdateMode::IfReasonOrMessageChange,
        );
    }

    set_condition(
        conditions,
        CONDITION_TYPE_PROVISIONED,
        "False",
        REASON_PROVISIONING,
        "install is in progress",
        UpdateMode::IfReasonOrMessageChange,
    );
}

/// Name of the `ClusterProvision` for a given attempt number.
#[must_use]
pub fn provision_name(cd_name: &str, attempt: i32) -> String {
    format!("{cd_name}-{attempt}")
}

/// Sets the specific `ProvisionStopped` condition and the generic `Provisioned`
/// pointer to it, per the two-condition write the state machine's Stopped exit
/// calls for.
fn stop_provisioning(conditions: &mut Vec<Condition>, specific_reason: &str, message: &str) {
    set_condition(
        conditions,
        CONDITION_TYPE_PROVISION_STOPPED,
        "True",
        specific_reason,
        message,
        UpdateMode::IfReasonOrMessageChange,
    );
    set_condition(
        conditions,
        CONDITION_TYPE_PROVISIONED,
        "False",
        REASON_PROVISION_STOPPED,
        message,
        UpdateMode::IfReasonOrMessageChange,
    );
}

/// A provision is adopted only if it is controller-owned by `cd` and is not
/// in a failed terminal state (§4.6 adoption rule); a failed provision is
/// never re-adopted.
#[must_use]
pub fn select_active_provision<'a>(
    provisions: &'a [Arc<ClusterProvision>],
    cd: &ClusterDeployment,
) -> Option<&'a Arc<ClusterProvision>> {
    let cd_uid = cd.uid();
    provisions.iter().find(|p| {
        let owned = p
            .owner_references()
            .iter()
            .any(|o| o.controller == Some(true) && Some(&o.uid) == cd_uid.as_ref());
        owned && !is_failed(p)
    })
}

fn is_failed(provision: &ClusterProvision) -> bool {
    provision.status.as_ref().is_some_and(|s| s.failed)
}

fn is_terminal_success(provision: &ClusterProvision) -> bool {
    provision.status.as_ref().is_some_and(|s| s.success)
}

fn is_terminal_failure(provision: &ClusterProvision) -> bool {
    is_failed(provision)
}

/// True once the backoff window for `attempt`, starting at `failure_time`,
/// has elapsed as of `now`.
#[must_use]
pub fn backoff_elapsed(failure_time: DateTime<Utc>, attempt: i32, now: DateTime<Utc>) -> bool {
    remaining_backoff(failure_time, attempt, now) == Duration::ZERO
}

#[must_use]
pub fn remaining_backoff(failure_time: DateTime<Utc>, attempt: i32, now: DateTime<Utc>) -> Duration {
    let backoff = provision_backoff_duration(attempt.max(0) as u32);
    let elapsed = (now - failure_time).num_seconds().max(0) as u64;
    let elapsed = Duration::from_secs(elapsed);
    backoff.saturating_sub(elapsed)
}

/// The retry-reason/attempts-limit policy of §4.6, evaluated against the most
/// recent terminal failure.
#[must_use]
pub fn evaluate_retry(
    attempt: i32,
    limit: Option<i32>,
    failure_reason: Option<&str>,
    retry_reasons: &RetryReasonsConfig,
) -> RetryDecision {
    if let Some(limit) = limit {
        if attempt + 1 >= limit {
            return RetryDecision::Stopped(REASON_ATTEMPTS_LIMIT_REACHED);
        }
    }

    let reason = failure_reason.unwrap_or("");
    if !retry_reasons.allows_retry(reason) {
        return RetryDecision::Stopped(REASON_FAILURE_REASON_NOT_RETRYABLE);
    }

    RetryDecision::Retry
}

/// Attempt numbers to retain per the stale-provision retention rule: attempt
/// 0, plus the two most recent attempts. `provisions` must be sorted newest
/// attempt first (as `Stores::provisions_for_cluster_deployment` returns).
#[must_use]
pub fn attempts_to_retain(provisions: &[Arc<ClusterProvision>]) -> std::collections::BTreeSet<i32> {
    let mut keep: std::collections::BTreeSet<i32> = provisions
        .iter()
        .take(2)
        .map(|p| p.spec.attempt)
        .collect();
    keep.insert(0);
    keep
}

fn is_stale_failed(provision: &ClusterProvision, now: DateTime<Utc>) -> bool {
    if !is_failed(provision) {
        return false;
    }
    let Some(created) = provision.meta().creation_timestamp.as_ref() else {
        return false;
    };
    let age = (now - created.0).num_seconds().max(0) as u64;
    age > STALE_PROVISION_RETENTION_SECS
}

fn is_stuck(provision: &ClusterProvision, now: DateTime<Utc>) -> bool {
    if is_failed(provision) || is_terminal_success(provision) {
        return false;
    }
    let Some(created) = provision.meta().creation_timestamp.as_ref() else {
        return false;
    };
    let age = (now - created.0).num_seconds().max(0) as u64;
    age > PROVISION_STUCK_THRESHOLD_SECS
}

async fn prune_stale_provisions(
    ctx: &Context,
    namespace: &str,
    provisions: &[Arc<ClusterProvision>],
    now: DateTime<Utc>,
) {
    let retained = attempts_to_retain(provisions);
    let api: Api<ClusterProvision> = Api::namespaced(ctx.client.clone(), namespace);

    for provision in provisions {
        let should_delete = is_stale_failed(provision, now) || !retained.contains(&provision.spec.attempt);
        if should_delete {
            let _ = api.delete(&provision.name_any(), &DeleteParams::default()).await;
        }
    }
}

async fn create_provision_attempt(
    ctx: &Context,
    namespace: &str,
    cd: &ClusterDeployment,
    attempt: i32,
) -> std::result::Result<(), String> {
    let api: Api<ClusterProvision> = Api::namespaced(ctx.client.clone(), namespace);
    let name = provision_name(&cd.name_any(), attempt);

    let mut labels = BTreeMap::new();
    labels.insert(CLUSTER_NAME_LABEL.to_string(), cd.spec.cluster_name.clone());

    let owner = cd
        .controller_owner_ref(&())
        .ok_or_else(|| "ClusterDeployment has no UID to own a ClusterProvision".to_string())?;

    let provision = ClusterProvision {
        metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
            name: Some(name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        spec: ClusterProvisionSpec {
            cluster_deployment_ref: LocalObjectReference {
                name: cd.name_any(),
            },
            attempt,
        },
        status: None,
    };

    api.create(&PostParams::default(), &provision)
        .await
        .map_err(|e| e.to_string())?;

    ctx.expectations
        .expect_creations(&format!("{namespace}/{}", cd.name_any()), 1);

    Ok(())
}

#[cfg(test)]
#[path = "provision_tests.rs"]
mod provision_tests;

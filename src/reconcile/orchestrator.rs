// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciler orchestrator (§4.9): the single entry point that sequences
//! every other component over one `ClusterDeployment` pass and owns the
//! `Provisioned` summary condition and the pass's requeue disposition.
//!
//! Each component below writes its own condition(s) and returns just enough
//! for the orchestrator to decide whether the rest of the pipeline runs this
//! pass. The orchestrator itself performs exactly one `status` patch and, if
//! labels or annotations changed, exactly one `metadata` patch, per pass.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kube::api::{DeleteParams, Patch, PatchParams};
use kube::{Api, ResourceExt};
use serde_json::json;

use super::{dns, image_resolver, post_install, provision, pull_secret};
use crate::context::Context;
use crate::crd::{ClusterDeployment, Condition};
use crate::errors::ReconcileError;
use crate::labels::{CLUSTER_NAME_LABEL, CLUSTER_PLATFORM_LABEL, CLUSTER_REGION_LABEL, FINALIZER_CLUSTER_DEPLOYMENT};
use crate::platform;
use crate::reconcilers::finalizers::{ensure_finalizer, handle_deletion};
use crate::reconcilers::status::{find_condition, is_true, set_condition, sort_conditions, strip_legacy_conditions, UpdateMode};
use crate::status_reasons::{
    CONDITION_TYPE_AUTHENTICATION_FAILURE, CONDITION_TYPE_DNS_NOT_READY, CONDITION_TYPE_INSTALL_IMAGES_NOT_RESOLVED,
    CONDITION_TYPE_INSTALL_LAUNCH_ERROR, CONDITION_TYPE_PROVISION_STOPPED, CONDITION_TYPE_PROVISIONED,
    CONDITION_TYPE_REQUIREMENTS_MET, CONDITION_TYPE_SYNC_SET_FAILED, CONDITION_TYPE_UNREACHABLE,
    REASON_AUTHENTICATION_FAILED, REASON_CREDENTIALS_VALID, REASON_IMAGE_NOT_SPECIFIED, REASON_INITIALIZED,
    REASON_PROVISION_STOPPED, REASON_PROVISION_SUCCEEDED, REASON_PULL_SECRET_INVALID, REASON_ZONE_PENDING,
};

/// Annotation requesting deletion once a Go-style duration has elapsed since
/// the `ClusterDeployment` was created (§6 "Annotations consumed").
pub const DELETE_AFTER_ANNOTATION: &str = "hive.example.io/delete-after";

/// The full condition vocabulary (§6), minus `Provisioned` itself, seeded to
/// `Unknown/Initialized` the first time a CD is ever observed so a reader of
/// `status.conditions` never has to distinguish "not yet evaluated" from
/// "field absent from the CRD version in use".
const CONDITION_VOCABULARY: &[&str] = &[
    CONDITION_TYPE_PROVISION_STOPPED,
    CONDITION_TYPE_REQUIREMENTS_MET,
    CONDITION_TYPE_DNS_NOT_READY,
    CONDITION_TYPE_INSTALL_IMAGES_NOT_RESOLVED,
    CONDITION_TYPE_AUTHENTICATION_FAILURE,
    CONDITION_TYPE_INSTALL_LAUNCH_ERROR,
    CONDITION_TYPE_UNREACHABLE,
    CONDITION_TYPE_SYNC_SET_FAILED,
];

fn ensure_default_conditions(conditions: &mut Vec<Condition>) {
    for condition_type in CONDITION_VOCABULARY {
        if find_condition(conditions, condition_type).is_none() {
            set_condition(
                conditions,
                condition_type,
                "Unknown",
                REASON_INITIALIZED,
                "awaiting first evaluation",
                UpdateMode::Always,
            );
        }
    }
}

fn desired_labels(cd: &ClusterDeployment) -> BTreeMap<String, String> {
    let mut labels = cd.labels().clone();
    labels.insert(CLUSTER_NAME_LABEL.to_string(), cd.spec.cluster_name.clone());

    if let Some(capability) = platform::capability_for(&cd.spec.platform) {
        labels.insert(CLUSTER_PLATFORM_LABEL.to_string(), capability.name().to_lowercase());
    }

    let region = cd
        .spec
        .platform
        .aws
        .as_ref()
        .map(|p| p.region.clone())
        .or_else(|| cd.spec.platform.azure.as_ref().map(|p| p.region.clone()));
    if let Some(region) = region {
        labels.insert(CLUSTER_REGION_LABEL.to_string(), region);
    }

    labels
}

async fn ensure_labels(ctx: &Context, cd: &ClusterDeployment) -> Result<(), ReconcileError> {
    let desired = desired_labels(cd);
    if &desired == cd.labels() {
        return Ok(());
    }

    let namespace = cd.namespace().unwrap_or_default();
    let api: Api<ClusterDeployment> = Api::namespaced(ctx.client.clone(), &namespace);
    let patch = json!({ "metadata": { "labels": desired } });
    api.patch(&cd.name_any(), &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(())
}

/// Parses a Go-style duration string (`"8h"`, `"30m"`, `"1h30m"`) as used by
/// [`DELETE_AFTER_ANNOTATION`]. Only the `h`, `m`, and `s` suffixes are
/// supported; anything else (or an empty/malformed string) yields `None`.
#[must_use]
pub fn parse_go_duration(raw: &str) -> Option<Duration> {
    let mut total = Duration::ZERO;
    let mut start = 0;
    let mut saw_component = false;
    let bytes = raw.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
            i += 1;
        }
        if i == start {
            return None;
        }
        let number: f64 = raw[start..i].parse().ok()?;

        let unit_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
            i += 1;
        }
        if i == unit_start {
            return None;
        }
        let seconds = match &raw[unit_start..i] {
            "h" => number * 3_600.0,
            "m" => number * 60.0,
            "s" => number,
            _ => return None,
        };
        total += Duration::from_secs_f64(seconds.max(0.0));
        saw_component = true;
        start = i;
    }

    saw_component.then_some(total)
}

/// Remaining time until `DELETE_AFTER_ANNOTATION` expires, or `None` if the
/// annotation is absent, unparsable, or the CD has no creation timestamp yet.
/// `Some(Duration::ZERO)` means the deadline has already passed.
fn delete_after_remaining(cd: &ClusterDeployment, now: DateTime<Utc>) -> Option<Duration> {
    let raw = cd.annotations().get(DELETE_AFTER_ANNOTATION)?;
    let window = parse_go_duration(raw)?;
    let created = cd.metadata.creation_timestamp.as_ref()?.0;
    let deadline = created + chrono::Duration::from_std(window).ok()?;
    let remaining = (deadline - now).num_seconds();
    Some(Duration::from_secs(remaining.max(0) as u64))
}

async fn request_delete(ctx: &Context, namespace: &str, name: &str) -> Result<(), ReconcileError> {
    let api: Api<ClusterDeployment> = Api::namespaced(ctx.client.clone(), namespace);
    api.delete(name, &DeleteParams::default()).await?;
    Ok(())
}

/// Testable property 7: `Provisioned` is a pure function of every other
/// condition and the `installed` flag. Returns `None` when the cluster is
/// already installed (nothing blocks it) or when none of the blocking
/// conditions checked here are set — in that case whatever the provisioning
/// state machine itself wrote to `Provisioned` this pass stands unchanged.
/// Checked in descending order of how terminal the blocker is: a stopped
/// provisioning pass outranks a still-pending preflight check.
#[must_use]
pub fn derive_blocked_provisioned(conditions: &[Condition], installed: bool) -> Option<(&'static str, &'static str, String)> {
    if installed {
        return None;
    }

    if let Some(stopped) = find_condition(conditions, CONDITION_TYPE_PROVISION_STOPPED) {
        if stopped.status == "True" {
            let message = stopped.message.clone().unwrap_or_else(|| "provisioning stopped".to_string());
            return Some(("False", REASON_PROVISION_STOPPED, message));
        }
    }

    if is_true(conditions, CONDITION_TYPE_AUTHENTICATION_FAILURE) {
        return Some(("False", REASON_AUTHENTICATION_FAILED, "platform credential validation failed".to_string()));
    }

    if find_condition(conditions, CONDITION_TYPE_REQUIREMENTS_MET).is_some_and(|c| c.status == "False") {
        return Some(("False", REASON_PULL_SECRET_INVALID, "pull secret requirements not met".to_string()));
    }

    if is_true(conditions, CONDITION_TYPE_INSTALL_IMAGES_NOT_RESOLVED) {
        return Some(("False", REASON_IMAGE_NOT_SPECIFIED, "installer images not resolved".to_string()));
    }

    if is_true(conditions, CONDITION_TYPE_DNS_NOT_READY) {
        return Some(("False", REASON_ZONE_PENDING, "waiting on managed DNS zone".to_string()));
    }

    None
}

async fn persist(
    ctx: &Context,
    cd: &ClusterDeployment,
    status: &crate::crd::ClusterDeploymentStatus,
    annotations: &BTreeMap<String, String>,
) -> Result<(), ReconcileError> {
    let namespace = cd.namespace().unwrap_or_default();
    let name = cd.name_any();
    let api: Api<ClusterDeployment> = Api::namespaced(ctx.client.clone(), &namespace);

    if annotations != cd.annotations() {
        let patch = json!({ "metadata": { "annotations": annotations } });
        api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    }

    let patch = json!({ "status": status });
    api.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(())
}

/// Runs one full reconcile pass over `cd` (§4.9). Returns the delay before
/// the next pass should run, or `None` if the pass handled a deletion and no
/// further scheduling is needed from here.
pub async fn reconcile(ctx: &Context, cd: &ClusterDeployment) -> Result<Option<Duration>, ReconcileError> {
    let namespace = cd.namespace().unwrap_or_default();
    let name = cd.name_any();
    let key = format!("{namespace}/{name}");

    if !ctx.expectations.satisfied(&key) {
        return Ok(Some(Duration::from_secs(5)));
    }

    let mut status = cd.status.clone().unwrap_or_default();
    let mut conditions = std::mem::take(&mut status.conditions);
    strip_legacy_conditions(&mut conditions);
    ensure_default_conditions(&mut conditions);
    ensure_labels(ctx, cd).await?;

    if cd.metadata.deletion_timestamp.is_some() {
        handle_deletion(&ctx.client, cd, FINALIZER_CLUSTER_DEPLOYMENT)
            .await
            .map_err(ReconcileError::from)?;
        return Ok(None);
    }

    ensure_finalizer(&ctx.client, cd, FINALIZER_CLUSTER_DEPLOYMENT)
        .await
        .map_err(ReconcileError::from)?;

    let mut annotations = cd.annotations().clone();
    let now = Utc::now();
    let mut requeue_candidates: Vec<Duration> = Vec::new();
    let mut pipeline_blocked = false;

    if let Some(capability) = platform::capability_for(&cd.spec.platform) {
        match capability.validate_credentials(ctx, &namespace) {
            Ok(()) => {
                set_condition(
                    &mut conditions,
                    CONDITION_TYPE_AUTHENTICATION_FAILURE,
                    "False",
                    REASON_CREDENTIALS_VALID,
                    "platform credentials are present",
                    UpdateMode::IfReasonOrMessageChange,
                );
            }
            Err(reason) => {
                set_condition(
                    &mut conditions,
                    CONDITION_TYPE_AUTHENTICATION_FAILURE,
                    "True",
                    REASON_AUTHENTICATION_FAILED,
                    &reason,
                    UpdateMode::IfReasonOrMessageChange,
                );
                pipeline_blocked = true;
            }
        }
    }

    if !pipeline_blocked {
        if let Some(remaining) = delete_after_remaining(cd, now) {
            if remaining == Duration::ZERO {
                request_delete(ctx, &namespace, &name).await?;
                return Ok(None);
            }
            requeue_candidates.push(remaining);
        }
    }

    if !pipeline_blocked && pull_secret::reconcile(ctx, cd, &mut conditions).await.is_err() {
        pipeline_blocked = true;
    }

    if !pipeline_blocked {
        match image_resolver::reconcile(ctx, cd, &mut status, &mut conditions, None).await {
            Ok(true) => {}
            Ok(false) | Err(_) => pipeline_blocked = true,
        }
    }

    if !pipeline_blocked && cd.spec.manage_dns {
        match dns::reconcile(ctx, cd, &mut annotations, &mut conditions).await {
            Ok((dns::DnsOutcome::Ready, _)) => {}
            Ok((dns::DnsOutcome::Waiting, wait)) => {
                pipeline_blocked = true;
                if let Some(wait) = wait {
                    requeue_candidates.push(wait);
                }
            }
            Err(_) => pipeline_blocked = true,
        }
    }

    if pipeline_blocked {
        requeue_candidates.push(Duration::from_secs(ctx.config.default_requeue_secs));
    } else if cd.spec.installed {
        if let Some(cluster_metadata) = cd.spec.cluster_metadata.clone() {
            post_install::reconcile(ctx, cd, &cluster_metadata, &mut status, &annotations, &mut conditions).await;
        }
    } else {
        match provision::reconcile(ctx, cd, &mut status, &mut conditions).await {
            Ok(outcome) => {
                if let Some(succeeded) = outcome.succeeded_provision.as_ref() {
                    if let Some(promotion) = post_install::promote_on_success(ctx, cd, succeeded, &mut status).await {
                        set_condition(
                            &mut conditions,
                            CONDITION_TYPE_PROVISIONED,
                            "True",
                            REASON_PROVISION_SUCCEEDED,
                            "cluster was successfully installed",
                            UpdateMode::IfReasonOrMessageChange,
                        );
                        post_install::reconcile(ctx, cd, &promotion.cluster_metadata, &mut status, &annotations, &mut conditions).await;
                    }
                }
                if let Some(wait) = outcome.requeue_after {
                    requeue_candidates.push(wait);
                }
            }
            Err(_) => requeue_candidates.push(Duration::from_secs(30)),
        }
    }

    if let Some((blocked_status, reason, message)) = derive_blocked_provisioned(&conditions, cd.spec.installed) {
        set_condition(&mut conditions, CONDITION_TYPE_PROVISIONED, blocked_status, reason, &message, UpdateMode::IfReasonOrMessageChange);
    }

    sort_conditions(&mut conditions);
    status.conditions = conditions;
    status.observed_generation = cd.metadata.generation;

    persist(ctx, cd, &status, &annotations).await?;

    let requeue_after = requeue_candidates
        .into_iter()
        .min()
        .unwrap_or_else(|| Duration::from_secs(ctx.config.default_requeue_secs));

    Ok(Some(requeue_after))
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod orchestrator_tests;

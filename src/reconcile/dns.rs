// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Managed-DNS coordinator (§4.5): creates and awaits an owned `DNSZone` for
//! clusters that opted into managed DNS, translating its conditions onto the
//! `ClusterDeployment`'s `DNSNotReady` condition.

use crate::constants::{DNS_READY_ANNOTATION, DNS_ZONE_WAIT_SECS};
use crate::crd::{ClusterDeployment, Condition, DNSZone, DNSZoneSpec};
use crate::errors::DnsCoordinationError;
use crate::platform::{self, PlatformCapability};
use crate::reconcilers::resources::create_or_apply;
use crate::reconcilers::status::{find_condition, is_true, set_condition, UpdateMode};
use crate::status_reasons::{
    CONDITION_TYPE_DNS_NOT_READY, CONDITION_TYPE_PROVISION_STOPPED, REASON_API_OPT_IN_REQUIRED,
    REASON_AUTHENTICATION_FAILED, REASON_DNS_UNSUPPORTED_PLATFORM, REASON_GENERIC_DNS_ERRORS,
    REASON_INSUFFICIENT_CREDENTIALS, REASON_PROVISION_STOPPED, REASON_ZONE_AVAILABLE,
    REASON_ZONE_PENDING, REASON_ZONE_RESOURCE_CONFLICT, REASON_ZONE_TIMED_OUT,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Resource, ResourceExt};
use std::time::Duration;

/// Name of the owned DNSZone for a CD named `cd_name`.
#[must_use]
pub fn zone_name(cd_name: &str) -> String {
    format!("{cd_name}-zone")
}

/// Outcome of a DNS coordination pass. `Ready` means provisioning may
/// proceed; `Waiting` carries the requeue delay still owed. A bounded-wait
/// timeout is surfaced as `Err(DnsCoordinationError::ZoneTimedOut)` instead
/// of a third variant, since the orchestrator treats it like any other
/// terminal per-pass error once `ProvisionStopped` has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsOutcome {
    Ready,
    Waiting,
}

/// Coordinates the owned `DNSZone` for `cd`. No-op (returns `Ready`
/// immediately) when `spec.manage_dns` is false.
pub async fn reconcile(
    ctx: &crate::context::Context,
    cd: &ClusterDeployment,
    annotations: &mut std::collections::BTreeMap<String, String>,
    conditions: &mut Vec<Condition>,
) -> Result<(DnsOutcome, Option<Duration>), DnsCoordinationError> {
    if !cd.spec.manage_dns {
        return Ok((DnsOutcome::Ready, None));
    }

    let Some(capability) = platform::capability_for(&cd.spec.platform) else {
        set_condition(
            conditions,
            CONDITION_TYPE_DNS_NOT_READY,
            "True",
            REASON_DNS_UNSUPPORTED_PLATFORM,
            "managed DNS was requested but no platform is configured",
            UpdateMode::IfReasonOrMessageChange,
        );
        return Err(DnsCoordinationError::UnsupportedPlatform {
            platform: "none".to_string(),
        });
    };

    if !capability.supports_managed_dns() {
        set_condition(
            conditions,
            CONDITION_TYPE_DNS_NOT_READY,
            "True",
            REASON_DNS_UNSUPPORTED_PLATFORM,
            &format!("platform '{}' does not support managed DNS", capability.name()),
            UpdateMode::IfReasonOrMessageChange,
        );
        return Err(DnsCoordinationError::UnsupportedPlatform {
            platform: capability.name().to_string(),
        });
    }

    let namespace = cd.namespace().unwrap_or_default();
    let name = cd.name_any();

    let zone = match ctx.stores.get_dns_zone(&zone_name(&name), &namespace) {
        Some(zone) => zone,
        None => {
            ensure_zone(ctx, &namespace, cd).await;
            set_condition(
                conditions,
                CONDITION_TYPE_DNS_NOT_READY,
                "True",
                REASON_ZONE_PENDING,
                "waiting for DNSZone to be created",
                UpdateMode::IfReasonOrMessageChange,
            );
            return Ok((DnsOutcome::Waiting, Some(Duration::from_secs(5))));
        }
    };

    if !owned_by(&zone, cd) {
        set_condition(
            conditions,
            CONDITION_TYPE_DNS_NOT_READY,
            "True",
            REASON_ZONE_RESOURCE_CONFLICT,
            &format!("DNSZone '{}' exists but is not owned by this ClusterDeployment", zone_name(&name)),
            UpdateMode::IfReasonOrMessageChange,
        );
        return Err(DnsCoordinationError::UnsupportedPlatform {
            platform: capability.name().to_string(),
        });
    }

    let zone_conditions = zone.status.as_ref().map(|s| s.conditions.as_slice()).unwrap_or(&[]);

    if is_true(zone_conditions, REASON_ZONE_AVAILABLE) {
        set_condition(
            conditions,
            CONDITION_TYPE_DNS_NOT_READY,
            "False",
            REASON_ZONE_AVAILABLE,
            "DNSZone is available",
            UpdateMode::IfReasonOrMessageChange,
        );
        annotations
            .entry(DNS_READY_ANNOTATION.to_string())
            .or_insert_with(|| "true".to_string());
        return Ok((DnsOutcome::Ready, None));
    }

    let failure_reason = [
        REASON_INSUFFICIENT_CREDENTIALS,
        REASON_API_OPT_IN_REQUIRED,
        REASON_AUTHENTICATION_FAILED,
        REASON_GENERIC_DNS_ERRORS,
    ]
    .into_iter()
    .find(|reason_as_type| is_true(zone_conditions, reason_as_type));

    let reason = failure_reason.unwrap_or(REASON_ZONE_PENDING);
    let message = failure_reason.map_or_else(
        || "waiting for DNSZone to become available".to_string(),
        |r| format!("DNSZone reports {r}"),
    );

    if wait_exceeded(conditions) {
        set_condition(
            conditions,
            CONDITION_TYPE_DNS_NOT_READY,
            "True",
            REASON_ZONE_TIMED_OUT,
            "DNSZone did not become available within the maximum wait",
            UpdateMode::IfReasonOrMessageChange,
        );
        set_condition(
            conditions,
            CONDITION_TYPE_PROVISION_STOPPED,
            "True",
            REASON_PROVISION_STOPPED,
            "DNS coordination timed out",
            UpdateMode::IfReasonOrMessageChange,
        );
        return Err(DnsCoordinationError::ZoneTimedOut {
            zone_name: zone_name(&name),
            waited_secs: DNS_ZONE_WAIT_SECS,
        });
    }

    set_condition(
        conditions,
        CONDITION_TYPE_DNS_NOT_READY,
        "True",
        reason,
        &message,
        UpdateMode::IfReasonOrMessageChange,
    );

    let remaining = remaining_wait(conditions);
    Ok((DnsOutcome::Waiting, Some(remaining)))
}

fn owned_by(zone: &DNSZone, cd: &ClusterDeployment) -> bool {
    let cd_uid = cd.uid();
    zone.owner_references()
        .iter()
        .any(|owner| owner.controller == Some(true) && Some(&owner.uid) == cd_uid.as_ref())
}

/// Seconds elapsed since `DNSNotReady` was first observed true, compared
/// against the configured wait budget.
fn wait_exceeded(conditions: &[Condition]) -> bool {
    remaining_wait(conditions) == Duration::ZERO
}

fn remaining_wait(conditions: &[Condition]) -> Duration {
    let Some(first_seen) = find_condition(conditions, CONDITION_TYPE_DNS_NOT_READY)
        .and_then(|c| c.last_transition_time.as_ref())
        .and_then(|t| parse_rfc3339_secs(t))
    else {
        return Duration::from_secs(DNS_ZONE_WAIT_SECS);
    };

    let now = now_secs();
    let elapsed = now.saturating_sub(first_seen);
    let budget = DNS_ZONE_WAIT_SECS as i64;
    if elapsed >= budget {
        Duration::ZERO
    } else {
        Duration::from_secs((budget - elapsed) as u64)
    }
}

fn parse_rfc3339_secs(timestamp: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|dt| dt.timestamp())
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

async fn ensure_zone(ctx: &crate::context::Context, namespace: &str, cd: &ClusterDeployment) {
    let Some(owner) = cd.controller_owner_ref(&()) else {
        return;
    };

    let zone = DNSZone {
        metadata: ObjectMeta {
            name: Some(zone_name(&cd.name_any())),
            namespace: Some(namespace.to_string()),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        spec: DNSZoneSpec {
            zone: cd.spec.cluster_name.clone(),
            preserve_on_delete: cd.spec.preserve_on_delete,
            platform: cd.spec.platform.clone(),
        },
        status: None,
    };

    let _ = create_or_apply(&ctx.client, namespace, &zone, "cdoperator-controller").await;
    ctx.expectations
        .expect_creations(&format!("{namespace}/{}", cd.name_any()), 1);
}

#[cfg(test)]
#[path = "dns_tests.rs"]
mod dns_tests;

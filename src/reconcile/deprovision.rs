// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deprovision coordinator (§4.8): destroys cloud resources for a
//! `ClusterDeployment` once it is marked for deletion.
//!
//! This is the production `FinalizerCleanup` implementation for
//! `ClusterDeployment`. `cleanup()` is called by
//! `reconcilers::finalizers::handle_deletion` once per pass while the
//! resource carries a deletion timestamp and its finalizer. Returning `Ok(())`
//! tells the caller it is safe to remove the finalizer; returning `Err`
//! leaves the finalizer in place so the next pass retries.

use crate::crd::{
    ClusterDeployment, ClusterDeploymentCustomization, ClusterDeprovision, ClusterDeprovisionSpec,
    ClusterProvision, Platform,
};
use crate::errors::{DeprovisionError, ReconcileError};
use crate::labels::CLUSTER_NAME_LABEL;
use crate::platform::{self, PlatformCapability};
use crate::reconcilers::finalizers::FinalizerCleanup;
use crate::reconcilers::status::{set_condition, UpdateMode};
use crate::status_reasons::{
    CONDITION_TYPE_PROVISIONED, REASON_AUTHENTICATION_FAILED, REASON_DEPROVISIONING,
};
use anyhow::{anyhow, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client, Resource, ResourceExt};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;

/// Annotation that unconditionally refuses deprovision while set to `"true"`.
pub const PROTECTED_DELETE_ANNOTATION: &str = "hive.example.io/protected-delete";

/// Outcome of the precondition checks in §4.8 steps 1-4, evaluated without
/// any network access so the decision tree can be unit tested directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// `protected-delete` is set; leave everything as-is.
    Protected,
    /// Install never completed; only the owned DNSZone needs cleanup.
    NeverInstalled,
    /// `preserveOnDelete` and `installed` are both true.
    Preserved,
    /// The platform has nothing to tear down (or none is set).
    PlatformSkipped,
    /// None of the short-circuits apply; proceed to steps 5-9.
    Proceed,
}

/// Evaluate the step 1-4 precondition checks against a CD's spec and annotations.
#[must_use]
pub fn evaluate_precondition(spec: &crate::crd::ClusterDeploymentSpec, annotations: &BTreeMap<String, String>) -> Precondition {
    if annotations.get(PROTECTED_DELETE_ANNOTATION).map(String::as_str) == Some("true") {
        return Precondition::Protected;
    }
    if spec.cluster_metadata.is_none() {
        return Precondition::NeverInstalled;
    }
    if spec.preserve_on_delete && spec.installed {
        return Precondition::Preserved;
    }
    match platform::capability_for(&spec.platform) {
        Some(c) if c.skip_deprovision() => Precondition::PlatformSkipped,
        None => Precondition::PlatformSkipped,
        Some(_) => Precondition::Proceed,
    }
}

#[async_trait::async_trait]
impl FinalizerCleanup for ClusterDeployment {
    async fn cleanup(&self, client: &Client) -> Result<()> {
        let namespace = self.namespace().unwrap_or_default();
        let name = self.name_any();

        match evaluate_precondition(&self.spec, self.annotations()) {
            Precondition::Protected => {
                info!(
                    "ClusterDeployment {}/{} is protected-delete; leaving finalizer in place",
                    namespace, name
                );
                return Err(anyhow!("protected-delete annotation is set"));
            }
            Precondition::NeverInstalled => {
                info!(
                    "ClusterDeployment {}/{} never completed install; skipping deprovision",
                    namespace, name
                );
                delete_owned_dns_zone(client, &namespace, &name).await?;
                return Ok(());
            }
            Precondition::Preserved => {
                info!(
                    "ClusterDeployment {}/{} has preserveOnDelete=true; skipping deprovision",
                    namespace, name
                );
                return Ok(());
            }
            Precondition::PlatformSkipped => {
                info!(
                    "ClusterDeployment {}/{} platform has no deprovision step",
                    namespace, name
                );
                return Ok(());
            }
            Precondition::Proceed => {}
        }

        // Step 5: an outstanding provision must not race a deprovision.
        if let Some(provision) = active_provision(client, &namespace, &name).await? {
            delete_provision(client, &provision).await?;
            return Err(anyhow!(
                "deleted outstanding ClusterProvision for '{name}'; retrying deprovision next pass"
            ));
        }

        let metadata = self
            .spec
            .cluster_metadata
            .as_ref()
            .expect("checked for None above");

        // Steps 6-7: ensure the ClusterDeprovision exists and await its terminal state.
        let deprovision = ensure_deprovision(
            client,
            &namespace,
            &name,
            &metadata.infra_id,
            &metadata.cluster_id,
            &self.spec.platform,
        )
        .await?;

        match deprovision.status.as_ref() {
            Some(status) if status.authentication_failure => {
                let message = format!(
                    "cloud provider rejected deprovision credentials for infra ID '{}'",
                    metadata.infra_id
                );
                write_provisioned_condition(
                    client,
                    &namespace,
                    &name,
                    "False",
                    REASON_AUTHENTICATION_FAILED,
                    &message,
                )
                .await?;
                return Err(ReconcileError::from(DeprovisionError::AuthenticationFailed {
                    infra_id: metadata.infra_id.clone(),
                    reason: "cloud provider rejected deprovision credentials".to_string(),
                })
                .into());
            }
            Some(status) if status.completed => {}
            _ => {
                write_provisioned_condition(
                    client,
                    &namespace,
                    &name,
                    "False",
                    REASON_DEPROVISIONING,
                    "waiting for ClusterDeprovision to complete",
                )
                .await?;
                return Err(anyhow!(
                    "ClusterDeprovision for '{}' is still in progress",
                    metadata.infra_id
                ));
            }
        }

        // Step 8: wait for the owned DNSZone to be gone before proceeding.
        if self.spec.manage_dns && dns_zone_exists(client, &namespace, &name).await? {
            delete_owned_dns_zone(client, &namespace, &name).await?;
            return Err(anyhow!("awaiting DNSZone deletion for '{name}' before removing finalizer"));
        }

        // Step 9: release any pool customization this CD was holding.
        release_customization_lock(client, &namespace, &self.spec).await?;

        Ok(())
    }
}

/// Writes the `Provisioned` condition onto the CD's own status subresource.
/// Used by the deprovision path, which does not go through the orchestrator's
/// single end-of-pass patch since `cleanup()` only receives `&self`.
async fn write_provisioned_condition(
    client: &Client,
    namespace: &str,
    name: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Result<()> {
    let api: Api<ClusterDeployment> = Api::namespaced(client.clone(), namespace);
    let current = api.get_status(name).await?;
    let mut conditions = current
        .status
        .map(|s| s.conditions)
        .unwrap_or_default();

    set_condition(
        &mut conditions,
        CONDITION_TYPE_PROVISIONED,
        status,
        reason,
        message,
        UpdateMode::Always,
    );

    let patch = json!({ "status": { "conditions": conditions } });
    api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

async fn active_provision(
    client: &Client,
    namespace: &str,
    cd_name: &str,
) -> Result<Option<ClusterProvision>> {
    let api: Api<ClusterProvision> = Api::namespaced(client.clone(), namespace);
    let provisions = api.list(&ListParams::default()).await?;
    Ok(provisions
        .items
        .into_iter()
        .find(|p| p.spec.cluster_deployment_ref.name == cd_name && !is_terminal(p)))
}

fn is_terminal(provision: &ClusterProvision) -> bool {
    provision
        .status
        .as_ref()
        .is_some_and(|s| s.success || s.failed)
}

async fn delete_provision(client: &Client, provision: &ClusterProvision) -> Result<()> {
    let namespace = provision.namespace().unwrap_or_default();
    let api: Api<ClusterProvision> = Api::namespaced(client.clone(), &namespace);
    api.delete(&provision.name_any(), &DeleteParams::default())
        .await?;
    Ok(())
}

async fn ensure_deprovision(
    client: &Client,
    namespace: &str,
    cd_name: &str,
    infra_id: &str,
    cluster_id: &str,
    platform: &Platform,
) -> Result<ClusterDeprovision> {
    let api: Api<ClusterDeprovision> = Api::namespaced(client.clone(), namespace);

    if let Ok(existing) = api.get(cd_name).await {
        return Ok(existing);
    }

    let mut labels = BTreeMap::new();
    labels.insert(CLUSTER_NAME_LABEL.to_string(), cd_name.to_string());

    let deprovision = ClusterDeprovision {
        metadata: ObjectMeta {
            name: Some(cd_name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: ClusterDeprovisionSpec {
            infra_id: infra_id.to_string(),
            cluster_id: Some(cluster_id.to_string()),
            platform: platform.clone(),
        },
        status: None,
    };

    Ok(api.create(&PostParams::default(), &deprovision).await?)
}

async fn dns_zone_exists(client: &Client, namespace: &str, cd_name: &str) -> Result<bool> {
    let api: Api<crate::crd::DNSZone> = Api::namespaced(client.clone(), namespace);
    Ok(api.get(cd_name).await.is_ok())
}

async fn delete_owned_dns_zone(client: &Client, namespace: &str, cd_name: &str) -> Result<()> {
    let api: Api<crate::crd::DNSZone> = Api::namespaced(client.clone(), namespace);
    match api.delete(cd_name, &DeleteParams::default()).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn release_customization_lock(
    client: &Client,
    namespace: &str,
    spec: &crate::crd::ClusterDeploymentSpec,
) -> Result<()> {
    let Some(pool_ref) = spec.cluster_pool_ref.as_ref() else {
        return Ok(());
    };
    let Some(customization_ref) = pool_ref.customization_ref.as_ref() else {
        return Ok(());
    };

    let api: Api<ClusterDeploymentCustomization> =
        Api::namespaced(client.clone(), &pool_ref.namespace);
    if api.get(&customization_ref.name).await.is_err() {
        return Ok(());
    }

    let patch = json!({ "status": { "clusterDeploymentRef": null } });
    api.patch_status(
        &customization_ref.name,
        &PatchParams::default(),
        &Patch::Merge(&patch),
    )
    .await?;

    info!(
        "released ClusterDeploymentCustomization {}/{} held by {}",
        pool_ref.namespace, customization_ref.name, namespace
    );

    Ok(())
}

#[cfg(test)]
#[path = "deprovision_tests.rs"]
mod deprovision_tests;

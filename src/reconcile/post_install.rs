// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Post-install reconciler (§4.7): promotes a `ClusterDeployment` to
//! `installed` on its first successful provision, takes ownership of the
//! admin credential secrets the installer produced, and mirrors the
//! installed cluster's console reachability and sync-set status back onto
//! the CD.

use crate::constants::{REMOTE_CONSOLE_NAMESPACE, REMOTE_CONSOLE_ROUTE_NAME};
use crate::context::Context;
use crate::crd::{ClusterDeployment, ClusterDeploymentStatus, ClusterMetadata, ClusterProvision, Condition};
use crate::errors::PostInstallError;
use crate::labels::{CLUSTER_NAME_LABEL, SECRET_TYPE_KUBECONFIG, SECRET_TYPE_LABEL, SECRET_TYPE_PASSWORD};
use crate::reconcilers::status::{find_condition, set_condition, UpdateMode};
use crate::status_reasons::{
    CONDITION_TYPE_SYNC_SET_FAILED, CONDITION_TYPE_UNREACHABLE, REASON_CONSOLE_ROUTE_REACHABLE,
    REASON_NO_SYNC_FAILURES, REASON_SYNC_SET_FAILED, REASON_SYNCSET_PAUSED,
    REASON_UNEXPECTED_HTTP_RESPONSE, REASON_UPSTREAM_UNREACHABLE,
};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::api::{Patch, PatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, Client, Config, Resource, ResourceExt};
use serde_json::json;
use std::collections::BTreeMap;

/// Annotation that, absent a sibling `ClusterSync`, forces
/// `SyncSetFailed=True/SyncSetPaused` instead of leaving the condition unset.
pub const SYNCSET_PAUSE_ANNOTATION: &str = "hive.example.io/syncset-pause";

/// Key under which the admin kubeconfig secret stores its YAML payload.
const KUBECONFIG_SECRET_KEY: &str = "kubeconfig";

/// What `promote_on_success` changed, for the caller to fold into the rest of
/// its pass without re-reading the ClusterDeployment.
pub struct PromotionOutcome {
    pub cluster_metadata: ClusterMetadata,
}

/// On first observation of `provision.status.success`, copies cluster
/// identity into `spec.clusterMetadata` and flips `spec.installed`. A no-op
/// if `cd` is already installed, the provision hasn't succeeded, or the
/// provision's status is missing any of the four required fields.
pub async fn promote_on_success(
    ctx: &Context,
    cd: &ClusterDeployment,
    provision: &ClusterProvision,
    status: &mut ClusterDeploymentStatus,
) -> Option<PromotionOutcome> {
    if cd.spec.installed {
        return None;
    }

    let provision_status = provision.status.as_ref().filter(|s| s.success)?;
    let cluster_metadata = ClusterMetadata {
        infra_id: provision_status.infra_id.clone()?,
        cluster_id: provision_status.cluster_id.clone()?,
        admin_kubeconfig_secret_ref: provision_status.admin_kubeconfig_secret_ref.clone()?,
        admin_password_secret_ref: provision_status.admin_password_secret_ref.clone()?,
    };

    let namespace = cd.namespace().unwrap_or_default();
    let name = cd.name_any();
    let api: Api<ClusterDeployment> = Api::namespaced(ctx.client.clone(), &namespace);
    let patch = json!({
        "spec": {
            "installed": true,
            "clusterMetadata": &cluster_metadata,
        }
    });

    if api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch)).await.is_err() {
        return None;
    }

    status.installed_timestamp = Some(Time(k8s_openapi::jiff::Timestamp::now()));
    Some(PromotionOutcome { cluster_metadata })
}

/// Runs once `cd` is installed: owns the admin secrets, derives `APIURL` and
/// `WebConsoleURL`, and mirrors sync-set status. Every failure here is
/// non-fatal to the rest of the reconcile pass — it is surfaced as the
/// `Unreachable` condition instead of aborting the orchestrator's pipeline.
pub async fn reconcile(
    ctx: &Context,
    cd: &ClusterDeployment,
    cluster_metadata: &ClusterMetadata,
    status: &mut ClusterDeploymentStatus,
    annotations: &BTreeMap<String, String>,
    conditions: &mut Vec<Condition>,
) {
    let namespace = cd.namespace().unwrap_or_default();
    let name = cd.name_any();

    ensure_secret_ownership(ctx, cd, &namespace, cluster_metadata).await;

    match read_kubeconfig(ctx, &namespace, &cluster_metadata.admin_kubeconfig_secret_ref.name, &name).await {
        Ok(kubeconfig) => {
            if let Some(server) = server_url(&kubeconfig) {
                status.api_url = Some(server);
            }

            match fetch_console_url(kubeconfig, &name).await {
                Ok(url) => {
                    status.web_console_url = Some(url);
                    set_condition(
                        conditions,
                        CONDITION_TYPE_UNREACHABLE,
                        "False",
                        REASON_CONSOLE_ROUTE_REACHABLE,
                        "console route is reachable",
                        UpdateMode::IfReasonOrMessageChange,
                    );
                }
                Err(e) => set_unreachable(conditions, &e),
            }
        }
        Err(e) => set_unreachable(conditions, &e),
    }

    mirror_sync_set_status(ctx, &namespace, &name, annotations, conditions);
}

fn set_unreachable(conditions: &mut Vec<Condition>, err: &PostInstallError) {
    let (reason, message) = match err {
        PostInstallError::UnexpectedHttpResponse { endpoint, status } => (
            REASON_UNEXPECTED_HTTP_RESPONSE,
            format!("console route '{endpoint}' returned unexpected status {status}"),
        ),
        PostInstallError::ConsoleRouteUnavailable { reason, .. } => (REASON_UPSTREAM_UNREACHABLE, reason.clone()),
    };
    set_condition(conditions, CONDITION_TYPE_UNREACHABLE, "True", reason, &message, UpdateMode::IfReasonOrMessageChange);
}

fn mirror_sync_set_status(
    ctx: &Context,
    namespace: &str,
    cd_name: &str,
    annotations: &BTreeMap<String, String>,
    conditions: &mut Vec<Condition>,
) {
    let sync = ctx.stores.get_cluster_sync(cd_name, namespace);
    let sync_conditions = sync.as_ref().and_then(|s| s.status.as_ref()).map(|s| s.conditions.as_slice());
    let paused = annotations.get(SYNCSET_PAUSE_ANNOTATION).map(String::as_str) == Some("true");

    let (status, reason, message) = evaluate_sync_set_status(sync_conditions, paused);
    set_condition(conditions, CONDITION_TYPE_SYNC_SET_FAILED, status, reason, &message, UpdateMode::IfReasonOrMessageChange);
}

/// Pure decision behind `mirror_sync_set_status`: `sync_conditions` is
/// `Some` iff a sibling `ClusterSync` was observed; `paused` reflects the
/// syncset-pause annotation.
fn evaluate_sync_set_status(sync_conditions: Option<&[Condition]>, paused: bool) -> (&'static str, &'static str, String) {
    match sync_conditions {
        Some(conditions) => match find_condition(conditions, "Failed") {
            Some(c) if c.status == "True" => (
                "True",
                REASON_SYNC_SET_FAILED,
                c.message.clone().unwrap_or_else(|| "ClusterSync reports Failed".to_string()),
            ),
            _ => ("False", REASON_NO_SYNC_FAILURES, "ClusterSync reports no failures".to_string()),
        },
        None if paused => (
            "True",
            REASON_SYNCSET_PAUSED,
            "syncset-pause annotation is set and no ClusterSync exists".to_string(),
        ),
        None => ("False", REASON_NO_SYNC_FAILURES, "no ClusterSync observed yet".to_string()),
    }
}

async fn ensure_secret_ownership(ctx: &Context, cd: &ClusterDeployment, namespace: &str, metadata: &ClusterMetadata) {
    let Some(owner) = cd.controller_owner_ref(&()) else {
        return;
    };

    let targets = [
        (metadata.admin_kubeconfig_secret_ref.name.as_str(), SECRET_TYPE_KUBECONFIG),
        (metadata.admin_password_secret_ref.name.as_str(), SECRET_TYPE_PASSWORD),
    ];

    let api: Api<Secret> = Api::namespaced(ctx.client.clone(), namespace);
    for (secret_name, secret_type) in targets {
        let Ok(existing) = api.get(secret_name).await else {
            continue;
        };
        if existing.owner_references().iter().any(|o| o.controller == Some(true)) {
            continue;
        }

        let mut labels = BTreeMap::new();
        labels.insert(CLUSTER_NAME_LABEL.to_string(), cd.spec.cluster_name.clone());
        labels.insert(SECRET_TYPE_LABEL.to_string(), secret_type.to_string());

        let patch = json!({
            "metadata": {
                "ownerReferences": [&owner],
                "labels": labels,
            }
        });
        let _ = api.patch(secret_name, &PatchParams::default(), &Patch::Merge(&patch)).await;
    }
}

async fn read_kubeconfig(
    ctx: &Context,
    namespace: &str,
    secret_name: &str,
    cd_name: &str,
) -> Result<Kubeconfig, PostInstallError> {
    let api: Api<Secret> = Api::namespaced(ctx.client.clone(), namespace);
    let secret = api.get(secret_name).await.map_err(|e| PostInstallError::ConsoleRouteUnavailable {
        cd_name: cd_name.to_string(),
        reason: format!("fetching kubeconfig secret '{secret_name}': {e}"),
    })?;

    let data = secret.data.ok_or_else(|| PostInstallError::ConsoleRouteUnavailable {
        cd_name: cd_name.to_string(),
        reason: format!("kubeconfig secret '{secret_name}' has no data"),
    })?;
    let raw = data.get(KUBECONFIG_SECRET_KEY).ok_or_else(|| PostInstallError::ConsoleRouteUnavailable {
        cd_name: cd_name.to_string(),
        reason: format!("kubeconfig secret '{secret_name}' is missing a '{KUBECONFIG_SECRET_KEY}' key"),
    })?;

    serde_yaml::from_slice(&raw.0).map_err(|e| PostInstallError::ConsoleRouteUnavailable {
        cd_name: cd_name.to_string(),
        reason: format!("parsing kubeconfig: {e}"),
    })
}

fn server_url(kubeconfig: &Kubeconfig) -> Option<String> {
    kubeconfig.clusters.iter().find_map(|c| c.cluster.as_ref()?.server.clone())
}

async fn fetch_console_url(kubeconfig: Kubeconfig, cd_name: &str) -> Result<String, PostInstallError> {
    let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|e| PostInstallError::ConsoleRouteUnavailable {
            cd_name: cd_name.to_string(),
            reason: format!("building client config from kubeconfig: {e}"),
        })?;

    let remote_client = Client::try_from(config).map_err(|e| PostInstallError::ConsoleRouteUnavailable {
        cd_name: cd_name.to_string(),
        reason: format!("constructing client against installed cluster: {e}"),
    })?;

    let route_resource = ApiResource::from_gvk(&GroupVersionKind::gvk("route.openshift.io", "v1", "Route"));
    let api: Api<DynamicObject> = Api::namespaced_with(remote_client, REMOTE_CONSOLE_NAMESPACE, &route_resource);

    let endpoint = format!("{REMOTE_CONSOLE_NAMESPACE}/{REMOTE_CONSOLE_ROUTE_NAME}");
    let route = api.get(REMOTE_CONSOLE_ROUTE_NAME).await.map_err(|e| match e {
        kube::Error::Api(err) => PostInstallError::UnexpectedHttpResponse {
            endpoint: endpoint.clone(),
            status: err.code,
        },
        other => PostInstallError::ConsoleRouteUnavailable {
            cd_name: cd_name.to_string(),
            reason: other.to_string(),
        },
    })?;

    route
        .data
        .get("spec")
        .and_then(|s| s.get("host"))
        .and_then(|h| h.as_str())
        .map(|host| format!("https://{host}"))
        .ok_or_else(|| PostInstallError::ConsoleRouteUnavailable {
            cd_name: cd_name.to_string(),
            reason: format!("console route '{endpoint}' has no spec.host"),
        })
}

#[cfg(test)]
#[path = "post_install_tests.rs"]
mod post_install_tests;

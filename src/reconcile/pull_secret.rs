// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pull-secret merger (§4.3): merges a cluster-local pull secret with the
//! process-global one into a derived secret owned by the `ClusterDeployment`.

use crate::context::Context;
use crate::crd::{ClusterDeployment, Condition};
use crate::errors::PullSecretError;
use crate::labels::{CLUSTER_NAME_LABEL, SECRET_TYPE_LABEL};
use crate::reconcilers::resources::create_or_apply;
use crate::reconcilers::status::{set_condition, UpdateMode};
use crate::status_reasons::{
    CONDITION_TYPE_REQUIREMENTS_MET, REASON_PULL_SECRET_INVALID, REASON_PULL_SECRET_MERGED,
};
use anyhow::Result;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::{Api, Resource, ResourceExt};
use serde_json::Value;
use std::collections::BTreeMap;

/// `SECRET_TYPE_LABEL` value stamped on the merged pull secret.
pub const MERGED_PULL_SECRET_TYPE: &str = "merged-pull-secret";

/// Name of the derived secret owned by a CD named `cd_name`.
#[must_use]
pub fn derived_secret_name(cd_name: &str) -> String {
    format!("{cd_name}-pull")
}

/// Merges the CD's local pull secret (if any) with the operator's global one
/// (if configured) and writes the result to `<cd>-pull`.
///
/// Returns `Ok(())` with `RequirementsMet=True` written on success, or
/// `Err(PullSecretError)` with `RequirementsMet=False` written on failure.
/// Callers treat an `Err` as a reason to abort the rest of the pass.
pub async fn reconcile(
    ctx: &Context,
    cd: &ClusterDeployment,
    conditions: &mut Vec<Condition>,
) -> Result<(), PullSecretError> {
    let namespace = cd.namespace().unwrap_or_default();
    let name = cd.name_any();

    let local = match &cd.spec.pull_secret_ref {
        Some(secret_ref) => Some(
            read_dockerconfigjson(ctx, &namespace, &secret_ref.name)
                .await
                .map_err(|reason| PullSecretError::Invalid {
                    secret_name: secret_ref.name.clone(),
                    namespace: namespace.clone(),
                    reason,
                })?,
        ),
        None => None,
    };

    let global = match &ctx.config.global_pull_secret {
        Some(secret_name) => read_dockerconfigjson(ctx, &ctx.config.operator_namespace, secret_name)
            .await
            .ok(),
        None => None,
    };

    if local.is_none() && global.is_none() {
        set_condition(
            conditions,
            CONDITION_TYPE_REQUIREMENTS_MET,
            "False",
            REASON_PULL_SECRET_INVALID,
            "no pull secret configured locally or globally",
            UpdateMode::IfReasonOrMessageChange,
        );
        return Err(PullSecretError::Invalid {
            secret_name: cd
                .spec
                .pull_secret_ref
                .as_ref()
                .map(|r| r.name.clone())
                .unwrap_or_default(),
            namespace: namespace.clone(),
            reason: "neither a local nor a global pull secret is available".to_string(),
        });
    }

    let merged = merge_auths(global.as_ref(), local.as_ref());

    write_merged_secret(ctx, &namespace, &name, cd, &merged)
        .await
        .map_err(|reason| PullSecretError::InvalidJson {
            secret_name: derived_secret_name(&name),
            reason,
        })?;

    set_condition(
        conditions,
        CONDITION_TYPE_REQUIREMENTS_MET,
        "True",
        REASON_PULL_SECRET_MERGED,
        &format!("merged pull secret written to '{}'", derived_secret_name(&name)),
        UpdateMode::IfReasonOrMessageChange,
    );

    Ok(())
}

/// Reads and parses the `.dockerconfigjson` entry of a named secret.
async fn read_dockerconfigjson(
    ctx: &Context,
    namespace: &str,
    name: &str,
) -> std::result::Result<Value, String> {
    let api: Api<Secret> = Api::namespaced(ctx.client.clone(), namespace);
    let secret = api.get(name).await.map_err(|e| e.to_string())?;
    let data = secret
        .data
        .ok_or_else(|| "secret has no data".to_string())?;
    let bytes = data
        .get(".dockerconfigjson")
        .ok_or_else(|| "secret is missing a .dockerconfigjson key".to_string())?;
    serde_json::from_slice(&bytes.0).map_err(|e| e.to_string())
}

/// JSON union of `auths.*` entries, local taking precedence over global.
fn merge_auths(global: Option<&Value>, local: Option<&Value>) -> Value {
    let mut auths = serde_json::Map::new();
    for source in [global, local] {
        if let Some(obj) = source.and_then(|v| v.get("auths")).and_then(Value::as_object) {
            for (registry, creds) in obj {
                auths.insert(registry.clone(), creds.clone());
            }
        }
    }
    serde_json::json!({ "auths": Value::Object(auths) })
}

async fn write_merged_secret(
    ctx: &Context,
    namespace: &str,
    cd_name: &str,
    cd: &ClusterDeployment,
    merged: &Value,
) -> std::result::Result<(), String> {
    let mut labels = BTreeMap::new();
    labels.insert(CLUSTER_NAME_LABEL.to_string(), cd.spec.cluster_name.clone());
    labels.insert(SECRET_TYPE_LABEL.to_string(), MERGED_PULL_SECRET_TYPE.to_string());

    let owner = cd
        .controller_owner_ref(&())
        .ok_or_else(|| "ClusterDeployment has no UID to own a secret".to_string())?;

    let bytes = serde_json::to_vec(merged).map_err(|e| e.to_string())?;
    let mut data = BTreeMap::new();
    data.insert(".dockerconfigjson".to_string(), ByteString(bytes));

    let secret = Secret {
        metadata: ObjectMeta {
            name: Some(derived_secret_name(cd_name)),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        type_: Some("kubernetes.io/dockerconfigjson".to_string()),
        data: Some(data),
        ..Default::default()
    };

    create_or_apply(&ctx.client, namespace, &secret, "cdoperator-controller")
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "pull_secret_tests.rs"]
mod pull_secret_tests;

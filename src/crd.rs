// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions for the cluster-lifecycle controller.
//!
//! This module defines every Kubernetes Custom Resource the controller reads or
//! writes: the aggregate root [`ClusterDeployment`], its subordinate
//! [`ClusterProvision`] attempts and [`ClusterDeprovision`] request, the
//! [`ClusterImageSet`] it resolves installer images from, the [`DNSZone`] it
//! manages when DNS is delegated, the sibling [`ClusterSync`] it mirrors
//! `SyncSetFailed` status from, and the [`ClusterDeploymentCustomization`] whose
//! pool lock it releases on delete.
//!
//! # Example: Creating a minimal `ClusterDeployment`
//!
//! ```rust
//! use cdoperator::crd::{ClusterDeploymentSpec, Platform, AwsPlatform, Provisioning, SecretReference};
//!
//! let spec = ClusterDeploymentSpec {
//!     cluster_name: "bar".to_string(),
//!     installed: false,
//!     preserve_on_delete: false,
//!     manage_dns: false,
//!     install_attempts_limit: Some(3),
//!     platform: Platform {
//!         aws: Some(AwsPlatform { region: "us-east-1".to_string(), credentials_secret_ref: SecretReference { name: "foo-aws-creds".to_string() } }),
//!         azure: None,
//!         bare_metal: None,
//!     },
//!     provisioning: Some(Provisioning {
//!         release_image: Some("quay.io/openshift/release@sha256:abc".to_string()),
//!         image_set_ref: None,
//!         install_config_secret_ref: Some(SecretReference { name: "install-config-secret".to_string() }),
//!     }),
//!     cluster_install_ref: None,
//!     pull_secret_ref: Some(SecretReference { name: "pull-secret".to_string() }),
//!     cluster_pool_ref: None,
//!     cluster_metadata: None,
//! };
//! assert_eq!(spec.cluster_name, "bar");
//! ```

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition represents an observation of a resource's current state.
///
/// Conditions are the sole user-visible surface for reconciliation outcomes
/// (see the condition algebra in `reconcilers::status`). `last_probe_time` moves
/// on every evaluation of the condition; `last_transition_time` moves only when
/// `status` itself changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition, e.g. `Provisioned`, `DNSNotReady`, `SyncSetFailed`.
    pub r#type: String,

    /// Status of the condition: `True`, `False`, or `Unknown`.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the controller evaluated this condition (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_probe_time: Option<String>,

    /// Last time `status` itself changed (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Reference to a `Secret` in the same namespace as the referencing resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    pub name: String,
}

/// Reference to a `ClusterImageSet` by name (cluster-scoped).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterImageSetReference {
    pub name: String,
}

/// AWS platform details: region and the secret carrying account credentials.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AwsPlatform {
    pub region: String,
    pub credentials_secret_ref: SecretReference,
}

/// Azure platform details: region/cloud name and the secret carrying credentials.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AzurePlatform {
    pub region: String,
    pub credentials_secret_ref: SecretReference,
}

/// Bare-metal platform details. Carries no credentials: there is no cloud
/// account to authenticate against, and deprovision is a no-op (§4.8.4).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct BareMetalPlatform {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_vip: Option<String>,
}

/// Platform is a tagged union over supported infrastructure providers.
///
/// Exactly one variant field is expected to be set; which one determines the
/// capability dispatch in `platform::capability_for` (managed-DNS support,
/// deprovision no-op, credential validation, deprovision request shape).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzurePlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bare_metal: Option<BareMetalPlatform>,
}

/// Release-image and install-config inputs for a direct (non-delegated) install.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct Provisioning {
    /// Explicit release image pull spec. Takes precedence over `image_set_ref`
    /// when both are set (§4.4).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_set_ref: Option<ClusterImageSetReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_config_secret_ref: Option<SecretReference>,
}

/// Alternative to `Provisioning`: delegates installation to an external
/// installer resource identified by group/version/kind/name. The core never
/// runs the delegated installer's logic; it only watches for its terminal
/// conditions (`ClusterInstallFailed`/`ClusterInstallCompleted`/`ClusterInstallStopped`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterInstallRef {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub name: String,
}

/// Reference to a `ClusterPool` this CD was checked out from, and optionally to
/// the `ClusterDeploymentCustomization` applied at checkout time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPoolReference {
    pub pool_name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization_ref: Option<LocalObjectReference>,
}

/// Reference to an object in the same namespace, by name only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocalObjectReference {
    pub name: String,
}

/// Cluster identity and admin-access data, populated by the post-install
/// reconciler (§4.7) once a provision attempt terminates successfully.
///
/// Per invariant (1), either all four fields are present or none are: the
/// core never partially populates this struct (§13 Open-Question decision).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMetadata {
    pub infra_id: String,
    pub cluster_id: String,
    pub admin_kubeconfig_secret_ref: SecretReference,
    pub admin_password_secret_ref: SecretReference,
}

/// `ClusterDeployment` is the aggregate root: a declarative description of a
/// managed OpenShift cluster, reconciled toward installed / deprovisioned.
///
/// See SPEC_FULL.md §3 for the full data-model rationale, and §4.9 for the
/// single-pass reconciliation contract.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "hive.example.io",
    version = "v1",
    kind = "ClusterDeployment",
    namespaced,
    shortname = "cd",
    shortname = "cds",
    doc = "ClusterDeployment is a declarative description of a managed OpenShift cluster, reconciled toward installed or deprovisioned by the cluster-lifecycle controller.",
    printcolumn = r#"{"name":"ClusterName","type":"string","jsonPath":".spec.clusterName"}"#,
    printcolumn = r#"{"name":"Installed","type":"boolean","jsonPath":".spec.installed"}"#,
    printcolumn = r#"{"name":"InfraID","type":"string","jsonPath":".spec.clusterMetadata.infraID"}"#,
    printcolumn = r#"{"name":"Provisioned","type":"string","jsonPath":".status.conditions[?(@.type=='Provisioned')].status"}"#,
    printcolumn = r#"{"name":"ProvisionedReason","type":"string","jsonPath":".status.conditions[?(@.type=='Provisioned')].reason"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[kube(status = "ClusterDeploymentStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentSpec {
    /// Short, human-chosen name of the cluster (distinct from the CD's own
    /// Kubernetes resource name); used to derive subordinate resource names.
    pub cluster_name: String,

    /// Monotonically transitions false→true once the first provision attempt
    /// succeeds (§4.7). Never reset to false by the core.
    #[serde(default)]
    pub installed: bool,

    /// When true, deprovision is skipped entirely on delete for an installed
    /// cluster (§4.8.3) — the cloud resources are left running.
    #[serde(default)]
    pub preserve_on_delete: bool,

    /// When true, the core creates and awaits an owned `DNSZone` before
    /// allowing provisioning to proceed (§4.5).
    #[serde(default)]
    pub manage_dns: bool,

    /// Maximum number of install attempts (0 means "one attempt, no retry").
    /// `None` means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_attempts_limit: Option<i32>,

    pub platform: Platform,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning: Option<Provisioning>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_install_ref: Option<ClusterInstallRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_secret_ref: Option<SecretReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_pool_ref: Option<ClusterPoolReference>,

    /// Populated by the post-install reconciler (§4.7); never set by the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_metadata: Option<ClusterMetadata>,
}

/// Observed state written by the core. Every field here is re-derivable from
/// subordinate resources on each pass (§5 Ordering guarantees) except
/// `install_restarts`, which is persisted precisely because it must be
/// non-decreasing across passes (invariant 2).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provision_ref: Option<LocalObjectReference>,

    #[serde(default)]
    pub install_restarts: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_console_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_timestamp: Option<Time>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

/// `ClusterProvision` is one attempt at installing a cluster (§3 Lifecycles).
/// Produced by the core, observed (never driven) by it; the provision
/// controller itself is out of scope (§1).
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "hive.example.io",
    version = "v1",
    kind = "ClusterProvision",
    namespaced,
    shortname = "cp",
    doc = "ClusterProvision represents one attempt at installing a ClusterDeployment.",
    printcolumn = r#"{"name":"ClusterDeployment","type":"string","jsonPath":".spec.clusterDeploymentRef.name"}"#,
    printcolumn = r#"{"name":"Attempt","type":"integer","jsonPath":".spec.attempt"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[kube(status = "ClusterProvisionStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterProvisionSpec {
    pub cluster_deployment_ref: LocalObjectReference,

    /// Ordinal of this attempt, starting at 0 (§4.6).
    #[serde(default)]
    pub attempt: i32,
}

/// Terminal stage of a `ClusterProvision`: mutually exclusive with `failed`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProvisionStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Set true exactly once, when the delegated installer reports success.
    #[serde(default)]
    pub success: bool,

    /// Set true exactly once, when the delegated installer reports terminal
    /// failure. A provision is terminal iff `success || failed`.
    #[serde(default)]
    pub failed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_time: Option<Time>,

    /// Short CamelCase reason for the failure, checked against the
    /// retry-reasons allowlist (§4.6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_kubeconfig_secret_ref: Option<SecretReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password_secret_ref: Option<SecretReference>,
}

/// `ClusterDeprovision` is one attempt at destroying cloud resources for a
/// previously-installed cluster (§4.8).
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "hive.example.io",
    version = "v1",
    kind = "ClusterDeprovision",
    namespaced,
    shortname = "cdr",
    doc = "ClusterDeprovision requests destruction of cloud resources for a ClusterDeployment's infra ID.",
    printcolumn = r#"{"name":"InfraID","type":"string","jsonPath":".spec.infraId"}"#,
    printcolumn = r#"{"name":"Completed","type":"boolean","jsonPath":".status.completed"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[kube(status = "ClusterDeprovisionStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeprovisionSpec {
    pub infra_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    pub platform: Platform,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeprovisionStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(default)]
    pub completed: bool,

    /// Set when the cloud provider rejects the deprovision attempt's
    /// credentials (§4.8.7); distinct from a generic in-progress state.
    #[serde(default)]
    pub authentication_failure: bool,
}

/// `ClusterImageSet` names a release image, from which installer and CLI
/// container images are resolved (§4.4). Cluster-scoped: shared across
/// namespaces the way a shared catalog entry is.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "hive.example.io",
    version = "v1",
    kind = "ClusterImageSet",
    shortname = "cis",
    doc = "ClusterImageSet names a release image from which installer and CLI container images are resolved.",
    printcolumn = r#"{"name":"ReleaseImage","type":"string","jsonPath":".spec.releaseImage"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterImageSetSpec {
    pub release_image: String,
}

/// `DNSZone` is a Hive-owned delegation zone created as a prerequisite to
/// installation (§4.5). Owned and created by the core; its own reconciliation
/// (zone registration with the DNS provider) is a sibling controller (§1),
/// out of scope here — the core only reads `ZoneAvailable` and the specific
/// failure conditions it translates.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "hive.example.io",
    version = "v1",
    kind = "DNSZone",
    namespaced,
    shortname = "dnszone",
    doc = "DNSZone is a Hive-owned DNS delegation zone, created as a prerequisite to managed-DNS installation.",
    printcolumn = r#"{"name":"Zone","type":"string","jsonPath":".spec.zone"}"#,
    printcolumn = r#"{"name":"Available","type":"string","jsonPath":".status.conditions[?(@.type=='ZoneAvailable')].status"}"#
)]
#[kube(status = "DNSZoneStatus")]
#[serde(rename_all = "camelCase")]
pub struct DNSZoneSpec {
    pub zone: String,

    #[serde(default)]
    pub preserve_on_delete: bool,

    pub platform: Platform,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DNSZoneStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// `ClusterSync` is the aggregated result of applying a cluster's sync sets
/// and selector-sync-sets. The core only mirrors its `Failed` condition into
/// `SyncSetFailed` on the owning CD (§4.7); it never drives sync-set
/// application itself (§1).
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "hiveinternal.example.io",
    version = "v1alpha1",
    kind = "ClusterSync",
    namespaced,
    doc = "ClusterSync aggregates the result of applying SyncSets and SelectorSyncSets to an installed cluster."
)]
#[kube(status = "ClusterSyncStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterSyncSpec {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSyncStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// `ClusterDeploymentCustomization` is applied to a CD checked out of a
/// `ClusterPool`. The core's only interaction with it is releasing its
/// in-use lock condition on CD delete (§4.8.9).
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "hive.example.io",
    version = "v1",
    kind = "ClusterDeploymentCustomization",
    namespaced,
    shortname = "cdc",
    doc = "ClusterDeploymentCustomization is applied to a ClusterDeployment checked out from a ClusterPool."
)]
#[kube(status = "ClusterDeploymentCustomizationStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentCustomizationSpec {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentCustomizationStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Name of the `ClusterDeployment` currently holding this customization,
    /// cleared by the deprovision coordinator (§4.8.9).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_deployment_ref: Option<LocalObjectReference>,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants used across all reconcilers.
//!
//! This module defines standard Kubernetes labels and controller-specific
//! labels/annotations to ensure consistency across every resource the
//! controller creates or reads.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the component name within the architecture (e.g., "cluster-lifecycle")
pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of the application
pub const K8S_NAME: &str = "app.kubernetes.io/name";

/// Standard label for a unique name identifying the instance of an application
pub const K8S_INSTANCE: &str = "app.kubernetes.io/instance";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

// ============================================================================
// Kubernetes Standard Label Values
// ============================================================================

/// Value for `app.kubernetes.io/part-of` indicating this resource is part of the
/// cluster-lifecycle controller's domain.
pub const PART_OF_CLUSTER_LIFECYCLE: &str = "cluster-lifecycle";

/// Component value for owned `ClusterProvision` jobs.
pub const COMPONENT_PROVISION: &str = "provision";

/// Component value for owned `DNSZone` resources.
pub const COMPONENT_DNS_ZONE: &str = "dns-zone";

// ============================================================================
// Kubernetes Standard Label Values - Managed By
// ============================================================================

/// Value for `app.kubernetes.io/managed-by` on resources owned by a `ClusterDeployment`.
pub const MANAGED_BY_CLUSTER_DEPLOYMENT: &str = "ClusterDeployment";

// ============================================================================
// Domain-Specific Labels (§6 "Labels written")
// ============================================================================

/// Label carrying the CD's human-chosen `spec.clusterName`, set on every
/// owned object (provisions, DNS zone, generated secrets).
pub const CLUSTER_NAME_LABEL: &str = "hive.example.io/cluster-name";

/// Label carrying the CD's platform kind (`aws`, `azure`, `baremetal`).
pub const CLUSTER_PLATFORM_LABEL: &str = "hive.example.io/cluster-platform";

/// Label carrying the CD's platform region, when the platform has one.
pub const CLUSTER_REGION_LABEL: &str = "hive.example.io/cluster-region";

/// Label set on a `Secret` to record what kind of generated credential it
/// holds (`kubeconfig`, `password`).
pub const SECRET_TYPE_LABEL: &str = "hive.example.io/secret-type";

/// Label set on an owned `Job` to record which reconciler concern created it.
pub const JOB_TYPE_LABEL: &str = "hive.example.io/job-type";

// ============================================================================
// Annotations
// ============================================================================

/// Annotation used to trigger reconciliation (value is a timestamp).
pub const RECONCILE_TRIGGER_ANNOTATION: &str = "hive.example.io/reconcile-trigger";

// ============================================================================
// Finalizers
// ============================================================================

/// Finalizer for `ClusterDeployment` resources; gates cleanup of owned
/// provisions/DNS zone and, for an installed cluster, deprovisioning.
pub const FINALIZER_CLUSTER_DEPLOYMENT: &str = "hive.example.io/clusterdeployment-finalizer";

/// Finalizer for `ClusterDeploymentCustomization` resources; ensures the
/// in-use lock condition is released before deletion.
pub const FINALIZER_CLUSTER_DEPLOYMENT_CUSTOMIZATION: &str =
    "hive.example.io/clusterdeploymentcustomization-finalizer";

// ============================================================================
// Secret Type Values
// ============================================================================

/// `SECRET_TYPE_LABEL` value for generated admin kubeconfig secrets.
pub const SECRET_TYPE_KUBECONFIG: &str = "kubeconfig";

/// `SECRET_TYPE_LABEL` value for generated admin password secrets.
pub const SECRET_TYPE_PASSWORD: &str = "password";

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the cluster-lifecycle controller.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for `ClusterDeployment`, `ClusterProvision`, `ClusterDeprovision`,
/// `ClusterImageSet`, `DNSZone`, and `ClusterDeploymentCustomization`.
pub const API_GROUP: &str = "hive.example.io";

/// API version for the above kinds.
pub const API_VERSION: &str = "v1";

/// Fully qualified API version (group/version).
pub const API_GROUP_VERSION: &str = "hive.example.io/v1";

/// API group for internally-facing aggregation types such as `ClusterSync`.
pub const API_GROUP_INTERNAL: &str = "hiveinternal.example.io";

/// API version for internally-facing aggregation types.
pub const API_VERSION_INTERNAL: &str = "v1alpha1";

/// Kind name for `ClusterDeployment`.
pub const KIND_CLUSTER_DEPLOYMENT: &str = "ClusterDeployment";

/// Kind name for `ClusterProvision`.
pub const KIND_CLUSTER_PROVISION: &str = "ClusterProvision";

/// Kind name for `ClusterDeprovision`.
pub const KIND_CLUSTER_DEPROVISION: &str = "ClusterDeprovision";

/// Kind name for `ClusterImageSet`.
pub const KIND_CLUSTER_IMAGE_SET: &str = "ClusterImageSet";

/// Kind name for `DNSZone`.
pub const KIND_DNS_ZONE: &str = "DNSZone";

/// Kind name for `ClusterSync`.
pub const KIND_CLUSTER_SYNC: &str = "ClusterSync";

/// Kind name for `ClusterDeploymentCustomization`.
pub const KIND_CLUSTER_DEPLOYMENT_CUSTOMIZATION: &str = "ClusterDeploymentCustomization";

// ============================================================================
// Provision Attempt Backoff Constants (§4.6)
// ============================================================================

/// Base backoff before the first retried provision attempt (1 minute).
pub const PROVISION_BACKOFF_BASE_SECS: u64 = 60;

/// Ceiling on provision-attempt backoff, regardless of attempt count (24 hours).
pub const PROVISION_BACKOFF_MAX_SECS: u64 = 24 * 60 * 60;

/// Window after which a ClusterProvision with no recorded movement is treated
/// as stuck and superseded by a fresh attempt (§4.6 "stuck install" handling).
pub const PROVISION_STUCK_THRESHOLD_SECS: u64 = 2 * 60 * 60;

/// Retention window for a terminal ClusterProvision that is no longer the
/// active attempt, after which it becomes eligible for garbage collection
/// (§4.6 "stale provision retention").
pub const STALE_PROVISION_RETENTION_SECS: u64 = 7 * 24 * 60 * 60;

// ============================================================================
// Managed DNS Constants (§4.5)
// ============================================================================

/// Maximum time the core waits for an owned `DNSZone` to report
/// `ZoneAvailable=True` before surfacing `DNSNotReady` (10 minutes).
pub const DNS_ZONE_WAIT_SECS: u64 = 10 * 60;

/// Annotation set once a DNSZone has ever reported ready; never cleared
/// (§13 Open-Question decision on `dns-ready` persistence).
pub const DNS_READY_ANNOTATION: &str = "hive.example.io/dns-ready";

// ============================================================================
// Remote Cluster Access Constants (§4.7)
// ============================================================================

/// Namespace the web console `Route` is expected in on the installed cluster.
pub const REMOTE_CONSOLE_NAMESPACE: &str = "openshift-console";

/// Name of the web console `Route` on the installed cluster.
pub const REMOTE_CONSOLE_ROUTE_NAME: &str = "console";

// ============================================================================
// Controller Requeue & Error Handling Constants
// ============================================================================

/// Default requeue interval for a successful reconcile with nothing pending
/// (1 minute).
pub const DEFAULT_REQUEUE_DURATION_SECS: u64 = 60;

/// Requeue duration after a reconcile error (30 seconds).
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

// ============================================================================
// Leader Election Constants
// ============================================================================

/// Default leader election lease duration (15 seconds).
pub const DEFAULT_LEASE_DURATION_SECS: u64 = 15;

/// Default leader election renew deadline (10 seconds).
pub const DEFAULT_LEASE_RENEW_DEADLINE_SECS: u64 = 10;

/// Default leader election retry period (2 seconds).
pub const DEFAULT_LEASE_RETRY_PERIOD_SECS: u64 = 2;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for the Tokio runtime.
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Default client-side queries-per-second budget, informational only until
/// the Tower rate-limiting layer lands.
pub const KUBE_CLIENT_QPS: f32 = 20.0;

/// Default client-side burst budget, informational only until the Tower
/// rate-limiting layer lands.
pub const KUBE_CLIENT_BURST: u32 = 30;

// ============================================================================
// Kubernetes API List Constants
// ============================================================================

/// Page size used for paginated list calls against the Kubernetes API server.
pub const KUBE_LIST_PAGE_SIZE: u32 = 500;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for the Prometheus metrics HTTP server.
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for the Prometheus metrics endpoint.
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for the metrics HTTP server.
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";

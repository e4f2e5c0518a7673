// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Standard Kubernetes status condition reasons for cluster-lifecycle resources.
//!
//! This module defines constants for condition reasons following Kubernetes conventions.
//! Reasons are programmatic identifiers in CamelCase that explain why a condition has
//! a particular status.
//!
//! # Condition Types
//!
//! A `ClusterDeployment`'s `status.conditions` carries one entry per condition type
//! named below; `Provisioned` is the summary condition computed from every other
//! condition plus the active `ClusterProvision` (see `reconcile::orchestrator`).
//!
//! ```yaml
//! status:
//!   conditions:
//!     - type: Provisioned
//!       status: "True"
//!       reason: ProvisionSucceeded
//!       message: "cluster was successfully installed"
//!     - type: DNSNotReady
//!       status: "False"
//!       reason: ZoneAvailable
//!       message: "DNSZone bar is available"
//!     - type: SyncSetFailed
//!       status: "False"
//!       reason: NoFailures
//! ```

// ============================================================================
// RequirementsMet (§4.3/§4.9)
// ============================================================================

/// All preflight requirements (pull secret, images, DNS, credentials) are met.
pub const REASON_REQUIREMENTS_MET: &str = "RequirementsMet";

/// First-ever observation of a condition, before any pass has evaluated it.
pub const REASON_INITIALIZED: &str = "Initialized";

/// The platform's credentials secret exists and carries data.
pub const REASON_CREDENTIALS_VALID: &str = "CredentialsValid";

// ============================================================================
// ProvisionStopped (§4.6)
// ============================================================================

/// `installAttemptsLimit` was reached without a successful install.
pub const REASON_ATTEMPTS_LIMIT_REACHED: &str = "InstallAttemptsLimitReached";

/// The most recent provision's failure reason is not in the retry allowlist.
pub const REASON_FAILURE_REASON_NOT_RETRYABLE: &str = "FailureReasonNotRetryable";

// ============================================================================
// InstallLaunchError (§4.6)
// ============================================================================

/// The active provision's install pod is stuck in `Pending`.
pub const REASON_POD_IN_PENDING_PHASE: &str = "PodInPendingPhase";

// ============================================================================
// Provisioned (summary condition, §4.7/§4.9)
// ============================================================================

/// A provision attempt succeeded and the cluster is installed.
pub const REASON_PROVISION_SUCCEEDED: &str = "ProvisionSucceeded";

/// An install attempt is currently running.
pub const REASON_PROVISIONING: &str = "Provisioning";

/// The active provision attempt failed with a reason not in the retry
/// allowlist, or the attempts limit was reached; no further attempts follow.
pub const REASON_PROVISION_STOPPED: &str = "ProvisionStopped";

/// The active provision attempt failed with a retryable reason and a new
/// attempt is scheduled per the backoff schedule.
pub const REASON_PROVISION_FAILED_RETRYING: &str = "ProvisionFailedRetrying";

/// Waiting on a prerequisite (DNS zone, pull secret, image resolution)
/// before a provision attempt can be created.
pub const REASON_PROVISION_PENDING: &str = "ProvisionPending";

// ============================================================================
// DNSNotReady (§4.5)
// ============================================================================

/// The owned `DNSZone` reports `ZoneAvailable=True`.
pub const REASON_ZONE_AVAILABLE: &str = "ZoneAvailable";

/// Waiting for the owned `DNSZone` to become available.
pub const REASON_ZONE_PENDING: &str = "ZonePending";

/// The owned `DNSZone` exceeded the maximum wait without becoming available.
pub const REASON_ZONE_TIMED_OUT: &str = "ZoneTimedOut";

/// Managed DNS was requested on a platform that does not support it.
pub const REASON_DNS_UNSUPPORTED_PLATFORM: &str = "UnsupportedPlatform";

/// An owned `DNSZone` already exists but is not controller-owned by this CD.
pub const REASON_ZONE_RESOURCE_CONFLICT: &str = "ZoneResourceConflict";

/// The owned `DNSZone` reports insufficient DNS-provider credentials.
pub const REASON_INSUFFICIENT_CREDENTIALS: &str = "InsufficientCredentials";

/// The owned `DNSZone` reports the DNS provider requires an API opt-in.
pub const REASON_API_OPT_IN_REQUIRED: &str = "APIOptInRequired";

/// The owned `DNSZone` reports an unclassified provider-side error.
pub const REASON_GENERIC_DNS_ERRORS: &str = "GenericDNSErrors";

// ============================================================================
// Pull secret merge (§4.3)
// ============================================================================

/// Pull secret merge succeeded and the merged secret was written.
pub const REASON_PULL_SECRET_MERGED: &str = "PullSecretMerged";

/// Referenced pull secret (CD-local or global) is missing or malformed.
pub const REASON_PULL_SECRET_INVALID: &str = "PullSecretInvalid";

// ============================================================================
// Installer image resolution (§4.4)
// ============================================================================

/// Release image resolved to installer/CLI image references.
pub const REASON_IMAGE_RESOLVED: &str = "ImageResolved";

/// Neither `provisioning.releaseImage` nor a resolvable `imageSetRef` is set.
pub const REASON_IMAGE_NOT_SPECIFIED: &str = "NoReleaseImage";

/// `provisioning.imageSetRef` names a `ClusterImageSet` that does not exist.
pub const REASON_IMAGE_SET_NOT_FOUND: &str = "ClusterImageSetNotFound";

/// The release image is not referenced by digest, or its signature failed verification.
pub const REASON_RELEASE_IMAGE_VERIFICATION_FAILED: &str = "ReleaseImageVerificationFailed";

/// The Job created to resolve installer/CLI images failed.
pub const REASON_JOB_TO_RESOLVE_IMAGES_FAILED: &str = "JobToResolveImagesFailed";

// ============================================================================
// SyncSetFailed (§4.7)
// ============================================================================

/// No sync set failures are reported by the cluster's `ClusterSync`.
pub const REASON_NO_SYNC_FAILURES: &str = "NoFailures";

/// The cluster's `ClusterSync` reports `Failed=True`.
pub const REASON_SYNC_SET_FAILED: &str = "SyncSetFailed";

// ============================================================================
// Deprovision (§4.8)
// ============================================================================

/// Deprovision completed; all cloud resources for the infra ID are gone.
pub const REASON_DEPROVISION_COMPLETED: &str = "DeprovisionCompleted";

/// A deprovision attempt is in progress.
pub const REASON_DEPROVISIONING: &str = "Deprovisioning";

/// The cloud provider rejected the deprovision attempt's credentials.
pub const REASON_AUTHENTICATION_FAILED: &str = "AuthenticationFailed";

/// Deprovision was skipped because the platform has no cloud resources to
/// destroy (bare metal) or `preserveOnDelete` was set.
pub const REASON_DEPROVISION_SKIPPED: &str = "DeprovisionSkipped";

// ============================================================================
// Generic / transport
// ============================================================================

/// An external HTTP call (credential preflight, console route fetch)
/// returned an unexpected status code.
pub const REASON_UNEXPECTED_HTTP_RESPONSE: &str = "UnexpectedHttpResponse";

/// An external HTTP call could not reach its destination at all.
pub const REASON_UPSTREAM_UNREACHABLE: &str = "UpstreamUnreachable";

/// The installed cluster's console route was fetched successfully.
pub const REASON_CONSOLE_ROUTE_REACHABLE: &str = "ConsoleRouteReachable";

// ============================================================================
// Condition type names
// ============================================================================

pub const CONDITION_TYPE_PROVISIONED: &str = "Provisioned";
pub const CONDITION_TYPE_DNS_NOT_READY: &str = "DNSNotReady";
pub const CONDITION_TYPE_SYNC_SET_FAILED: &str = "SyncSetFailed";
pub const CONDITION_TYPE_AUTHENTICATION_FAILURE: &str = "AuthenticationFailure";
pub const CONDITION_TYPE_REQUIREMENTS_MET: &str = "RequirementsMet";
pub const CONDITION_TYPE_PROVISION_STOPPED: &str = "ProvisionStopped";
pub const CONDITION_TYPE_INSTALL_IMAGES_NOT_RESOLVED: &str = "InstallImagesNotResolved";
pub const CONDITION_TYPE_INSTALL_LAUNCH_ERROR: &str = "InstallLaunchError";
pub const CONDITION_TYPE_UNREACHABLE: &str = "Unreachable";

// ============================================================================
// SyncSetFailed (annotation-driven pause, §4.7)
// ============================================================================

/// `ClusterSync` reconciliation is paused via the syncset-pause annotation.
pub const REASON_SYNCSET_PAUSED: &str = "SyncSetPaused";

#[cfg(test)]
#[path = "status_reasons_tests.rs"]
mod status_reasons_tests;

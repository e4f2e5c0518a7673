// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the cluster-lifecycle controller.
//!
//! This module provides structured error types for each reconciler concern:
//! pull-secret merging, installer-image resolution, managed-DNS coordination,
//! provision-attempt management, post-install data collection, and deprovision
//! coordination. Each nested enum maps to a `status_reasons` constant via
//! [`ReconcileError::status_reason`], and [`ReconcileError::is_transient`]
//! tells the caller whether to retry immediately or surface a terminal
//! condition.

use thiserror::Error;

use crate::status_reasons::{
    REASON_AUTHENTICATION_FAILED, REASON_DNS_UNSUPPORTED_PLATFORM, REASON_IMAGE_NOT_SPECIFIED,
    REASON_IMAGE_SET_NOT_FOUND, REASON_PULL_SECRET_INVALID, REASON_UNEXPECTED_HTTP_RESPONSE,
    REASON_UPSTREAM_UNREACHABLE, REASON_ZONE_TIMED_OUT,
};

/// Errors merging the global and CD-local pull secrets (§4.3).
#[derive(Error, Debug, Clone)]
pub enum PullSecretError {
    /// Referenced `Secret` does not exist or lacks a `.dockerconfigjson` key.
    #[error("pull secret '{secret_name}' in namespace '{namespace}' is missing or malformed: {reason}")]
    Invalid {
        secret_name: String,
        namespace: String,
        reason: String,
    },

    /// `.dockerconfigjson` contents failed to parse as JSON.
    #[error("pull secret '{secret_name}' contains invalid JSON: {reason}")]
    InvalidJson { secret_name: String, reason: String },
}

/// Errors resolving installer/CLI images from a release image (§4.4).
#[derive(Error, Debug, Clone)]
pub enum ImageResolutionError {
    /// Neither `provisioning.releaseImage` nor an imageSetRef resolves to an image.
    #[error("ClusterDeployment '{name}' specifies no release image or ClusterImageSet reference")]
    NotSpecified { name: String },

    /// `provisioning.imageSetRef` names a `ClusterImageSet` that does not exist.
    #[error("ClusterImageSet '{image_set_name}' referenced by '{cd_name}' not found")]
    ImageSetNotFound {
        image_set_name: String,
        cd_name: String,
    },
}

/// Errors coordinating an owned `DNSZone` (§4.5).
#[derive(Error, Debug, Clone)]
pub enum DnsCoordinationError {
    /// The owned zone did not report `ZoneAvailable=True` within the wait window.
    #[error("DNSZone '{zone_name}' did not become available within {waited_secs}s")]
    ZoneTimedOut { zone_name: String, waited_secs: u64 },

    /// Managed DNS was requested on a platform the capability interface rejects.
    #[error("platform '{platform}' does not support managed DNS")]
    UnsupportedPlatform { platform: String },
}

/// Errors managing `ClusterProvision` attempts (§4.6).
#[derive(Error, Debug, Clone)]
pub enum ProvisionError {
    /// Creating the next `ClusterProvision` attempt failed.
    #[error("failed to create ClusterProvision attempt {attempt} for '{cd_name}': {reason}")]
    AttemptCreationFailed {
        cd_name: String,
        attempt: i32,
        reason: String,
    },

    /// The configured attempts limit was reached without a successful install.
    #[error("ClusterDeployment '{cd_name}' exhausted its install attempts limit ({limit})")]
    AttemptsExhausted { cd_name: String, limit: i32 },
}

/// Errors collecting post-install data from a successful provision (§4.7).
#[derive(Error, Debug, Clone)]
pub enum PostInstallError {
    /// The installed cluster's `console` route could not be fetched.
    #[error("fetching console route for '{cd_name}' failed: {reason}")]
    ConsoleRouteUnavailable { cd_name: String, reason: String },

    /// An external HTTP call returned an unexpected status.
    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedHttpResponse { endpoint: String, status: u16 },
}

/// Errors coordinating cluster deprovision (§4.8).
#[derive(Error, Debug, Clone)]
pub enum DeprovisionError {
    /// The cloud provider rejected the platform credentials used to deprovision.
    #[error("deprovision credentials for '{infra_id}' were rejected: {reason}")]
    AuthenticationFailed { infra_id: String, reason: String },

    /// Creating the `ClusterDeprovision` request failed.
    #[error("failed to create ClusterDeprovision for '{infra_id}': {reason}")]
    RequestCreationFailed { infra_id: String, reason: String },
}

/// Composite error type returned by every reconciler component.
#[derive(Error, Debug, Clone)]
pub enum ReconcileError {
    #[error(transparent)]
    PullSecret(#[from] PullSecretError),

    #[error(transparent)]
    ImageResolution(#[from] ImageResolutionError),

    #[error(transparent)]
    DnsCoordination(#[from] DnsCoordinationError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    PostInstall(#[from] PostInstallError),

    #[error(transparent)]
    Deprovision(#[from] DeprovisionError),

    /// Wraps a raw Kubernetes API error (already classified transient/permanent
    /// by `reconcilers::retry::is_retryable_kube_error`).
    #[error("Kubernetes API error: {0}")]
    Kube(String),

    /// Generic error for anything that doesn't fit another category.
    #[error("reconciliation failed: {0}")]
    Generic(String),
}

impl ReconcileError {
    /// Returns true if the caller should retry without surfacing a terminal
    /// condition. Not-found/invalid-input errors are permanent; connectivity
    /// and Kubernetes API errors are transient.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::PullSecret(PullSecretError::Invalid { .. } | PullSecretError::InvalidJson { .. }) => {
                false
            }
            Self::ImageResolution(_) => false,
            Self::DnsCoordination(DnsCoordinationError::ZoneTimedOut { .. }) => true,
            Self::DnsCoordination(DnsCoordinationError::UnsupportedPlatform { .. }) => false,
            Self::Provision(ProvisionError::AttemptCreationFailed { .. }) => true,
            Self::Provision(ProvisionError::AttemptsExhausted { .. }) => false,
            Self::PostInstall(_) => true,
            Self::Deprovision(DeprovisionError::AuthenticationFailed { .. }) => true,
            Self::Deprovision(DeprovisionError::RequestCreationFailed { .. }) => true,
            Self::Kube(_) | Self::Generic(_) => true,
        }
    }

    /// Returns the `status_reasons` constant for the condition this error
    /// should be surfaced under.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::PullSecret(_) => REASON_PULL_SECRET_INVALID,
            Self::ImageResolution(ImageResolutionError::NotSpecified { .. }) => {
                REASON_IMAGE_NOT_SPECIFIED
            }
            Self::ImageResolution(ImageResolutionError::ImageSetNotFound { .. }) => {
                REASON_IMAGE_SET_NOT_FOUND
            }
            Self::DnsCoordination(DnsCoordinationError::ZoneTimedOut { .. }) => REASON_ZONE_TIMED_OUT,
            Self::DnsCoordination(DnsCoordinationError::UnsupportedPlatform { .. }) => {
                REASON_DNS_UNSUPPORTED_PLATFORM
            }
            Self::Provision(_) => REASON_UPSTREAM_UNREACHABLE,
            Self::PostInstall(PostInstallError::UnexpectedHttpResponse { .. }) => {
                REASON_UNEXPECTED_HTTP_RESPONSE
            }
            Self::PostInstall(PostInstallError::ConsoleRouteUnavailable { .. }) => {
                REASON_UPSTREAM_UNREACHABLE
            }
            Self::Deprovision(DeprovisionError::AuthenticationFailed { .. }) => {
                REASON_AUTHENTICATION_FAILED
            }
            Self::Deprovision(DeprovisionError::RequestCreationFailed { .. }) => {
                REASON_UPSTREAM_UNREACHABLE
            }
            Self::Kube(_) | Self::Generic(_) => REASON_UPSTREAM_UNREACHABLE,
        }
    }
}

impl From<kube::Error> for ReconcileError {
    fn from(err: kube::Error) -> Self {
        Self::Kube(err.to_string())
    }
}

impl From<anyhow::Error> for ReconcileError {
    fn from(err: anyhow::Error) -> Self {
        Self::Generic(err.to_string())
    }
}

/// Map an HTTP status code from an external call (credential preflight,
/// console route fetch) to a condition reason and human-readable message.
#[must_use]
pub fn map_http_error_to_reason(status_code: u16) -> (&'static str, String) {
    match status_code {
        401 | 403 => (
            REASON_AUTHENTICATION_FAILED,
            format!("credential rejected by upstream API ({status_code})"),
        ),
        404 => (
            REASON_UPSTREAM_UNREACHABLE,
            format!("resource not found on upstream API ({status_code})"),
        ),
        500..=599 => (
            REASON_UPSTREAM_UNREACHABLE,
            format!("upstream API server error ({status_code})"),
        ),
        _ => (
            REASON_UNEXPECTED_HTTP_RESPONSE,
            format!("unexpected HTTP status from upstream API ({status_code})"),
        ),
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;

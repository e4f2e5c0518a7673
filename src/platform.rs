// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Polymorphic platform dispatch (§9).
//!
//! The `Platform` tagged union (AWS, Azure, bare metal, ...) is handled by a
//! small capability interface rather than a deep trait hierarchy: dispatch is
//! a single tag match in [`capability_for`], and each variant answers four
//! questions — does it support managed DNS, should deprovision be skipped,
//! what does a deprovision request for it look like, and how should its
//! credentials be validated.

use crate::crd::{ClusterDeprovisionSpec, Platform};

/// Per-platform behavior needed by the DNS and deprovision reconcilers.
pub trait PlatformCapability {
    /// Whether this platform can host a managed `DNSZone` (§4.5).
    fn supports_managed_dns(&self) -> bool;

    /// Whether deprovision should be skipped entirely — true for platforms
    /// with no cloud resources to destroy (§4.8.4).
    fn skip_deprovision(&self) -> bool;

    /// Human-readable platform name used in errors and condition messages.
    fn name(&self) -> &'static str;

    /// Name of the secret carrying this platform's credentials, if any.
    fn credentials_secret_name(&self) -> Option<&str>;

    /// Preflight credential check (§4.9): confirms the platform's credentials
    /// secret exists and carries data before a provision attempt is allowed
    /// to proceed. This does not call out to the cloud provider itself — it
    /// only rules out the case where the secret was never created or was
    /// emptied out from under the `ClusterDeployment`. Platforms with no
    /// credentials secret (bare metal) are vacuously valid.
    fn validate_credentials(&self, ctx: &crate::context::Context, namespace: &str) -> Result<(), String> {
        let Some(name) = self.credentials_secret_name() else {
            return Ok(());
        };

        let secret = ctx
            .stores
            .get_secret(name, namespace)
            .ok_or_else(|| format!("credentials secret '{name}' not found in namespace '{namespace}'"))?;

        if secret.data.as_ref().is_some_and(|d| !d.is_empty()) {
            Ok(())
        } else {
            Err(format!("credentials secret '{name}' has no data"))
        }
    }
}

struct AwsCapability<'a>(&'a crate::crd::AwsPlatform);
struct AzureCapability<'a>(&'a crate::crd::AzurePlatform);
struct BareMetalCapability<'a>(&'a crate::crd::BareMetalPlatform);

impl PlatformCapability for AwsCapability<'_> {
    fn supports_managed_dns(&self) -> bool {
        true
    }

    fn skip_deprovision(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "AWS"
    }

    fn credentials_secret_name(&self) -> Option<&str> {
        Some(&self.0.credentials_secret_ref.name)
    }
}

impl PlatformCapability for AzureCapability<'_> {
    fn supports_managed_dns(&self) -> bool {
        true
    }

    fn skip_deprovision(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "Azure"
    }

    fn credentials_secret_name(&self) -> Option<&str> {
        Some(&self.0.credentials_secret_ref.name)
    }
}

impl PlatformCapability for BareMetalCapability<'_> {
    fn supports_managed_dns(&self) -> bool {
        false
    }

    fn skip_deprovision(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "BareMetal"
    }

    fn credentials_secret_name(&self) -> Option<&str> {
        None
    }
}

/// Resolves the active variant of `platform` to its capability implementation.
///
/// Returns `None` if no variant is set, which callers should treat as a
/// requirements-not-met condition rather than a panic — an empty `Platform`
/// is a valid (if useless) value to deserialize.
#[must_use]
pub fn capability_for(platform: &Platform) -> Option<Box<dyn PlatformCapability + '_>> {
    if let Some(aws) = &platform.aws {
        return Some(Box::new(AwsCapability(aws)));
    }
    if let Some(azure) = &platform.azure {
        return Some(Box::new(AzureCapability(azure)));
    }
    if let Some(bare_metal) = &platform.bare_metal {
        return Some(Box::new(BareMetalCapability(bare_metal)));
    }
    None
}

/// Builds the `ClusterDeprovisionSpec` for tearing down `infra_id` on
/// `platform`, or `None` if the platform has nothing to deprovision.
#[must_use]
pub fn build_deprovision_request(
    platform: &Platform,
    infra_id: &str,
    cluster_id: Option<&str>,
) -> Option<ClusterDeprovisionSpec> {
    let capability = capability_for(platform)?;
    if capability.skip_deprovision() {
        return None;
    }

    Some(ClusterDeprovisionSpec {
        infra_id: infra_id.to_string(),
        cluster_id: cluster_id.map(str::to_string),
        platform: platform.clone(),
    })
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod platform_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for all controllers with reflector stores.
//!
//! This module provides the core infrastructure for the shared reflector store pattern.
//! All controllers receive an `Arc<Context>` that contains:
//! - Kubernetes client
//! - Reflector stores for every watched/owned kind
//! - The expectations tracker and retry-reasons config singletons
//! - Metrics registry
//!
//! The stores enable O(1) in-memory lookups of subordinate resources by owner
//! reference, eliminating the need for API list calls inside the reconcile loop.

use crate::crd::{
    ClusterDeployment, ClusterDeploymentCustomization, ClusterDeprovision, ClusterImageSet,
    ClusterProvision, ClusterSync, DNSZone,
};
use crate::expectations::ExpectationsTracker;
use crate::config::{OperatorConfig, RetryReasonsConfig};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Secret;
use kube::runtime::reflector::Store;
use kube::{Client, ResourceExt};
use std::sync::Arc;

/// Shared context passed to every reconciler.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations.
    pub client: Client,

    /// Reflector stores for every watched/owned kind.
    pub stores: Stores,

    /// HTTP client for credential-preflight and console-route calls.
    pub http_client: reqwest::Client,

    /// Metrics registry for observability.
    pub metrics: Metrics,

    /// Tracks object creations the controller itself initiated, so a stale
    /// reflector cache entry doesn't cause the same object to be created twice
    /// within one reconcile pass (§4.1).
    pub expectations: ExpectationsTracker,

    /// The retry-reasons allowlist used by the provision backoff decision (§4.6).
    pub retry_reasons: RetryReasonsConfig,

    /// Process-wide configuration (manager namespace, global pull secret name,
    /// install-logs credentials secret name, DNS wait timeout).
    pub config: OperatorConfig,
}

/// Collection of all reflector stores for cross-resource queries.
///
/// Each store is populated by a dedicated reflector task and provides
/// in-memory access to resources without API calls.
#[derive(Clone)]
pub struct Stores {
    pub cluster_deployments: Store<ClusterDeployment>,
    pub cluster_provisions: Store<ClusterProvision>,
    pub cluster_deprovisions: Store<ClusterDeprovision>,
    pub cluster_image_sets: Store<ClusterImageSet>,
    pub dns_zones: Store<DNSZone>,
    pub cluster_syncs: Store<ClusterSync>,
    pub cluster_deployment_customizations: Store<ClusterDeploymentCustomization>,
    pub jobs: Store<Job>,
    pub secrets: Store<Secret>,
}

impl Stores {
    /// All `ClusterProvision`s owned by the named `ClusterDeployment`, newest
    /// attempt first.
    #[must_use]
    pub fn provisions_for_cluster_deployment(
        &self,
        cd_name: &str,
        namespace: &str,
    ) -> Vec<Arc<ClusterProvision>> {
        let mut provisions: Vec<Arc<ClusterProvision>> = self
            .cluster_provisions
            .state()
            .iter()
            .filter(|p| {
                p.namespace().as_deref() == Some(namespace)
                    && p.spec.cluster_deployment_ref.name == cd_name
            })
            .cloned()
            .collect();
        provisions.sort_by_key(|p| std::cmp::Reverse(p.spec.attempt));
        provisions
    }

    /// The owned `DNSZone` by name, if the reflector cache has observed it yet.
    #[must_use]
    pub fn get_dns_zone(&self, name: &str, namespace: &str) -> Option<Arc<DNSZone>> {
        self.dns_zones
            .state()
            .iter()
            .find(|z| z.name_any() == name && z.namespace().as_deref() == Some(namespace))
            .cloned()
    }

    /// The cluster-scoped `ClusterImageSet` by name.
    #[must_use]
    pub fn get_cluster_image_set(&self, name: &str) -> Option<Arc<ClusterImageSet>> {
        self.cluster_image_sets
            .state()
            .iter()
            .find(|i| i.name_any() == name)
            .cloned()
    }

    /// The `ClusterSync` sharing the `ClusterDeployment`'s name and namespace
    /// (Hive convention: a `ClusterSync` is named identically to its CD).
    #[must_use]
    pub fn get_cluster_sync(&self, cd_name: &str, namespace: &str) -> Option<Arc<ClusterSync>> {
        self.cluster_syncs
            .state()
            .iter()
            .find(|s| s.name_any() == cd_name && s.namespace().as_deref() == Some(namespace))
            .cloned()
    }

    /// The `ClusterDeploymentCustomization` referenced by a CD's `clusterPoolRef`.
    #[must_use]
    pub fn get_customization(
        &self,
        name: &str,
        namespace: &str,
    ) -> Option<Arc<ClusterDeploymentCustomization>> {
        self.cluster_deployment_customizations
            .state()
            .iter()
            .find(|c| c.name_any() == name && c.namespace().as_deref() == Some(namespace))
            .cloned()
    }

    /// The `Secret` by name and namespace.
    #[must_use]
    pub fn get_secret(&self, name: &str, namespace: &str) -> Option<Arc<Secret>> {
        self.secrets
            .state()
            .iter()
            .find(|s| s.name_any() == name && s.namespace().as_deref() == Some(namespace))
            .cloned()
    }
}

/// Prometheus-backed observability handle; see `metrics` for the metric
/// families themselves. Kept as a unit-like struct so `Context` derives
/// `Clone` cheaply — the underlying counters live behind the global registry.
#[derive(Clone, Copy, Default)]
pub struct Metrics;

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;

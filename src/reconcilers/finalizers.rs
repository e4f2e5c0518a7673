// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generic finalizer management for Kubernetes resources.
//!
//! This module provides reusable functions for adding, removing, and handling
//! finalizers on Kubernetes custom resources. It eliminates duplicate finalizer
//! management code across reconcilers.
//!
//! # Example
//!
//! ```rust,ignore
//! use cdoperator::reconcilers::finalizers::{ensure_finalizer, handle_deletion, FinalizerCleanup};
//! use cdoperator::crd::ClusterDeployment;
//! use kube::Client;
//! use anyhow::Result;
//!
//! const FINALIZER: &str = "hive.example.io/clusterdeployment-finalizer";
//!
//! #[async_trait::async_trait]
//! impl FinalizerCleanup for ClusterDeployment {
//!     async fn cleanup(&self, client: &Client) -> Result<()> {
//!         // Create a ClusterDeprovision and await its completion.
//!         Ok(())
//!     }
//! }
//!
//! async fn reconcile(client: Client, cd: ClusterDeployment) -> Result<()> {
//!     // Ensure finalizer is present
//!     ensure_finalizer(&client, &cd, FINALIZER).await?;
//!
//!     // Handle deletion if resource is being deleted
//!     if cd.metadata.deletion_timestamp.is_some() {
//!         return handle_deletion(&client, &cd, FINALIZER).await;
//!     }
//!
//!     // Normal reconciliation logic...
//!     Ok(())
//! }
//! ```

use anyhow::Result;
use kube::api::{Patch, PatchParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use serde_json::json;
use tracing::info;

/// Trait for resources that require cleanup operations when being deleted.
///
/// Implement this trait to define custom cleanup logic that should run
/// before a finalizer is removed from a resource.
#[async_trait::async_trait]
pub trait FinalizerCleanup: Resource + ResourceExt + Clone {
    /// Perform cleanup operations before the finalizer is removed.
    ///
    /// This method is called when a resource with a deletion timestamp
    /// still has the finalizer present. Implement any cleanup logic needed
    /// before the resource is fully deleted.
    ///
    /// # Arguments
    ///
    /// * `client` - Kubernetes client for accessing the API
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` if cleanup succeeded, or an error if cleanup failed.
    /// If this method returns an error, the finalizer will NOT be removed and
    /// deletion will be blocked until cleanup succeeds.
    ///
    /// # Errors
    ///
    /// Should return an error if:
    /// - Child resources cannot be deleted
    /// - External systems cannot be cleaned up
    /// - Any other cleanup operation fails
    async fn cleanup(&self, client: &Client) -> Result<()>;
}

/// Add a finalizer to a resource if not already present.
///
/// This function checks if the specified finalizer is present on the resource,
/// and adds it if missing. The operation is idempotent - calling it multiple
/// times has no effect if the finalizer is already present.
///
/// # Arguments
///
/// * `client` - Kubernetes client for accessing the API
/// * `resource` - The resource to add the finalizer to
/// * `finalizer` - The finalizer string to add
///
/// # Returns
///
/// Returns `Ok(())` if the finalizer was added or already present.
///
/// # Errors
///
/// Returns an error if:
/// - The resource has no namespace (for namespaced resources)
/// - The API patch operation fails
///
/// # Example
///
/// ```rust,no_run
/// # use cdoperator::reconcilers::finalizers::ensure_finalizer;
/// # use cdoperator::crd::ClusterDeployment;
/// # use kube::Client;
/// # async fn example(client: Client, cd: ClusterDeployment) {
/// const FINALIZER: &str = "hive.example.io/clusterdeployment-finalizer";
/// ensure_finalizer(&client, &cd, FINALIZER).await.unwrap();
/// # }
/// ```
pub async fn ensure_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();

    // Check if finalizer is already present
    if resource
        .meta()
        .finalizers
        .as_ref()
        .is_none_or(|f| !f.contains(&finalizer.to_string()))
    {
        info!(
            "Adding finalizer {} to {}/{} {}",
            finalizer,
            namespace,
            name,
            T::kind(&())
        );

        let mut finalizers = resource.meta().finalizers.clone().unwrap_or_default();
        finalizers.push(finalizer.to_string());

        let api: Api<T> = Api::namespaced(client.clone(), &namespace);
        let patch = json!({ "metadata": { "finalizers": finalizers } });
        api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        info!(
            "Successfully added finalizer {} to {}/{} {}",
            finalizer,
            namespace,
            name,
            T::kind(&())
        );
    }

    Ok(())
}

/// Remove a finalizer from a resource.
///
/// This function removes the specified finalizer from the resource if present.
/// The operation is idempotent - calling it multiple times has no effect if
/// the finalizer is already absent.
///
/// **Note:** Typically you should use `handle_deletion()` instead of calling
/// this function directly, as it performs cleanup before removing the finalizer.
///
/// # Arguments
///
/// * `client` - Kubernetes client for accessing the API
/// * `resource` - The resource to remove the finalizer from
/// * `finalizer` - The finalizer string to remove
///
/// # Returns
///
/// Returns `Ok(())` if the finalizer was removed or already absent.
///
/// # Errors
///
/// Returns an error if:
/// - The resource has no namespace (for namespaced resources)
/// - The API patch operation fails
pub async fn remove_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();

    // Check if finalizer is present
    if resource
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.contains(&finalizer.to_string()))
    {
        info!(
            "Removing finalizer {} from {}/{} {}",
            finalizer,
            namespace,
            name,
            T::kind(&())
        );

        let mut finalizers = resource.meta().finalizers.clone().unwrap_or_default();
        finalizers.retain(|f| f != finalizer);

        let api: Api<T> = Api::namespaced(client.clone(), &namespace);
        let patch = json!({ "metadata": { "finalizers": finalizers } });
        api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        info!(
            "Successfully removed finalizer {} from {}/{} {}",
            finalizer,
            namespace,
            name,
            T::kind(&())
        );
    }

    Ok(())
}

/// Handle resource deletion with cleanup and finalizer removal.
///
/// This function orchestrates the complete deletion process:
/// 1. Logs that the resource is being deleted
/// 2. Calls the resource's `cleanup()` method to perform cleanup operations
/// 3. Removes the finalizer to allow Kubernetes to delete the resource
///
/// This function should be called when a resource has a deletion timestamp
/// and the finalizer is still present.
///
/// # Arguments
///
/// * `client` - Kubernetes client for accessing the API
/// * `resource` - The resource being deleted
/// * `finalizer` - The finalizer string to check and remove
///
/// # Returns
///
/// Returns `Ok(())` if cleanup and finalizer removal succeeded.
///
/// # Errors
///
/// Returns an error if:
/// - The cleanup operation fails
/// - The finalizer removal fails
///
/// If an error occurs, the finalizer will remain on the resource and deletion
/// will be blocked until the operation succeeds on a subsequent reconciliation.
///
/// # Example
///
/// ```text
/// use cdoperator::reconcilers::finalizers::{handle_deletion, FinalizerCleanup};
/// use cdoperator::crd::ClusterDeployment;
/// use kube::Client;
/// use anyhow::Result;
///
/// const FINALIZER: &str = "hive.example.io/clusterdeployment-finalizer";
///
/// async fn reconcile(client: Client, cd: ClusterDeployment) -> Result<()> {
///     if cd.metadata.deletion_timestamp.is_some() {
///         return handle_deletion(&client, &cd, FINALIZER).await;
///     }
///     // Normal reconciliation...
///     Ok(())
/// }
/// ```
pub async fn handle_deletion<T>(client: &Client, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + FinalizerCleanup
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();

    info!("{} {}/{} is being deleted", T::kind(&()), namespace, name);

    // Only proceed if the finalizer is present
    if resource
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.contains(&finalizer.to_string()))
    {
        info!(
            "Running cleanup for {} {}/{}",
            T::kind(&()),
            namespace,
            name
        );

        // Perform cleanup operations
        resource.cleanup(client).await?;

        // Remove the finalizer
        remove_finalizer(client, resource, finalizer).await?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # cdoperator - ClusterDeployment Lifecycle Controller for Kubernetes
//!
//! cdoperator is a Kubernetes controller written in Rust that drives the
//! lifecycle of `ClusterDeployment` custom resources: merging pull secrets,
//! resolving installer images, coordinating managed DNS zones, running and
//! retrying provision attempts, collecting post-install data, and tearing
//! clusters down again on delete.
//!
//! ## Overview
//!
//! This library provides the core functionality for the controller, including:
//!
//! - Custom Resource Definitions (CRDs) for `ClusterDeployment` and its
//!   subordinate kinds (`ClusterProvision`, `ClusterDeprovision`,
//!   `ClusterImageSet`, `DNSZone`, `ClusterSync`,
//!   `ClusterDeploymentCustomization`)
//! - Reconciliation logic for each lifecycle phase
//! - A shared reflector-store `Context` for O(1) cross-resource lookups
//! - Integration with the Kubernetes API server via `kube-rs`
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types for cluster lifecycle resources
//! - [`reconcilers`] - Shared reconciliation infrastructure (finalizers, status, retry)
//! - [`reconcile`] - The lifecycle components: pull secrets, image resolution, DNS, provisioning, post-install, deprovision, orchestration
//! - [`context`] - The shared `Context` and reflector `Stores`
//! - [`expectations`] - The self-initiated-create/delete expectations tracker
//! - [`errors`] - Structured error taxonomy for every reconciler concern
//! - [`config`] - Process configuration and the retry-reasons allowlist
//!
//! ## Example
//!
//! ```rust,no_run
//! use cdoperator::crd::{ClusterDeploymentSpec, Platform, AwsPlatform, SecretReference};
//!
//! let spec = ClusterDeploymentSpec {
//!     cluster_name: "bar".to_string(),
//!     installed: false,
//!     preserve_on_delete: false,
//!     manage_dns: false,
//!     install_attempts_limit: None,
//!     platform: Platform {
//!         aws: Some(AwsPlatform {
//!             region: "us-east-1".to_string(),
//!             credentials_secret_ref: SecretReference {
//!                 name: "aws-creds".to_string(),
//!             },
//!         }),
//!         ..Default::default()
//!     },
//!     provisioning: None,
//!     cluster_install_ref: None,
//!     pull_secret_ref: None,
//!     cluster_pool_ref: None,
//!     cluster_metadata: None,
//! };
//! assert_eq!(spec.cluster_name, "bar");
//! ```
//!
//! ## Features
//!
//! - **Reflector-backed lookups** - No API list calls inside the reconcile loop
//! - **Structured condition algebra** - Update-mode-aware status condition merging
//! - **Pluggable platforms** - AWS, Azure, and bare-metal share one capability interface
//! - **Status Tracking** - Full status subresources

pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod errors;
pub mod expectations;
pub mod labels;
pub mod metrics;
pub mod platform;
pub mod reconcile;
pub mod reconcilers;
pub mod status_reasons;

#[cfg(test)]
mod context_tests;
#[cfg(test)]
mod crd_tests;
#[cfg(test)]
mod expectations_tests;

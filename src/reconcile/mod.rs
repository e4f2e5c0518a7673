// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-component reconcile logic (§4). Each submodule owns one of the
//! controller's components; `reconcilers::finalizers` and `reconcilers::status`
//! host the cross-cutting mechanics these components are built on.

pub mod deprovision;
pub mod dns;
pub mod image_resolver;
pub mod orchestrator;
pub mod post_install;
pub mod provision;
pub mod pull_secret;

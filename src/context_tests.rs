// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for context.rs

use super::*;
use crate::crd::{
    ClusterDeploymentCustomization, ClusterDeploymentCustomizationSpec, ClusterImageSet,
    ClusterImageSetSpec, ClusterProvisionSpec, ClusterSync, ClusterSyncSpec, DNSZone, DNSZoneSpec,
    LocalObjectReference,
};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::runtime::reflector;
use kube::runtime::watcher::Event;

fn empty_stores() -> Stores {
    Stores {
        cluster_deployments: reflector::store().0,
        cluster_provisions: reflector::store().0,
        cluster_deprovisions: reflector::store().0,
        cluster_image_sets: reflector::store().0,
        dns_zones: reflector::store().0,
        cluster_syncs: reflector::store().0,
        cluster_deployment_customizations: reflector::store().0,
        jobs: reflector::store().0,
        secrets: reflector::store().0,
    }
}

fn namespaced_meta(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

fn provision(name: &str, namespace: &str, cd_name: &str, attempt: i32) -> ClusterProvision {
    ClusterProvision {
        metadata: namespaced_meta(name, namespace),
        spec: ClusterProvisionSpec {
            cluster_deployment_ref: LocalObjectReference {
                name: cd_name.to_string(),
            },
            attempt,
        },
        status: None,
    }
}

#[test]
fn provisions_for_cluster_deployment_sorts_newest_attempt_first() {
    let (store, mut writer) = reflector::store::<ClusterProvision>();
    writer.apply_watcher_event(&Event::Apply(provision("cd-0", "team-a", "cd", 0)));
    writer.apply_watcher_event(&Event::Apply(provision("cd-2", "team-a", "cd", 2)));
    writer.apply_watcher_event(&Event::Apply(provision("cd-1", "team-a", "cd", 1)));

    let mut stores = empty_stores();
    stores.cluster_provisions = store;

    let found = stores.provisions_for_cluster_deployment("cd", "team-a");
    let attempts: Vec<i32> = found.iter().map(|p| p.spec.attempt).collect();
    assert_eq!(attempts, vec![2, 1, 0]);
}

#[test]
fn provisions_for_cluster_deployment_filters_by_namespace_and_owner() {
    let (store, mut writer) = reflector::store::<ClusterProvision>();
    writer.apply_watcher_event(&Event::Apply(provision("cd-0", "team-a", "cd", 0)));
    writer.apply_watcher_event(&Event::Apply(provision("other-0", "team-a", "other-cd", 0)));
    writer.apply_watcher_event(&Event::Apply(provision("cd-0-wrong-ns", "team-b", "cd", 0)));

    let mut stores = empty_stores();
    stores.cluster_provisions = store;

    let found = stores.provisions_for_cluster_deployment("cd", "team-a");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name_any(), "cd-0");
}

#[test]
fn get_dns_zone_matches_name_and_namespace() {
    let (store, mut writer) = reflector::store::<DNSZone>();
    let zone = DNSZone {
        metadata: namespaced_meta("my-zone", "team-a"),
        spec: DNSZoneSpec {
            zone: "example.com".to_string(),
            preserve_on_delete: false,
            platform: Default::default(),
        },
        status: None,
    };
    writer.apply_watcher_event(&Event::Apply(zone));

    let mut stores = empty_stores();
    stores.dns_zones = store;

    assert!(stores.get_dns_zone("my-zone", "team-a").is_some());
    assert!(stores.get_dns_zone("my-zone", "team-b").is_none());
    assert!(stores.get_dns_zone("other-zone", "team-a").is_none());
}

#[test]
fn get_cluster_image_set_ignores_namespace() {
    let (store, mut writer) = reflector::store::<ClusterImageSet>();
    let image_set = ClusterImageSet::new(
        "ocp-4.15",
        ClusterImageSetSpec {
            release_image: "quay.io/openshift-release-dev/ocp-release:4.15.0-x86_64".to_string(),
        },
    );
    writer.apply_watcher_event(&Event::Apply(image_set));

    let mut stores = empty_stores();
    stores.cluster_image_sets = store;

    assert!(stores.get_cluster_image_set("ocp-4.15").is_some());
    assert!(stores.get_cluster_image_set("ocp-4.14").is_none());
}

#[test]
fn get_cluster_sync_matches_by_cd_name_convention() {
    let (store, mut writer) = reflector::store::<ClusterSync>();
    let sync = ClusterSync {
        metadata: namespaced_meta("my-cd", "team-a"),
        spec: ClusterSyncSpec {},
        status: None,
    };
    writer.apply_watcher_event(&Event::Apply(sync));

    let mut stores = empty_stores();
    stores.cluster_syncs = store;

    assert!(stores.get_cluster_sync("my-cd", "team-a").is_some());
    assert!(stores.get_cluster_sync("my-cd", "team-b").is_none());
    assert!(stores.get_cluster_sync("other-cd", "team-a").is_none());
}

#[test]
fn get_customization_matches_name_and_namespace() {
    let (store, mut writer) = reflector::store::<ClusterDeploymentCustomization>();
    let customization = ClusterDeploymentCustomization {
        metadata: namespaced_meta("pool-checkout-1", "pool-ns"),
        spec: ClusterDeploymentCustomizationSpec {},
        status: None,
    };
    writer.apply_watcher_event(&Event::Apply(customization));

    let mut stores = empty_stores();
    stores.cluster_deployment_customizations = store;

    assert!(stores.get_customization("pool-checkout-1", "pool-ns").is_some());
    assert!(stores.get_customization("pool-checkout-1", "other-ns").is_none());
}

#[test]
fn get_secret_matches_name_and_namespace() {
    let (store, mut writer) = reflector::store::<Secret>();
    let secret = Secret {
        metadata: namespaced_meta("pull-secret", "team-a"),
        ..Default::default()
    };
    writer.apply_watcher_event(&Event::Apply(secret));

    let mut stores = empty_stores();
    stores.secrets = store;

    assert!(stores.get_secret("pull-secret", "team-a").is_some());
    assert!(stores.get_secret("pull-secret", "team-b").is_none());
}

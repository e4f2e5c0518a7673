use super::*;
use crate::crd::{ClusterDeployment, ClusterDeploymentSpec, Platform};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

fn test_spec() -> ClusterDeploymentSpec {
    ClusterDeploymentSpec {
        cluster_name: "test-cd".to_string(),
        installed: false,
        preserve_on_delete: false,
        manage_dns: false,
        install_attempts_limit: None,
        platform: Platform::default(),
        provisioning: None,
        cluster_install_ref: None,
        pull_secret_ref: None,
        cluster_pool_ref: None,
        cluster_metadata: None,
    }
}

#[test]
fn zone_name_suffixes_zone() {
    assert_eq!(zone_name("foo"), "foo-zone");
}

fn condition(transition_secs_ago: i64) -> Condition {
    let t = chrono::Utc::now() - chrono::Duration::seconds(transition_secs_ago);
    Condition {
        r#type: CONDITION_TYPE_DNS_NOT_READY.to_string(),
        status: "True".to_string(),
        reason: Some(REASON_ZONE_PENDING.to_string()),
        message: None,
        last_probe_time: None,
        last_transition_time: Some(t.to_rfc3339()),
    }
}

#[test]
fn remaining_wait_is_full_budget_with_no_prior_condition() {
    let conditions: Vec<Condition> = vec![];
    assert_eq!(remaining_wait(&conditions), Duration::from_secs(DNS_ZONE_WAIT_SECS));
}

#[test]
fn remaining_wait_shrinks_as_time_passes() {
    let conditions = vec![condition(60)];
    let remaining = remaining_wait(&conditions);
    assert!(remaining < Duration::from_secs(DNS_ZONE_WAIT_SECS));
    assert!(remaining > Duration::ZERO);
}

#[test]
fn wait_exceeded_once_budget_elapsed() {
    let conditions = vec![condition((DNS_ZONE_WAIT_SECS + 10) as i64)];
    assert!(wait_exceeded(&conditions));
}

#[test]
fn wait_not_exceeded_within_budget() {
    let conditions = vec![condition(5)];
    assert!(!wait_exceeded(&conditions));
}

#[test]
fn owned_by_matches_controller_owner_uid() {
    let mut cd = ClusterDeployment::new("test-cd", test_spec());
    cd.metadata.uid = Some("abc-123".to_string());

    let mut zone = DNSZone::new(
        "test-cd-zone",
        crate::crd::DNSZoneSpec {
            zone: "test-cd".to_string(),
            preserve_on_delete: false,
            platform: Platform::default(),
        },
    );
    zone.metadata.owner_references = Some(vec![OwnerReference {
        controller: Some(true),
        uid: "abc-123".to_string(),
        api_version: "hive.example.io/v1".to_string(),
        kind: "ClusterDeployment".to_string(),
        name: "test-cd".to_string(),
        ..Default::default()
    }]);

    assert!(owned_by(&zone, &cd));
}

#[test]
fn owned_by_false_on_uid_mismatch() {
    let mut cd = ClusterDeployment::new("test-cd", test_spec());
    cd.metadata.uid = Some("abc-123".to_string());

    let mut zone = DNSZone::new(
        "test-cd-zone",
        crate::crd::DNSZoneSpec {
            zone: "test-cd".to_string(),
            preserve_on_delete: false,
            platform: Platform::default(),
        },
    );
    zone.metadata.owner_references = Some(vec![OwnerReference {
        controller: Some(true),
        uid: "different-uid".to_string(),
        api_version: "hive.example.io/v1".to_string(),
        kind: "ClusterDeployment".to_string(),
        name: "test-cd".to_string(),
        ..Default::default()
    }]);

    assert!(!owned_by(&zone, &cd));
}

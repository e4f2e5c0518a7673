use super::*;
use crate::config::RetryReasonsConfig;
use crate::crd::{ClusterDeployment, ClusterDeploymentSpec, ClusterProvisionStatus, Platform};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{OwnerReference, Time};
use std::sync::Arc;

fn test_cd(uid: &str) -> ClusterDeployment {
    let mut cd = ClusterDeployment::new(
        "test-cd",
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
        },
    );
    cd.metadata.uid = Some(uid.to_string());
    cd
}

fn owner_ref(uid: &str) -> OwnerReference {
    OwnerReference {
        controller: Some(true),
        uid: uid.to_string(),
        api_version: "hive.example.io/v1".to_string(),
        kind: "ClusterDeployment".to_string(),
        name: "test-cd".to_string(),
        ..Default::default()
    }
}

fn provision(attempt: i32, owner_uid: &str, status: Option<ClusterProvisionStatus>) -> Arc<ClusterProvision> {
    Arc::new(ClusterProvision {
        metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
            name: Some(provision_name("test-cd", attempt)),
            namespace: Some("default".to_string()),
            owner_references: Some(vec![owner_ref(owner_uid)]),
            ..Default::default()
        },
        spec: ClusterProvisionSpec {
            cluster_deployment_ref: LocalObjectReference {
                name: "test-cd".to_string(),
            },
            attempt,
        },
        status,
    })
}

#[test]
fn provision_name_format() {
    assert_eq!(provision_name("foo", 2), "foo-2");
}

#[test]
fn select_active_provision_adopts_owned_non_failed() {
    let cd = test_cd("abc");
    let provisions = vec![provision(0, "abc", None)];
    assert!(select_active_provision(&provisions, &cd).is_some());
}

#[test]
fn select_active_provision_ignores_failed() {
    let cd = test_cd("abc");
    let failed_status = ClusterProvisionStatus {
        failed: true,
        ..Default::default()
    };
    let provisions = vec![provision(0, "abc", Some(failed_status))];
    assert!(select_active_provision(&provisions, &cd).is_none());
}

#[test]
fn select_active_provision_ignores_unowned() {
    let cd = test_cd("abc");
    let provisions = vec![provision(0, "someone-else", None)];
    assert!(select_active_provision(&provisions, &cd).is_none());
}

#[test]
fn backoff_not_elapsed_immediately_after_failure() {
    let now = chrono::Utc::now();
    assert!(!backoff_elapsed(now, 0, now));
}

#[test]
fn backoff_elapsed_after_window_passes() {
    let failure_time = chrono::Utc::now() - chrono::Duration::hours(2);
    let now = chrono::Utc::now();
    assert!(backoff_elapsed(failure_time, 0, now));
}

#[test]
fn evaluate_retry_stops_at_attempts_limit() {
    let retry_reasons = RetryReasonsConfig::unrestricted();
    let decision = evaluate_retry(2, Some(3), Some("SomeReason"), &retry_reasons);
    assert_eq!(decision, RetryDecision::Stopped(crate::status_reasons::REASON_ATTEMPTS_LIMIT_REACHED));
}

#[test]
fn evaluate_retry_allows_when_unrestricted() {
    let retry_reasons = RetryReasonsConfig::unrestricted();
    let decision = evaluate_retry(0, None, Some("AnyReason"), &retry_reasons);
    assert_eq!(decision, RetryDecision::Retry);
}

#[test]
fn attempts_to_retain_always_keeps_zero_plus_last_two() {
    let provisions = vec![provision(5, "abc", None), provision(4, "abc", None), provision(0, "abc", None)];
    let retained = attempts_to_retain(&provisions);
    assert!(retained.contains(&0));
    assert!(retained.contains(&5));
    assert!(retained.contains(&4));
}

#[test]
fn is_stale_failed_true_past_retention_window() {
    let old_time = chrono::Utc::now() - chrono::Duration::days(8);
    let mut p = provision(0, "abc", Some(ClusterProvisionStatus {
        failed: true,
        ..Default::default()
    }));
    Arc::get_mut(&mut p).unwrap().metadata.creation_timestamp = Some(Time(old_time));
    assert!(is_stale_failed(&p, chrono::Utc::now()));
}

#[test]
fn is_stale_failed_false_when_recent() {
    let recent = chrono::Utc::now() - chrono::Duration::hours(1);
    let mut p = provision(0, "abc", Some(ClusterProvisionStatus {
        failed: true,
        ..Default::default()
    }));
    Arc::get_mut(&mut p).unwrap().metadata.creation_timestamp = Some(Time(recent));
    assert!(!is_stale_failed(&p, chrono::Utc::now()));
}

#[test]
fn is_stuck_true_past_threshold_when_not_terminal() {
    let old_time = chrono::Utc::now() - chrono::Duration::hours(3);
    let mut p = provision(0, "abc", None);
    Arc::get_mut(&mut p).unwrap().metadata.creation_timestamp = Some(Time(old_time));
    assert!(is_stuck(&p, chrono::Utc::now()));
}

#[test]
fn is_stuck_false_once_terminal() {
    let old_time = chrono::Utc::now() - chrono::Duration::hours(3);
    let mut p = provision(0, "abc", Some(ClusterProvisionStatus {
        success: true,
        ..Default::default()
    }));
    Arc::get_mut(&mut p).unwrap().metadata.creation_timestamp = Some(Time(old_time));
    assert!(!is_stuck(&p, chrono::Utc::now()));
}

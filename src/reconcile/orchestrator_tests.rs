use super::*;
use crate::crd::{AwsPlatform, ClusterDeployment, ClusterDeploymentSpec, Platform, SecretReference};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

fn test_cd() -> ClusterDeployment {
    ClusterDeployment::new(
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
    )
}

fn condition(condition_type: &str, status: &str) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some("SomeReason".to_string()),
        message: Some("detail".to_string()),
        last_probe_time: None,
        last_transition_time: None,
    }
}

#[test]
fn parse_go_duration_single_unit() {
    assert_eq!(parse_go_duration("8h"), Some(Duration::from_secs(8 * 3600)));
    assert_eq!(parse_go_duration("30m"), Some(Duration::from_secs(30 * 60)));
    assert_eq!(parse_go_duration("45s"), Some(Duration::from_secs(45)));
}

#[test]
fn parse_go_duration_compound() {
    assert_eq!(parse_go_duration("1h30m"), Some(Duration::from_secs(3600 + 30 * 60)));
}

#[test]
fn parse_go_duration_rejects_unknown_unit() {
    assert_eq!(parse_go_duration("8d"), None);
}

#[test]
fn parse_go_duration_rejects_garbage() {
    assert_eq!(parse_go_duration(""), None);
    assert_eq!(parse_go_duration("soon"), None);
}

#[test]
fn delete_after_remaining_none_without_annotation() {
    let cd = test_cd();
    assert_eq!(delete_after_remaining(&cd, Utc::now()), None);
}

#[test]
fn delete_after_remaining_zero_once_expired() {
    let mut cd = test_cd();
    cd.metadata.creation_timestamp = Some(Time(Utc::now() - chrono::Duration::hours(10)));
    cd.metadata.annotations = Some(BTreeMap::from([(DELETE_AFTER_ANNOTATION.to_string(), "8h".to_string())]));
    assert_eq!(delete_after_remaining(&cd, Utc::now()), Some(Duration::ZERO));
}

#[test]
fn delete_after_remaining_positive_before_deadline() {
    let mut cd = test_cd();
    cd.metadata.creation_timestamp = Some(Time(Utc::now()));
    cd.metadata.annotations = Some(BTreeMap::from([(DELETE_AFTER_ANNOTATION.to_string(), "8h".to_string())]));
    let remaining = delete_after_remaining(&cd, Utc::now()).expect("annotation present and parsed");
    assert!(remaining > Duration::from_secs(7 * 3600));
}

#[test]
fn derive_blocked_provisioned_none_when_installed() {
    let conditions = vec![condition(CONDITION_TYPE_PROVISION_STOPPED, "True")];
    assert_eq!(derive_blocked_provisioned(&conditions, true), None);
}

#[test]
fn derive_blocked_provisioned_none_when_nothing_blocking() {
    let conditions = vec![condition(CONDITION_TYPE_PROVISION_STOPPED, "False")];
    assert_eq!(derive_blocked_provisioned(&conditions, false), None);
}

#[test]
fn derive_blocked_provisioned_prefers_provision_stopped() {
    let conditions = vec![
        condition(CONDITION_TYPE_PROVISION_STOPPED, "True"),
        condition(CONDITION_TYPE_DNS_NOT_READY, "True"),
    ];
    let (status, reason, _) = derive_blocked_provisioned(&conditions, false).expect("should be blocked");
    assert_eq!(status, "False");
    assert_eq!(reason, REASON_PROVISION_STOPPED);
}

#[test]
fn derive_blocked_provisioned_falls_back_to_dns_not_ready() {
    let conditions = vec![condition(CONDITION_TYPE_DNS_NOT_READY, "True")];
    let (status, reason, _) = derive_blocked_provisioned(&conditions, false).expect("should be blocked");
    assert_eq!(status, "False");
    assert_eq!(reason, REASON_ZONE_PENDING);
}

#[test]
fn derive_blocked_provisioned_flags_requirements_not_met() {
    let conditions = vec![condition(CONDITION_TYPE_REQUIREMENTS_MET, "False")];
    let (status, reason, _) = derive_blocked_provisioned(&conditions, false).expect("should be blocked");
    assert_eq!(status, "False");
    assert_eq!(reason, REASON_PULL_SECRET_INVALID);
}

#[test]
fn ensure_default_conditions_seeds_missing_types_only() {
    let mut conditions = vec![condition(CONDITION_TYPE_DNS_NOT_READY, "False")];
    ensure_default_conditions(&mut conditions);

    let dns = find_condition(&conditions, CONDITION_TYPE_DNS_NOT_READY).unwrap();
    assert_eq!(dns.reason.as_deref(), Some("SomeReason"));

    let sync = find_condition(&conditions, CONDITION_TYPE_SYNC_SET_FAILED).unwrap();
    assert_eq!(sync.reason.as_deref(), Some(REASON_INITIALIZED));
}

#[test]
fn desired_labels_includes_platform_and_region() {
    let mut cd = test_cd();
    cd.spec.platform.aws = Some(AwsPlatform {
        region: "us-east-1".to_string(),
        credentials_secret_ref: SecretReference {
            name: "aws-creds".to_string(),
        },
    });

    let labels = desired_labels(&cd);
    assert_eq!(labels.get(CLUSTER_NAME_LABEL).map(String::as_str), Some("test-cd"));
    assert_eq!(labels.get(CLUSTER_PLATFORM_LABEL).map(String::as_str), Some("aws"));
    assert_eq!(labels.get(CLUSTER_REGION_LABEL).map(String::as_str), Some("us-east-1"));
}

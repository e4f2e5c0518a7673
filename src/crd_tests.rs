#[cfg(test)]
mod tests {
    use crate::crd::*;

    fn secret(name: &str) -> SecretReference {
        SecretReference {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_platform_default_has_no_variant_set() {
        let platform = Platform::default();
        assert!(platform.aws.is_none());
        assert!(platform.azure.is_none());
        assert!(platform.bare_metal.is_none());
    }

    #[test]
    fn test_aws_platform() {
        let platform = Platform {
            aws: Some(AwsPlatform {
                region: "us-east-1".into(),
                credentials_secret_ref: secret("foo-aws-creds"),
            }),
            azure: None,
            bare_metal: None,
        };

        assert!(platform.aws.is_some());
        assert_eq!(platform.aws.unwrap().region, "us-east-1");
    }

    #[test]
    fn test_bare_metal_platform_carries_no_credentials() {
        let platform = Platform {
            aws: None,
            azure: None,
            bare_metal: Some(BareMetalPlatform {
                api_vip: Some("192.0.2.5".into()),
            }),
        };

        assert!(platform.bare_metal.is_some());
    }

    #[test]
    fn test_condition_default() {
        let condition = Condition::default();
        assert!(condition.r#type.is_empty());
        assert!(condition.reason.is_none());
        assert!(condition.last_probe_time.is_none());
        assert!(condition.last_transition_time.is_none());
    }

    #[test]
    fn test_condition_carries_probe_and_transition_times_independently() {
        let condition = Condition {
            r#type: "Provisioned".into(),
            status: "False".into(),
            reason: Some("Provisioning".into()),
            message: Some("install attempt in progress".into()),
            last_probe_time: Some("2026-08-01T00:05:00Z".into()),
            last_transition_time: Some("2026-08-01T00:00:00Z".into()),
        };

        assert_ne!(condition.last_probe_time, condition.last_transition_time);
    }

    #[test]
    fn test_condition_serialization_round_trip() {
        let condition = Condition {
            r#type: "Provisioned".into(),
            status: "True".into(),
            reason: Some("Provisioned".into()),
            message: Some("cluster is installed".into()),
            last_probe_time: Some("2026-08-01T00:05:00Z".into()),
            last_transition_time: Some("2026-08-01T00:05:00Z".into()),
        };

        let json = serde_json::to_string(&condition).unwrap();
        assert!(json.contains("Provisioned"));
        assert!(json.contains("lastProbeTime"));

        let deserialized: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, condition);
    }

    #[test]
    fn test_cluster_deployment_spec_minimal() {
        let spec = ClusterDeploymentSpec {
            cluster_name: "bar".into(),
            installed: false,
            preserve_on_delete: false,
            manage_dns: false,
            install_attempts_limit: Some(3),
            platform: Platform {
                aws: Some(AwsPlatform {
                    region: "us-east-1".into(),
                    credentials_secret_ref: secret("foo-aws-creds"),
                }),
                azure: None,
                bare_metal: None,
            },
            provisioning: Some(Provisioning {
                release_image: Some("quay.io/openshift/release@sha256:abc".into()),
                image_set_ref: None,
                install_config_secret_ref: Some(secret("install-config-secret")),
            }),
            cluster_install_ref: None,
            pull_secret_ref: Some(secret("pull-secret")),
            cluster_pool_ref: None,
            cluster_metadata: None,
        };

        assert_eq!(spec.cluster_name, "bar");
        assert!(!spec.installed);
        assert!(spec.cluster_metadata.is_none());
    }

    #[test]
    fn test_cluster_metadata_requires_all_four_fields() {
        let metadata = ClusterMetadata {
            infra_id: "bar-abc12".into(),
            cluster_id: "11111111-2222-3333-4444-555555555555".into(),
            admin_kubeconfig_secret_ref: secret("bar-admin-kubeconfig"),
            admin_password_secret_ref: secret("bar-admin-password"),
        };

        assert_eq!(metadata.infra_id, "bar-abc12");
        assert_eq!(metadata.admin_kubeconfig_secret_ref.name, "bar-admin-kubeconfig");
    }

    #[test]
    fn test_cluster_deployment_status_default() {
        let status = ClusterDeploymentStatus::default();
        assert!(status.conditions.is_empty());
        assert_eq!(status.install_restarts, 0);
        assert!(status.api_url.is_none());
    }

    #[test]
    fn test_cluster_provision_spec_attempt_ordinal() {
        let spec = ClusterProvisionSpec {
            cluster_deployment_ref: LocalObjectReference { name: "bar".into() },
            attempt: 2,
        };

        assert_eq!(spec.attempt, 2);
        assert_eq!(spec.cluster_deployment_ref.name, "bar");
    }

    #[test]
    fn test_cluster_provision_status_success_and_failed_are_distinct() {
        let succeeded = ClusterProvisionStatus {
            success: true,
            ..Default::default()
        };
        let failed = ClusterProvisionStatus {
            failed: true,
            failure_reason: Some("InstallAttemptTimeout".into()),
            ..Default::default()
        };

        assert!(succeeded.success && !succeeded.failed);
        assert!(failed.failed && !failed.success);
    }

    #[test]
    fn test_cluster_deprovision_spec_carries_platform() {
        let spec = ClusterDeprovisionSpec {
            infra_id: "bar-abc12".into(),
            cluster_id: Some("11111111-2222-3333-4444-555555555555".into()),
            platform: Platform {
                aws: Some(AwsPlatform {
                    region: "us-east-1".into(),
                    credentials_secret_ref: secret("foo-aws-creds"),
                }),
                azure: None,
                bare_metal: None,
            },
        };

        assert_eq!(spec.infra_id, "bar-abc12");
        assert!(spec.platform.aws.is_some());
    }

    #[test]
    fn test_cluster_deprovision_status_default() {
        let status = ClusterDeprovisionStatus::default();
        assert!(!status.completed);
        assert!(!status.authentication_failure);
    }

    #[test]
    fn test_cluster_image_set_spec() {
        let spec = ClusterImageSetSpec {
            release_image: "quay.io/openshift/release@sha256:abc".into(),
        };

        assert!(spec.release_image.starts_with("quay.io/"));
    }

    #[test]
    fn test_dns_zone_spec() {
        let spec = DNSZoneSpec {
            zone: "bar.clusters.example.com".into(),
            preserve_on_delete: false,
            platform: Platform {
                aws: Some(AwsPlatform {
                    region: "us-east-1".into(),
                    credentials_secret_ref: secret("foo-aws-creds"),
                }),
                azure: None,
                bare_metal: None,
            },
        };

        assert_eq!(spec.zone, "bar.clusters.example.com");
        assert!(!spec.preserve_on_delete);
    }

    #[test]
    fn test_cluster_deployment_customization_status_tracks_holder() {
        let status = ClusterDeploymentCustomizationStatus {
            conditions: vec![],
            cluster_deployment_ref: Some(LocalObjectReference { name: "bar".into() }),
        };

        assert_eq!(
            status.cluster_deployment_ref.unwrap().name,
            "bar".to_string()
        );
    }
}

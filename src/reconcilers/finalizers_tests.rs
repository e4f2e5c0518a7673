// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `finalizers.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{AwsPlatform, ClusterDeployment, ClusterDeploymentSpec, Platform, SecretReference};
    use crate::reconcilers::finalizers::FinalizerCleanup;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
    use k8s_openapi::chrono::Utc;
    use kube::Client;

    const TEST_FINALIZER: &str = "test.hive.example.io/finalizer";
    const TEST_NAMESPACE: &str = "test-namespace";
    const TEST_NAME: &str = "test-resource";

    fn test_spec() -> ClusterDeploymentSpec {
        ClusterDeploymentSpec {
            cluster_name: "bar".to_string(),
            installed: false,
            preserve_on_delete: false,
            manage_dns: false,
            install_attempts_limit: None,
            platform: Platform {
                aws: Some(AwsPlatform {
                    region: "us-east-1".to_string(),
                    credentials_secret_ref: SecretReference {
                        name: "aws-creds".to_string(),
                    },
                }),
                ..Default::default()
            },
            provisioning: None,
            cluster_install_ref: None,
            pull_secret_ref: None,
            cluster_pool_ref: None,
            cluster_metadata: None,
        }
    }

    fn create_test_cd() -> ClusterDeployment {
        ClusterDeployment {
            metadata: ObjectMeta {
                name: Some(TEST_NAME.to_string()),
                namespace: Some(TEST_NAMESPACE.to_string()),
                finalizers: None,
                deletion_timestamp: None,
                generation: Some(1),
                ..Default::default()
            },
            spec: test_spec(),
            status: None,
        }
    }

    fn create_test_cd_with_finalizers(finalizers: Vec<String>) -> ClusterDeployment {
        ClusterDeployment {
            metadata: ObjectMeta {
                name: Some(TEST_NAME.to_string()),
                namespace: Some(TEST_NAMESPACE.to_string()),
                finalizers: Some(finalizers),
                deletion_timestamp: None,
                generation: Some(1),
                ..Default::default()
            },
            spec: test_spec(),
            status: None,
        }
    }

    fn create_test_cd_being_deleted(finalizers: Vec<String>) -> ClusterDeployment {
        ClusterDeployment {
            metadata: ObjectMeta {
                name: Some(TEST_NAME.to_string()),
                namespace: Some(TEST_NAMESPACE.to_string()),
                finalizers: Some(finalizers),
                deletion_timestamp: Some(Time(Utc::now())),
                generation: Some(1),
                ..Default::default()
            },
            spec: test_spec(),
            status: None,
        }
    }

    async fn mock_client() -> Client {
        Client::try_default()
            .await
            .expect("Failed to create mock client")
    }

    #[tokio::test]
    #[ignore] // Requires Kubernetes cluster
    async fn test_ensure_finalizer_adds_when_missing() {
        let _client = mock_client().await;
        let cd = create_test_cd();
        assert!(cd.metadata.finalizers.is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Kubernetes cluster
    async fn test_ensure_finalizer_idempotent_when_present() {
        let _client = mock_client().await;
        let cd = create_test_cd_with_finalizers(vec![TEST_FINALIZER.to_string()]);
        assert!(cd
            .metadata
            .finalizers
            .as_ref()
            .unwrap()
            .contains(&TEST_FINALIZER.to_string()));
    }

    #[tokio::test]
    #[ignore] // Requires Kubernetes cluster
    async fn test_remove_finalizer_removes_when_present() {
        let _client = mock_client().await;
        let cd = create_test_cd_with_finalizers(vec![TEST_FINALIZER.to_string()]);
        assert!(cd
            .metadata
            .finalizers
            .as_ref()
            .unwrap()
            .contains(&TEST_FINALIZER.to_string()));
    }

    #[tokio::test]
    #[ignore] // Requires Kubernetes cluster
    async fn test_remove_finalizer_idempotent_when_absent() {
        let _client = mock_client().await;
        let cd = create_test_cd();
        assert!(cd.metadata.finalizers.is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Kubernetes cluster
    async fn test_handle_deletion_runs_cleanup_and_removes_finalizer() {
        let _client = mock_client().await;
        let cd = create_test_cd_being_deleted(vec![TEST_FINALIZER.to_string()]);
        assert!(cd.metadata.deletion_timestamp.is_some());
    }

    #[tokio::test]
    #[ignore] // Requires Kubernetes cluster
    async fn test_handle_deletion_skips_when_finalizer_absent() {
        let _client = mock_client().await;
        let cd = create_test_cd_being_deleted(vec![]);
        assert!(cd.metadata.deletion_timestamp.is_some());
        assert!(cd.metadata.finalizers.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_finalizer_cleanup_trait_requires_async() {
        // Compile-time check that ClusterDeployment's production FinalizerCleanup
        // impl (in reconcile::deprovision) satisfies the async trait bound.
        fn _assert_trait_is_async<T: FinalizerCleanup>() {}
        _assert_trait_is_async::<ClusterDeployment>();
    }

    #[test]
    fn test_create_test_cd_has_no_finalizers() {
        let cd = create_test_cd();
        assert!(cd.metadata.finalizers.is_none());
        assert_eq!(cd.metadata.name.as_ref().unwrap(), TEST_NAME);
        assert_eq!(cd.metadata.namespace.as_ref().unwrap(), TEST_NAMESPACE);
    }

    #[test]
    fn test_create_test_cd_with_finalizers_has_finalizers() {
        let cd = create_test_cd_with_finalizers(vec![TEST_FINALIZER.to_string()]);
        assert_eq!(cd.metadata.finalizers.as_ref().unwrap().len(), 1);
        assert!(cd
            .metadata
            .finalizers
            .as_ref()
            .unwrap()
            .contains(&TEST_FINALIZER.to_string()));
    }

    #[test]
    fn test_create_test_cd_being_deleted_has_deletion_timestamp() {
        let cd = create_test_cd_being_deleted(vec![TEST_FINALIZER.to_string()]);
        assert!(cd.metadata.deletion_timestamp.is_some());
        assert!(cd.metadata.finalizers.is_some());
    }

    #[test]
    fn test_clusterdeployment_kind() {
        use kube::Resource;
        let _cd = create_test_cd();
        assert_eq!(ClusterDeployment::kind(&()), "ClusterDeployment");
    }

    #[test]
    fn test_cd_has_finalizer_check() {
        let cd_without = create_test_cd();
        let cd_with = create_test_cd_with_finalizers(vec![TEST_FINALIZER.to_string()]);

        assert!(cd_without.metadata.finalizers.is_none());
        assert!(!cd_without
            .metadata
            .finalizers
            .as_ref()
            .is_some_and(|f| f.contains(&TEST_FINALIZER.to_string())));

        assert!(cd_with
            .metadata
            .finalizers
            .as_ref()
            .is_some_and(|f| f.contains(&TEST_FINALIZER.to_string())));
    }

    #[test]
    fn test_cd_has_deletion_timestamp_check() {
        let cd_normal = create_test_cd();
        let cd_deleting = create_test_cd_being_deleted(vec![TEST_FINALIZER.to_string()]);

        assert!(cd_normal.metadata.deletion_timestamp.is_none());
        assert!(cd_deleting.metadata.deletion_timestamp.is_some());
    }

    #[test]
    fn test_finalizer_list_manipulation() {
        let mut finalizers: Vec<String> = vec![];

        finalizers.push(TEST_FINALIZER.to_string());
        assert_eq!(finalizers.len(), 1);

        if !finalizers.contains(&TEST_FINALIZER.to_string()) {
            finalizers.push(TEST_FINALIZER.to_string());
        }
        assert_eq!(finalizers.len(), 1);

        let other_finalizer = "other.hive.example.io/finalizer";
        finalizers.push(other_finalizer.to_string());
        assert_eq!(finalizers.len(), 2);

        finalizers.retain(|f| f != TEST_FINALIZER);
        assert_eq!(finalizers.len(), 1);
        assert!(finalizers.contains(&other_finalizer.to_string()));

        finalizers.retain(|f| f != other_finalizer);
        assert_eq!(finalizers.len(), 0);
    }

    #[test]
    fn test_multiple_finalizers_handling() {
        let finalizer1 = "finalizer1.hive.example.io/cleanup";
        let finalizer2 = "finalizer2.hive.example.io/cleanup";
        let finalizer3 = "finalizer3.hive.example.io/cleanup";

        let cd = create_test_cd_with_finalizers(vec![
            finalizer1.to_string(),
            finalizer2.to_string(),
            finalizer3.to_string(),
        ]);

        assert_eq!(cd.metadata.finalizers.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_resource_generation_tracking() {
        let cd = create_test_cd();
        assert_eq!(cd.metadata.generation, Some(1));

        let deleting_cd = create_test_cd_being_deleted(vec![TEST_FINALIZER.to_string()]);
        assert_eq!(deleting_cd.metadata.generation, Some(1));
    }

    #[test]
    fn test_empty_finalizer_list_vs_none() {
        let cd_none = create_test_cd();
        let cd_empty = create_test_cd_with_finalizers(vec![]);

        assert!(cd_none.metadata.finalizers.is_none());
        assert!(cd_empty.metadata.finalizers.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_deletion_timestamp_and_finalizer_combination() {
        let case1 = create_test_cd_being_deleted(vec![TEST_FINALIZER.to_string()]);
        assert!(case1.metadata.deletion_timestamp.is_some());
        assert!(case1
            .metadata
            .finalizers
            .as_ref()
            .is_some_and(|f| f.contains(&TEST_FINALIZER.to_string())));

        let case2 = create_test_cd_being_deleted(vec![]);
        assert!(case2.metadata.deletion_timestamp.is_some());
        assert!(case2.metadata.finalizers.as_ref().unwrap().is_empty());

        let case3 = create_test_cd_with_finalizers(vec![TEST_FINALIZER.to_string()]);
        assert!(case3.metadata.deletion_timestamp.is_none());

        let case4 = create_test_cd();
        assert!(case4.metadata.deletion_timestamp.is_none());
        assert!(case4.metadata.finalizers.is_none());
    }
}

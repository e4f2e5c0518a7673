// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `status_reasons` module

#[cfg(test)]
mod tests {
    use crate::status_reasons::*;

    #[test]
    fn test_provisioned_reason_constants() {
        assert_eq!(REASON_PROVISION_SUCCEEDED, "ProvisionSucceeded");
        assert_eq!(REASON_PROVISIONING, "Provisioning");
        assert_eq!(REASON_PROVISION_STOPPED, "ProvisionStopped");
        assert_eq!(REASON_PROVISION_FAILED_RETRYING, "ProvisionFailedRetrying");
        assert_eq!(REASON_PROVISION_PENDING, "ProvisionPending");
    }

    #[test]
    fn test_dns_reason_constants() {
        assert_eq!(REASON_ZONE_AVAILABLE, "ZoneAvailable");
        assert_eq!(REASON_ZONE_PENDING, "ZonePending");
        assert_eq!(REASON_ZONE_TIMED_OUT, "ZoneTimedOut");
        assert_eq!(REASON_DNS_UNSUPPORTED_PLATFORM, "UnsupportedPlatform");
    }

    #[test]
    fn test_pull_secret_and_image_reason_constants() {
        assert_eq!(REASON_PULL_SECRET_MERGED, "PullSecretMerged");
        assert_eq!(REASON_PULL_SECRET_INVALID, "PullSecretInvalid");
        assert_eq!(REASON_IMAGE_RESOLVED, "ImageResolved");
        assert_eq!(REASON_IMAGE_NOT_SPECIFIED, "NoReleaseImage");
        assert_eq!(REASON_IMAGE_SET_NOT_FOUND, "ClusterImageSetNotFound");
    }

    #[test]
    fn test_sync_set_reason_constants() {
        assert_eq!(REASON_NO_SYNC_FAILURES, "NoFailures");
        assert_eq!(REASON_SYNC_SET_FAILED, "SyncSetFailed");
    }

    #[test]
    fn test_deprovision_reason_constants() {
        assert_eq!(REASON_DEPROVISION_COMPLETED, "DeprovisionCompleted");
        assert_eq!(REASON_DEPROVISIONING, "Deprovisioning");
        assert_eq!(REASON_AUTHENTICATION_FAILED, "AuthenticationFailed");
        assert_eq!(REASON_DEPROVISION_SKIPPED, "DeprovisionSkipped");
    }

    #[test]
    fn test_condition_type_constants_follow_pascal_case() {
        let types = [
            CONDITION_TYPE_PROVISIONED,
            CONDITION_TYPE_DNS_NOT_READY,
            CONDITION_TYPE_SYNC_SET_FAILED,
            CONDITION_TYPE_AUTHENTICATION_FAILURE,
        ];

        for type_name in types {
            assert!(
                !type_name.contains(' '),
                "Type '{type_name}' contains spaces"
            );
            assert!(
                type_name.chars().next().unwrap().is_uppercase(),
                "Type '{type_name}' doesn't start with uppercase"
            );
        }
    }

    #[test]
    fn test_all_provisioned_reasons_are_unique() {
        let reasons = [
            REASON_PROVISION_SUCCEEDED,
            REASON_PROVISIONING,
            REASON_PROVISION_STOPPED,
            REASON_PROVISION_FAILED_RETRYING,
            REASON_PROVISION_PENDING,
        ];

        for (i, reason1) in reasons.iter().enumerate() {
            for (j, reason2) in reasons.iter().enumerate() {
                if i != j {
                    assert_ne!(
                        reason1, reason2,
                        "Constants at indices {i} and {j} have the same value: {reason1}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_reason_constants_follow_pascal_case() {
        let reasons = [
            REASON_PROVISION_SUCCEEDED,
            REASON_PROVISIONING,
            REASON_ZONE_AVAILABLE,
            REASON_PULL_SECRET_MERGED,
            REASON_IMAGE_RESOLVED,
            REASON_NO_SYNC_FAILURES,
            REASON_DEPROVISION_COMPLETED,
        ];

        for reason in reasons {
            assert!(!reason.contains(' '), "Reason '{reason}' contains spaces");
            assert!(
                !reason.contains('_'),
                "Reason '{reason}' contains underscores"
            );
            assert!(
                reason.chars().next().unwrap().is_uppercase(),
                "Reason '{reason}' doesn't start with uppercase"
            );
        }
    }
}

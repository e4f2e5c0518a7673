use super::*;

#[test]
fn job_name_suffixes_imageset() {
    assert_eq!(job_name("foo"), "foo-imageset");
}

struct AlwaysAccepts;
impl SignatureVerifier for AlwaysAccepts {
    fn verify(&self, _digest: &str) -> bool {
        true
    }
}

struct AlwaysRejects;
impl SignatureVerifier for AlwaysRejects {
    fn verify(&self, _digest: &str) -> bool {
        false
    }
}

#[test]
fn verifier_accepts_known_digest() {
    let verifier: &dyn SignatureVerifier = &AlwaysAccepts;
    let image = "quay.io/openshift/release@sha256:abcd1234";
    let digest = image.split_once("@sha256:").map(|(_, d)| d);
    assert_eq!(digest, Some("abcd1234"));
    assert!(verifier.verify(digest.unwrap()));
}

#[test]
fn verifier_rejects_unknown_digest() {
    let verifier: &dyn SignatureVerifier = &AlwaysRejects;
    assert!(!verifier.verify("deadbeef"));
}

#[test]
fn tag_only_image_has_no_digest() {
    let image = "quay.io/openshift/release:4.15";
    assert_eq!(image.split_once("@sha256:"), None);
}

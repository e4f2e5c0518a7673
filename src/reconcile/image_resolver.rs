// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Installer-image resolver (§4.4): resolves a release-image reference into
//! concrete installer and CLI image digests via a one-shot Job, optionally
//! gated by digest-signature verification.

use crate::context::Context;
use crate::crd::{ClusterDeployment, ClusterDeploymentStatus, Condition};
use crate::errors::ImageResolutionError;
use crate::labels::{CLUSTER_NAME_LABEL, JOB_TYPE_LABEL};
use crate::reconcilers::status::{set_condition, UpdateMode};
use crate::status_reasons::{
    CONDITION_TYPE_INSTALL_IMAGES_NOT_RESOLVED, REASON_IMAGE_NOT_SPECIFIED, REASON_IMAGE_RESOLVED,
    REASON_IMAGE_SET_NOT_FOUND, REASON_JOB_TO_RESOLVE_IMAGES_FAILED,
    REASON_RELEASE_IMAGE_VERIFICATION_FAILED,
};
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DeleteParams;
use kube::{Api, Resource, ResourceExt};
use std::collections::BTreeMap;

/// `JOB_TYPE_LABEL` value for the image-resolution Job.
pub const IMAGE_RESOLUTION_JOB_TYPE: &str = "imageset";

/// Name of the resolution Job and its output ConfigMap for a CD named `cd_name`.
#[must_use]
pub fn job_name(cd_name: &str) -> String {
    format!("{cd_name}-imageset")
}

/// A digest verifier consulted when the release image must be pinned by
/// digest before a resolution Job is allowed to run. Narrow interface: the
/// core never implements signature verification itself (§1 Non-goals).
pub trait SignatureVerifier {
    fn verify(&self, release_image_digest: &str) -> bool;
}

/// Resolves `InstallerImage`/`CLIImage` onto the CD's status.
///
/// Returns `Ok(true)` when both images are present on `status` after this
/// call (resolution complete, the pass may proceed); `Ok(false)` when a Job
/// was just created or is still running (the pass should requeue);
/// `Err(ImageResolutionError)` on an unrecoverable input problem.
pub async fn reconcile(
    ctx: &Context,
    cd: &ClusterDeployment,
    status: &mut ClusterDeploymentStatus,
    conditions: &mut Vec<Condition>,
    verifier: Option<&dyn SignatureVerifier>,
) -> Result<bool, ImageResolutionError> {
    if status.installer_image.is_some() && status.cli_image.is_some() {
        return Ok(true);
    }

    let namespace = cd.namespace().unwrap_or_default();
    let name = cd.name_any();

    let release_image = resolve_release_image(ctx, cd).map_err(|err| {
        let (reason, message) = match &err {
            ImageResolutionError::NotSpecified { name } => (
                REASON_IMAGE_NOT_SPECIFIED,
                format!("'{name}' has no release image or image set reference"),
            ),
            ImageResolutionError::ImageSetNotFound { image_set_name, cd_name } => (
                REASON_IMAGE_SET_NOT_FOUND,
                format!("ClusterImageSet '{image_set_name}' referenced by '{cd_name}' was not found"),
            ),
        };
        set_condition(
            conditions,
            CONDITION_TYPE_INSTALL_IMAGES_NOT_RESOLVED,
            "True",
            reason,
            &message,
            UpdateMode::IfReasonOrMessageChange,
        );
        err
    })?;

    if let Some(verifier) = verifier {
        match release_image.split_once("@sha256:") {
            Some((_, digest)) if verifier.verify(digest) => {}
            _ => {
                set_condition(
                    conditions,
                    CONDITION_TYPE_INSTALL_IMAGES_NOT_RESOLVED,
                    "True",
                    REASON_RELEASE_IMAGE_VERIFICATION_FAILED,
                    &format!("release image '{release_image}' is not referenced by digest or failed signature verification"),
                    UpdateMode::IfReasonOrMessageChange,
                );
                return Ok(false);
            }
        }
    }

    match read_resolved_images(ctx, &namespace, &name).await {
        Ok(Some((installer, cli))) => {
            status.installer_image = Some(installer);
            status.cli_image = Some(cli);
            delete_job(ctx, &namespace, &name).await;
            set_condition(
                conditions,
                CONDITION_TYPE_INSTALL_IMAGES_NOT_RESOLVED,
                "False",
                REASON_IMAGE_RESOLVED,
                "installer and CLI images resolved",
                UpdateMode::IfReasonOrMessageChange,
            );
            Ok(true)
        }
        Ok(None) => {
            ensure_resolution_job(ctx, &namespace, cd, &release_image).await;
            Ok(false)
        }
        Err(reason) => {
            set_condition(
                conditions,
                CONDITION_TYPE_INSTALL_IMAGES_NOT_RESOLVED,
                "True",
                REASON_JOB_TO_RESOLVE_IMAGES_FAILED,
                &reason,
                UpdateMode::IfReasonOrMessageChange,
            );
            Ok(false)
        }
    }
}

fn resolve_release_image(
    ctx: &Context,
    cd: &ClusterDeployment,
) -> std::result::Result<String, ImageResolutionError> {
    let provisioning = cd.spec.provisioning.as_ref();

    if let Some(image) = provisioning.and_then(|p| p.release_image.as_ref()) {
        return Ok(image.clone());
    }

    let image_set_ref = provisioning
        .and_then(|p| p.image_set_ref.as_ref())
        .ok_or_else(|| ImageResolutionError::NotSpecified { name: cd.name_any() })?;

    let image_set = ctx
        .stores
        .get_cluster_image_set(&image_set_ref.name)
        .ok_or_else(|| ImageResolutionError::ImageSetNotFound {
            image_set_name: image_set_ref.name.clone(),
            cd_name: cd.name_any(),
        })?;

    Ok(image_set.spec.release_image.clone())
}

/// Looks for the Job's output ConfigMap, carrying `installerImage`/`cliImage`
/// keys once the resolution container has written its result (§13 Job output
/// contract). `Ok(None)` means the Job has not finished yet; `Err` means it
/// reached a terminal failed state.
async fn read_resolved_images(
    ctx: &Context,
    namespace: &str,
    cd_name: &str,
) -> std::result::Result<Option<(String, String)>, String> {
    use k8s_openapi::api::core::v1::ConfigMap;

    let jobs: Api<Job> = Api::namespaced(ctx.client.clone(), namespace);
    let job = match jobs.get(&job_name(cd_name)).await {
        Ok(job) => job,
        Err(kube::Error::Api(e)) if e.code == 404 => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };

    let job_status = job.status.unwrap_or_default();
    if job_status.failed.unwrap_or(0) > 0 {
        return Err(format!("image resolution Job '{}' failed", job_name(cd_name)));
    }
    if job_status.succeeded.unwrap_or(0) == 0 {
        return Ok(None);
    }

    let configmaps: Api<ConfigMap> = Api::namespaced(ctx.client.clone(), namespace);
    let output = configmaps
        .get(&job_name(cd_name))
        .await
        .map_err(|e| format!("image resolution Job '{}' succeeded but produced no output: {e}", job_name(cd_name)))?;
    let data = output.data.unwrap_or_default();

    let installer = data
        .get("installerImage")
        .ok_or_else(|| "resolution output is missing installerImage".to_string())?;
    let cli = data
        .get("cliImage")
        .ok_or_else(|| "resolution output is missing cliImage".to_string())?;

    Ok(Some((installer.clone(), cli.clone())))
}

async fn ensure_resolution_job(ctx: &Context, namespace: &str, cd: &ClusterDeployment, release_image: &str) {
    let jobs: Api<Job> = Api::namespaced(ctx.client.clone(), namespace);
    let name = job_name(&cd.name_any());

    if jobs.get(&name).await.is_ok() {
        return;
    }

    let mut labels = BTreeMap::new();
    labels.insert(CLUSTER_NAME_LABEL.to_string(), cd.spec.cluster_name.clone());
    labels.insert(JOB_TYPE_LABEL.to_string(), IMAGE_RESOLUTION_JOB_TYPE.to_string());

    let owner = match cd.controller_owner_ref(&()) {
        Some(o) => o,
        None => return,
    };

    let job = Job {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        spec: Some(JobSpec {
            backoff_limit: Some(2),
            template: PodTemplateSpec {
                spec: Some(PodSpec {
                    restart_policy: Some("OnFailure".to_string()),
                    containers: vec![Container {
                        name: "resolve-images".to_string(),
                        image: Some(release_image.to_string()),
                        command: Some(vec![
                            "/bin/installer".to_string(),
                            "image".to_string(),
                            "--output-configmap".to_string(),
                            name.clone(),
                        ]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }),
        status: None,
    };

    let _ = jobs.create(&kube::api::PostParams::default(), &job).await;
    ctx.expectations.expect_creations(&format!("{namespace}/{}", cd.name_any()), 1);
}

async fn delete_job(ctx: &Context, namespace: &str, cd_name: &str) {
    let jobs: Api<Job> = Api::namespaced(ctx.client.clone(), namespace);
    let _ = jobs
        .delete(
            &job_name(cd_name),
            &DeleteParams {
                propagation_policy: Some(kube::api::PropagationPolicy::Background),
                ..Default::default()
            },
        )
        .await;
}

#[cfg(test)]
#[path = "image_resolver_tests.rs"]
mod image_resolver_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Process configuration, read once at startup from environment variables.
//!
//! Every knob has a default so the controller is runnable with zero
//! configuration in a typical in-cluster deployment, matching the
//! environment-variable-with-fallback pattern this codebase's `main.rs` uses
//! for leader-election and client-QPS tuning.

use std::path::PathBuf;
use std::time::SystemTime;

use crate::constants::{
    DEFAULT_REQUEUE_DURATION_SECS, DNS_ZONE_WAIT_SECS, TOKIO_WORKER_THREADS,
};

/// Name of the environment variable pointing at the retry-reasons JSON file.
pub const FAILED_PROVISION_CONFIG_FILE_ENV_VAR: &str = "FAILED_PROVISION_CONFIG_FILE";

/// Name of the environment variable naming the install-logs credentials
/// secret to copy from the manager namespace into each CD's namespace.
pub const INSTALL_LOGS_CREDENTIALS_SECRET_REF_ENV_VAR: &str = "INSTALL_LOGS_CREDENTIALS_SECRET_REF";

/// Name of the environment variable naming the global pull secret in the
/// manager namespace.
pub const GLOBAL_PULL_SECRET_ENV_VAR: &str = "GLOBAL_PULL_SECRET";

/// Name of the environment variable naming the manager's own namespace, where
/// the global pull secret and install-logs credentials secret live.
pub const OPERATOR_NAMESPACE_ENV_VAR: &str = "OPERATOR_NAMESPACE";

/// Default manager namespace when `OPERATOR_NAMESPACE` is unset.
pub const DEFAULT_OPERATOR_NAMESPACE: &str = "hive";

/// Operational configuration loaded once at process startup.
#[derive(Clone, Debug)]
pub struct OperatorConfig {
    /// Namespace the manager itself runs in; source namespace for
    /// `global_pull_secret` and `install_logs_credentials_secret_ref`.
    pub operator_namespace: String,

    /// Name of the global pull secret in the manager's own namespace, merged
    /// into every CD that doesn't carry enough of its own (§4.3).
    pub global_pull_secret: Option<String>,

    /// Name of a secret in the manager's namespace to copy into each CD's
    /// namespace for install-log collection.
    pub install_logs_credentials_secret_ref: Option<String>,

    /// Path to the retry-reasons allowlist file, if configured.
    pub failed_provision_config_file: Option<PathBuf>,

    /// How long to wait between reconciles with no error and no specific
    /// follow-up requested.
    pub default_requeue_secs: u64,

    /// How long to wait for an owned `DNSZone` to report ready before giving
    /// up (§4.5).
    pub dns_zone_wait_secs: u64,

    /// Number of Tokio worker threads for the multi-threaded runtime.
    pub worker_threads: usize,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            operator_namespace: DEFAULT_OPERATOR_NAMESPACE.to_string(),
            global_pull_secret: None,
            install_logs_credentials_secret_ref: None,
            failed_provision_config_file: None,
            default_requeue_secs: DEFAULT_REQUEUE_DURATION_SECS,
            dns_zone_wait_secs: DNS_ZONE_WAIT_SECS,
            worker_threads: TOKIO_WORKER_THREADS,
        }
    }
}

impl OperatorConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            operator_namespace: std::env::var(OPERATOR_NAMESPACE_ENV_VAR)
                .unwrap_or_else(|_| defaults.operator_namespace.clone()),
            global_pull_secret: std::env::var(GLOBAL_PULL_SECRET_ENV_VAR).ok(),
            install_logs_credentials_secret_ref: std::env::var(
                INSTALL_LOGS_CREDENTIALS_SECRET_REF_ENV_VAR,
            )
            .ok(),
            failed_provision_config_file: std::env::var(FAILED_PROVISION_CONFIG_FILE_ENV_VAR)
                .ok()
                .map(PathBuf::from),
            default_requeue_secs: std::env::var("DEFAULT_REQUEUE_DURATION_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_requeue_secs),
            dns_zone_wait_secs: std::env::var("DNS_ZONE_WAIT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.dns_zone_wait_secs),
            worker_threads: std::env::var("TOKIO_WORKER_THREADS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.worker_threads),
        }
    }
}

/// The retry-reasons allowlist used by the provision backoff decision (§4.6).
///
/// Three states are semantically distinct: no file configured means every
/// failure reason is retryable; a file with an empty list means none are;
/// a populated list means only the listed reasons are retried.
#[derive(Clone, Debug, Default)]
pub struct RetryReasonsConfig {
    /// `None` when no file is configured (unrestricted retries). `Some(vec)`
    /// once a file has been loaded, where an empty vec denies all retries.
    reasons: Option<Vec<String>>,

    /// Path and mtime the config was last loaded from, for lazy reload.
    loaded_from: Option<(PathBuf, SystemTime)>,
}

impl RetryReasonsConfig {
    /// A config with no file configured: every failure reason is retryable.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Loads (or reloads) the allowlist from `path`, returning the prior
    /// state unchanged if the path's mtime hasn't advanced since the last
    /// load.
    pub fn reload_if_changed(&mut self, path: &std::path::Path) -> anyhow::Result<()> {
        let metadata = std::fs::metadata(path)?;
        let mtime = metadata.modified()?;

        if let Some((loaded_path, loaded_mtime)) = &self.loaded_from {
            if loaded_path == path && *loaded_mtime >= mtime {
                return Ok(());
            }
        }

        let contents = std::fs::read_to_string(path)?;
        let parsed: FailedProvisionConfigFile = serde_json::from_str(&contents)?;
        self.reasons = Some(parsed.retry_reasons);
        self.loaded_from = Some((path.to_path_buf(), mtime));
        Ok(())
    }

    /// Whether a provision that failed with `reason` should be retried.
    #[must_use]
    pub fn allows_retry(&self, reason: &str) -> bool {
        match &self.reasons {
            None => true,
            Some(allowlist) => allowlist.iter().any(|r| r == reason),
        }
    }
}

#[derive(serde::Deserialize)]
struct FailedProvisionConfigFile {
    #[serde(rename = "retryReasons")]
    retry_reasons: Vec<String>,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;

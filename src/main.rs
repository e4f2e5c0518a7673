// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use axum::{routing::get, Router};
use cdoperator::config::{OperatorConfig, RetryReasonsConfig};
use cdoperator::constants::{
    DEFAULT_LEASE_DURATION_SECS, DEFAULT_LEASE_RENEW_DEADLINE_SECS,
    DEFAULT_LEASE_RETRY_PERIOD_SECS, ERROR_REQUEUE_DURATION_SECS, KUBE_CLIENT_BURST,
    KUBE_CLIENT_QPS, METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PATH, METRICS_SERVER_PORT,
    TOKIO_WORKER_THREADS,
};
use cdoperator::context::{Context, Metrics, Stores};
use cdoperator::crd::{
    ClusterDeployment, ClusterDeploymentCustomization, ClusterDeprovision, ClusterImageSet,
    ClusterProvision, ClusterSync, DNSZone,
};
use cdoperator::errors::ReconcileError;
use cdoperator::expectations::ExpectationsTracker;
use cdoperator::metrics;
use cdoperator::reconcile::orchestrator;
use futures::StreamExt;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    runtime::{controller::Action, reflector, watcher, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use kube_lease_manager::{LeaseManager, LeaseManagerBuilder};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("cdoperator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging with custom format
///
/// Respects `RUST_LOG` environment variable if set, otherwise defaults to INFO level.
/// Respects `RUST_LOG_FORMAT` environment variable for output format (json or text).
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting cluster-lifecycle operator");
    debug!("Logging initialized with file and line number tracking");
}

/// Initialize the Kubernetes client.
async fn initialize_services() -> Result<Client> {
    debug!("Initializing Kubernetes client");

    // Load kubeconfig
    let config = kube::Config::infer().await?;

    // Parse rate limit configuration from environment variables or use defaults.
    // Note: kube-rs 2.0 uses Tower middleware (RateLimitLayer) for rate limiting
    // instead of direct QPS/burst config fields like client-go.
    let qps: f32 = std::env::var("CDOPERATOR_KUBE_QPS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(KUBE_CLIENT_QPS);

    let burst: u32 = std::env::var("CDOPERATOR_KUBE_BURST")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(KUBE_CLIENT_BURST);

    let client = Client::try_from(config)?;

    info!(
        qps = qps,
        burst = burst,
        "Kubernetes client initialized"
    );

    Ok(client)
}

/// Initialize reflectors for all watched CRD/core types and create the
/// shared context.
///
/// This function creates reflector tasks for every watched resource kind,
/// populating in-memory stores that enable O(1) lookups of subordinate
/// resources without extra API calls during reconciliation.
///
/// # Arguments
///
/// * `client` - Kubernetes API client
///
/// # Returns
///
/// * `Arc<Context>` - Shared context with client, stores, and metrics
///
/// # Architecture
///
/// Each reflector spawns a background task that watches its resource type
/// and updates the corresponding store. The stores are then made available
/// to the controller through the shared context.
async fn initialize_shared_context(client: Client) -> Result<Arc<Context>> {
    info!("Initializing reflectors for all watched resource kinds");

    // Create APIs for every watched kind.
    let cluster_deployments_api = Api::<ClusterDeployment>::all(client.clone());
    let cluster_provisions_api = Api::<ClusterProvision>::all(client.clone());
    let cluster_deprovisions_api = Api::<ClusterDeprovision>::all(client.clone());
    let cluster_image_sets_api = Api::<ClusterImageSet>::all(client.clone());
    let dns_zones_api = Api::<DNSZone>::all(client.clone());
    let cluster_syncs_api = Api::<ClusterSync>::all(client.clone());
    let cluster_deployment_customizations_api =
        Api::<ClusterDeploymentCustomization>::all(client.clone());
    let jobs_api = Api::<Job>::all(client.clone());
    let secrets_api = Api::<Secret>::all(client.clone());

    // Create stores (will be populated by reflectors)
    let (cluster_deployments_store, cluster_deployments_writer) = reflector::store();
    let (cluster_provisions_store, cluster_provisions_writer) = reflector::store();
    let (cluster_deprovisions_store, cluster_deprovisions_writer) = reflector::store();
    let (cluster_image_sets_store, cluster_image_sets_writer) = reflector::store();
    let (dns_zones_store, dns_zones_writer) = reflector::store();
    let (cluster_syncs_store, cluster_syncs_writer) = reflector::store();
    let (cluster_deployment_customizations_store, cluster_deployment_customizations_writer) =
        reflector::store();
    let (jobs_store, jobs_writer) = reflector::store();
    let (secrets_store, secrets_writer) = reflector::store();

    // Start reflector tasks (one per watched kind). These run in the
    // background and continuously update the stores.
    tokio::spawn(async move {
        let stream = watcher(cluster_deployments_api, watcher::Config::default());
        reflector(cluster_deployments_writer, stream)
            .for_each(|_| futures::future::ready(()))
            .await;
        warn!("ClusterDeployment reflector stream ended");
    });

    tokio::spawn(async move {
        let stream = watcher(cluster_provisions_api, watcher::Config::default());
        reflector(cluster_provisions_writer, stream)
            .for_each(|_| futures::future::ready(()))
            .await;
        warn!("ClusterProvision reflector stream ended");
    });

    tokio::spawn(async move {
        let stream = watcher(cluster_deprovisions_api, watcher::Config::default());
        reflector(cluster_deprovisions_writer, stream)
            .for_each(|_| futures::future::ready(()))
            .await;
        warn!("ClusterDeprovision reflector stream ended");
    });

    tokio::spawn(async move {
        let stream = watcher(cluster_image_sets_api, watcher::Config::default());
        reflector(cluster_image_sets_writer, stream)
            .for_each(|_| futures::future::ready(()))
            .await;
        warn!("ClusterImageSet reflector stream ended");
    });

    tokio::spawn(async move {
        let stream = watcher(dns_zones_api, watcher::Config::default());
        reflector(dns_zones_writer, stream)
            .for_each(|_| futures::future::ready(()))
            .await;
        warn!("DNSZone reflector stream ended");
    });

    tokio::spawn(async move {
        let stream = watcher(cluster_syncs_api, watcher::Config::default());
        reflector(cluster_syncs_writer, stream)
            .for_each(|_| futures::future::ready(()))
            .await;
        warn!("ClusterSync reflector stream ended");
    });

    tokio::spawn(async move {
        let stream = watcher(
            cluster_deployment_customizations_api,
            watcher::Config::default(),
        );
        reflector(cluster_deployment_customizations_writer, stream)
            .for_each(|_| futures::future::ready(()))
            .await;
        warn!("ClusterDeploymentCustomization reflector stream ended");
    });

    tokio::spawn(async move {
        let stream = watcher(jobs_api, watcher::Config::default());
        reflector(jobs_writer, stream)
            .for_each(|_| futures::future::ready(()))
            .await;
        warn!("Job reflector stream ended");
    });

    tokio::spawn(async move {
        let stream = watcher(secrets_api, watcher::Config::default());
        reflector(secrets_writer, stream)
            .for_each(|_| futures::future::ready(()))
            .await;
        warn!("Secret reflector stream ended");
    });

    // Create the stores structure
    let stores = Stores {
        cluster_deployments: cluster_deployments_store,
        cluster_provisions: cluster_provisions_store,
        cluster_deprovisions: cluster_deprovisions_store,
        cluster_image_sets: cluster_image_sets_store,
        dns_zones: dns_zones_store,
        cluster_syncs: cluster_syncs_store,
        cluster_deployment_customizations: cluster_deployment_customizations_store,
        jobs: jobs_store,
        secrets: secrets_store,
    };

    // Create HTTP client for credential-preflight and console-route calls
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let config = OperatorConfig::from_env();
    let mut retry_reasons = RetryReasonsConfig::unrestricted();
    if let Some(path) = config.failed_provision_config_file.as_deref() {
        if let Err(e) = retry_reasons.reload_if_changed(path) {
            warn!("Failed to load retry-reasons config from {path:?}: {e}");
        }
    }

    // Create the shared context
    let context = Arc::new(Context {
        client,
        stores,
        http_client,
        metrics: Metrics::default(),
        expectations: ExpectationsTracker::new(),
        retry_reasons,
        config,
    });

    info!("Shared context initialized with reflectors for all watched resource kinds");

    Ok(context)
}

/// Start the Prometheus metrics HTTP server
///
/// Serves metrics on the configured port and path (default: 0.0.0.0:8080/metrics)
///
/// # Returns
/// A `JoinHandle` that can be used to monitor the server task
fn start_metrics_server() -> tokio::task::JoinHandle<()> {
    info!(
        bind_address = METRICS_SERVER_BIND_ADDRESS,
        port = METRICS_SERVER_PORT,
        path = METRICS_SERVER_PATH,
        "Starting Prometheus metrics HTTP server"
    );

    tokio::spawn(async move {
        // Define the metrics endpoint handler
        async fn metrics_handler() -> String {
            match metrics::gather_metrics() {
                Ok(metrics_text) => metrics_text,
                Err(e) => {
                    error!("Failed to gather metrics: {}", e);
                    String::from("# Error gathering metrics\n")
                }
            }
        }

        // Build the router with the metrics endpoint
        let app = Router::new().route(METRICS_SERVER_PATH, get(metrics_handler));

        // Bind to the configured address and port
        let bind_addr = format!("{METRICS_SERVER_BIND_ADDRESS}:{METRICS_SERVER_PORT}");
        let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind metrics server to {bind_addr}: {e}");
                return;
            }
        };

        info!("Metrics server listening on http://{bind_addr}{METRICS_SERVER_PATH}");

        // Run the server
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {e}");
        }
    })
}

/// Leader election configuration
struct LeaderElectionConfig {
    enabled: bool,
    lease_name: String,
    lease_namespace: String,
    identity: String,
    lease_duration: u64,
    renew_deadline: u64,
    retry_period: u64,
}

/// Load leader election configuration from environment variables
fn load_leader_election_config() -> LeaderElectionConfig {
    let enabled = std::env::var("CDOPERATOR_ENABLE_LEADER_ELECTION")
        .unwrap_or_else(|_| "true".to_string())
        .parse::<bool>()
        .unwrap_or(true);

    let lease_name =
        std::env::var("CDOPERATOR_LEASE_NAME").unwrap_or_else(|_| "cdoperator-leader".to_string());

    let lease_namespace = std::env::var("CDOPERATOR_LEASE_NAMESPACE")
        .or_else(|_| std::env::var("POD_NAMESPACE"))
        .unwrap_or_else(|_| "hive".to_string());

    let lease_duration = std::env::var("CDOPERATOR_LEASE_DURATION_SECONDS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_LEASE_DURATION_SECS);

    let renew_deadline = std::env::var("CDOPERATOR_LEASE_RENEW_DEADLINE_SECONDS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_LEASE_RENEW_DEADLINE_SECS);

    let retry_period = std::env::var("CDOPERATOR_LEASE_RETRY_PERIOD_SECONDS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_LEASE_RETRY_PERIOD_SECS);

    let identity = std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| format!("cdoperator-{}", rand::random::<u32>()));

    LeaderElectionConfig {
        enabled,
        lease_name,
        lease_namespace,
        identity,
        lease_duration,
        renew_deadline,
        retry_period,
    }
}

/// Create a default watcher configuration.
///
/// Returns a basic watcher configuration without semantic filtering.
/// Used for owned kinds whose status updates (not just spec changes) must
/// trigger reconciliation of the owning `ClusterDeployment`.
///
/// # Returns
///
/// A `Config` instance with default settings.
#[inline]
fn default_watcher_config() -> Config {
    Config::default()
}

/// Create a semantic watcher configuration.
///
/// Returns a watcher configuration that only triggers on semantic changes
/// (spec modifications), ignoring status-only updates. This prevents
/// reconciliation loops when the controller itself updates status fields.
///
/// # Returns
///
/// A `Config` instance configured with semantic filtering.
#[inline]
fn semantic_watcher_config() -> Config {
    Config::default().any_semantic()
}

/// Run the controller without leader election, with signal handling
async fn run_operators_without_leader_election(context: Arc<Context>) -> Result<()> {
    warn!("Leader election DISABLED - running without high availability");
    info!("Starting controller with signal handling");

    let shutdown_result: Result<()> = tokio::select! {
        // Monitor for SIGINT (Ctrl+C)
        result = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            info!("Stopping controller...");
            result.map_err(anyhow::Error::from)
        }

        // Monitor for SIGTERM (Kubernetes sends this when deleting pods)
        result = async {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = signal(SignalKind::terminate())?;
                sigterm.recv().await;
                Ok::<(), anyhow::Error>(())
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
                Ok::<(), anyhow::Error>(())
            }
        } => {
            info!("Received SIGTERM (pod termination), initiating graceful shutdown...");
            info!("Stopping controller...");
            result
        }

        // Run the controller
        result = run_cluster_deployment_operator(context.clone()) => {
            result
        }
    };

    shutdown_result?;
    info!("Graceful shutdown completed successfully");

    Ok(())
}

/// Performs startup drift detection across `ClusterDeployment` resources.
///
/// Called once on operator startup to trigger a reconcile for every
/// existing `ClusterDeployment`, picking up any changes that happened while
/// the operator was down or being upgraded.
///
/// # Arguments
///
/// * `client` - Kubernetes API client
/// * `context` - Shared operator context
///
/// # Errors
///
/// Returns error if Kubernetes API calls fail.
async fn perform_startup_drift_detection(client: Client, context: Arc<Context>) -> Result<()> {
    info!("Starting drift detection for ClusterDeployment resources...");
    let cluster_deployments_api: Api<ClusterDeployment> = Api::all(client.clone());
    match cluster_deployments_api
        .list(&kube::api::ListParams::default())
        .await
    {
        Ok(deployments) => {
            info!(
                "Found {} ClusterDeployment resources",
                deployments.items.len()
            );
            for cd in deployments.items {
                let name = cd.name_any();
                let namespace = cd.namespace().unwrap_or_else(|| "default".to_string());
                debug!(
                    "Triggering reconciliation for ClusterDeployment: {}/{}",
                    namespace, name
                );

                match Box::pin(orchestrator::reconcile(&context, &cd)).await {
                    Ok(_) => debug!(
                        "ClusterDeployment {}/{} reconciled successfully",
                        namespace, name
                    ),
                    Err(e) => warn!(
                        "Failed to reconcile ClusterDeployment {}/{}: {}",
                        namespace, name, e
                    ),
                }
            }
        }
        Err(e) => {
            warn!("Failed to list ClusterDeployment resources: {}", e);
        }
    }

    info!("Startup drift detection completed");
    Ok(())
}

async fn async_main() -> Result<()> {
    initialize_logging();

    let client = initialize_services().await?;

    // Initialize shared context with reflectors for all watched resource kinds
    let context = initialize_shared_context(client.clone()).await?;

    // Start the metrics HTTP server
    let _metrics_handle = start_metrics_server();

    let leader_election_config = load_leader_election_config();

    if leader_election_config.enabled {
        info!(
            lease_name = %leader_election_config.lease_name,
            lease_namespace = %leader_election_config.lease_namespace,
            identity = %leader_election_config.identity,
            lease_duration_secs = leader_election_config.lease_duration,
            renew_deadline_secs = leader_election_config.renew_deadline,
            "Leader election enabled"
        );

        // Create and start lease manager for leader election
        // The manager returns a watch receiver (to monitor leadership status)
        // and a join handle (to monitor the lease renewal task)
        info!("Starting leader election, waiting to acquire leadership...");

        let lease_manager =
            LeaseManagerBuilder::new(client.clone(), &leader_election_config.lease_name)
                .with_namespace(&leader_election_config.lease_namespace)
                .with_identity(&leader_election_config.identity)
                .with_duration(leader_election_config.lease_duration)
                .with_grace(leader_election_config.retry_period)
                .build()
                .await?;

        let (leader_rx, lease_handle) = lease_manager.watch().await;

        // Wait until we become leader
        let mut rx = leader_rx.clone();
        while !*rx.borrow_and_update() {
            rx.changed().await?;
        }

        info!("Leadership acquired, starting controller...");

        info!("Performing startup drift detection across ClusterDeployment resources...");
        if let Err(e) = Box::pin(perform_startup_drift_detection(
            client.clone(),
            context.clone(),
        ))
        .await
        {
            warn!(
                "Startup drift detection failed: {}. Continuing with controller startup.",
                e
            );
        }

        run_operators_with_leader_election(context, leader_rx, lease_handle).await?;
    } else {
        info!("Leader election disabled, starting controller immediately...");

        info!("Performing startup drift detection across ClusterDeployment resources...");
        if let Err(e) = Box::pin(perform_startup_drift_detection(
            client.clone(),
            context.clone(),
        ))
        .await
        {
            warn!(
                "Startup drift detection failed: {}. Continuing with controller startup.",
                e
            );
        }

        run_operators_without_leader_election(context).await?;
    }

    Ok(())
}

/// Monitor leadership status - returns when leadership is lost or an error occurs
async fn monitor_leadership(
    mut leader_rx: tokio::sync::watch::Receiver<bool>,
) -> Result<(), anyhow::Error> {
    loop {
        leader_rx.changed().await?;
        if !*leader_rx.borrow() {
            // Leadership lost
            return Ok(());
        }
    }
}

/// Run the `ClusterDeployment` controller, reconciling on changes to the CD
/// itself and to every owned/watched kind that feeds the reconcile decision.
async fn run_cluster_deployment_operator(context: Arc<Context>) -> Result<()> {
    info!("Starting ClusterDeployment operator");

    let client = context.client.clone();
    let api = Api::<ClusterDeployment>::all(client.clone());
    let cluster_provisions_api = Api::<ClusterProvision>::all(client.clone());
    let cluster_deprovisions_api = Api::<ClusterDeprovision>::all(client.clone());
    let dns_zones_api = Api::<DNSZone>::all(client.clone());
    let jobs_api = Api::<Job>::all(client.clone());
    let cluster_syncs_api = Api::<ClusterSync>::all(client.clone());

    Controller::new(api, semantic_watcher_config())
        .owns(cluster_provisions_api, default_watcher_config())
        .owns(cluster_deprovisions_api, default_watcher_config())
        .owns(dns_zones_api, default_watcher_config())
        .owns(jobs_api, default_watcher_config())
        .watches(cluster_syncs_api, default_watcher_config(), |sync| {
            // A ClusterSync shares its ClusterDeployment's name and namespace
            // (Hive convention), so mapping it back is a direct lookup.
            sync.namespace().map(|namespace| {
                kube::runtime::reflector::ObjectRef::new(&sync.name_any()).within(&namespace)
            })
        })
        .run(
            reconcile_cluster_deployment_wrapper,
            error_policy,
            context,
        )
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `ClusterDeployment`, adapting
/// `reconcile::orchestrator::reconcile`'s `Option<Duration>` requeue
/// disposition into an `Action` and recording metrics.
async fn reconcile_cluster_deployment_wrapper(
    cd: Arc<ClusterDeployment>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    use cdoperator::constants::KIND_CLUSTER_DEPLOYMENT;
    let start = std::time::Instant::now();

    debug!(
        cluster_deployment = %cd.name_any(),
        namespace = ?cd.namespace(),
        "Reconcile wrapper called for ClusterDeployment"
    );

    let result = Box::pin(orchestrator::reconcile(&ctx, &cd)).await;
    let duration = start.elapsed();

    match result {
        Ok(requeue_after) => {
            info!(
                "Successfully reconciled ClusterDeployment: {}",
                cd.name_any()
            );
            metrics::record_reconciliation_success(KIND_CLUSTER_DEPLOYMENT, duration);

            match requeue_after {
                Some(after) => Ok(Action::requeue(after)),
                None => Ok(Action::await_change()),
            }
        }
        Err(e) => {
            error!("Failed to reconcile ClusterDeployment: {}", e);
            metrics::record_reconciliation_error(KIND_CLUSTER_DEPLOYMENT, duration);
            metrics::record_error(KIND_CLUSTER_DEPLOYMENT, "reconcile_error");
            Err(e)
        }
    }
}

/// Run the controller with leader election
///
/// This function runs the controller while monitoring leadership status and handling signals.
/// If leadership is lost or SIGTERM/SIGINT is received, the controller is stopped and the process exits gracefully.
async fn run_operators_with_leader_election(
    context: Arc<Context>,
    leader_rx: tokio::sync::watch::Receiver<bool>,
    _lease_handle: tokio::task::JoinHandle<
        Result<LeaseManager, kube_lease_manager::LeaseManagerError>,
    >,
) -> Result<()> {
    info!("Running controller with leader election and signal handling");

    let shutdown_result: Result<()> = tokio::select! {
        // Monitor for SIGINT (Ctrl+C)
        result = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            info!("Stopping controller and releasing leader election lease...");
            result.map_err(anyhow::Error::from)
        }

        // Monitor for SIGTERM (Kubernetes sends this when deleting pods)
        result = async {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = signal(SignalKind::terminate())?;
                sigterm.recv().await;
                Ok::<(), anyhow::Error>(())
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
                Ok::<(), anyhow::Error>(())
            }
        } => {
            info!("Received SIGTERM (pod termination), initiating graceful shutdown...");
            info!("Stopping controller and releasing leader election lease...");
            result
        }

        // Monitor leadership - if lost, stop the controller
        result = monitor_leadership(leader_rx) => {
            match result {
                Ok(()) => {
                    warn!("Leadership lost! Stopping controller...");
                    anyhow::bail!("Leadership lost - stepping down")
                }
                Err(e) => {
                    error!("Leadership monitor error: {:?}", e);
                    anyhow::bail!("Leadership monitoring failed: {e}")
                }
            }
        }

        // Run the controller
        result = run_cluster_deployment_operator(context) => {
            result
        }
    };

    shutdown_result?;
    info!("Graceful shutdown completed successfully, leader election lease released");
    Ok(())
}

/// Error policy for the controller.
///
/// Returns an action to requeue the resource after a delay when reconciliation fails.
/// An `Action` to requeue the resource after `ERROR_REQUEUE_DURATION_SECS` seconds.
#[allow(clippy::needless_pass_by_value)] // Signature required by kube::runtime::Controller
fn error_policy<T, C>(resource: Arc<T>, err: &ReconcileError, _ctx: Arc<C>) -> Action
where
    T: std::fmt::Debug,
{
    error!(
        error = %err,
        resource = ?resource,
        "Reconciliation error - will retry in {}s",
        ERROR_REQUEUE_DURATION_SECS
    );
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use kube_lease_manager::LeaseManagerBuilder;
use object_storage_operator::{
    config::{ManagementCluster, OperatorArgs},
    constants::{
        DEFAULT_LEASE_DURATION_SECS, DEFAULT_LEASE_GRACE_SECS, ERROR_REQUEUE_DURATION_SECS,
        REQUEUE_WHEN_READY_SECS, TOKIO_WORKER_THREADS,
    },
    context::Context,
    crd::Bucket,
    errors::Error,
    http_server::{metrics_routes, probe_routes, serve, Readiness},
    metrics,
    reconcilers::ReconcileOutcome,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] Error);

fn main() -> Result<()> {
    // Required before any TLS connection (kube, reqwest)
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("object-storage-operator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

fn init_logging() {
    // RUST_LOG selects the level (default info), RUST_LOG_FORMAT=json|text the format
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
}

async fn async_main() -> Result<()> {
    let args = OperatorArgs::parse();
    init_logging();

    // Unknown providers are rejected here, before any controller runs
    let management_cluster = ManagementCluster::try_from(&args)?;

    info!(
        cluster = %management_cluster.name,
        provider = %management_cluster.provider,
        region = %management_cluster.region,
        "Starting object storage operator"
    );

    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized");

    let http_client = reqwest::Client::builder().build()?;
    let ctx = Arc::new(Context::new(client.clone(), management_cluster, http_client));
    let readiness = Readiness::default();

    tokio::select! {
        result = serve("metrics", args.metrics_bind_address, metrics_routes()) => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("metrics server exited unexpectedly without error")
        }
        result = serve("probes", args.health_probe_bind_address, probe_routes(readiness.clone())) => {
            error!("CRITICAL: probe server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("probe server exited unexpectedly without error")
        }
        result = run(&args, client, ctx, readiness.clone()) => {
            result?;
            info!("Controller stopped");
            Ok(())
        }
    }
}

/// Run the controller, behind the lease when leader election is enabled.
async fn run(args: &OperatorArgs, client: Client, ctx: Arc<Context>, readiness: Readiness) -> Result<()> {
    if !args.leader_elect {
        readiness.set_ready();
        run_bucket_controller(ctx).await;
        return Ok(());
    }

    let identity = std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "object-storage-operator".to_string());

    let manager = LeaseManagerBuilder::new(client, &args.lease_name)
        .with_namespace(&args.lease_namespace)
        .with_identity(&identity)
        .with_duration(DEFAULT_LEASE_DURATION_SECS)
        .with_grace(DEFAULT_LEASE_GRACE_SECS)
        .build()
        .await?;
    let (mut leader, _lease_task) = manager.watch().await;

    // Standby replicas are ready: they only wait for the lease
    readiness.set_ready();
    info!(identity = %identity, lease = %args.lease_name, "Waiting for leadership");
    while !*leader.borrow_and_update() {
        leader.changed().await?;
    }
    metrics::record_leader_elected(&identity);
    info!(identity = %identity, "Leadership acquired");

    tokio::select! {
        () = run_bucket_controller(ctx) => Ok(()),
        changed = leader.changed() => {
            metrics::record_leader_lost(&identity);
            warn!(identity = %identity, "Leadership lost, exiting");
            changed?;
            anyhow::bail!("leadership lost")
        }
    }
}

/// Run the `Bucket` controller until shutdown.
async fn run_bucket_controller(ctx: Arc<Context>) {
    info!("Starting Bucket controller");

    let api = Api::<Bucket>::all(ctx.client.clone());

    Controller::new(api, Config::default())
        .shutdown_on_signal()
        .run(reconcile_bucket, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;
}

/// Reconcile wrapper for `Bucket`
async fn reconcile_bucket(bucket: Arc<Bucket>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    let namespace = bucket.namespace().unwrap_or_default();
    let name = bucket.name_any();

    debug!(namespace = %namespace, name = %name, "Reconcile wrapper called for Bucket");

    match ctx.reconciler.reconcile(&namespace, &name).await {
        Ok(outcome) => {
            metrics::record_reconciliation_success(start.elapsed());
            match outcome {
                ReconcileOutcome::Ready => {
                    Ok(Action::requeue(Duration::from_secs(REQUEUE_WHEN_READY_SECS)))
                }
                ReconcileOutcome::Released | ReconcileOutcome::Gone => Ok(Action::await_change()),
            }
        }
        Err(e) => {
            metrics::record_reconciliation_error(e.reason(), start.elapsed());
            error!(namespace = %namespace, name = %name, error = %e, "Failed to reconcile Bucket");
            Err(e.into())
        }
    }
}

/// Error policy for the `Bucket` controller
fn error_policy(_bucket: Arc<Bucket>, err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    if err.0.is_transient() {
        Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
    } else {
        Action::await_change()
    }
}

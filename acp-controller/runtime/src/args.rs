use crate::{
    backend::{HttpConnect, Router},
    controller,
    core::Connection,
    k8s::{ORYAccessControlPolicy, ORYAccessControlPolicyRole},
    KubeStore, ReconcileMetrics, Reconciler,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(
    name = "acp-controller",
    about = "Syncs access control policies and roles to an authorization backend"
)]
pub struct Args {
    #[clap(long, default_value = "acp=info,warn", env = "ACP_CONTROLLER_LOG")]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// Base URL of the default backend, including the scheme.
    #[clap(long, env = "ACP_BACKEND_URL")]
    backend_url: String,

    #[clap(long, default_value = "4444", env = "ACP_BACKEND_PORT")]
    backend_port: u16,

    /// Path prefix under which the default backend serves its engines.
    #[clap(long, default_value = "/engines", env = "ACP_BACKEND_ENDPOINT")]
    backend_endpoint: String,

    /// Bounds every backend request, including connection establishment.
    #[clap(long, default_value = "10000")]
    backend_timeout_ms: u64,

    #[clap(long, default_value = "5000")]
    patch_timeout_ms: u64,

    /// Delay before retrying a failed reconciliation.
    #[clap(long, default_value = "10")]
    error_requeue_secs: u64,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            admin,
            backend_url,
            backend_port,
            backend_endpoint,
            backend_timeout_ms,
            patch_timeout_ms,
            error_requeue_secs,
        } = self;

        let mut prom = <Registry>::default();
        let metrics = ReconcileMetrics::register(prom.sub_registry_with_prefix("reconcile"));
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        // The log subscriber is installed by `build`.
        let connect = HttpConnect::new(Duration::from_millis(backend_timeout_ms))
            .context("failed to build backend http client")?;
        let defaults = Connection::new(backend_url, backend_port, backend_endpoint);
        let router = Arc::new(Router::new(defaults, connect)?);

        let store = KubeStore::new(runtime.client(), Duration::from_millis(patch_timeout_ms));
        let requeue = Duration::from_secs(error_requeue_secs);

        let policies = Arc::new(Reconciler::<ORYAccessControlPolicy, _, _>::new(
            store.clone(),
            router.clone(),
            metrics.clone(),
        ));
        tokio::spawn(
            controller::run(
                runtime.client(),
                policies,
                requeue,
                runtime.shutdown_handle(),
            )
            .instrument(info_span!("policies")),
        );

        let roles = Arc::new(Reconciler::<ORYAccessControlPolicyRole, _, _>::new(
            store, router, metrics,
        ));
        tokio::spawn(
            controller::run(runtime.client(), roles, requeue, runtime.shutdown_handle())
                .instrument(info_span!("roles")),
        );

        // Block the main thread on the shutdown signal. Once it fires, wait for
        // both controllers to stop before exiting.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}

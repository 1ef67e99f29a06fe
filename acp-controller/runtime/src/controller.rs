use crate::{
    backend::Connect,
    core::{Backend, ResourceId},
    k8s::{self, ResourceExt, StatusCode, Synced},
    reconcile::{self, Outcome, Reconciler},
    KubeStore,
};
use futures::prelude::*;
use kube::runtime::{controller::Action, watcher, Controller};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

struct Context<K, C: Connect> {
    reconciler: Arc<Reconciler<K, KubeStore, C>>,
    requeue: Duration,
}

/// Drives `reconciler` with every change to resources of kind `K` until the
/// process begins shutting down.
///
/// Resources are watched in all namespaces. Failed reconciliations and
/// rejected upserts are retried after `requeue`. Everything else waits for the
/// resource to change again.
pub async fn run<K, C>(
    client: k8s::Client,
    reconciler: Arc<Reconciler<K, KubeStore, C>>,
    requeue: Duration,
    drain: drain::Watch,
) where
    K: Synced,
    C: Connect,
    C::Client: Backend<K::Json>,
{
    let api = k8s::Api::<K>::all(client);
    let ctx = Arc::new(Context {
        reconciler,
        requeue,
    });

    let (close_tx, close_rx) = tokio::sync::oneshot::channel::<()>();
    let controller = Controller::new(api, watcher::Config::default())
        .graceful_shutdown_on(close_rx.map(|_| ()))
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => {
                    debug!(name = %obj.name, namespace = ?obj.namespace, "Reconciled")
                }
                Err(error) => warn!(%error, "Controller failed"),
            }
        });
    tokio::pin!(controller);

    info!(kind = %K::kind(&()), "Starting controller");
    tokio::select! {
        _ = (&mut controller) => {}
        handle = drain.signaled() => {
            let _ = close_tx.send(());
            handle.release_after(controller).await;
        }
    }
    info!(kind = %K::kind(&()), "Controller stopped");
}

async fn reconcile<K, C>(
    resource: Arc<K>,
    ctx: Arc<Context<K, C>>,
) -> Result<Action, reconcile::Error>
where
    K: Synced,
    C: Connect,
    C::Client: Backend<K::Json>,
{
    let id = ResourceId::new(resource.namespace().unwrap_or_default(), resource.name_any());
    let outcome = ctx.reconciler.reconcile(&id).await?;
    debug!(%id, ?outcome);
    Ok(action(outcome, ctx.requeue))
}

/// Only rejected upserts are retried on a timer. Every other outcome either
/// needs no further work or needs the resource itself to change.
fn action(outcome: Outcome, requeue: Duration) -> Action {
    match outcome {
        Outcome::Rejected(StatusCode::UpsertFailed) => Action::requeue(requeue),
        _ => Action::await_change(),
    }
}

fn error_policy<K, C>(
    resource: Arc<K>,
    error: &reconcile::Error,
    ctx: Arc<Context<K, C>>,
) -> Action
where
    K: Synced,
    C: Connect,
{
    debug!(
        name = %resource.name_any(),
        namespace = ?resource.namespace(),
        %error,
        "Retrying reconciliation",
    );
    Action::requeue(ctx.requeue)
}

use crate::{
    backend::{Connect, Router},
    core::{Backend, ResourceId},
    k8s::{self, ResourceExt, StatusCode, Synced},
    status, ReconcileMetrics, Store,
};
use std::{marker::PhantomData, sync::Arc};
use tracing::{debug, error, info, instrument, warn};


/// Syncs resources of kind `K` from a [`Store`] to the backend.
///
/// The reconciler holds no state of its own. Every invocation reads the
/// resource, decides which backend call to make from its current state, and
/// records the result on the resource, so an interrupted reconciliation is
/// completed by the next one.
pub struct Reconciler<K, S, C: Connect> {
    store: S,
    router: Arc<Router<C>>,
    metrics: ReconcileMetrics,
    _kind: PhantomData<fn() -> K>,
}

/// What a reconciliation did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The resource no longer exists.
    Absent,

    /// The backend already reflects the resource, or the resource is
    /// terminating and has already been released.
    Unchanged,

    /// The resource was written to the backend.
    Upserted,

    /// The resource was removed from the backend and its finalizer released.
    Deleted,

    /// The sync failed and the failure was recorded on the resource's status.
    Rejected(StatusCode),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0:#}")]
    Store(anyhow::Error),

    #[error("failed to delete {id} from the backend: {error:#}")]
    Delete { id: String, error: anyhow::Error },
}

// === impl Reconciler ===

impl<K, S, C> Reconciler<K, S, C>
where
    K: Synced,
    S: Store<K>,
    C: Connect,
    C::Client: Backend<K::Json>,
{
    pub fn new(store: S, router: Arc<Router<C>>, metrics: ReconcileMetrics) -> Self {
        Self {
            store,
            router,
            metrics,
            _kind: PhantomData,
        }
    }

    /// Reconciles the resource identified by `id`.
    ///
    /// Errors are returned only when retrying the same reconciliation may
    /// succeed: failed store writes and failed backend deletes. Failures the
    /// user has to act on are recorded on the resource's status instead.
    #[instrument(
        skip_all,
        fields(kind = %K::kind(&()), namespace = %id.namespace, name = %id.name)
    )]
    pub async fn reconcile(&self, id: &ResourceId) -> Result<Outcome, Error> {
        let res = self.sync(id).await;
        let outcome = match &res {
            Ok(Outcome::Absent) => "absent",
            Ok(Outcome::Unchanged) => "unchanged",
            Ok(Outcome::Upserted) => "upserted",
            Ok(Outcome::Deleted) => "deleted",
            Ok(Outcome::Rejected(_)) => "rejected",
            Err(error @ Error::Store(_)) => {
                error!(%error, "Failed to update resource");
                "error"
            }
            Err(error @ Error::Delete { .. }) => {
                warn!(%error, "Failed to delete from backend");
                "error"
            }
        };
        self.metrics.record(&K::kind(&()), outcome);
        self.metrics.set_backend_clients(self.router.cached());
        res
    }

    async fn sync(&self, id: &ResourceId) -> Result<Outcome, Error> {
        let mut resource = match self.store.get(id).await.map_err(Error::Store)? {
            Some(resource) => resource,
            None => {
                debug!("Resource not found");
                return Ok(Outcome::Absent);
            }
        };

        let client = match self.router.resolve(resource.connection()) {
            Ok(client) => client,
            Err(error) => {
                warn!(%error, "Invalid backend address");
                let outcome = status::Outcome::failed(StatusCode::InvalidBackendAddress, &error);
                self.report(&resource, outcome).await?;
                return Ok(Outcome::Rejected(StatusCode::InvalidBackendAddress));
            }
        };

        let flavor = resource.flavor();
        let backend_id = resource.backend_id();

        if k8s::is_terminating(&resource) {
            if !k8s::has_finalizer(&resource) {
                debug!("Terminating resource already released");
                return Ok(Outcome::Unchanged);
            }

            // The finalizer stays in place until the backend confirms the
            // delete, so a failure here is retried.
            Backend::<K::Json>::delete(&*client, flavor, &backend_id)
                .await
                .map_err(|error| Error::Delete {
                    id: backend_id.clone(),
                    error,
                })?;
            info!(%flavor, id = %backend_id, "Deleted from backend");

            let finalizers = resource
                .finalizers()
                .iter()
                .filter(|f| *f != k8s::FINALIZER)
                .cloned()
                .collect();
            self.store
                .set_finalizers(&resource, finalizers)
                .await
                .map_err(Error::Store)?;
            info!("Released finalizer");
            return Ok(Outcome::Deleted);
        }

        // The finalizer must be durable before the backend is modified, so
        // that the backend state is cleaned up even if the controller dies
        // right after the upsert.
        if !k8s::has_finalizer(&resource) {
            let mut finalizers = resource.finalizers().to_vec();
            finalizers.push(k8s::FINALIZER.to_string());
            resource = self
                .store
                .set_finalizers(&resource, finalizers)
                .await
                .map_err(Error::Store)?;
            info!("Added finalizer");
        }

        if !status::is_pending(&resource) {
            debug!("Generation already synced");
            return Ok(Outcome::Unchanged);
        }

        let generation = resource.meta().generation.unwrap_or_default();
        let json = resource.to_backend_json();
        match Backend::<K::Json>::upsert(&*client, flavor, &json).await {
            Ok(_) => {
                info!(%flavor, id = %backend_id, generation, "Upserted to backend");
                self.report(&resource, status::Outcome::Synced { generation })
                    .await?;
                Ok(Outcome::Upserted)
            }
            Err(error) => {
                warn!(%flavor, id = %backend_id, error = format_args!("{error:#}"), "Upsert failed");
                let outcome =
                    status::Outcome::failed(StatusCode::UpsertFailed, format_args!("{error:#}"));
                self.report(&resource, outcome).await?;
                Ok(Outcome::Rejected(StatusCode::UpsertFailed))
            }
        }
    }

    async fn report(&self, resource: &K, outcome: status::Outcome) -> Result<(), Error> {
        let Some(status) = status::next_status(resource.reconciliation_status(), outcome) else {
            debug!("Status unchanged");
            return Ok(());
        };
        self.store
            .write_status(resource, &status)
            .await
            .map_err(Error::Store)
    }
}

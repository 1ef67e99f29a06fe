use crate::k8s::{self, ReconciliationStatus, ResourceExt, ResourceId, Synced};
use anyhow::{Context, Result};
use tokio::time;

/// Reads resources and persists the controller's writes to them.
///
/// The controller only ever writes a resource's finalizers and its status.
#[async_trait::async_trait]
pub trait Store<K>: Send + Sync {
    async fn get(&self, id: &ResourceId) -> Result<Option<K>>;

    /// Replaces the resource's finalizers, returning the updated resource.
    async fn set_finalizers(&self, resource: &K, finalizers: Vec<String>) -> Result<K>;

    async fn write_status(&self, resource: &K, status: &ReconciliationStatus) -> Result<()>;
}

/// Stores resources in the Kubernetes API.
#[derive(Clone)]
pub struct KubeStore {
    client: k8s::Client,
    patch_timeout: time::Duration,
}

const FIELD_MANAGER: &str = "acp-controller";

impl KubeStore {
    pub fn new(client: k8s::Client, patch_timeout: time::Duration) -> Self {
        Self {
            client,
            patch_timeout,
        }
    }

    fn api<K: Synced>(&self, namespace: &str) -> k8s::Api<K> {
        k8s::Api::namespaced(self.client.clone(), namespace)
    }

    fn params() -> k8s::PatchParams {
        k8s::PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        }
    }
}

fn namespace<K: Synced>(resource: &K) -> Result<String> {
    resource
        .namespace()
        .with_context(|| format!("{} {} has no namespace", K::kind(&()), resource.name_any()))
}

#[async_trait::async_trait]
impl<K: Synced> Store<K> for KubeStore {
    async fn get(&self, id: &ResourceId) -> Result<Option<K>> {
        let api = self.api::<K>(&id.namespace);
        let resource = api
            .get_opt(&id.name)
            .await
            .with_context(|| format!("failed to get {} {id}", K::kind(&())))?;
        Ok(resource)
    }

    async fn set_finalizers(&self, resource: &K, finalizers: Vec<String>) -> Result<K> {
        let name = resource.name_any();
        let api = self.api::<K>(&namespace(resource)?);

        // The resource version makes the patch fail if the finalizers were
        // changed since the resource was read.
        let patch = serde_json::json!({
            "metadata": {
                "finalizers": finalizers,
                "resourceVersion": resource.resource_version(),
            }
        });
        let updated = time::timeout(
            self.patch_timeout,
            api.patch(&name, &Self::params(), &k8s::Patch::Merge(&patch)),
        )
        .await
        .with_context(|| format!("timed out patching finalizers of {name}"))?
        .with_context(|| format!("failed to patch finalizers of {name}"))?;
        Ok(updated)
    }

    async fn write_status(&self, resource: &K, status: &ReconciliationStatus) -> Result<()> {
        let name = resource.name_any();
        let api = self.api::<K>(&namespace(resource)?);
        let patch = crate::status::make_patch::<K>(status);
        time::timeout(
            self.patch_timeout,
            api.patch_status(&name, &Self::params(), &patch),
        )
        .await
        .with_context(|| format!("timed out patching status of {name}"))?
        .with_context(|| format!("failed to patch status of {name}"))?;
        Ok(())
    }
}

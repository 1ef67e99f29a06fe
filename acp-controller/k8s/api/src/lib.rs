#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod policy;
pub mod role;
pub mod status;

pub use self::{
    policy::{Condition, ORYAccessControlPolicy, ORYAccessControlPolicySpec},
    role::{ORYAccessControlPolicyRole, ORYAccessControlPolicyRoleSpec},
    status::{ReconciliationError, ReconciliationStatus, StatusCode},
};
pub use acp_controller_core::{Connection, Flavor, ResourceId};
pub use kube::{
    api::{Api, ObjectMeta, Patch, PatchParams, ResourceExt},
    Client, Resource,
};

/// Marks resources whose backend state has not yet been cleaned up.
pub const FINALIZER: &str = "finalizer.ory.keto.sh";

/// A custom resource that is mirrored into a backend collection.
pub trait Synced:
    Resource<DynamicType = (), Scope = kube::core::NamespaceResourceScope>
    + Clone
    + std::fmt::Debug
    + serde::de::DeserializeOwned
    + serde::Serialize
    + Send
    + Sync
    + 'static
{
    /// The backend's representation of this resource.
    type Json: acp_controller_core::Collection;

    fn flavor(&self) -> Flavor;

    /// The per-resource backend override. Empty when the resource uses the
    /// default backend.
    fn connection(&self) -> &Connection;

    fn reconciliation_status(&self) -> Option<&ReconciliationStatus>;

    fn to_backend_json(&self) -> Self::Json;

    /// The id under which the backend stores this resource: the explicit
    /// `spec.id` if set, otherwise the resource's name.
    fn backend_id(&self) -> String;
}

fn backend_id(id: Option<&str>, meta: &ObjectMeta) -> String {
    match id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => meta.name.clone().unwrap_or_default(),
    }
}

pub fn has_finalizer<T: Resource>(resource: &T) -> bool {
    resource.finalizers().iter().any(|f| f == FINALIZER)
}

pub fn is_terminating<T: Resource>(resource: &T) -> bool {
    resource.meta().deletion_timestamp.is_some()
}

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod connection;
pub mod flavor;
pub mod policy;
mod resource_id;
pub mod role;

pub use self::{
    connection::Connection,
    flavor::{Flavor, InvalidFlavor},
    policy::{ConditionJson, Effect, PolicyJson},
    resource_id::ResourceId,
    role::RoleJson,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

/// Namespace literal under which the backend exposes its access control
/// engines.
pub const ACP_SCHEME: &str = "ory";

/// A resource kind that the backend stores in its own collection.
pub trait Collection: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The collection path segment, e.g. `policies`.
    const NAME: &'static str;
}

/// Operations a backend instance exposes for a single resource kind.
///
/// Deleting a resource that the backend does not know about is not an error.
#[async_trait::async_trait]
pub trait Backend<T: Collection>: Send + Sync {
    /// Fetches a single resource, returning `None` if the backend doesn't know
    /// about it.
    async fn get(&self, flavor: Flavor, id: &str) -> anyhow::Result<Option<T>>;

    async fn list(&self, flavor: Flavor) -> anyhow::Result<Vec<T>>;

    /// Replaces the resource identified by the payload's id.
    async fn upsert(&self, flavor: Flavor, resource: &T) -> anyhow::Result<T>;

    async fn delete(&self, flavor: Flavor, id: &str) -> anyhow::Result<()>;
}

/// Builds the backend path for a collection, optionally addressing a single
/// resource.
pub fn collection_path<T: Collection>(flavor: Flavor, id: Option<&str>) -> String {
    match id.map(|id| id.trim_start_matches('/')) {
        Some(id) if !id.is_empty() => {
            format!("/acp/{ACP_SCHEME}/{flavor}/{}/{id}", T::NAME)
        }
        _ => format!("/acp/{ACP_SCHEME}/{flavor}/{}", T::NAME),
    }
}

/// Decodes `null` as the type's default value. The backend encodes empty
/// lists and maps as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_paths() {
        assert_eq!(
            collection_path::<PolicyJson>(Flavor::Exact, None),
            "/acp/ory/exact/policies"
        );
        assert_eq!(
            collection_path::<PolicyJson>(Flavor::Glob, Some("p1")),
            "/acp/ory/glob/policies/p1"
        );
        assert_eq!(
            collection_path::<RoleJson>(Flavor::Regex, Some("/admins")),
            "/acp/ory/regex/roles/admins"
        );
        assert_eq!(
            collection_path::<RoleJson>(Flavor::Exact, Some("")),
            "/acp/ory/exact/roles"
        );
    }
}

use crate::{ReconciliationStatus, Synced};
use acp_controller_core::{Connection, Flavor, RoleJson};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Describes a role whose members are synced to the backend.
#[derive(Clone, Debug, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "keto.ory.sh",
    version = "v1alpha1",
    kind = "ORYAccessControlPolicyRole",
    status = "ReconciliationStatus",
    shortname = "acprole",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ORYAccessControlPolicyRoleSpec {
    pub flavor: Flavor,

    /// The role id. Defaults to `metadata.name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(min = 1))]
    pub id: Option<String>,

    #[schemars(length(min = 1))]
    pub members: Vec<String>,

    #[serde(default, skip_serializing_if = "Connection::is_empty")]
    pub keto: Connection,
}

impl Synced for ORYAccessControlPolicyRole {
    type Json = RoleJson;

    fn flavor(&self) -> Flavor {
        self.spec.flavor
    }

    fn connection(&self) -> &Connection {
        &self.spec.keto
    }

    fn reconciliation_status(&self) -> Option<&ReconciliationStatus> {
        self.status.as_ref()
    }

    fn backend_id(&self) -> String {
        super::backend_id(self.spec.id.as_deref(), &self.metadata)
    }

    fn to_backend_json(&self) -> RoleJson {
        RoleJson {
            id: self.backend_id(),
            members: self.spec.members.clone(),
        }
    }
}

use crate::{ReconciliationStatus, Synced};
use acp_controller_core::{ConditionJson, Connection, Effect, Flavor, PolicyJson};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Describes an access control policy that is synced to the backend.
#[derive(Clone, Debug, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "keto.ory.sh",
    version = "v1alpha1",
    kind = "ORYAccessControlPolicy",
    status = "ReconciliationStatus",
    shortname = "acp",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ORYAccessControlPolicySpec {
    /// The matching engine the backend uses for this policy.
    pub flavor: Flavor,

    /// The policy id. Defaults to `metadata.name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(min = 1))]
    pub id: Option<String>,

    #[schemars(length(min = 1))]
    pub actions: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub conditions: BTreeMap<String, Condition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub effect: Effect,

    #[schemars(length(min = 1))]
    pub resources: Vec<String>,

    #[schemars(length(min = 1))]
    pub subjects: Vec<String>,

    /// Overrides the controller's default backend for this policy.
    #[serde(default, skip_serializing_if = "Connection::is_empty")]
    pub keto: Connection,
}

/// A named condition evaluated by the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct Condition {
    /// One of `CIDRCondition`, `StringEqualCondition`, `StringMatchCondition`,
    /// `EqualsSubjectCondition` or `StringPairsEqualCondition`.
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl Synced for ORYAccessControlPolicy {
    type Json = PolicyJson;

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

    fn to_backend_json(&self) -> PolicyJson {
        let spec = &self.spec;
        PolicyJson {
            id: self.backend_id(),
            actions: spec.actions.clone(),
            conditions: spec
                .conditions
                .iter()
                .map(|(name, c)| {
                    let condition = ConditionJson {
                        kind: c.kind.clone(),
                        options: c.options.clone(),
                    };
                    (name.clone(), condition)
                })
                .collect(),
            description: spec.description.clone().unwrap_or_default(),
            effect: spec.effect,
            resources: spec.resources.clone(),
            subjects: spec.subjects.clone(),
        }
    }
}

use crate::Collection;
use serde::{Deserialize, Serialize};

/// A role as the backend stores it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoleJson {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(
        default,
        deserialize_with = "crate::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub members: Vec<String>,
}

impl Collection for RoleJson {
    const NAME: &'static str = "roles";
}

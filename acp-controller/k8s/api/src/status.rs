use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The observed state shared by policies and roles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationStatus {
    /// The most recent generation that was successfully synced to the backend.
    #[serde(default)]
    pub observed_generation: i64,

    /// Set if and only if the most recent sync attempt failed. Always
    /// serialized, so that a merge patch clears a previous error.
    #[serde(default)]
    pub last_error: Option<ReconciliationError>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationError {
    pub status_code: StatusCode,
    pub description: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
pub enum StatusCode {
    #[serde(rename = "UPSERT_FAILED")]
    UpsertFailed,
    #[serde(rename = "INVALID_BACKEND_ADDRESS")]
    InvalidBackendAddress,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpsertFailed => "UPSERT_FAILED",
            Self::InvalidBackendAddress => "INVALID_BACKEND_ADDRESS",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

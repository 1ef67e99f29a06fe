//! Computes the status written back onto synced resources.
//!
//! The reporter never inspects the backend. It only maps the outcome of a
//! sync attempt onto a resource's current status, and yields `None` whenever
//! the resulting status is identical to the current one so that the caller can
//! skip the write.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

use acp_controller_k8s_api::{
    self as k8s, ReconciliationError, ReconciliationStatus, StatusCode, Synced,
};

#[cfg(test)]
mod tests;

/// The result of a sync attempt, as far as the status is concerned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The backend accepted the resource at the given generation.
    Synced { generation: i64 },

    /// The sync attempt failed. The observed generation is left untouched so
    /// that the next attempt retries the same generation.
    Failed {
        code: StatusCode,
        description: String,
    },
}

impl Outcome {
    pub fn failed(code: StatusCode, error: impl std::fmt::Display) -> Self {
        Self::Failed {
            code,
            description: error.to_string(),
        }
    }
}

/// Returns the status a resource should carry after `outcome`, or `None` if
/// its current status already reflects it.
pub fn next_status(
    current: Option<&ReconciliationStatus>,
    outcome: Outcome,
) -> Option<ReconciliationStatus> {
    let observed_generation = current.map(|s| s.observed_generation).unwrap_or_default();
    let next = match outcome {
        Outcome::Synced { generation } => ReconciliationStatus {
            observed_generation: generation,
            last_error: None,
        },
        Outcome::Failed { code, description } => ReconciliationStatus {
            observed_generation,
            last_error: Some(ReconciliationError {
                status_code: code,
                description,
            }),
        },
    };

    if current == Some(&next) {
        return None;
    }
    Some(next)
}

/// Indicates whether the resource's current generation still has to be synced.
pub fn is_pending<T: Synced>(resource: &T) -> bool {
    let generation = resource.meta().generation.unwrap_or_default();
    let observed = resource
        .reconciliation_status()
        .map(|s| s.observed_generation)
        .unwrap_or_default();
    generation != observed
}

/// Builds the merge patch that replaces a resource's status.
pub fn make_patch<T: Synced>(status: &ReconciliationStatus) -> k8s::Patch<serde_json::Value> {
    let value = serde_json::json!({
        "apiVersion": T::api_version(&()),
        "kind": T::kind(&()),
        "status": status,
    });
    k8s::Patch::Merge(value)
}

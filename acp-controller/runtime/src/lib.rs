//! Syncs `ORYAccessControlPolicy` and `ORYAccessControlPolicyRole` resources to
//! the authorization backend.
//!
//! Each kind is driven by its own controller, but both share one
//! [`Reconciler`] implementation, one [`Store`] and one backend [`Router`].
//!
//! ```text
//! [ Controller<K> ] -> [ Reconciler<K> ] -> [ Router ] -> [ backend Client ]
//!                             |
//!                             +-> [ Store ] (resource, finalizer, status)
//! ```

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use acp_controller_backend as backend;
pub use acp_controller_core as core;
pub use acp_controller_k8s_api as k8s;
pub use acp_controller_k8s_status as status;

mod args;
pub mod controller;
mod metrics;
pub mod reconcile;
mod store;

pub use self::{
    args::Args,
    metrics::ReconcileMetrics,
    reconcile::{Outcome, Reconciler},
    store::{KubeStore, Store},
};
pub use acp_controller_backend::Router;

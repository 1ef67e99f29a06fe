//! HTTP access to the authorization backend.
//!
//! A [`Client`] is bound to a single backend instance. The [`Router`] maps a
//! resource's connection override onto a client, creating one per distinct
//! backend address and sharing it between all resources that point at it.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod client;
mod router;


pub use self::{
    client::{Client, Error},
    router::{parse_address, Connect, HttpConnect, InvalidAddress, Router},
};
pub use reqwest::Url;

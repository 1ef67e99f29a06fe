use crate::Client;
use acp_controller_core::Connection;
use ahash::AHashMap as HashMap;
use parking_lot::RwLock;
use reqwest::Url;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

/// Builds a backend client for a base address.
pub trait Connect: Send + Sync + 'static {
    type Client: Send + Sync + 'static;

    fn connect(&self, base: Url) -> Self::Client;
}

/// Connects HTTP clients that share one connection pool and request timeout.
#[derive(Clone, Debug)]
pub struct HttpConnect(reqwest::Client);

/// Resolves a resource's connection override to a backend client.
///
/// The default client is built up front. Clients for other addresses are
/// created on first use and cached for the lifetime of the router.
pub struct Router<C: Connect = HttpConnect> {
    defaults: Connection,
    default_client: Arc<C::Client>,
    connect: C,
    clients: RwLock<HashMap<Connection, Arc<C::Client>>>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid backend address {address:?}: {reason}")]
pub struct InvalidAddress {
    pub address: String,
    pub reason: String,
}

// === impl HttpConnect ===

impl HttpConnect {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self(http))
    }
}

impl Connect for HttpConnect {
    type Client = Client;

    fn connect(&self, base: Url) -> Client {
        Client::new(base, self.0.clone())
    }
}

// === impl Router ===

impl<C: Connect> Router<C> {
    /// Fails if the defaults don't form a valid backend address.
    pub fn new(defaults: Connection, connect: C) -> Result<Self, InvalidAddress> {
        let base = parse_address(&defaults)?;
        info!(%base, "Using default backend");
        let default_client = Arc::new(connect.connect(base));
        Ok(Self {
            defaults,
            default_client,
            connect,
            clients: Default::default(),
        })
    }

    pub fn default_client(&self) -> Arc<C::Client> {
        self.default_client.clone()
    }

    /// The number of cached non-default clients.
    pub fn cached(&self) -> usize {
        self.clients.read().len()
    }

    pub fn resolve(&self, conn: &Connection) -> Result<Arc<C::Client>, InvalidAddress> {
        let conn = conn.or(&self.defaults);
        if conn == self.defaults {
            return Ok(self.default_client.clone());
        }

        if let Some(client) = self.clients.read().get(&conn) {
            return Ok(client.clone());
        }

        // Build the client outside of the lock. If another resolution raced us
        // to the same address, the client it cached is kept.
        let base = parse_address(&conn)?;
        debug!(%base, "Creating backend client");
        let client = Arc::new(self.connect.connect(base));
        Ok(self.clients.write().entry(conn).or_insert(client).clone())
    }
}

/// Parses a fully-resolved connection into the base address of a backend.
pub fn parse_address(conn: &Connection) -> Result<Url, InvalidAddress> {
    let address = conn.address();
    let invalid = |reason: String| InvalidAddress {
        address: address.clone(),
        reason,
    };

    let url = Url::parse(&address).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    if url.port_or_known_default() != Some(conn.port) {
        return Err(invalid(format!(
            "url {:?} does not combine with port {}",
            conn.url, conn.port
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("unexpected query or fragment".to_string()));
    }
    Ok(url)
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Locates a backend instance.
///
/// On a resource this is an override: any empty field falls back to the
/// process-wide default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Base URL of the backend, including the scheme, e.g. `http://keto`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[schemars(regex(pattern = r"^$|^https?://.*"), length(max = 64))]
    pub url: String,

    /// Port the backend listens on. Zero means unset.
    #[serde(default, skip_serializing_if = "is_zero")]
    #[schemars(range(max = 65535))]
    pub port: u16,

    /// Path prefix under which the backend serves its engines, e.g. `/engines`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[schemars(regex(pattern = r"^$|^/.*"))]
    pub endpoint: String,
}

fn is_zero(port: &u16) -> bool {
    *port == 0
}

impl Connection {
    pub fn new(url: impl Into<String>, port: u16, endpoint: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            port,
            endpoint: endpoint.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_empty() && self.port == 0 && self.endpoint.is_empty()
    }

    /// Fills every unset field from `defaults`.
    pub fn or(&self, defaults: &Self) -> Self {
        Self {
            url: if self.url.is_empty() {
                defaults.url.clone()
            } else {
                self.url.clone()
            },
            port: if self.port == 0 {
                defaults.port
            } else {
                self.port
            },
            endpoint: if self.endpoint.is_empty() {
                defaults.endpoint.clone()
            } else {
                self.endpoint.clone()
            },
        }
    }

    /// The base address of the backend, `<url>:<port><endpoint>`.
    pub fn address(&self) -> String {
        format!("{}:{}{}", self.url, self.port, self.endpoint)
    }
}

use acp_controller_core::{self as core, Backend, Collection, Flavor};
use reqwest::{header, Method, StatusCode, Url};
use tracing::{debug, trace};

/// A client for one backend instance.
#[derive(Clone, Debug)]
pub struct Client {
    base: Url,
    http: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{method} {url} http request failed")]
    Request {
        method: Method,
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} http request returned unexpected status code {status}")]
    UnexpectedStatus {
        method: Method,
        url: Url,
        status: StatusCode,
    },

    #[error("{method} {url} returned a malformed response")]
    Decode {
        method: Method,
        url: Url,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode request body")]
    Encode(#[source] serde_json::Error),
}

struct Response {
    method: Method,
    url: Url,
    status: StatusCode,
    body: bytes::Bytes,
}

// === impl Client ===

impl Client {
    /// Creates a client for the backend at `base`. The `http` client carries
    /// the request timeout and connection pool and may be shared.
    pub fn new(base: Url, http: reqwest::Client) -> Self {
        Self { base, http }
    }

    pub async fn get<T: Collection>(&self, flavor: Flavor, id: &str) -> Result<Option<T>, Error> {
        let rsp = self
            .send(Method::GET, core::collection_path::<T>(flavor, Some(id)), None)
            .await?;
        match rsp.status {
            StatusCode::OK => rsp.decode().map(Some),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(rsp.unexpected()),
        }
    }

    pub async fn list<T: Collection>(&self, flavor: Flavor) -> Result<Vec<T>, Error> {
        let rsp = self
            .send(Method::GET, core::collection_path::<T>(flavor, None), None)
            .await?;
        match rsp.status {
            // The backend encodes an empty collection as `null`.
            StatusCode::OK => rsp
                .decode::<Option<Vec<T>>>()
                .map(Option::unwrap_or_default),
            _ => Err(rsp.unexpected()),
        }
    }

    pub async fn upsert<T: Collection>(&self, flavor: Flavor, resource: &T) -> Result<T, Error> {
        let body = serde_json::to_vec(resource).map_err(Error::Encode)?;
        let rsp = self
            .send(Method::PUT, core::collection_path::<T>(flavor, None), Some(body))
            .await?;
        match rsp.status {
            StatusCode::OK => rsp.decode(),
            _ => Err(rsp.unexpected()),
        }
    }

    pub async fn delete<T: Collection>(&self, flavor: Flavor, id: &str) -> Result<(), Error> {
        let rsp = self
            .send(Method::DELETE, core::collection_path::<T>(flavor, Some(id)), None)
            .await?;
        match rsp.status {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => {
                debug!(%flavor, id, collection = T::NAME, "Resource already absent from backend");
                Ok(())
            }
            _ => Err(rsp.unexpected()),
        }
    }

    fn url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let prefix = self.base.path().trim_end_matches('/');
        url.set_path(&format!("{prefix}{path}"));
        url
    }

    async fn send(
        &self,
        method: Method,
        path: String,
        body: Option<Vec<u8>>,
    ) -> Result<Response, Error> {
        let url = self.url(&path);
        let mut req = self
            .http
            .request(method.clone(), url.clone())
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            req = req
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let request_failed = |source| Error::Request {
            method: method.clone(),
            url: url.clone(),
            source,
        };
        let rsp = req.send().await.map_err(request_failed)?;
        let status = rsp.status();
        let body = rsp.bytes().await.map_err(request_failed)?;
        trace!(%method, %url, %status, "Backend responded");
        Ok(Response {
            method,
            url,
            status,
            body,
        })
    }
}

#[async_trait::async_trait]
impl<T: Collection> Backend<T> for Client {
    async fn get(&self, flavor: Flavor, id: &str) -> anyhow::Result<Option<T>> {
        Ok(Client::get::<T>(self, flavor, id).await?)
    }

    async fn list(&self, flavor: Flavor) -> anyhow::Result<Vec<T>> {
        Ok(Client::list::<T>(self, flavor).await?)
    }

    async fn upsert(&self, flavor: Flavor, resource: &T) -> anyhow::Result<T> {
        Ok(Client::upsert::<T>(self, flavor, resource).await?)
    }

    async fn delete(&self, flavor: Flavor, id: &str) -> anyhow::Result<()> {
        Ok(Client::delete::<T>(self, flavor, id).await?)
    }
}

// === impl Response ===

impl Response {
    fn decode<T: serde::de::DeserializeOwned>(self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|source| Error::Decode {
            method: self.method,
            url: self.url,
            source,
        })
    }

    fn unexpected(self) -> Error {
        Error::UnexpectedStatus {
            method: self.method,
            url: self.url,
            status: self.status,
        }
    }
}

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// The JSON document an NFT's `uri` points at. Only the fields used for
/// display are kept; anything else in the document is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OffChainMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
}

impl OffChainMetadata {
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// The image URL, treating a blank value the same as a missing one.
    pub fn image(&self) -> Option<&str> {
        self.image
            .as_deref()
            .map(str::trim)
            .filter(|image| !image.is_empty())
    }

    pub fn image_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.image().unwrap_or(fallback)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("record has no metadata uri")]
    MissingUri,

    #[error("request to {uri} failed: {message}")]
    Request { uri: String, message: String },

    #[error("{uri} returned HTTP {status}")]
    Status { uri: String, status: u16 },

    #[error("{uri} returned malformed metadata: {message}")]
    Decode { uri: String, message: String },

    #[error("metadata task for {uri} was aborted: {message}")]
    Aborted { uri: String, message: String },
}

/// Produces the off-chain document for a metadata uri.
///
/// The returned future owns everything it needs so it can be spawned and
/// outlive the caller.
pub trait MetadataFetcher: Send + Sync {
    fn fetch(&self, uri: &str) -> BoxFuture<'static, Result<OffChainMetadata, MetadataError>>;
}

#[derive(Clone, Debug)]
pub struct HttpMetadataFetcher {
    client: reqwest::Client,
}

impl HttpMetadataFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl MetadataFetcher for HttpMetadataFetcher {
    fn fetch(&self, uri: &str) -> BoxFuture<'static, Result<OffChainMetadata, MetadataError>> {
        let client = self.client.clone();
        let uri = uri.trim().to_string();
        async move {
            if uri.is_empty() {
                return Err(MetadataError::MissingUri);
            }
            debug!(%uri, "fetching off-chain metadata");
            let response = client
                .get(&uri)
                .send()
                .await
                .map_err(|e| MetadataError::Request {
                    uri: uri.clone(),
                    message: e.to_string(),
                })?;
            let status = response.status();
            if !status.is_success() {
                return Err(MetadataError::Status {
                    uri,
                    status: status.as_u16(),
                });
            }
            let body = response
                .bytes()
                .await
                .map_err(|e| MetadataError::Request {
                    uri: uri.clone(),
                    message: e.to_string(),
                })?;
            OffChainMetadata::from_json(&body).map_err(|e| MetadataError::Decode {
                uri,
                message: e.to_string(),
            })
        }
        .boxed()
    }
}

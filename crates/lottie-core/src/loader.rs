//! Producing documents from uploads and URLs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use lottie_data::Document;
use tracing::{debug, info};

use crate::LoadError;

/// Parses an uploaded payload.
pub fn parse_document(bytes: &[u8]) -> Result<Document, LoadError> {
    Ok(Document::from_slice(bytes)?)
}

/// Retrieves raw document bytes for a URL.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}

/// Plain HTTP GET; anything but 200 is a failure. No retries.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let transport = |err: reqwest::Error| LoadError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }
}

/// Loads documents by URL, remembering each successful result for the
/// lifetime of the loader. Failures are not remembered.
pub struct CachedLoader<F> {
    fetcher: F,
    cache: Mutex<HashMap<String, Arc<Document>>>,
}

impl<F: DocumentFetcher> CachedLoader<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a fresh copy of the document at `url`; edits to it never
    /// reach the cache.
    pub async fn load_url(&self, url: &str) -> Result<Document, LoadError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(LoadError::EmptyUrl);
        }

        if let Some(doc) = self.cached(url) {
            debug!(url, "document served from cache");
            return Ok(Document::clone(&doc));
        }

        let bytes = self.fetcher.fetch(url).await?;
        let doc = Arc::new(parse_document(&bytes)?);
        info!(url, bytes = bytes.len(), layers = doc.layer_count(), "document fetched");

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), doc.clone());
        Ok(Document::clone(&doc))
    }

    pub fn cached_count(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn cached(&self, url: &str) -> Option<Arc<Document>> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }
}

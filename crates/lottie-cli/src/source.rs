//! Resolves a `SOURCE` argument to a document.

use std::path::Path;

use anyhow::{Context, Result};
use lottie_core::loader::parse_document;
use lottie_core::{CachedLoader, HttpFetcher};
use lottie_data::Document;
use tracing::debug;

pub fn is_url(source: &str) -> bool {
    let lower = source.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Loads `source` from the network when it is an http(s) URL, from disk
/// otherwise.
pub async fn load(source: &str) -> Result<Document> {
    if is_url(source) {
        let loader = CachedLoader::new(HttpFetcher::new());
        return loader
            .load_url(source)
            .await
            .with_context(|| format!("Failed to load {}", source));
    }

    let path = Path::new(source);
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "read animation");
    parse_document(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
}

// Document loading: inline data URLs, remote URLs, local files
//
// PDFs that do not already live on disk are staged into the configured
// directory so poppler can open them. Staged files are removed on drop.

use crate::config::RenderConfig;
use crate::raster::decode_data_url;
use ocrdeck_core::port::{DocumentRef, RenderError};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

pub struct DocumentLoader {
    client: reqwest::Client,
    staging_dir: PathBuf,
    staged: Mutex<HashMap<String, PathBuf>>,
}

impl DocumentLoader {
    pub fn new(config: &RenderConfig) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| RenderError::Fetch(e.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: &RenderConfig) -> Self {
        Self {
            client,
            staging_dir: config.staging_dir.clone(),
            staged: Mutex::new(HashMap::new()),
        }
    }

    /// Raw document bytes
    pub async fn load(&self, document: &DocumentRef) -> Result<Vec<u8>, RenderError> {
        match document {
            DocumentRef::InlineImage { data_url } => decode_data_url(data_url),
            DocumentRef::Remote { url } => self.fetch(url).await,
            DocumentRef::Local { path } => tokio::fs::read(path)
                .await
                .map_err(|e| RenderError::Fetch(format!("{}: {}", path.display(), e))),
        }
    }

    /// Path of the document on the local disk, staging it first if needed
    pub async fn local_path(&self, document: &DocumentRef) -> Result<PathBuf, RenderError> {
        let key = match document {
            DocumentRef::Local { path } => return Ok(path.clone()),
            DocumentRef::Remote { url } => url.clone(),
            DocumentRef::InlineImage { data_url } => data_url.clone(),
        };

        if let Some(path) = self.staged_path(&key) {
            return Ok(path);
        }

        let bytes = self.load(document).await?;
        tokio::fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(|e| RenderError::Fetch(e.to_string()))?;
        let path = self
            .staging_dir
            .join(format!("{}.pdf", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| RenderError::Fetch(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Document staged");
        self.staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, path.clone());
        Ok(path)
    }

    pub fn staged_count(&self) -> usize {
        self.staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn staged_path(&self, key: &str) -> Option<PathBuf> {
        self.staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .filter(|path| path.exists())
            .cloned()
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RenderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RenderError::Fetch(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Fetch(format!("{} returned {}", url, status)));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RenderError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl Drop for DocumentLoader {
    fn drop(&mut self) {
        let staged = self.staged.get_mut().unwrap_or_else(PoisonError::into_inner);
        for path in staged.values() {
            if let Err(e) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "Failed to remove staged document");
            }
        }
    }
}

//! Image repository adapters.
//!
//! The engine reads images through the `ImageRepository` seam; these
//! adapters cover the in-memory case (tests), a gallery export document on
//! disk, and the same document fetched from a URL (the app's re-import
//! path).

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use caselib_core::{Error, GalleryExport, GalleryImage, ImagePool, ImageRepository, Result};

/// Repository over a fixed in-memory image list.
#[derive(Default)]
pub struct MemoryImageRepository {
    images: Vec<GalleryImage>,
}

impl MemoryImageRepository {
    pub fn new(images: Vec<GalleryImage>) -> Self {
        Self { images }
    }
}

#[async_trait]
impl ImageRepository for MemoryImageRepository {
    async fn list_images(&self, pool: ImagePool) -> Result<Vec<GalleryImage>> {
        Ok(self
            .images
            .iter()
            .filter(|img| img.pool == pool)
            .cloned()
            .collect())
    }
}

/// Repository reading the app's combined gallery export document from disk.
pub struct GalleryFileRepository {
    path: PathBuf,
}

impl GalleryFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<GalleryExport> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            Error::Store(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        let export: GalleryExport = serde_json::from_slice(&bytes).map_err(|e| {
            Error::InvalidInput(format!(
                "malformed gallery export {}: {}",
                self.path.display(),
                e
            ))
        })?;
        debug!(
            path = %self.path.display(),
            official = export.official.len(),
            community = export.community.len(),
            "Gallery export loaded"
        );
        Ok(export)
    }
}

#[async_trait]
impl ImageRepository for GalleryFileRepository {
    async fn list_images(&self, pool: ImagePool) -> Result<Vec<GalleryImage>> {
        Ok(self.load().await?.pool(pool).to_vec())
    }

    async fn candidate_images(&self) -> Result<Vec<GalleryImage>> {
        // One read instead of one per pool.
        Ok(self.load().await?.into_candidate_set())
    }
}

/// Repository fetching the gallery export document from a URL.
pub struct GalleryUrlRepository {
    client: reqwest::Client,
    url: String,
}

impl GalleryUrlRepository {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            url: url.into(),
        }
    }

    async fn fetch(&self) -> Result<GalleryExport> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Request(format!("gallery fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Request(format!(
                "gallery fetch returned {} for {}",
                response.status(),
                self.url
            )));
        }

        let export: GalleryExport = response
            .json()
            .await
            .map_err(|e| Error::InvalidInput(format!("malformed gallery export: {}", e)))?;
        debug!(
            url = %self.url,
            official = export.official.len(),
            community = export.community.len(),
            "Gallery export fetched"
        );
        Ok(export)
    }
}

#[async_trait]
impl ImageRepository for GalleryUrlRepository {
    async fn list_images(&self, pool: ImagePool) -> Result<Vec<GalleryImage>> {
        Ok(self.fetch().await?.pool(pool).to_vec())
    }

    async fn candidate_images(&self) -> Result<Vec<GalleryImage>> {
        Ok(self.fetch().await?.into_candidate_set())
    }
}

//! Gallery export/import document shape.
//!
//! The surrounding application exports its combined gallery state as one
//! JSON document with top-level `official` and `community` arrays, and can
//! re-import an equivalent document fetched from a URL. The engine shares
//! the image shape and can consume this document as an image source.

use serde::{Deserialize, Serialize};

use crate::models::{GalleryImage, ImagePool};

/// The combined gallery export document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GalleryExport {
    #[serde(default)]
    pub official: Vec<GalleryImage>,
    #[serde(default)]
    pub community: Vec<GalleryImage>,
}

impl GalleryExport {
    /// Split a flat image list into an export document by pool ownership.
    pub fn from_images(images: Vec<GalleryImage>) -> Self {
        let mut export = GalleryExport::default();
        for image in images {
            match image.pool {
                ImagePool::Official => export.official.push(image),
                ImagePool::Community => export.community.push(image),
            }
        }
        export
    }

    /// Images of one pool.
    pub fn pool(&self, pool: ImagePool) -> &[GalleryImage] {
        match pool {
            ImagePool::Official => &self.official,
            ImagePool::Community => &self.community,
        }
    }

    /// The union of both pools, official first. This is the candidate set
    /// handed to enrichment.
    pub fn into_candidate_set(self) -> Vec<GalleryImage> {
        let mut images = self.official;
        images.extend(self.community);
        images
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str, pool: ImagePool) -> GalleryImage {
        GalleryImage {
            id: id.to_string(),
            src: format!("https://img.example/{}", id),
            gcs_path: String::new(),
            title: id.to_string(),
            description: String::new(),
            uploader: "admin".to_string(),
            timestamp: 0,
            pool,
            tags: None,
            entity: None,
            difficulty: None,
        }
    }

    #[test]
    fn test_from_images_splits_by_pool() {
        let export = GalleryExport::from_images(vec![
            image("a", ImagePool::Community),
            image("b", ImagePool::Official),
            image("c", ImagePool::Community),
        ]);
        assert_eq!(export.official.len(), 1);
        assert_eq!(export.community.len(), 2);
    }

    #[test]
    fn test_candidate_set_orders_official_first() {
        let export = GalleryExport::from_images(vec![
            image("a", ImagePool::Community),
            image("b", ImagePool::Official),
        ]);
        let ids: Vec<_> = export
            .into_candidate_set()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_missing_arrays_default_empty() {
        let export: GalleryExport = serde_json::from_str("{}").unwrap();
        assert!(export.official.is_empty());
        assert!(export.community.is_empty());
    }
}

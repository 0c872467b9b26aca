//! Trait seams between the engine and its external collaborators.
//!
//! The pipeline core depends only on these traits; concrete backends live
//! in `caselib-inference` (classifier) and `caselib-engine` (store and
//! image repository adapters).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{
    CaseStudiesStore, CaseStudy, CasesStore, GalleryImage, ImagePool, Mcq,
};

// =============================================================================
// CLASSIFIER
// =============================================================================

/// Raw classifier output, before taxonomy validation.
///
/// `entity` is `None` when the classifier could not determine one;
/// `difficulty` is free text until enrichment normalizes it against the
/// closed difficulty set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierResponse {
    pub entity: Option<String>,
    pub difficulty: String,
}

/// Classifies an image from its textual metadata.
///
/// Wraps a fallible, latent external call. Implementations may retry
/// internally; the engine only ever sees success or one terminal failure
/// per image, and maps failures to the "unknown" sentinel.
#[async_trait]
pub trait MetadataClassifier: Send + Sync {
    /// Best-guess (entity, difficulty) for an image, given its title and
    /// description and the valid vocabulary.
    async fn classify(
        &self,
        title: &str,
        description: &str,
        valid_entities: &[String],
        valid_difficulties: &[String],
    ) -> Result<ClassifierResponse>;

    /// The model name backing this classifier.
    fn model_name(&self) -> &str;
}

/// Generates board-style multiple-choice questions for a case study.
#[async_trait]
pub trait McqGenerator: Send + Sync {
    /// Produce MCQs from the study's narrative. Failures are degraded to an
    /// empty question list by the caller, never batch-fatal.
    async fn generate_mcqs(&self, study: &CaseStudy) -> Result<Vec<Mcq>>;
}

// =============================================================================
// IMAGE REPOSITORY
// =============================================================================

/// Read access to the gallery image pools. The engine never writes images
/// back; classification tags live only on its in-memory copies.
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// All images in one pool.
    async fn list_images(&self, pool: ImagePool) -> Result<Vec<GalleryImage>>;

    /// The candidate set for classification: official images followed by
    /// community images.
    async fn candidate_images(&self) -> Result<Vec<GalleryImage>> {
        let mut images = self.list_images(ImagePool::Official).await?;
        images.extend(self.list_images(ImagePool::Community).await?);
        Ok(images)
    }
}

// =============================================================================
// PERSISTENT STORE
// =============================================================================

/// Durable storage for the cases and case-studies snapshots.
///
/// Load/save failures are fatal to the whole batch. Implementations stamp
/// the schema version and generation timestamp on every save.
#[async_trait]
pub trait CaseLibraryStore: Send + Sync {
    async fn load_cases(&self) -> Result<CasesStore>;

    async fn save_cases(&self, store: &CasesStore) -> Result<()>;

    async fn load_case_studies(&self) -> Result<CaseStudiesStore>;

    async fn save_case_studies(&self, store: &CaseStudiesStore) -> Result<()>;
}

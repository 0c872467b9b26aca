//! Enrichment stage: attach a classification to every image that lacks one.
//!
//! Already-classified images pass through untouched, in place: the
//! classification tag is written at most once per image, which is the
//! first idempotence source of the pipeline. Classifier failures degrade
//! to the "unknown" sentinel and never abort the batch.

use futures::stream::{self, StreamExt};
use tracing::{debug, trace, warn};

use caselib_core::{
    Classification, ClassifierResponse, Difficulty, GalleryImage, MetadataClassifier, Taxonomy,
};

/// Classify every unclassified image in `images`, preserving input order.
///
/// Calls for distinct images are independent and dispatched with a bounded
/// fan-out of `concurrency`; the stage completes only once every call has
/// settled. Pure: no store access, no writes beyond the returned collection.
pub async fn enrich_images(
    images: Vec<GalleryImage>,
    taxonomy: &Taxonomy,
    classifier: &dyn MetadataClassifier,
    concurrency: usize,
) -> Vec<GalleryImage> {
    let valid_entities = taxonomy.entity_names();
    let valid_difficulties = taxonomy.difficulty_names();
    let total = images.len();

    let enriched: Vec<GalleryImage> = stream::iter(images)
        .map(|image| {
            let valid_entities = &valid_entities;
            let valid_difficulties = &valid_difficulties;
            async move {
                enrich_one(
                    image,
                    taxonomy,
                    classifier,
                    valid_entities,
                    valid_difficulties,
                )
                .await
            }
        })
        // `buffered` (not `buffer_unordered`) keeps results in input order.
        .buffered(concurrency.max(1))
        .collect()
        .await;

    debug!(
        subsystem = "engine",
        component = "enrichment",
        image_count = total,
        "Enrichment complete"
    );
    enriched
}

async fn enrich_one(
    mut image: GalleryImage,
    taxonomy: &Taxonomy,
    classifier: &dyn MetadataClassifier,
    valid_entities: &[String],
    valid_difficulties: &[String],
) -> GalleryImage {
    if image.classification().is_some() {
        trace!(image_id = %image.id, "Image already classified, passing through");
        return image;
    }

    let classification = match classifier
        .classify(
            &image.title,
            &image.description,
            valid_entities,
            valid_difficulties,
        )
        .await
    {
        Ok(response) => normalize(response, taxonomy),
        Err(e) => {
            warn!(
                image_id = %image.id,
                error = %e,
                "Classification failed, falling back to unknown"
            );
            Classification::unknown()
        }
    };

    trace!(
        image_id = %image.id,
        entity = %classification.entity,
        difficulty = %classification.difficulty,
        "Image classified"
    );
    image.set_classification(classification);
    image
}

/// Validate a raw classifier verdict against the taxonomy.
///
/// A missing entity, or one the taxonomy does not know, becomes the
/// "unknown" sentinel. A difficulty outside the closed set falls back to
/// intermediate.
fn normalize(response: ClassifierResponse, taxonomy: &Taxonomy) -> Classification {
    let difficulty = response
        .difficulty
        .parse::<Difficulty>()
        .unwrap_or(Difficulty::Intermediate);

    match response.entity {
        Some(entity) if !entity.trim().is_empty() => {
            let entity = entity.trim().to_lowercase();
            if taxonomy.contains(&entity) {
                Classification { entity, difficulty }
            } else {
                Classification {
                    entity: caselib_core::defaults::UNKNOWN_ENTITY.to_string(),
                    difficulty,
                }
            }
        }
        _ => Classification {
            entity: caselib_core::defaults::UNKNOWN_ENTITY.to_string(),
            difficulty,
        },
    }
}

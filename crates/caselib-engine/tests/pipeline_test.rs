//! End-to-end pipeline tests over the in-memory store and mock classifier.
//!
//! Exercises the convergence guarantees: repeated runs never fork
//! duplicate cases, never reallocate ids, and never regenerate curated
//! case content.

use std::sync::Arc;

use chrono::Utc;

use caselib_core::{
    Case, CaseType, CasesStore, Difficulty, Error, GalleryImage, ImagePool, Mcq,
};
use caselib_engine::{CasePipeline, MemoryImageRepository, MemoryStore, PipelineConfig};
use caselib_inference::MockClassifier;

fn image(id: &str, title: &str, description: &str) -> GalleryImage {
    GalleryImage {
        id: id.to_string(),
        src: format!("https://img.example/{}", id),
        gcs_path: format!("gallery/{}.jpg", id),
        title: title.to_string(),
        description: description.to_string(),
        uploader: "resident".to_string(),
        timestamp: 1_700_000_000_000,
        pool: ImagePool::Community,
        tags: None,
        entity: None,
        difficulty: None,
    }
}

fn two_image_gallery() -> Vec<GalleryImage> {
    vec![
        image("img-1", "TB granuloma", "caseating"),
        image("img-2", "Sarcoid nodule", "noncaseating"),
    ]
}

fn classifier() -> MockClassifier {
    MockClassifier::new()
        .with_classification("TB granuloma", "tuberculosis", "advanced")
        .with_classification("Sarcoid nodule", "sarcoidosis", "intermediate")
        .with_classification("Miliary pattern", "tuberculosis", "advanced")
}

fn pipeline(images: Vec<GalleryImage>, store: Arc<MemoryStore>) -> CasePipeline {
    CasePipeline::new(
        Arc::new(MemoryImageRepository::new(images)),
        Arc::new(classifier()),
        store,
    )
}

#[tokio::test]
async fn test_first_run_creates_one_case_per_group() {
    let store = Arc::new(MemoryStore::new());
    let summary = pipeline(two_image_gallery(), store.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.cases_created, 2);
    assert_eq!(summary.cases_updated, 0);
    assert_eq!(summary.total_cases, 2);

    let cases = store.cases();
    assert_eq!(cases.cases["CASE001"].entity, "tuberculosis");
    assert_eq!(cases.cases["CASE001"].difficulty, Difficulty::Advanced);
    assert_eq!(cases.cases["CASE002"].entity, "sarcoidosis");

    let studies = store.case_studies();
    assert_eq!(studies.case_studies.len(), 2);
    assert_eq!(studies.case_studies["CASE001"].images.len(), 1);
    assert_eq!(
        studies.case_studies["CASE001"].images[0].image_id,
        "CASE001_IMG001"
    );
}

#[tokio::test]
async fn test_second_run_is_idempotent_except_updated_at() {
    let store = Arc::new(MemoryStore::new());

    pipeline(two_image_gallery(), store.clone())
        .run()
        .await
        .unwrap();
    let first = store.cases();

    let summary = pipeline(two_image_gallery(), store.clone())
        .run()
        .await
        .unwrap();
    assert_eq!(summary.cases_created, 0);
    assert_eq!(summary.cases_updated, 2);
    assert_eq!(summary.total_cases, 2);

    let second = store.cases();
    assert_eq!(
        first.cases.keys().collect::<Vec<_>>(),
        second.cases.keys().collect::<Vec<_>>(),
        "no new ids allocated on the second run"
    );
    for (id, before) in &first.cases {
        let after = &second.cases[id];
        let mut normalized = after.clone();
        normalized.updated_at = before.updated_at;
        assert_eq!(&normalized, before, "only updatedAt may change for {}", id);
        assert!(after.updated_at >= before.updated_at);
    }
}

#[tokio::test]
async fn test_added_image_joins_existing_case() {
    let store = Arc::new(MemoryStore::new());

    pipeline(two_image_gallery(), store.clone())
        .run()
        .await
        .unwrap();

    let mut gallery = two_image_gallery();
    gallery.push(image("img-3", "Miliary pattern", "disseminated"));
    let summary = pipeline(gallery, store.clone()).run().await.unwrap();

    assert_eq!(summary.cases_created, 0);
    assert_eq!(summary.cases_updated, 2);
    assert_eq!(summary.total_cases, 2);

    let studies = store.case_studies();
    assert_eq!(studies.case_studies["CASE001"].images.len(), 2);
    assert_eq!(studies.case_studies["CASE002"].images.len(), 1);
}

#[tokio::test]
async fn test_all_classifications_failing_still_succeeds() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = CasePipeline::new(
        Arc::new(MemoryImageRepository::new(two_image_gallery())),
        Arc::new(MockClassifier::new().failing()),
        store.clone(),
    );

    let summary = pipeline.run().await.unwrap();
    assert_eq!(summary.cases_created, 0);
    assert_eq!(summary.cases_updated, 0);
    assert_eq!(summary.total_cases, 0);
    assert!(store.cases().cases.is_empty());
    assert!(store.case_studies().case_studies.is_empty());
}

#[tokio::test]
async fn test_uniqueness_invariant_across_runs() {
    let store = Arc::new(MemoryStore::new());

    for _ in 0..3 {
        pipeline(two_image_gallery(), store.clone())
            .run()
            .await
            .unwrap();
    }

    let cases = store.cases();
    let mut pairs: Vec<(String, Difficulty)> = cases
        .cases
        .values()
        .map(|c| (c.entity.clone(), c.difficulty))
        .collect();
    let total = pairs.len();
    pairs.sort();
    pairs.dedup();
    assert_eq!(pairs.len(), total, "at most one case per (entity, difficulty)");
}

#[tokio::test]
async fn test_ids_increase_monotonically_across_runs() {
    let store = Arc::new(MemoryStore::new());

    pipeline(
        vec![image("img-1", "TB granuloma", "caseating")],
        store.clone(),
    )
    .run()
    .await
    .unwrap();
    assert!(store.cases().cases.contains_key("CASE001"));

    let mut gallery = vec![image("img-1", "TB granuloma", "caseating")];
    gallery.push(image("img-2", "Sarcoid nodule", "noncaseating"));
    pipeline(gallery, store.clone()).run().await.unwrap();
    assert!(store.cases().cases.contains_key("CASE002"));
}

#[tokio::test]
async fn test_allocator_never_reuses_ids_from_gapped_store() {
    // A store manually edited down to one high-numbered case.
    let now = Utc::now();
    let mut seeded = CasesStore::empty();
    seeded.cases.insert(
        "CASE007".to_string(),
        Case {
            case_id: "CASE007".to_string(),
            title: "Histoplasmosis Case (advanced)".to_string(),
            entity: "histoplasmosis".to_string(),
            category: "infectious".to_string(),
            difficulty: Difficulty::Advanced,
            case_type: CaseType::Classic,
            description: "desc".to_string(),
            case_context: "ctx".to_string(),
            learning_objectives: vec![],
            tags: vec![],
            created_at: now,
            updated_at: now,
        },
    );
    let store = Arc::new(MemoryStore::new().with_cases(seeded));

    let summary = pipeline(two_image_gallery(), store.clone())
        .run()
        .await
        .unwrap();
    assert_eq!(summary.cases_created, 2);
    assert_eq!(summary.total_cases, 3);

    let cases = store.cases();
    assert!(cases.cases.contains_key("CASE008"));
    assert!(cases.cases.contains_key("CASE009"));
    assert!(!cases.cases.contains_key("CASE001"));
}

#[tokio::test]
async fn test_duplicate_pair_aborts_without_persisting() {
    let now = Utc::now();
    let mut corrupted = CasesStore::empty();
    for id in ["CASE001", "CASE002"] {
        corrupted.cases.insert(
            id.to_string(),
            Case {
                case_id: id.to_string(),
                title: "Tuberculosis Case (advanced)".to_string(),
                entity: "tuberculosis".to_string(),
                category: "infectious".to_string(),
                difficulty: Difficulty::Advanced,
                case_type: CaseType::Classic,
                description: "desc".to_string(),
                case_context: "ctx".to_string(),
                learning_objectives: vec![],
                tags: vec![],
                created_at: now,
                updated_at: now,
            },
        );
    }
    let store = Arc::new(MemoryStore::new().with_cases(corrupted.clone()));

    let err = pipeline(two_image_gallery(), store.clone())
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StoreInconsistency(_)));

    // The failed run committed nothing.
    assert_eq!(store.cases().cases, corrupted.cases);
    assert!(store.case_studies().case_studies.is_empty());
}

#[tokio::test]
async fn test_mcqs_attached_when_enabled() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(MockClassifier::new().with_mcqs(vec![Mcq {
        topic: "TB".to_string(),
        question: "Which stain highlights the organisms?".to_string(),
        choices: vec![
            "AFB".to_string(),
            "GMS".to_string(),
            "PAS".to_string(),
            "H&E".to_string(),
        ],
        answer: "AFB".to_string(),
        rationale: "AFB highlights mycobacteria.".to_string(),
    }]));

    let pipeline = CasePipeline::new(
        Arc::new(MemoryImageRepository::new(two_image_gallery())),
        Arc::new(classifier()),
        store.clone(),
    )
    .with_config(PipelineConfig::default().with_mcqs(true))
    .with_mcq_generator(generator);

    pipeline.run().await.unwrap();

    let studies = store.case_studies();
    for study in studies.case_studies.values() {
        let mcqs = study.mcqs.as_ref().expect("every study gets MCQs");
        assert_eq!(mcqs.len(), 1);
    }
}

#[tokio::test]
async fn test_pre_classified_images_are_not_reclassified() {
    let store = Arc::new(MemoryStore::new());
    let mock = classifier();

    let mut gallery = two_image_gallery();
    gallery[0].entity = Some("tuberculosis".to_string());
    gallery[0].difficulty = Some(Difficulty::Advanced);

    CasePipeline::new(
        Arc::new(MemoryImageRepository::new(gallery)),
        Arc::new(mock.clone()),
        store.clone(),
    )
    .run()
    .await
    .unwrap();

    // Only the unclassified image hit the classifier.
    assert_eq!(mock.classify_call_count(), 1);
    assert_eq!(store.cases().cases.len(), 2);
}

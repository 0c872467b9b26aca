//! Case study projection stage: derive the display-ready view of every case.
//!
//! Unlike cases, studies are not a source of truth: the whole store is
//! rebuilt from (cases, enriched images, taxonomy) on every run. Image
//! ids are view-local and renumbered each pass. This is a pure function;
//! identical inputs yield an identical study map.

use tracing::debug;

use caselib_core::{
    defaults, Case, CaseImage, CaseStudiesStore, CaseStudy, CasesStore, GalleryImage, Taxonomy,
};

/// Rebuild the case studies store from the current cases and image set.
///
/// A case whose pair matches zero images still gets a study with an empty
/// image list.
pub fn project_case_studies(
    cases: &CasesStore,
    images: &[GalleryImage],
    taxonomy: &Taxonomy,
) -> CaseStudiesStore {
    let mut store = CaseStudiesStore::empty();

    for case in cases.cases.values() {
        let study = project_one(case, images, taxonomy);
        store.case_studies.insert(case.case_id.clone(), study);
    }

    debug!(
        subsystem = "engine",
        component = "projection",
        study_count = store.case_studies.len(),
        "Projection complete"
    );
    store
}

fn project_one(case: &Case, images: &[GalleryImage], taxonomy: &Taxonomy) -> CaseStudy {
    let entity_data = taxonomy.get(&case.entity);
    let findings: Vec<String> = entity_data.map(|e| e.cells.clone()).unwrap_or_default();

    let case_images: Vec<CaseImage> = images
        .iter()
        .filter(|img| {
            img.classification()
                .map(|c| case.matches(&c.entity, c.difficulty))
                .unwrap_or(false)
        })
        .enumerate()
        .map(|(index, img)| CaseImage {
            image_id: format!("{}_IMG{:03}", case.case_id, index + 1),
            path: img.src.clone(),
            stain: defaults::DEFAULT_STAIN.to_string(),
            caption: img.title.clone(),
            findings: findings.clone(),
        })
        .collect();

    let key_features = if findings.is_empty() {
        "granulomatous inflammation".to_string()
    } else {
        findings.join(", ")
    };

    CaseStudy {
        case: case.clone(),
        images: case_images,
        discussion: format!(
            "This case demonstrates {}. {}",
            case.entity, case.case_context
        ),
        teaching_points: vec![
            case.description.clone(),
            format!("Key features include: {}", key_features),
        ],
        references: defaults::CASE_STUDY_REFERENCES
            .iter()
            .map(|r| r.to_string())
            .collect(),
        mcqs: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use caselib_core::{CaseType, Classification, Difficulty, ImagePool};

    fn case(id: &str, entity: &str, difficulty: Difficulty) -> Case {
        let now = Utc::now();
        Case {
            case_id: id.to_string(),
            title: format!("{} Case ({})", entity, difficulty),
            entity: entity.to_string(),
            category: "infectious".to_string(),
            difficulty,
            case_type: CaseType::Classic,
            description: "teaching point".to_string(),
            case_context: "context narrative".to_string(),
            learning_objectives: vec![],
            tags: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn classified(id: &str, entity: &str, difficulty: Difficulty) -> GalleryImage {
        let mut image = GalleryImage {
            id: id.to_string(),
            src: format!("https://img.example/{}", id),
            gcs_path: String::new(),
            title: format!("title of {}", id),
            description: String::new(),
            uploader: "admin".to_string(),
            timestamp: 0,
            pool: ImagePool::Official,
            tags: None,
            entity: None,
            difficulty: None,
        };
        image.set_classification(Classification {
            entity: entity.to_string(),
            difficulty,
        });
        image
    }

    fn store_with(cases: Vec<Case>) -> CasesStore {
        let mut store = CasesStore::empty();
        for case in cases {
            store.cases.insert(case.case_id.clone(), case);
        }
        store
    }

    #[test]
    fn test_images_numbered_sequentially_within_case() {
        let cases = store_with(vec![case("CASE001", "tuberculosis", Difficulty::Advanced)]);
        let images = vec![
            classified("a", "tuberculosis", Difficulty::Advanced),
            classified("b", "sarcoidosis", Difficulty::Intermediate),
            classified("c", "tuberculosis", Difficulty::Advanced),
        ];

        let studies = project_case_studies(&cases, &images, Taxonomy::builtin());
        let study = &studies.case_studies["CASE001"];

        assert_eq!(study.images.len(), 2);
        assert_eq!(study.images[0].image_id, "CASE001_IMG001");
        assert_eq!(study.images[1].image_id, "CASE001_IMG002");
        assert_eq!(study.images[0].path, "https://img.example/a");
        assert_eq!(study.images[0].stain, "H&E");
        assert_eq!(study.images[0].caption, "title of a");
        assert!(study.images[0]
            .findings
            .contains(&"Langhans giant cells".to_string()));
    }

    #[test]
    fn test_narrative_synthesized_from_case_and_taxonomy() {
        let cases = store_with(vec![case("CASE001", "tuberculosis", Difficulty::Advanced)]);
        let studies = project_case_studies(&cases, &[], Taxonomy::builtin());
        let study = &studies.case_studies["CASE001"];

        assert_eq!(
            study.discussion,
            "This case demonstrates tuberculosis. context narrative"
        );
        assert_eq!(study.teaching_points[0], "teaching point");
        assert!(study.teaching_points[1].starts_with("Key features include: "));
        assert_eq!(study.references.len(), 2);
        assert!(study.mcqs.is_none());
    }

    #[test]
    fn test_case_without_matching_images_gets_empty_list() {
        let cases = store_with(vec![case("CASE001", "rheumatoid", Difficulty::Intermediate)]);
        let images = vec![classified("a", "tuberculosis", Difficulty::Advanced)];

        let studies = project_case_studies(&cases, &images, Taxonomy::builtin());
        assert!(studies.case_studies["CASE001"].images.is_empty());
    }

    #[test]
    fn test_entity_without_taxonomy_entry_falls_back() {
        let cases = store_with(vec![case("CASE001", "berylliosis", Difficulty::Beginner)]);
        let images = vec![classified("a", "berylliosis", Difficulty::Beginner)];

        let studies = project_case_studies(&cases, &images, Taxonomy::builtin());
        let study = &studies.case_studies["CASE001"];

        assert!(study.images[0].findings.is_empty());
        assert_eq!(
            study.teaching_points[1],
            "Key features include: granulomatous inflammation"
        );
    }

    #[test]
    fn test_projection_is_deterministic() {
        let cases = store_with(vec![
            case("CASE001", "tuberculosis", Difficulty::Advanced),
            case("CASE002", "sarcoidosis", Difficulty::Intermediate),
        ]);
        let images = vec![
            classified("a", "tuberculosis", Difficulty::Advanced),
            classified("b", "sarcoidosis", Difficulty::Intermediate),
        ];

        let first = project_case_studies(&cases, &images, Taxonomy::builtin());
        let second = project_case_studies(&cases, &images, Taxonomy::builtin());
        assert_eq!(first.case_studies, second.case_studies);
    }
}

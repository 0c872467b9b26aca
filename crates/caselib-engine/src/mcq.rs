//! Optional MCQ attachment: quiz questions generated per case study after
//! projection.
//!
//! Kept out of the projection stage proper because MCQ generation calls a
//! non-deterministic external model; projection stays a pure function and
//! this stage is opt-in. Per-case failures degrade to no questions.

use tracing::{debug, warn};

use caselib_core::{CaseStudiesStore, McqGenerator};

/// Generate and attach MCQs for every study in the store, sequentially.
///
/// Never fails the batch: a study whose generation call errors out simply
/// keeps `mcqs: None`.
pub async fn attach_mcqs(store: &mut CaseStudiesStore, generator: &dyn McqGenerator) {
    let mut attached = 0;
    for study in store.case_studies.values_mut() {
        match generator.generate_mcqs(study).await {
            Ok(questions) if !questions.is_empty() => {
                study.mcqs = Some(questions);
                attached += 1;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(
                    case_id = %study.case.case_id,
                    error = %e,
                    "MCQ generation failed, study keeps no questions"
                );
            }
        }
    }
    debug!(
        subsystem = "engine",
        component = "mcq",
        study_count = store.case_studies.len(),
        attached,
        "MCQ attachment complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use caselib_core::{Case, CaseStudy, CaseType, Difficulty, Mcq};
    use caselib_inference::MockClassifier;

    fn study(id: &str) -> CaseStudy {
        let now = Utc::now();
        CaseStudy {
            case: Case {
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
            images: vec![],
            discussion: "discussion".to_string(),
            teaching_points: vec![],
            references: vec![],
            mcqs: None,
        }
    }

    fn store_with(ids: &[&str]) -> CaseStudiesStore {
        let mut store = CaseStudiesStore::empty();
        for id in ids {
            store.case_studies.insert(id.to_string(), study(id));
        }
        store
    }

    fn sample_mcq() -> Mcq {
        Mcq {
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
        }
    }

    #[tokio::test]
    async fn test_attaches_generated_questions() {
        let mut store = store_with(&["CASE001"]);
        let generator = MockClassifier::new().with_mcqs(vec![sample_mcq()]);

        attach_mcqs(&mut store, &generator).await;

        let mcqs = store.case_studies["CASE001"].mcqs.as_ref().unwrap();
        assert_eq!(mcqs.len(), 1);
        assert_eq!(mcqs[0].answer, "AFB");
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_study_without_questions() {
        let mut store = store_with(&["CASE001", "CASE002"]);
        let generator = MockClassifier::new().failing();

        attach_mcqs(&mut store, &generator).await;

        assert!(store.case_studies["CASE001"].mcqs.is_none());
        assert!(store.case_studies["CASE002"].mcqs.is_none());
    }

    #[tokio::test]
    async fn test_empty_generation_is_not_attached() {
        let mut store = store_with(&["CASE001"]);
        let generator = MockClassifier::new();

        attach_mcqs(&mut store, &generator).await;
        assert!(store.case_studies["CASE001"].mcqs.is_none());
    }
}

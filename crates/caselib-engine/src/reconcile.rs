//! Case reconciliation stage: find-or-create exactly one case per group.
//!
//! Create populates a fresh case from the taxonomy; update touches only
//! `updated_at`, so curator edits to titles, descriptions, and objectives
//! survive every re-run. Ids are allocated monotonically above the highest
//! suffix already in the store and never reuse gaps left by manual edits.
//!
//! Mutates the in-memory store only; persistence is the orchestrator's
//! explicit final step.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use caselib_core::{format_case_id, Case, CaseType, CasesStore, Error, Result, Taxonomy};

use crate::grouping::{GroupKey, ImageGroups};

/// Counts reported by one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub created: usize,
    pub updated: usize,
}

/// Reconcile every image group into the cases store.
///
/// Finding more than one existing case for a single (entity, difficulty)
/// pair is store corruption: the pass aborts with
/// [`Error::StoreInconsistency`] rather than guessing which record is
/// canonical, and the caller must not persist.
pub fn reconcile_cases(
    groups: &ImageGroups,
    taxonomy: &Taxonomy,
    cases: &mut CasesStore,
    now: DateTime<Utc>,
) -> Result<ReconcileOutcome> {
    let mut outcome = ReconcileOutcome::default();
    let mut next_number = cases.highest_case_number() + 1;

    for (key, images) in groups.iter() {
        let matching: Vec<String> = cases
            .cases
            .values()
            .filter(|c| c.matches(&key.entity, key.difficulty))
            .map(|c| c.case_id.clone())
            .collect();

        match matching.as_slice() {
            [] => {
                let case_id = format_case_id(next_number);
                next_number += 1;

                let case = build_case(&case_id, key, taxonomy, now);
                debug!(
                    subsystem = "engine",
                    component = "reconcile",
                    case_id = %case_id,
                    entity = %key.entity,
                    difficulty = %key.difficulty,
                    image_count = images.len(),
                    "Creating case"
                );
                cases.cases.insert(case_id, case);
                outcome.created += 1;
            }
            [case_id] => {
                // Refresh the timestamp only; every curator-visible field
                // is left untouched.
                if let Some(case) = cases.cases.get_mut(case_id) {
                    case.updated_at = now;
                }
                debug!(
                    subsystem = "engine",
                    component = "reconcile",
                    case_id = %case_id,
                    entity = %key.entity,
                    difficulty = %key.difficulty,
                    "Updating case"
                );
                outcome.updated += 1;
            }
            duplicates => {
                error!(
                    subsystem = "engine",
                    component = "reconcile",
                    entity = %key.entity,
                    difficulty = %key.difficulty,
                    case_ids = ?duplicates,
                    "Multiple cases share one (entity, difficulty) pair"
                );
                return Err(Error::StoreInconsistency(format!(
                    "{} cases ({}) share the pair ({}, {}); expected at most one",
                    duplicates.len(),
                    duplicates.join(", "),
                    key.entity,
                    key.difficulty,
                )));
            }
        }
    }

    info!(
        subsystem = "engine",
        component = "reconcile",
        cases_created = outcome.created,
        cases_updated = outcome.updated,
        total_cases = cases.cases.len(),
        "Reconciliation complete"
    );
    Ok(outcome)
}

/// Human-readable case title: entity name capitalized, hyphens spaced,
/// difficulty in parentheses.
fn entity_title(entity: &str) -> String {
    let mut chars = entity.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    capitalized.replace('-', " ")
}

fn build_case(case_id: &str, key: &GroupKey, taxonomy: &Taxonomy, now: DateTime<Utc>) -> Case {
    let entity_data = taxonomy.get(&key.entity);

    Case {
        case_id: case_id.to_string(),
        title: format!("{} Case ({})", entity_title(&key.entity), key.difficulty),
        entity: key.entity.clone(),
        category: entity_data
            .map(|e| e.category.clone())
            .unwrap_or_else(|| "unknown".to_string()),
        difficulty: key.difficulty,
        case_type: CaseType::Classic,
        description: entity_data
            .map(|e| e.teaching_point.clone())
            .unwrap_or_else(|| {
                format!(
                    "Case demonstrating {} at a {} level.",
                    key.entity, key.difficulty
                )
            }),
        case_context: entity_data
            .map(|e| e.case_context.clone())
            .unwrap_or_else(|| format!("Histologic features of {}.", key.entity)),
        learning_objectives: vec![
            format!("Recognize histologic features of {}", key.entity),
            format!(
                "Differentiate {} from other granulomatous diseases",
                key.entity
            ),
        ],
        tags: entity_data
            .map(|e| e.tags.clone())
            .unwrap_or_else(|| vec![key.entity.clone()]),
        created_at: now,
        updated_at: now,
    }
}

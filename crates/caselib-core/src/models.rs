//! Data model for the case aggregation engine.
//!
//! Field names serialize in camelCase so store snapshots and the gallery
//! export format stay byte-compatible with the JSON the surrounding
//! teaching application reads and writes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::Error;

// =============================================================================
// CLASSIFICATION VOCABULARY
// =============================================================================

/// Diagnostic complexity of a case or image.
///
/// A closed set, unlike entities: the taxonomy may grow new disease
/// entities, but difficulty is always one of these three levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// All levels, in ascending order of complexity.
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(Error::InvalidInput(format!(
                "unknown difficulty level: {}",
                other
            ))),
        }
    }
}

/// Presentation style of a case. Auto-generated cases are always `Classic`;
/// the other variants exist for operator-authored cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseType {
    Classic,
    Atypical,
    Mimic,
    Complicated,
}

impl CaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseType::Classic => "classic",
            CaseType::Atypical => "atypical",
            CaseType::Mimic => "mimic",
            CaseType::Complicated => "complicated",
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An (entity, difficulty) pair attached to an image by enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Classification {
    /// Lowercase taxonomy entity name, or [`defaults::UNKNOWN_ENTITY`].
    pub entity: String,
    pub difficulty: Difficulty,
}

impl Classification {
    /// The fallback classification for images the classifier failed on or
    /// could not place in the taxonomy.
    pub fn unknown() -> Self {
        Self {
            entity: defaults::UNKNOWN_ENTITY.to_string(),
            difficulty: Difficulty::Intermediate,
        }
    }

    /// Whether this classification carries the "unknown" sentinel entity.
    pub fn is_unknown(&self) -> bool {
        self.entity == defaults::UNKNOWN_ENTITY
    }
}

// =============================================================================
// IMAGES
// =============================================================================

/// Which gallery pool an image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImagePool {
    /// Admin-curated images.
    Official,
    /// User-submitted images.
    Community,
}

impl fmt::Display for ImagePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImagePool::Official => f.write_str("official"),
            ImagePool::Community => f.write_str("community"),
        }
    }
}

/// An uploaded gallery image.
///
/// Immutable once classified, except for the classification tag itself,
/// which enrichment writes at most once: `entity` and `difficulty` set
/// together, never overwritten on later runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: String,
    /// Public URL to the image.
    pub src: String,
    /// Path within the storage bucket, for backend operations.
    #[serde(default)]
    pub gcs_path: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub uploader: String,
    /// Upload time, epoch milliseconds (shape shared with the app export).
    #[serde(default)]
    pub timestamp: i64,
    /// Pool ownership; serialized as `category` to match the app's JSON.
    #[serde(rename = "category")]
    pub pool: ImagePool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

impl GalleryImage {
    /// The image's classification tag, if both halves are present.
    pub fn classification(&self) -> Option<Classification> {
        match (&self.entity, self.difficulty) {
            (Some(entity), Some(difficulty)) => Some(Classification {
                entity: entity.clone(),
                difficulty,
            }),
            _ => None,
        }
    }

    /// Attach a classification tag. Enrichment calls this exactly once per
    /// previously-unclassified image.
    pub fn set_classification(&mut self, classification: Classification) {
        self.entity = Some(classification.entity);
        self.difficulty = Some(classification.difficulty);
    }
}

// =============================================================================
// CASES
// =============================================================================

/// Format a numeric case id as `CASE###` (zero-padded to three digits;
/// wider numbers keep all their digits).
pub fn format_case_id(n: u32) -> String {
    format!("CASE{:03}", n)
}

/// Parse the numeric suffix out of a `CASE###` id. Returns `None` for ids
/// that do not follow the format (e.g. manually created records).
pub fn parse_case_number(case_id: &str) -> Option<u32> {
    case_id.strip_prefix("CASE")?.parse().ok()
}

/// The canonical clinical grouping for one (entity, difficulty) pair.
///
/// Created once by reconciliation; on later passes only `updated_at` is
/// refreshed, so operator edits to the curated fields survive re-runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub case_id: String,
    pub title: String,
    pub entity: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub case_type: CaseType,
    pub description: String,
    pub case_context: String,
    pub learning_objectives: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Case {
    /// Whether this case covers the given (entity, difficulty) pair.
    pub fn matches(&self, entity: &str, difficulty: Difficulty) -> bool {
        self.entity == entity && self.difficulty == difficulty
    }
}

/// One image slot within a projected case study.
///
/// Ids are view-local (`{caseId}_IMG{seq}`) and renumbered on every
/// projection pass; nothing outside the study may reference them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseImage {
    pub image_id: String,
    /// Public URL, copied from the source image's `src`.
    pub path: String,
    pub stain: String,
    pub caption: String,
    pub findings: Vec<String>,
}

/// A board-style multiple-choice question attached to a case study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mcq {
    pub topic: String,
    pub question: String,
    pub choices: Vec<String>,
    /// Must exactly match one of `choices`.
    pub answer: String,
    pub rationale: String,
}

/// Display-ready expansion of a [`Case`]: the case fields plus its current
/// image set and narrative. Fully rebuilt from (case, images, taxonomy) on
/// every run; never independently curated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudy {
    #[serde(flatten)]
    pub case: Case,
    pub images: Vec<CaseImage>,
    pub discussion: String,
    pub teaching_points: Vec<String>,
    pub references: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcqs: Option<Vec<Mcq>>,
}

// =============================================================================
// STORE SNAPSHOTS
// =============================================================================

/// Versioned snapshot of all cases, keyed by case id.
///
/// `BTreeMap` keeps serialization order deterministic across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasesStore {
    pub version: String,
    pub generated: DateTime<Utc>,
    pub cases: BTreeMap<String, Case>,
}

impl CasesStore {
    /// An empty snapshot stamped with the current schema version.
    pub fn empty() -> Self {
        Self {
            version: defaults::STORE_SCHEMA_VERSION.to_string(),
            generated: Utc::now(),
            cases: BTreeMap::new(),
        }
    }

    /// Highest numeric suffix among `CASE###`-formatted ids, or 0 for an
    /// empty store. Seeds the id allocator so gaps from manual edits are
    /// never reused.
    pub fn highest_case_number(&self) -> u32 {
        self.cases
            .keys()
            .filter_map(|id| parse_case_number(id))
            .max()
            .unwrap_or(0)
    }

    /// Copy of this snapshot restamped for persistence: current schema
    /// version and a fresh generation timestamp.
    pub fn stamped(&self) -> Self {
        Self {
            version: defaults::STORE_SCHEMA_VERSION.to_string(),
            generated: Utc::now(),
            cases: self.cases.clone(),
        }
    }
}

/// Versioned snapshot of all case studies, keyed by case id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudiesStore {
    pub version: String,
    pub generated: DateTime<Utc>,
    pub case_studies: BTreeMap<String, CaseStudy>,
}

impl CaseStudiesStore {
    /// An empty snapshot stamped with the current schema version.
    pub fn empty() -> Self {
        Self {
            version: defaults::STORE_SCHEMA_VERSION.to_string(),
            generated: Utc::now(),
            case_studies: BTreeMap::new(),
        }
    }

    /// Copy of this snapshot restamped for persistence.
    pub fn stamped(&self) -> Self {
        Self {
            version: defaults::STORE_SCHEMA_VERSION.to_string(),
            generated: Utc::now(),
            case_studies: self.case_studies.clone(),
        }
    }
}

// =============================================================================
// RUN SUMMARY
// =============================================================================

/// Outcome of one "generate/update case library" batch, reported to the
/// invoking operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    pub cases_created: usize,
    pub cases_updated: usize,
    pub total_cases: usize,
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} total cases",
            self.cases_created, self.cases_updated, self.total_cases
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_round_trip() {
        for level in Difficulty::ALL {
            let parsed: Difficulty = level.as_str().parse().unwrap();
            assert_eq!(parsed, level);
        }
    }

    #[test]
    fn test_difficulty_parse_rejects_unknown() {
        assert!("expert".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_difficulty_serde_lowercase() {
        let json = serde_json::to_string(&Difficulty::Advanced).unwrap();
        assert_eq!(json, "\"advanced\"");
    }

    #[test]
    fn test_case_id_format_and_parse() {
        assert_eq!(format_case_id(1), "CASE001");
        assert_eq!(format_case_id(42), "CASE042");
        assert_eq!(format_case_id(1234), "CASE1234");
        assert_eq!(parse_case_number("CASE007"), Some(7));
        assert_eq!(parse_case_number("CASE1234"), Some(1234));
        assert_eq!(parse_case_number("LEGACY-01"), None);
    }

    #[test]
    fn test_image_classification_requires_both_halves() {
        let mut img = sample_image("img-1");
        assert!(img.classification().is_none());

        img.entity = Some("sarcoidosis".to_string());
        assert!(img.classification().is_none());

        img.difficulty = Some(Difficulty::Intermediate);
        let tag = img.classification().unwrap();
        assert_eq!(tag.entity, "sarcoidosis");
        assert_eq!(tag.difficulty, Difficulty::Intermediate);
    }

    #[test]
    fn test_image_serializes_pool_as_category() {
        let img = sample_image("img-1");
        let json = serde_json::to_value(&img).unwrap();
        assert_eq!(json["category"], "official");
        // Unclassified images omit the optional tag fields entirely.
        assert!(json.get("entity").is_none());
        assert!(json.get("difficulty").is_none());
    }

    #[test]
    fn test_highest_case_number_skips_foreign_ids() {
        let mut store = CasesStore::empty();
        for id in ["CASE001", "CASE009", "LEGACY-7"] {
            store.cases.insert(id.to_string(), sample_case(id));
        }
        assert_eq!(store.highest_case_number(), 9);
    }

    #[test]
    fn test_case_study_flattens_case_fields() {
        let case = sample_case("CASE001");
        let study = CaseStudy {
            case: case.clone(),
            images: vec![],
            discussion: "d".to_string(),
            teaching_points: vec![],
            references: vec![],
            mcqs: None,
        };
        let json = serde_json::to_value(&study).unwrap();
        assert_eq!(json["caseId"], "CASE001");
        assert_eq!(json["caseType"], "classic");
        assert!(json.get("mcqs").is_none());
    }

    fn sample_image(id: &str) -> GalleryImage {
        GalleryImage {
            id: id.to_string(),
            src: format!("https://img.example/{}", id),
            gcs_path: String::new(),
            title: "TB granuloma".to_string(),
            description: "caseating".to_string(),
            uploader: "admin".to_string(),
            timestamp: 0,
            pool: ImagePool::Official,
            tags: None,
            entity: None,
            difficulty: None,
        }
    }

    fn sample_case(id: &str) -> Case {
        let now = Utc::now();
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
        }
    }
}

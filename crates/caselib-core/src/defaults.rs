//! Centralized default constants for the caselib system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates and the operator binary should reference these constants
//! instead of defining their own magic numbers.

// =============================================================================
// STORE SNAPSHOTS
// =============================================================================

/// Schema version stamped on every saved cases / case-studies snapshot.
pub const STORE_SCHEMA_VERSION: &str = "1.0.0";

/// Default path of the cases snapshot file.
pub const CASES_PATH: &str = "data/cases.json";

/// Default path of the case-studies snapshot file.
pub const CASE_STUDIES_PATH: &str = "data/case_studies.json";

/// Default path of the gallery export document consumed as image source.
pub const GALLERY_PATH: &str = "data/gallery.json";

// =============================================================================
// TAXONOMY
// =============================================================================

/// Version of the built-in taxonomy rule set.
pub const TAXONOMY_VERSION: &str = "1.0.0";

/// Schema identifier of the built-in taxonomy rule set.
pub const TAXONOMY_SCHEMA: &str = "who-2022-thoracic";

/// Sentinel entity name for images the classifier could not place.
pub const UNKNOWN_ENTITY: &str = "unknown";

/// Stain label assigned to projected case images (stain inference is not
/// performed; this is a fixed placeholder).
pub const DEFAULT_STAIN: &str = "H&E";

/// Fixed reference list attached to every projected case study.
pub const CASE_STUDY_REFERENCES: [&str; 2] = [
    "WHO Classification of Thoracic Tumours, 5th Edition",
    "Pathology of Granulomatous Diseases, Current Diagnostic Criteria",
];

// =============================================================================
// CLASSIFIER
// =============================================================================

/// Default Ollama endpoint.
pub const OLLAMA_URL: &str = "http://localhost:11434";

/// Default classification model.
pub const CLASSIFY_MODEL: &str = "qwen3:8b";

/// Timeout for a single classification request (seconds).
pub const CLASSIFY_TIMEOUT_SECS: u64 = 60;

/// Timeout for an MCQ generation request (seconds). Longer than
/// classification because the output is a multi-question JSON array.
pub const MCQ_TIMEOUT_SECS: u64 = 120;

/// Number of MCQs requested per case study.
pub const MCQS_PER_CASE: usize = 2;

// =============================================================================
// ENRICHMENT
// =============================================================================

/// Maximum in-flight classification calls during enrichment. Bounds fan-out
/// against external rate limits.
pub const CLASSIFY_CONCURRENCY: usize = 4;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// Env var overriding [`OLLAMA_URL`].
pub const ENV_OLLAMA_URL: &str = "CASELIB_OLLAMA_URL";

/// Env var overriding [`CLASSIFY_MODEL`].
pub const ENV_CLASSIFY_MODEL: &str = "CASELIB_CLASSIFY_MODEL";

/// Env var overriding [`CLASSIFY_TIMEOUT_SECS`].
pub const ENV_CLASSIFY_TIMEOUT_SECS: &str = "CASELIB_CLASSIFY_TIMEOUT_SECS";

/// Env var overriding [`CLASSIFY_CONCURRENCY`].
pub const ENV_CLASSIFY_CONCURRENCY: &str = "CASELIB_CLASSIFY_CONCURRENCY";

//! Structured logging schema and field name constants for caselib.
//!
//! All crates use these field names for consistent structured logging so
//! log aggregation tools can query by standardized names across the
//! pipeline stages.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Batch-fatal conditions (store I/O, invariant violations) |
//! | WARN  | Recoverable issue, automatic fallback applied (unknown classification) |
//! | INFO  | Lifecycle events, stage completions, run summaries |
//! | DEBUG | Decision points, per-group reconciliation outcomes |
//! | TRACE | Per-image iteration, classifier payloads |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "engine", "inference", "store"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "enrichment", "reconcile", "projection", "ollama"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "classify", "reconcile_group", "save_cases"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Gallery image id being operated on.
pub const IMAGE_ID: &str = "image_id";

/// Case id (`CASE###`) being created or updated.
pub const CASE_ID: &str = "case_id";

/// Disease entity name (lowercase taxonomy key).
pub const ENTITY: &str = "entity";

/// Difficulty level (beginner/intermediate/advanced).
pub const DIFFICULTY: &str = "difficulty";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of images processed by a stage.
pub const IMAGE_COUNT: &str = "image_count";

/// Number of (entity, difficulty) groups produced by partitioning.
pub const GROUP_COUNT: &str = "group_count";

/// Number of cases created in a reconciliation pass.
pub const CASES_CREATED: &str = "cases_created";

/// Number of cases updated in a reconciliation pass.
pub const CASES_UPDATED: &str = "cases_updated";

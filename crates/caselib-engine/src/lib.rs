//! # caselib-engine
//!
//! The case aggregation pipeline: takes an unordered pool of contributed
//! gallery images, classifies each against the disease-entity taxonomy,
//! groups classified images into clinical cases, and idempotently
//! reconciles cases and their derived case studies into a persistent
//! store.
//!
//! Re-running the pipeline on an unchanged image set converges: no case is
//! duplicated, no id reallocated, and curated case content is never
//! regenerated — only `updatedAt` moves.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use caselib_engine::{CasePipeline, GalleryFileRepository, JsonFileStore, PipelineConfig};
//! use caselib_inference::OllamaClassifier;
//!
//! let pipeline = CasePipeline::new(
//!     Arc::new(GalleryFileRepository::new("data/gallery.json")),
//!     Arc::new(OllamaClassifier::from_env()),
//!     Arc::new(JsonFileStore::with_default_paths()),
//! )
//! .with_config(PipelineConfig::from_env());
//!
//! let summary = pipeline.run().await?;
//! println!("{}", summary);
//! ```

pub mod enrichment;
pub mod grouping;
pub mod mcq;
pub mod pipeline;
pub mod projection;
pub mod reconcile;
pub mod repository;
pub mod store;

pub use enrichment::enrich_images;
pub use grouping::{GroupKey, ImageGroups};
pub use mcq::attach_mcqs;
pub use pipeline::{CasePipeline, PipelineConfig};
pub use projection::project_case_studies;
pub use reconcile::{reconcile_cases, ReconcileOutcome};
pub use repository::{GalleryFileRepository, GalleryUrlRepository, MemoryImageRepository};
pub use store::{JsonFileStore, MemoryStore};

//! # caselib-core
//!
//! Core types, taxonomy reference data, and trait seams for the caselib
//! case-aggregation engine.
//!
//! This crate provides the foundational data structures and trait
//! definitions that the inference and engine crates depend on.

pub mod defaults;
pub mod error;
pub mod gallery;
pub mod logging;
pub mod models;
pub mod taxonomy;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use gallery::GalleryExport;
pub use models::{
    format_case_id, parse_case_number, Case, CaseImage, CaseStudiesStore, CaseStudy, CaseType,
    CasesStore, Classification, Difficulty, GalleryImage, ImagePool, Mcq, PipelineSummary,
};
pub use taxonomy::{MorphologicPattern, Taxonomy, TaxonomyEntity};
pub use traits::{
    CaseLibraryStore, ClassifierResponse, ImageRepository, McqGenerator, MetadataClassifier,
};

//! # caselib-inference
//!
//! Classifier backends for the caselib case-aggregation engine.
//!
//! This crate provides:
//! - [`OllamaClassifier`]: metadata classification and MCQ generation over
//!   a local Ollama instance, with JSON-forced output
//! - [`MockClassifier`]: a deterministic, scriptable backend for tests
//!
//! Both implement the `MetadataClassifier` and `McqGenerator` seams from
//! `caselib-core`; the engine is agnostic to which backend it is handed.

pub mod mock;
pub mod ollama;

pub use mock::{MockCall, MockClassifier};
pub use ollama::{OllamaClassifier, DEFAULT_CLASSIFY_MODEL, DEFAULT_OLLAMA_URL};

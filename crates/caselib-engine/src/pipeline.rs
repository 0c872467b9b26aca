//! Top-level orchestrator for one "generate/update case library" batch.
//!
//! Runs the stages in order — enrich, group, reconcile, project, optional
//! MCQ attachment — over in-memory copies of the stores and commits both
//! snapshots only at the very end. A batch aborted before persistence, or
//! failed by a structural error, leaves the store exactly as loaded.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, instrument};

use caselib_core::{
    defaults, CaseLibraryStore, ImageRepository, McqGenerator, MetadataClassifier,
    PipelineSummary, Result, Taxonomy,
};

use crate::enrichment::enrich_images;
use crate::grouping::ImageGroups;
use crate::mcq::attach_mcqs;
use crate::projection::project_case_studies;
use crate::reconcile::reconcile_cases;

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum in-flight classification calls during enrichment.
    pub classify_concurrency: usize,
    /// Whether to attach MCQs to case studies after projection.
    pub generate_mcqs: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classify_concurrency: defaults::CLASSIFY_CONCURRENCY,
            generate_mcqs: false,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CASELIB_CLASSIFY_CONCURRENCY` | `4` | Max in-flight classifier calls |
    pub fn from_env() -> Self {
        let classify_concurrency = std::env::var(defaults::ENV_CLASSIFY_CONCURRENCY)
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::CLASSIFY_CONCURRENCY)
            .max(1);

        Self {
            classify_concurrency,
            generate_mcqs: false,
        }
    }

    /// Set the classification fan-out bound.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.classify_concurrency = concurrency.max(1);
        self
    }

    /// Enable or disable MCQ attachment.
    pub fn with_mcqs(mut self, enabled: bool) -> Self {
        self.generate_mcqs = enabled;
        self
    }
}

/// The case aggregation pipeline.
pub struct CasePipeline {
    repository: Arc<dyn ImageRepository>,
    classifier: Arc<dyn MetadataClassifier>,
    store: Arc<dyn CaseLibraryStore>,
    mcq_generator: Option<Arc<dyn McqGenerator>>,
    taxonomy: Taxonomy,
    config: PipelineConfig,
}

impl CasePipeline {
    /// Create a pipeline over the built-in taxonomy with default config.
    pub fn new(
        repository: Arc<dyn ImageRepository>,
        classifier: Arc<dyn MetadataClassifier>,
        store: Arc<dyn CaseLibraryStore>,
    ) -> Self {
        Self {
            repository,
            classifier,
            store,
            mcq_generator: None,
            taxonomy: Taxonomy::builtin().clone(),
            config: PipelineConfig::default(),
        }
    }

    /// Replace the taxonomy rule set.
    pub fn with_taxonomy(mut self, taxonomy: Taxonomy) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    /// Set the run configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Provide an MCQ generator (used only when the config enables MCQs).
    pub fn with_mcq_generator(mut self, generator: Arc<dyn McqGenerator>) -> Self {
        self.mcq_generator = Some(generator);
        self
    }

    /// Run one batch: classify, group, reconcile, project, persist.
    ///
    /// Returns the run summary, or the first structural/I-O error; on
    /// error nothing has been persisted.
    #[instrument(skip(self), fields(subsystem = "engine", component = "pipeline", op = "run"))]
    pub async fn run(&self) -> Result<PipelineSummary> {
        let start = Instant::now();
        info!(model = %self.classifier.model_name(), "Starting case library generation");

        // Load both snapshots up front: a malformed store fails the run
        // before any classifier spend.
        let mut cases = self.store.load_cases().await?;
        self.store.load_case_studies().await?;

        let images = self.repository.candidate_images().await?;
        info!(image_count = images.len(), "Candidate images loaded");

        let enriched = enrich_images(
            images,
            &self.taxonomy,
            self.classifier.as_ref(),
            self.config.classify_concurrency,
        )
        .await;

        let groups = ImageGroups::partition(&enriched);
        info!(
            group_count = groups.len(),
            excluded = groups.excluded_count(),
            "Images grouped"
        );

        let now = Utc::now();
        let outcome = reconcile_cases(&groups, &self.taxonomy, &mut cases, now)?;

        let mut case_studies = project_case_studies(&cases, &enriched, &self.taxonomy);

        if self.config.generate_mcqs {
            if let Some(generator) = &self.mcq_generator {
                attach_mcqs(&mut case_studies, generator.as_ref()).await;
            }
        }

        // Commit point: nothing above touched the durable store.
        self.store.save_cases(&cases).await?;
        self.store.save_case_studies(&case_studies).await?;

        let summary = PipelineSummary {
            cases_created: outcome.created,
            cases_updated: outcome.updated,
            total_cases: cases.cases.len(),
        };
        info!(
            cases_created = summary.cases_created,
            cases_updated = summary.cases_updated,
            total_cases = summary.total_cases,
            duration_ms = start.elapsed().as_millis() as u64,
            "Case library generation complete"
        );
        Ok(summary)
    }
}

//! Mock classifier backend for deterministic testing.
//!
//! Scripted responses keyed by image title, optional per-title or global
//! failure, and a call log for assertions. Used by the engine's pipeline
//! tests; no network involved.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use caselib_core::{
    CaseStudy, ClassifierResponse, Error, Mcq, McqGenerator, MetadataClassifier, Result,
};

/// Mock classifier for testing.
#[derive(Clone)]
pub struct MockClassifier {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    responses: HashMap<String, ClassifierResponse>,
    default_response: ClassifierResponse,
    failing_titles: HashSet<String>,
    fail_all: bool,
    latency_ms: u64,
    mcqs: Vec<Mcq>,
}

/// One recorded call, for assertions.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            responses: HashMap::new(),
            default_response: ClassifierResponse {
                entity: None,
                difficulty: "intermediate".to_string(),
            },
            failing_titles: HashSet::new(),
            fail_all: false,
            latency_ms: 0,
            mcqs: Vec::new(),
        }
    }
}

impl MockClassifier {
    /// Create a new mock with default configuration: every call succeeds
    /// and returns an undetermined entity.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script a classification for a specific image title.
    pub fn with_classification(
        mut self,
        title: impl Into<String>,
        entity: impl Into<String>,
        difficulty: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config).responses.insert(
            title.into(),
            ClassifierResponse {
                entity: Some(entity.into()),
                difficulty: difficulty.into(),
            },
        );
        self
    }

    /// Set the response for titles without a scripted classification.
    pub fn with_default_response(mut self, response: ClassifierResponse) -> Self {
        Arc::make_mut(&mut self.config).default_response = response;
        self
    }

    /// Fail every call, classification and MCQ generation alike.
    pub fn failing(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_all = true;
        self
    }

    /// Fail calls for one specific image title.
    pub fn with_failing_title(mut self, title: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .failing_titles
            .insert(title.into());
        self
    }

    /// Set simulated latency for all operations.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Set the MCQs returned for every case study.
    pub fn with_mcqs(mut self, mcqs: Vec<Mcq>) -> Self {
        Arc::make_mut(&mut self.config).mcqs = mcqs;
        self
    }

    /// All logged calls, in invocation order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of classify calls.
    pub fn classify_call_count(&self) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == "classify")
            .count()
    }

    fn log(&self, operation: &str, input: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataClassifier for MockClassifier {
    async fn classify(
        &self,
        title: &str,
        _description: &str,
        _valid_entities: &[String],
        _valid_difficulties: &[String],
    ) -> Result<ClassifierResponse> {
        self.log("classify", title);
        self.simulate_latency().await;

        if self.config.fail_all || self.config.failing_titles.contains(title) {
            return Err(Error::Classification(format!(
                "mock failure for \"{}\"",
                title
            )));
        }

        Ok(self
            .config
            .responses
            .get(title)
            .cloned()
            .unwrap_or_else(|| self.config.default_response.clone()))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[async_trait]
impl McqGenerator for MockClassifier {
    async fn generate_mcqs(&self, study: &CaseStudy) -> Result<Vec<Mcq>> {
        self.log("generate_mcqs", &study.case.case_id);
        self.simulate_latency().await;

        if self.config.fail_all {
            return Err(Error::Classification("mock MCQ failure".to_string()));
        }
        Ok(self.config.mcqs.clone())
    }
}

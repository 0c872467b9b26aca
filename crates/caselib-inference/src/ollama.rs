//! Ollama classifier backend implementation.
//!
//! Uses the `/api/chat` endpoint with `format: "json"` so the model is
//! forced to emit valid JSON, which keeps the classification and MCQ
//! parsers trivial.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use caselib_core::{
    defaults, CaseStudy, ClassifierResponse, Error, Mcq, McqGenerator, MetadataClassifier, Result,
};

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = defaults::OLLAMA_URL;

/// Default classification model.
pub const DEFAULT_CLASSIFY_MODEL: &str = defaults::CLASSIFY_MODEL;

const CLASSIFY_SYSTEM_PROMPT: &str =
    "You are an expert pathologist's assistant. You analyze the metadata of histology images \
     and classify them against a known disease-entity taxonomy. You always respond with a \
     single JSON object and no markdown formatting.";

const MCQ_SYSTEM_PROMPT: &str =
    "You are an expert medical educator specializing in pathology. You write high-quality, \
     board-style multiple-choice questions. You always respond with a single JSON object and \
     no markdown formatting.";

/// Ollama-backed metadata classifier and MCQ generator.
pub struct OllamaClassifier {
    client: Client,
    base_url: String,
    model: String,
    classify_timeout_secs: u64,
    mcq_timeout_secs: u64,
}

impl OllamaClassifier {
    /// Create a new classifier with default settings.
    pub fn new() -> Self {
        Self::with_config(
            DEFAULT_OLLAMA_URL.to_string(),
            DEFAULT_CLASSIFY_MODEL.to_string(),
        )
    }

    /// Create a new classifier with custom endpoint and model.
    pub fn with_config(base_url: String, model: String) -> Self {
        let classify_timeout = std::env::var(defaults::ENV_CLASSIFY_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::CLASSIFY_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(defaults::MCQ_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        debug!(
            base_url = %base_url,
            model = %model,
            "Initializing Ollama classifier"
        );

        Self {
            client,
            base_url,
            model,
            classify_timeout_secs: classify_timeout,
            mcq_timeout_secs: defaults::MCQ_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        let base_url = std::env::var(defaults::ENV_OLLAMA_URL)
            .unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string());
        let model = std::env::var(defaults::ENV_CLASSIFY_MODEL)
            .unwrap_or_else(|_| DEFAULT_CLASSIFY_MODEL.to_string());
        Self::with_config(base_url, model)
    }

    /// Check if the backend is available and responding.
    pub async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| Error::Classification(format!("Health check failed: {}", e)))?;
        Ok(response.status().is_success())
    }

    /// Internal chat call shared by classification and MCQ generation.
    ///
    /// Always requests JSON output and disables thinking so reasoning
    /// models do not leak chain-of-thought into the response body.
    async fn chat_json(&self, system: &str, prompt: &str, timeout_secs: u64) -> Result<String> {
        let start = Instant::now();

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
            format: Some(serde_json::json!("json")),
            think: Some(false),
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .timeout(Duration::from_secs(timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Classification(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Classification(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Classification(format!("Failed to parse response: {}", e)))?;

        let content = result.message.content;
        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = content.len(),
            duration_ms = elapsed,
            "Chat call complete"
        );
        if elapsed > 30_000 {
            warn!(
                duration_ms = elapsed,
                prompt_len = prompt.len(),
                slow = true,
                "Slow classifier call"
            );
        }
        Ok(content)
    }
}

impl Default for OllamaClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn classify_prompt(
    title: &str,
    description: &str,
    valid_entities: &[String],
    valid_difficulties: &[String],
) -> String {
    format!(
        "Analyze the metadata of a histology image and classify it.\n\
         The image title is: \"{}\"\n\
         The image description is: \"{}\"\n\n\
         Here is a list of known entities: {}.\n\
         Here are the possible difficulty levels: {}.\n\n\
         Based on the title and description, determine the single most likely entity and the \
         most appropriate difficulty level.\n\
         Respond with a single JSON object of the form \
         {{\"entity\": \"the_best_entity\", \"difficulty\": \"the_best_difficulty\"}}.\n\
         If you cannot determine the entity, respond with \
         {{\"entity\": null, \"difficulty\": \"intermediate\"}}.",
        title,
        description,
        valid_entities.join(", "),
        valid_difficulties.join(", "),
    )
}

fn mcq_prompt(study: &CaseStudy) -> String {
    format!(
        "Based on the following case study, create {} high-quality, board-style multiple-choice \
         questions. The questions should test the most critical learning objectives and \
         diagnostic clues presented.\n\n\
         Case Title: {}\n\
         Clinical Vignette: {}\n\
         Discussion: {}\n\
         Teaching Points: {}\n\n\
         For each question, provide four choices (one correct) and a concise rationale \
         explaining why the correct answer is right. The \"answer\" field must exactly match \
         one of the \"choices\".\n\
         Respond with a single JSON object of the form {{\"questions\": [{{\"topic\": ..., \
         \"question\": ..., \"choices\": [...], \"answer\": ..., \"rationale\": ...}}]}}.",
        defaults::MCQS_PER_CASE,
        study.case.title,
        study.case.description,
        study.discussion,
        study.teaching_points.join("; "),
    )
}

#[async_trait]
impl MetadataClassifier for OllamaClassifier {
    #[instrument(skip_all, fields(subsystem = "inference", component = "ollama", op = "classify", model = %self.model, title = %title))]
    async fn classify(
        &self,
        title: &str,
        description: &str,
        valid_entities: &[String],
        valid_difficulties: &[String],
    ) -> Result<ClassifierResponse> {
        let prompt = classify_prompt(title, description, valid_entities, valid_difficulties);
        let content = self
            .chat_json(CLASSIFY_SYSTEM_PROMPT, &prompt, self.classify_timeout_secs)
            .await?;

        serde_json::from_str(content.trim())
            .map_err(|e| Error::Classification(format!("Malformed classification JSON: {}", e)))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Wrapper object for MCQ output. Asking for an object (not a bare array)
/// keeps Ollama's JSON format enforcement happy.
#[derive(Deserialize)]
struct McqEnvelope {
    questions: Vec<Mcq>,
}

#[async_trait]
impl McqGenerator for OllamaClassifier {
    #[instrument(skip_all, fields(subsystem = "inference", component = "ollama", op = "generate_mcqs", model = %self.model, case_id = %study.case.case_id))]
    async fn generate_mcqs(&self, study: &CaseStudy) -> Result<Vec<Mcq>> {
        let prompt = mcq_prompt(study);
        let content = self
            .chat_json(MCQ_SYSTEM_PROMPT, &prompt, self.mcq_timeout_secs)
            .await?;

        let envelope: McqEnvelope = serde_json::from_str(content.trim())
            .map_err(|e| Error::Classification(format!("Malformed MCQ JSON: {}", e)))?;
        Ok(envelope.questions)
    }
}

/// Chat API message for `/api/chat`.
#[derive(Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Request payload for the Ollama `/api/chat` endpoint.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    /// Ollama format enforcement. Set to `"json"` for guaranteed valid JSON output.
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<serde_json::Value>,
    /// Disable thinking/reasoning for models that support it (e.g., gpt-oss, qwen3).
    #[serde(skip_serializing_if = "Option::is_none")]
    think: Option<bool>,
}

/// Response from the Ollama `/api/chat` endpoint.
#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}


use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::{RagError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// Instruction prepended to every generation request. The model answers
/// from the supplied context and says so when the context is not enough,
/// falling back to general knowledge.
const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant. Answer the question using the \
provided context. If the context does not contain enough information to answer, say so and \
answer from your general knowledge instead.";

/// Produces an answer from an assembled context block and the user's query.
pub trait ResponseGenerator: Send + Sync {
    fn generate(&self, context: &str, query: &str) -> Result<String>;
}

/// Generation client for a local Ollama instance. Issues exactly one
/// completion request per call; failures are not retried here.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    base_url: Url,
    model: String,
    max_response_tokens: u32,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    system: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .ollama
            .ollama_url()
            .map_err(|e| RagError::Config(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.ollama.generation_model.clone(),
            max_response_tokens: config.ollama.max_response_tokens,
            agent,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    fn complete(&self, context: &str, query: &str) -> Result<String> {
        let url = self
            .base_url
            .join("/api/generate")
            .map_err(|e| RagError::Config(format!("Failed to build generate URL: {e}")))?;

        let request = GenerateRequest {
            model: self.model.clone(),
            system: SYSTEM_INSTRUCTION.to_string(),
            prompt: format!("Context:\n{context}\n\nQuestion: {query}"),
            stream: false,
            options: GenerateOptions {
                num_predict: self.max_response_tokens,
            },
        };

        let request_json = serde_json::to_string(&request)
            .map_err(|e| RagError::Generation(format!("Failed to serialize request: {e}")))?;

        debug!(
            "Requesting completion from {} with model {}",
            url, self.model
        );

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| RagError::Generation(format!("Generation request failed: {e}")))?;

        let generate_response: GenerateResponse = serde_json::from_str(&response_text)
            .map_err(|e| RagError::Generation(format!("Failed to parse response: {e}")))?;

        debug!(
            "Received completion ({} bytes)",
            generate_response.response.len()
        );
        Ok(generate_response.response)
    }
}

impl ResponseGenerator for OllamaGenerator {
    #[inline]
    fn generate(&self, context: &str, query: &str) -> Result<String> {
        self.complete(context, query)
    }
}

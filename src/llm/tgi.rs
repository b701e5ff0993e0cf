// Text-generation server adapter
// Talks to a model server exposing `POST /generate` (text-generation-inference
// style). The server owns tokenization, weights and device placement.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::llm::provider::{GenerationParams, InferenceEngine};
use crate::types::{AppError, AppResult};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TgiEngine {
    client: Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Serialize)]
struct GenerateParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct Generation {
    generated_text: String,
}

// Some servers wrap the single generation in a list
#[derive(Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Single(Generation),
    Batch(Vec<Generation>),
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

impl TgiEngine {
    /// The overall call limit is enforced by `SharedEngine`; the client only
    /// bounds connection setup.
    pub fn new(endpoint: &str, model: &str) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| AppError::Engine(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl InferenceEngine for TgiEngine {
    async fn generate(&self, input: &str, params: &GenerationParams) -> AppResult<String> {
        let request = GenerateRequest {
            inputs: input,
            parameters: GenerateParameters {
                max_new_tokens: params.max_new_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/generate", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Engine(format!("{} request failed: {}", self.model, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(AppError::Engine(format!(
                "{} returned {}: {}",
                self.model, status, message
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Engine(format!("Malformed response from {}: {}", self.model, e)))?;

        match parsed {
            GenerateResponse::Single(generation) => Ok(generation.generated_text),
            GenerateResponse::Batch(generations) => generations
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .ok_or_else(|| AppError::Engine(format!("{} returned no generations", self.model))),
        }
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// Offline engine: returns the leading words of its input.
// Handy for demos and smoke tests without a model server.

use async_trait::async_trait;

use crate::llm::provider::{GenerationParams, InferenceEngine};
use crate::types::AppResult;

const DEFAULT_WORD_LIMIT: usize = 64;

pub struct EchoEngine;

impl EchoEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EchoEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceEngine for EchoEngine {
    async fn generate(&self, input: &str, params: &GenerationParams) -> AppResult<String> {
        let limit = params
            .max_new_tokens
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_WORD_LIMIT);

        Ok(input.split_whitespace().take(limit).collect::<Vec<_>>().join(" "))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_truncates_to_token_budget() {
        let params = GenerationParams { max_new_tokens: Some(3) };
        let out = EchoEngine::new()
            .generate("it was the best of times", &params)
            .await
            .unwrap();
        assert_eq!(out, "it was the");
    }
}

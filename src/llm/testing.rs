// Scripted engine for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::llm::provider::{GenerationParams, InferenceEngine, SharedEngine};
use crate::types::{AppError, AppResult};

/// Records every input, optionally fails the call with a given index,
/// optionally holds each call until the test releases it and optionally
/// takes a fixed time per call.
#[derive(Default)]
pub struct ScriptedEngine {
    calls: Mutex<Vec<String>>,
    completed: AtomicUsize,
    fail_on: Option<usize>,
    gate: Option<Arc<Semaphore>>,
    delay: Option<Duration>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(index: usize) -> Self {
        Self {
            fail_on: Some(index),
            ..Self::default()
        }
    }

    /// Every call waits for one permit of `gate` before returning.
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn delayed(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn shared(self: &Arc<Self>) -> SharedEngine {
        SharedEngine::new(self.clone(), GenerationParams::default())
    }
}

#[async_trait]
impl InferenceEngine for ScriptedEngine {
    async fn generate(&self, input: &str, _params: &GenerationParams) -> AppResult<String> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(input.to_string());
            calls.len() - 1
        };

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_on == Some(index) {
            return Err(AppError::Engine(format!("scripted failure on call {}", index)));
        }

        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(format!("summary of {}", input))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

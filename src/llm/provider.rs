use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::mode::OperatingMode;
use crate::types::{AppError, AppResult};

/// A text-generation backend. Calls may take tens of seconds.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    async fn generate(&self, input: &str, params: &GenerationParams) -> AppResult<String>;

    fn name(&self) -> &str;
}

/// Per-mode decoding settings passed along with every call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationParams {
    pub max_new_tokens: Option<u32>,
}

/// The process-wide engine handle.
///
/// Holds a single permit so at most one generation is in flight against the
/// underlying engine, regardless of how many jobs are running.
///
/// The optional call timeout covers one generation only. Its clock starts
/// once the permit is held, so waiting behind other jobs never counts.
#[derive(Clone)]
pub struct SharedEngine {
    engine: Arc<dyn InferenceEngine>,
    params: GenerationParams,
    slot: Arc<Semaphore>,
    call_timeout: Option<Duration>,
}

impl SharedEngine {
    pub fn new(engine: Arc<dyn InferenceEngine>, params: GenerationParams) -> Self {
        Self {
            engine,
            params,
            slot: Arc::new(Semaphore::new(1)),
            call_timeout: None,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Option<Duration>) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub async fn generate(&self, input: &str) -> AppResult<String> {
        let _permit = self
            .slot
            .acquire()
            .await
            .map_err(|_| AppError::Unavailable("inference engine is shut down".to_string()))?;

        let call = self.engine.generate(input, &self.params);
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                warn!(engine = self.engine.name(), limit_ms = limit.as_millis() as u64, "Engine call timed out");
                AppError::Engine(format!("{} timed out after {:?}", self.engine.name(), limit))
            })?,
            None => call.await,
        }
    }

    pub fn name(&self) -> &str {
        self.engine.name()
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }
}

/// Build the one engine the given mode needs.
pub fn load_engine(mode: OperatingMode, config: &EngineConfig) -> AppResult<SharedEngine> {
    let model = mode.model_config(config);
    let params = GenerationParams {
        max_new_tokens: model.max_new_tokens,
    };

    let engine: Arc<dyn InferenceEngine> = match config.provider.as_str() {
        "tgi" => Arc::new(crate::llm::tgi::TgiEngine::new(&model.endpoint, &model.model)?),
        "echo" => Arc::new(crate::llm::echo::EchoEngine::new()),
        other => {
            return Err(AppError::Engine(format!("Unsupported engine provider: {}", other)));
        }
    };

    info!(
        mode = %mode,
        provider = %config.provider,
        model = %model.model,
        "Inference engine loaded"
    );

    Ok(SharedEngine::new(engine, params).with_call_timeout(config.call_timeout()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedEngine;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEngine {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl InferenceEngine for CountingEngine {
        async fn generate(&self, input: &str, _params: &GenerationParams) -> AppResult<String> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(input.to_uppercase())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_engine_runs_one_call_at_a_time() {
        let counting = Arc::new(CountingEngine {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let shared = SharedEngine::new(counting.clone(), GenerationParams::default());

        let mut handles = Vec::new();
        for i in 0..8 {
            let engine = shared.clone();
            handles.push(tokio::spawn(async move { engine.generate(&format!("call {}", i)).await }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(counting.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let scripted = Arc::new(ScriptedEngine::delayed(Duration::from_millis(500)));
        let shared = scripted
            .shared()
            .with_call_timeout(Some(Duration::from_millis(20)));

        let err = shared.generate("too slow").await.unwrap_err();
        assert!(matches!(err, AppError::Engine(ref reason) if reason.contains("timed out")));
        assert_eq!(scripted.completed(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_waiting_for_the_engine_does_not_count() {
        // Each call fits the limit, but the last caller waits for the other
        // two, which is longer than the limit
        let scripted = Arc::new(ScriptedEngine::delayed(Duration::from_millis(80)));
        let shared = scripted
            .shared()
            .with_call_timeout(Some(Duration::from_millis(150)));

        let mut handles = Vec::new();
        for i in 0..3 {
            let engine = shared.clone();
            handles.push(tokio::spawn(async move { engine.generate(&format!("call {}", i)).await }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(scripted.completed(), 3);
    }

    #[test]
    fn test_load_engine_uses_mode_settings() {
        let mut config = crate::config::Config::from_yaml_str("").unwrap().engine;
        config.provider = "echo".to_string();

        let qa = load_engine(OperatingMode::QuestionAnswering, &config).unwrap();
        assert_eq!(qa.params().max_new_tokens, Some(300));
        assert_eq!(qa.name(), "echo");

        let summarize = load_engine(OperatingMode::Summarization, &config).unwrap();
        assert_eq!(summarize.params().max_new_tokens, None);
        assert_eq!(summarize.call_timeout, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_load_engine_rejects_unknown_provider() {
        let mut config = crate::config::Config::from_yaml_str("").unwrap().engine;
        config.provider = "carrier-pigeon".to_string();
        assert!(matches!(
            load_engine(OperatingMode::Summarization, &config),
            Err(AppError::Engine(_))
        ));
    }
}

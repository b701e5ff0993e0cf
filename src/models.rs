use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::config::{Config, JobsConfig};
use crate::llm::{self, SharedEngine};
use crate::mode::OperatingMode;
use crate::queue::{JobQueue, Scheduler, StatsSnapshot, Worker};
use crate::storage::{validate_object_name, BookStore};
use crate::types::{AppError, AppResult};

/// Application context, built once at startup and shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub mode: OperatingMode,
    pub engine_name: String,
    pub jobs: JobQueue,
}

impl AppState {
    /// Load the engine for `mode`, open the book store and start the job
    /// scheduler.
    pub fn bootstrap(config: Config, mode: OperatingMode) -> anyhow::Result<(Self, JoinHandle<()>)> {
        let engine = llm::load_engine(mode, &config.engine)?;
        let books = BookStore::from_config(&config.storage)?;
        Ok(Self::start(&config.jobs, mode, engine, books))
    }

    /// Start the scheduler around an already loaded engine and book store.
    pub fn start(
        jobs_config: &JobsConfig,
        mode: OperatingMode,
        engine: SharedEngine,
        books: BookStore,
    ) -> (Self, JoinHandle<()>) {
        let (jobs, receiver) = JobQueue::bounded(jobs_config.queue_capacity);
        let engine_name = engine.name().to_string();
        let worker = Arc::new(Worker::new(engine, books));
        let scheduler = Scheduler::spawn(receiver, worker, jobs.stats());

        let state = Self {
            mode,
            engine_name,
            jobs,
        };
        (state, scheduler)
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Decode a request body. Anything other than a JSON object is rejected.
pub fn decode_envelope(body: &[u8]) -> AppResult<Value> {
    let value: Value = serde_json::from_slice(body).map_err(|e| AppError::Decode(e.to_string()))?;
    if !value.is_object() {
        return Err(AppError::Decode("expected a JSON object".to_string()));
    }
    Ok(value)
}

fn optional_str(inputs: &Value, field: &str) -> AppResult<Option<String>> {
    match inputs.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(AppError::Validation(format!(
            "field `{}` must be a string, got {}",
            field, other
        ))),
    }
}

fn required_str(inputs: &Value, field: &str) -> AppResult<String> {
    optional_str(inputs, field)?
        .ok_or_else(|| AppError::Validation(format!("missing required field `{}`", field)))
}

/// Accepts integers, floats (truncated) and strings holding an integer.
fn required_int(inputs: &Value, field: &str) -> AppResult<i64> {
    let invalid = |value: &Value| {
        AppError::Validation(format!("field `{}` must be an integer, got {}", field, value))
    };

    match inputs.get(field) {
        None | Some(Value::Null) => Err(AppError::Validation(format!(
            "missing required field `{}`",
            field
        ))),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .ok_or_else(|| invalid(&Value::Number(n.clone()))),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid(&Value::String(s.clone()))),
        Some(other) => Err(invalid(other)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskQuestionRequest {
    pub question: String,
    pub context: Option<String>,
}

impl AskQuestionRequest {
    pub fn from_envelope(inputs: &Value) -> AppResult<Self> {
        Ok(Self {
            question: required_str(inputs, "question")?,
            context: optional_str(inputs, "context")?,
        })
    }

    /// Prompt in the `$answer$; $question$ = ...` slot format.
    pub fn prompt(&self) -> String {
        let mut prompt = format!("$answer$; $question$ = {}", self.question);
        if let Some(context) = &self.context {
            prompt.push_str(&format!("; $context$ = {}", context));
        }
        prompt
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizeTextRequest {
    pub context: String,
}

impl SummarizeTextRequest {
    pub fn from_envelope(inputs: &Value) -> AppResult<Self> {
        Ok(Self {
            context: required_str(inputs, "context")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizeBatchRequest {
    pub input_filename: String,
    pub output_filename: String,
}

impl SummarizeBatchRequest {
    pub fn from_envelope(inputs: &Value) -> AppResult<Self> {
        let input_filename = required_str(inputs, "input_filename")?;
        let output_filename = required_str(inputs, "output_filename")?;
        validate_object_name(&input_filename)?;
        validate_object_name(&output_filename)?;
        Ok(Self {
            input_filename,
            output_filename,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeNapRequest {
    pub nap_length: u64,
}

impl TakeNapRequest {
    pub fn from_envelope(inputs: &Value) -> AppResult<Self> {
        let nap_length = required_int(inputs, "nap_length")?;
        let nap_length = u64::try_from(nap_length).map_err(|_| {
            AppError::Validation(format!("field `nap_length` must not be negative, got {}", nap_length))
        })?;
        Ok(Self { nap_length })
    }
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Body returned by every job endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ApiResponse {
    /// Success that echoes the received body.
    pub fn success(inputs: Value) -> Self {
        Self {
            status: ResponseStatus::Success,
            inputs: Some(inputs),
            reason: None,
        }
    }

    /// Success without an echo.
    pub fn accepted() -> Self {
        Self {
            status: ResponseStatus::Success,
            inputs: None,
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            inputs: None,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub mode: OperatingMode,
    pub engine: String,
    pub timestamp: String,
    pub jobs: StatsSnapshot,
}

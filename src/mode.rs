//! Operating mode selection
//!
//! The server runs in exactly one mode for its whole lifetime. The mode picks
//! which model gets loaded and which endpoints accept work.

use serde::Serialize;

use crate::config::{EngineConfig, ModelConfig};
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    QuestionAnswering,
    Summarization,
}

impl OperatingMode {
    /// Map the `--qa` boot flag to a mode.
    pub fn from_qa_flag(qa: bool) -> Self {
        if qa {
            OperatingMode::QuestionAnswering
        } else {
            OperatingMode::Summarization
        }
    }

    /// Fail with the caller-facing mismatch reason unless `self` is `required`.
    pub fn require(self, required: OperatingMode) -> AppResult<()> {
        if self == required {
            return Ok(());
        }
        let reason = match required {
            OperatingMode::QuestionAnswering => "Not in QA mode",
            OperatingMode::Summarization => "Not in Summarize mode",
        };
        Err(AppError::ModeMismatch(reason.to_string()))
    }

    /// The model settings that belong to this mode.
    pub fn model_config(self, engine: &EngineConfig) -> &ModelConfig {
        match self {
            OperatingMode::QuestionAnswering => &engine.qa,
            OperatingMode::Summarization => &engine.summarize,
        }
    }
}

impl std::fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatingMode::QuestionAnswering => write!(f, "qa"),
            OperatingMode::Summarization => write!(f, "summarize"),
        }
    }
}

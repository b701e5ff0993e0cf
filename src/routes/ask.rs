use axum::{extract::State, routing::post, Json, Router};
use bytes::Bytes;
use tracing::info;

use crate::mode::OperatingMode;
use crate::models::{decode_envelope, ApiResponse, AppState, AskQuestionRequest};
use crate::queue::Job;
use crate::types::AppError;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ask_question", post(ask_question))
        .with_state(state)
}

/// POST /ask_question - queue a question for the QA model
async fn ask_question(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApiResponse>, AppError> {
    let inputs = decode_envelope(&body)?;
    info!(inputs = %inputs, "Received question");

    state.mode.require(OperatingMode::QuestionAnswering)?;
    let request = AskQuestionRequest::from_envelope(&inputs)?;

    state.jobs.submit(Job::Answer { prompt: request.prompt() })?;

    Ok(Json(ApiResponse::success(inputs)))
}

use axum::{extract::State, routing::post, Json, Router};
use bytes::Bytes;
use tracing::info;

use crate::mode::OperatingMode;
use crate::models::{
    decode_envelope, ApiResponse, AppState, SummarizeBatchRequest, SummarizeTextRequest,
};
use crate::queue::Job;
use crate::types::AppError;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/summarize_text", post(summarize_text))
        .route("/summarize_batch", post(summarize_batch))
        .with_state(state)
}

/// POST /summarize_text - queue one document for summarization
async fn summarize_text(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApiResponse>, AppError> {
    let inputs = decode_envelope(&body)?;
    info!(inputs = %inputs, "Received summarization request");

    state.mode.require(OperatingMode::Summarization)?;
    let request = SummarizeTextRequest::from_envelope(&inputs)?;

    state.jobs.submit(Job::Summarize { text: request.context })?;

    Ok(Json(ApiResponse::success(inputs)))
}

/// POST /summarize_batch - queue a whole stored book for summarization
async fn summarize_batch(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApiResponse>, AppError> {
    let inputs = decode_envelope(&body)?;
    state.mode.require(OperatingMode::Summarization)?;
    let request = SummarizeBatchRequest::from_envelope(&inputs)?;

    info!(
        input = %request.input_filename,
        output = %request.output_filename,
        "Received batch summarization request"
    );

    state.jobs.submit(Job::SummarizeBatch {
        input: request.input_filename,
        output: request.output_filename,
    })?;

    Ok(Json(ApiResponse::accepted()))
}

use axum::{extract::State, routing::post, Json, Router};
use bytes::Bytes;
use tracing::info;

use crate::models::{decode_envelope, ApiResponse, AppState, TakeNapRequest};
use crate::queue::Job;
use crate::types::AppError;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/take_nap", post(take_nap))
        .with_state(state)
}

/// POST /take_nap - queue a job that sleeps for `nap_length` seconds.
/// Available in every mode.
async fn take_nap(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApiResponse>, AppError> {
    let inputs = decode_envelope(&body)?;
    info!(inputs = %inputs, "Received nap request");

    let request = TakeNapRequest::from_envelope(&inputs)?;
    state.jobs.submit(Job::Nap { seconds: request.nap_length })?;

    Ok(Json(ApiResponse::success(inputs)))
}

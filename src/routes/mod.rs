//! HTTP routes
//!
//! Every job endpoint follows the same steps: decode the body, check the
//! operating mode, validate into a typed request, queue exactly one job and
//! answer immediately. Failures never queue anything.
//!
//! - `POST /ask_question` - question answering (QA mode)
//! - `POST /summarize_text` - single document (Summarize mode)
//! - `POST /summarize_batch` - stored book (Summarize mode)
//! - `POST /take_nap` - demo job (any mode)
//! - `GET /health` - mode, engine and job counters

pub mod ask;
pub mod health;
pub mod nap;
pub mod summarize;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::models::{ApiResponse, AppState};
use crate::types::AppError;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!(mode = %state.mode, "Creating application router");

    Router::new()
        .merge(ask::router(state.clone()))
        .merge(summarize::router(state.clone()))
        .merge(nap::router(state.clone()))
        .merge(health::router(state))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Admission failures all map to a 500 with a `failed` envelope.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        warn!(error = %self, "Request rejected");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::failed(self.to_string())),
        )
            .into_response()
    }
}

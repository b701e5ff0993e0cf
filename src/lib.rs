// Async NLP - fire-and-forget HTTP job server for QA and summarization

pub mod book;
pub mod config;
pub mod llm;
pub mod mode;
pub mod models;
pub mod pipeline;
pub mod queue;
pub mod routes;
pub mod storage;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use mode::OperatingMode;
pub use models::AppState;
pub use types::{AppError, AppResult};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}

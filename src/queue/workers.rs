// Job execution

use std::time::Duration;

use tracing::info;

use crate::llm::SharedEngine;
use crate::pipeline;
use crate::queue::jobs::Job;
use crate::storage::BookStore;
use crate::types::AppResult;

/// Runs jobs against the process-wide engine and book store.
pub struct Worker {
    engine: SharedEngine,
    books: BookStore,
}

impl Worker {
    pub fn new(engine: SharedEngine, books: BookStore) -> Self {
        Self { engine, books }
    }

    pub async fn process_job(&self, job: Job) -> AppResult<()> {
        match job {
            Job::Answer { prompt } => self.process_generation_job("answer", &prompt).await,
            Job::Summarize { text } => self.process_generation_job("summary", &text).await,
            Job::SummarizeBatch { input, output } => {
                pipeline::summarize_book(&self.engine, &self.books, &input, &output).await?;
                Ok(())
            }
            Job::Nap { seconds } => self.process_nap_job(seconds).await,
        }
    }

    async fn process_generation_job(&self, label: &str, input: &str) -> AppResult<()> {
        info!(engine = %self.engine.name(), input_len = input.len(), "Generating {}", label);
        let output = self.engine.generate(input).await?;
        info!(output = %output, "Generated {}", label);
        Ok(())
    }

    async fn process_nap_job(&self, seconds: u64) -> AppResult<()> {
        tokio::time::sleep(Duration::from_secs(seconds)).await;
        info!(seconds, "That was a refreshing nap");
        Ok(())
    }
}

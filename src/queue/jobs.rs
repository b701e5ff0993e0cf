// Job definitions

/// A unit of background work together with everything it needs to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Run a fully templated question-answering prompt.
    Answer { prompt: String },
    /// Summarize a single document.
    Summarize { text: String },
    /// Summarize every chapter of a stored book into another stored book.
    SummarizeBatch { input: String, output: String },
    /// Demo job that just sleeps.
    Nap { seconds: u64 },
}

impl Job {
    pub fn kind(&self) -> &'static str {
        match self {
            Job::Answer { .. } => "answer",
            Job::Summarize { .. } => "summarize",
            Job::SummarizeBatch { .. } => "summarize_batch",
            Job::Nap { .. } => "nap",
        }
    }
}

//! Batch summarization pipeline
//!
//! ```text
//! input book ──load──▶ chapter 1 ──engine──▶ summary 1
//!                      chapter 2 ──engine──▶ summary 2     (one at a time)
//!                      ...
//!                                   summaries ──save──▶ scratch dir ──put──▶ remote
//! ```
//!
//! Chapters are summarized strictly in order, each call awaited before the
//! next starts. A failed chapter aborts the run before anything is written.

use tracing::{debug, info};

use crate::book::{Book, ChapterSummary};
use crate::llm::SharedEngine;
use crate::storage::BookStore;
use crate::types::AppResult;

/// Summarize every chapter of `input` and store the summaries as `output`.
/// Returns the number of chapters written.
pub async fn summarize_book(
    engine: &SharedEngine,
    books: &BookStore,
    input: &str,
    output: &str,
) -> AppResult<usize> {
    let book: Book = books.load(input).await?;
    info!(input, chapters = book.len(), "Summarizing book");

    let mut summaries = Vec::with_capacity(book.len());
    for (index, chapter) in book.iter().enumerate() {
        let summary = engine.generate(&chapter.text).await?;
        debug!(input, chapter = index + 1, summary_len = summary.len(), "Chapter summarized");
        summaries.push(ChapterSummary { summary });
    }

    books.save(output, &summaries).await?;
    info!(input, output, chapters = summaries.len(), "Book summary saved");

    Ok(summaries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Chapter;
    use crate::llm::testing::ScriptedEngine;
    use crate::types::AppError;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    async fn store_with_book(dir: &TempDir, chapters: &[&str]) -> BookStore {
        let store = BookStore::new(dir.path(), None);
        let book: Book = chapters
            .iter()
            .map(|text| Chapter { text: text.to_string() })
            .collect();
        store.save("book.json", &book).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_summaries_keep_chapter_order() {
        let dir = TempDir::new().unwrap();
        let store = store_with_book(&dir, &["first", "second", "third"]).await;
        let engine = Arc::new(ScriptedEngine::new());

        let written = summarize_book(&engine.shared(), &store, "book.json", "summary.json")
            .await
            .unwrap();

        assert_eq!(written, 3);
        assert_eq!(engine.calls(), vec!["first", "second", "third"]);

        let summaries: Vec<ChapterSummary> = store.load("summary.json").await.unwrap();
        let texts: Vec<_> = summaries.iter().map(|s| s.summary.as_str()).collect();
        assert_eq!(texts, vec!["summary of first", "summary of second", "summary of third"]);
    }

    #[tokio::test]
    async fn test_failed_chapter_persists_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store_with_book(&dir, &["one", "two", "three", "four"]).await;
        let engine = Arc::new(ScriptedEngine::failing_on(2));

        let result = summarize_book(&engine.shared(), &store, "book.json", "summary.json").await;

        assert!(matches!(result, Err(AppError::Engine(_))));
        // Stopped at the failing chapter
        assert_eq!(engine.calls().len(), 3);
        assert!(!dir.path().join("summary.json").exists());
    }

    #[tokio::test]
    async fn test_long_book_outlasts_the_call_limit() {
        let dir = TempDir::new().unwrap();
        let store = store_with_book(&dir, &["one", "two", "three", "four", "five"]).await;
        let engine = Arc::new(ScriptedEngine::delayed(Duration::from_millis(60)));
        let shared = engine
            .shared()
            .with_call_timeout(Some(Duration::from_millis(200)));

        let started = Instant::now();
        let written = summarize_book(&shared, &store, "book.json", "summary.json")
            .await
            .unwrap();

        // The whole run is longer than any single call may take
        assert!(started.elapsed() > Duration::from_millis(200));
        assert_eq!(written, 5);
        let summaries: Vec<ChapterSummary> = store.load("summary.json").await.unwrap();
        assert_eq!(summaries.len(), 5);
    }

    #[tokio::test]
    async fn test_timed_out_chapter_persists_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store_with_book(&dir, &["one", "two"]).await;
        let engine = Arc::new(ScriptedEngine::delayed(Duration::from_millis(300)));
        let shared = engine
            .shared()
            .with_call_timeout(Some(Duration::from_millis(20)));

        let result = summarize_book(&shared, &store, "book.json", "summary.json").await;

        assert!(matches!(result, Err(AppError::Engine(_))));
        assert_eq!(engine.calls().len(), 1);
        assert!(!dir.path().join("summary.json").exists());
    }

    #[tokio::test]
    async fn test_missing_book_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = BookStore::new(dir.path(), None);
        let engine = Arc::new(ScriptedEngine::new());

        let result = summarize_book(&engine.shared(), &store, "nope.json", "summary.json").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_book_writes_empty_summary() {
        let dir = TempDir::new().unwrap();
        let store = store_with_book(&dir, &[]).await;
        let engine = Arc::new(ScriptedEngine::new());

        let written = summarize_book(&engine.shared(), &store, "book.json", "summary.json")
            .await
            .unwrap();

        assert_eq!(written, 0);
        let summaries: Vec<ChapterSummary> = store.load("summary.json").await.unwrap();
        assert!(summaries.is_empty());
    }
}

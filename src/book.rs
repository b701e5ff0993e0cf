//! Book records
//!
//! A book is a JSON array of single-field objects: `{"text": ...}` per chapter
//! going in, `{"summary": ...}` per chapter coming out of the batch pipeline.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterSummary {
    pub summary: String,
}

pub type Book = Vec<Chapter>;

/// Split a plain-text book into chapters.
///
/// The text is cut at every occurrence of `marker`; the first `skip` pieces
/// (front matter, table of contents) are dropped and the rest are trimmed.
/// Pieces that are empty after trimming are kept, so the chapter count always
/// matches the number of pieces after `skip`.
pub fn chapterize(text: &str, marker: &str, skip: usize) -> Book {
    text.split(marker)
        .skip(skip)
        .map(str::trim)
        .map(|piece| Chapter { text: piece.to_string() })
        .collect()
}

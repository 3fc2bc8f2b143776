use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ShelfError};
use crate::models::book::validate_rating;

/// A written review of a book.
///
/// `rating` is the reviewer's score at the time of writing and is kept apart
/// from `BookRecord::rating`; neither updates the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub book_id: String,
    pub title: String,
    pub content: String,
    pub rating: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_started: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_finished: Option<DateTime<Utc>>,

    #[serde(default = "default_true")]
    pub is_public: bool,

    #[serde(default)]
    pub is_favorite: bool,

    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Review {
    pub fn new(
        book_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        rating: u8,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            book_id: book_id.into(),
            title: title.into(),
            content: content.into(),
            rating,
            date_started: None,
            date_finished: None,
            is_public: true,
            is_favorite: false,
            created_at: Utc::now(),
        }
    }

    /// Required fields present and rating in range.
    pub fn validate(&self) -> Result<()> {
        if self.book_id.trim().is_empty() {
            return Err(ShelfError::ValidationError("review needs a book id".into()));
        }
        if self.title.trim().is_empty() {
            return Err(ShelfError::ValidationError("review title is empty".into()));
        }
        if self.content.trim().is_empty() {
            return Err(ShelfError::ValidationError("review content is empty".into()));
        }
        validate_rating(self.rating)
    }
}

/// Partial edit of a review; `None` keeps the stored value. The book and
/// creation time of a review never change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub rating: Option<u8>,
    pub date_started: Option<DateTime<Utc>>,
    pub date_finished: Option<DateTime<Utc>>,
    pub is_public: Option<bool>,
    pub is_favorite: Option<bool>,
}

impl Review {
    /// Apply `update` and validate the result. On error `self` is unchanged.
    pub fn apply(&mut self, update: ReviewUpdate) -> Result<()> {
        let mut next = self.clone();
        if let Some(title) = update.title {
            next.title = title;
        }
        if let Some(content) = update.content {
            next.content = content;
        }
        if let Some(rating) = update.rating {
            next.rating = rating;
        }
        if update.date_started.is_some() {
            next.date_started = update.date_started;
        }
        if update.date_finished.is_some() {
            next.date_finished = update.date_finished;
        }
        if let Some(is_public) = update.is_public {
            next.is_public = is_public;
        }
        if let Some(is_favorite) = update.is_favorite {
            next.is_favorite = is_favorite;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

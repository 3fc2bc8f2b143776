mod connection;
mod migrations;
mod schema;

pub use connection::ConnectionPool;
pub use migrations::{get_applied_versions, run_migrations, Migration};
pub use schema::{init_schema, SCHEMA_VERSION};

use std::path::Path;

use tracing::debug;

use crate::error::{Result, ShelfError};
use crate::models::{BookRecord, ReadingChallenge, Review, ReviewUpdate};
use crate::source::{BookFilter, BookSource, FavoritePersister};

use super::repositories::{
    BookRepository, ChallengeRepository, Repository, ReviewRepository, SqliteBookRepository,
    SqliteChallengeRepository, SqliteReviewRepository,
};

pub fn open_database(path: &Path) -> Result<ConnectionPool> {
    ConnectionPool::open(path)
}

pub fn open_in_memory() -> Result<ConnectionPool> {
    ConnectionPool::open_in_memory()
}

/// Changes to a reading challenge; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ChallengeUpdate {
    pub name: Option<String>,
    pub target: Option<u32>,
    pub current: Option<u32>,
}

/// Local stand-in for the hosted backend: books, reviews and challenges in
/// one SQLite file.
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let pool = open_database(path)?;
        Ok(Self { pool })
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = open_in_memory()?;
        Ok(Self { pool })
    }

    pub fn schema_versions(&self) -> Result<Vec<u32>> {
        let conn = self.pool.get_connection();
        get_applied_versions(&conn)
    }

    fn books(&self) -> SqliteBookRepository<'_> {
        SqliteBookRepository::new(self.pool.get_connection())
    }

    fn reviews(&self) -> SqliteReviewRepository<'_> {
        SqliteReviewRepository::new(self.pool.get_connection())
    }

    fn challenges(&self) -> SqliteChallengeRepository<'_> {
        SqliteChallengeRepository::new(self.pool.get_connection())
    }

    // ─── Books ─────────────────────────────────────────────

    pub fn upsert_book(&self, book: &BookRecord) -> Result<()> {
        self.books().save(book)
    }

    pub fn get_book(&self, id: &str) -> Result<BookRecord> {
        self.books()
            .find_by_id(id)?
            .ok_or_else(|| ShelfError::BookNotFound(id.to_string()))
    }

    pub fn list_books(&self, filter: &BookFilter) -> Result<Vec<BookRecord>> {
        self.books().list(filter)
    }

    pub fn count_books(&self) -> Result<usize> {
        self.books().count()
    }

    /// Load, change and store one book.
    pub fn update_book<F>(&self, id: &str, change: F) -> Result<BookRecord>
    where
        F: FnOnce(&mut BookRecord) -> Result<()>,
    {
        let mut book = self.get_book(id)?;
        change(&mut book)?;
        self.upsert_book(&book)?;
        debug!(book_id = id, "book updated");
        Ok(book)
    }

    pub fn delete_book(&self, id: &str) -> Result<()> {
        if !self.books().delete(id)? {
            return Err(ShelfError::BookNotFound(id.to_string()));
        }
        Ok(())
    }

    // ─── Reviews ───────────────────────────────────────────

    pub fn add_review(&self, review: &Review) -> Result<()> {
        review.validate()?;
        self.get_book(&review.book_id)?;
        self.reviews().save(review)
    }

    pub fn list_reviews(&self, book_id: &str) -> Result<Vec<Review>> {
        self.reviews().list_by_book(book_id)
    }

    pub fn get_review(&self, id: &str) -> Result<Review> {
        self.reviews()
            .find_by_id(id)?
            .ok_or_else(|| ShelfError::ReviewNotFound(id.to_string()))
    }

    /// Edit a review in place; its book and creation time are kept.
    pub fn update_review(&self, id: &str, update: ReviewUpdate) -> Result<Review> {
        let repo = self.reviews();
        let mut review = repo
            .find_by_id(id)?
            .ok_or_else(|| ShelfError::ReviewNotFound(id.to_string()))?;
        review.apply(update)?;
        repo.save(&review)?;
        debug!(review_id = id, "review updated");
        Ok(review)
    }

    pub fn delete_review(&self, id: &str) -> Result<()> {
        if !self.reviews().delete(id)? {
            return Err(ShelfError::ReviewNotFound(id.to_string()));
        }
        Ok(())
    }

    // ─── Challenges ────────────────────────────────────────

    pub fn create_challenge(&self, name: &str, target: u32, current: u32) -> Result<ReadingChallenge> {
        let mut challenge = ReadingChallenge::new(name, target)?;
        challenge.set_progress(current);
        self.challenges().save(&challenge)?;
        Ok(challenge)
    }

    pub fn list_challenges(&self) -> Result<Vec<ReadingChallenge>> {
        self.challenges().list()
    }

    pub fn update_challenge(&self, id: &str, update: ChallengeUpdate) -> Result<ReadingChallenge> {
        let repo = self.challenges();
        let mut challenge = repo
            .find_by_id(id)?
            .ok_or_else(|| ShelfError::ChallengeNotFound(id.to_string()))?;

        if let Some(name) = update.name {
            challenge.name = name;
        }
        if let Some(target) = update.target {
            if target == 0 {
                return Err(ShelfError::ValidationError(
                    "challenge target must be at least 1".into(),
                ));
            }
            challenge.target = target;
        }
        challenge.set_progress(update.current.unwrap_or(challenge.current));

        repo.save(&challenge)?;
        Ok(challenge)
    }

    pub fn delete_challenge(&self, id: &str) -> Result<()> {
        if !self.challenges().delete(id)? {
            return Err(ShelfError::ChallengeNotFound(id.to_string()));
        }
        Ok(())
    }
}

impl BookSource for Database {
    fn load_books(&self, filter: &BookFilter) -> Result<Vec<BookRecord>> {
        self.list_books(filter)
    }
}

impl FavoritePersister for Database {
    fn persist_favorite(&self, book_id: &str, is_favorite: bool) -> Result<()> {
        self.books().set_favorite(book_id, is_favorite)?;
        debug!(book_id, is_favorite, "favorite persisted");
        Ok(())
    }
}

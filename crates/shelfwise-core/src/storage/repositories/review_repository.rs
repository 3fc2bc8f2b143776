use std::sync::MutexGuard;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::Review;
use crate::storage::rows::ReviewRow;

use super::Repository;

pub trait ReviewRepository: Repository<Entity = Review, Id = str> {
    /// Newest first.
    fn list_by_book(&self, book_id: &str) -> Result<Vec<Review>>;
}

pub struct SqliteReviewRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteReviewRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }
}

impl Repository for SqliteReviewRepository<'_> {
    type Entity = Review;
    type Id = str;

    fn find_by_id(&self, id: &str) -> Result<Option<Review>> {
        let sql = format!("SELECT {} FROM reviews WHERE id = ?1", ReviewRow::COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id], ReviewRow::from_sql_row)
            .optional()?;
        Ok(row.map(Review::from))
    }

    fn save(&self, review: &Review) -> Result<()> {
        let row = ReviewRow::from_review(review);
        self.conn.execute(
            "INSERT INTO reviews
                (id, book_id, title, content, rating, date_started, date_finished,
                 is_public, is_favorite, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                rating = excluded.rating,
                date_started = excluded.date_started,
                date_finished = excluded.date_finished,
                is_public = excluded.is_public,
                is_favorite = excluded.is_favorite",
            params![
                row.id,
                row.book_id,
                row.title,
                row.content,
                row.rating,
                row.date_started,
                row.date_finished,
                row.is_public,
                row.is_favorite,
                row.created_at,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM reviews WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl ReviewRepository for SqliteReviewRepository<'_> {
    fn list_by_book(&self, book_id: &str) -> Result<Vec<Review>> {
        let sql = format!(
            "SELECT {} FROM reviews WHERE book_id = ?1 ORDER BY created_at DESC",
            ReviewRow::COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![book_id], ReviewRow::from_sql_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().map(Review::from).collect())
    }
}

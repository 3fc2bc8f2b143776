use std::sync::MutexGuard;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, ShelfError};
use crate::models::BookRecord;
use crate::source::BookFilter;
use crate::storage::rows::BookRow;

use super::Repository;

pub trait BookRepository: Repository<Entity = BookRecord, Id = str> {
    fn list(&self, filter: &BookFilter) -> Result<Vec<BookRecord>>;
    fn count(&self) -> Result<usize>;
    fn set_favorite(&self, id: &str, is_favorite: bool) -> Result<()>;
}

pub struct SqliteBookRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqliteBookRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }
}

impl Repository for SqliteBookRepository<'_> {
    type Entity = BookRecord;
    type Id = str;

    fn find_by_id(&self, id: &str) -> Result<Option<BookRecord>> {
        let sql = format!("SELECT {} FROM books WHERE id = ?1", BookRow::COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id], BookRow::from_sql_row)
            .optional()?;
        Ok(row.map(BookRecord::from))
    }

    fn save(&self, book: &BookRecord) -> Result<()> {
        let row = BookRow::from_record(book);
        self.conn.execute(
            "INSERT INTO books
                (id, title, author, cover_image, description, genre, page_count,
                 current_page, progress_percentage, started_reading, finished_reading,
                 rating, status, is_favorite, date_added, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                author = excluded.author,
                cover_image = excluded.cover_image,
                description = excluded.description,
                genre = excluded.genre,
                page_count = excluded.page_count,
                current_page = excluded.current_page,
                progress_percentage = excluded.progress_percentage,
                started_reading = excluded.started_reading,
                finished_reading = excluded.finished_reading,
                rating = excluded.rating,
                status = excluded.status,
                is_favorite = excluded.is_favorite,
                last_updated = excluded.last_updated",
            params![
                row.id,
                row.title,
                row.author,
                row.cover_image,
                row.description,
                row.genre,
                row.page_count,
                row.current_page,
                row.progress_percentage,
                row.started_reading,
                row.finished_reading,
                row.rating,
                row.status,
                row.is_favorite,
                row.date_added,
                row.last_updated,
            ],
        )?;
        Ok(())
    }

    /// Reviews of the book go with it (`ON DELETE CASCADE`).
    fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn list(&self, filter: &BookFilter) -> Result<Vec<BookRecord>> {
        let sql = format!(
            "SELECT {} FROM books
             WHERE (?1 IS NULL OR status = ?1) AND (?2 = 0 OR is_favorite = 1)
             ORDER BY last_updated DESC",
            BookRow::COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![filter.status.map(|s| s.to_string()), filter.favorites_only],
                BookRow::from_sql_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows.into_iter().map(BookRecord::from).collect())
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn set_favorite(&self, id: &str, is_favorite: bool) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE books SET is_favorite = ?1, last_updated = ?2 WHERE id = ?3",
            params![is_favorite, Utc::now().to_rfc3339(), id],
        )?;
        if updated == 0 {
            return Err(ShelfError::BookNotFound(id.to_string()));
        }
        Ok(())
    }
}

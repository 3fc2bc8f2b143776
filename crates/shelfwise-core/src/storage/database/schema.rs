use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 1;

pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS books (
            id                  TEXT PRIMARY KEY,
            title               TEXT NOT NULL,
            author              TEXT NOT NULL,
            cover_image         TEXT NOT NULL DEFAULT '',
            description         TEXT NOT NULL DEFAULT '',
            genre               TEXT NOT NULL DEFAULT '',
            page_count          INTEGER NOT NULL DEFAULT 0,
            current_page        INTEGER,
            progress_percentage REAL,
            started_reading     TEXT,
            finished_reading    TEXT,
            rating              INTEGER,
            status              TEXT NOT NULL DEFAULT 'want-to-read'
                CHECK(status IN ('want-to-read', 'currently-reading', 'completed')),
            is_favorite         INTEGER NOT NULL DEFAULT 0,
            date_added          TEXT NOT NULL,
            last_updated        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reviews (
            id            TEXT PRIMARY KEY,
            book_id       TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
            title         TEXT NOT NULL,
            content       TEXT NOT NULL,
            rating        INTEGER NOT NULL,
            date_started  TEXT,
            date_finished TEXT,
            is_public     INTEGER NOT NULL DEFAULT 1,
            is_favorite   INTEGER NOT NULL DEFAULT 0,
            created_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reading_challenges (
            id         TEXT PRIMARY KEY,
            name       TEXT NOT NULL,
            target     INTEGER NOT NULL,
            current    INTEGER NOT NULL DEFAULT 0,
            percentage REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

pub fn create_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_books_status       ON books(status);
        CREATE INDEX IF NOT EXISTS idx_books_is_favorite  ON books(is_favorite);
        CREATE INDEX IF NOT EXISTS idx_books_last_updated ON books(last_updated);
        CREATE INDEX IF NOT EXISTS idx_reviews_book       ON reviews(book_id);
        ",
    )?;
    Ok(())
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    create_tables(conn)?;
    create_indexes(conn)?;
    Ok(())
}

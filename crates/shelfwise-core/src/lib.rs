//! Reading-tracker core: book records, derived collection statistics, the
//! favorites store and a local SQLite library.

pub mod config;
pub mod error;
pub mod favorites;
pub mod models;
pub mod query;
pub mod source;
pub mod stats;
pub mod storage;

pub use config::AppConfig;
pub use error::{ExitCode, Result, ShelfError};
pub use models::*;

pub use favorites::{FavoritesStats, FavoritesStore, FavoritesTab, ToggleOutcome};
pub use query::{paginate, BookQuery, Page, SortOrder};
pub use source::{BookFilter, BookSource, FavoritePersister, MemoryLibrary};
pub use stats::*;

pub use storage::database::{open_database, open_in_memory, ChallengeUpdate, ConnectionPool, Database};
pub use storage::repositories::{
    BookRepository, ChallengeRepository, Repository, ReviewRepository, SqliteBookRepository,
    SqliteChallengeRepository, SqliteReviewRepository,
};
pub use storage::rows::{parse_datetime, BookRow, ReviewRow};

//! Seams to whatever holds the authoritative copy of the collection.
//!
//! The pure parts of the crate (statistics, favorites, queries) only ever see
//! snapshots produced through [`BookSource`]; writing a favorite flag back goes
//! through [`FavoritePersister`]. [`Database`](crate::Database) implements both.

use std::sync::{Mutex, MutexGuard};

use crate::error::{Result, ShelfError};
use crate::models::{BookRecord, ReadingStatus};

/// Narrows a snapshot to one shelf and/or to favorites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub status: Option<ReadingStatus>,
    pub favorites_only: bool,
}

impl BookFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_status(status: ReadingStatus) -> Self {
        Self {
            status: Some(status),
            favorites_only: false,
        }
    }

    pub fn favorites() -> Self {
        Self {
            status: None,
            favorites_only: true,
        }
    }

    pub fn matches(&self, book: &BookRecord) -> bool {
        self.status.is_none_or(|s| book.status == s) && (!self.favorites_only || book.is_favorite)
    }
}

pub trait BookSource {
    /// Complete point-in-time snapshot, most recently updated first.
    fn load_books(&self, filter: &BookFilter) -> Result<Vec<BookRecord>>;
}

pub trait FavoritePersister {
    /// Store the favorite flag and bump `last_updated`. Unknown ids are
    /// reported as [`ShelfError::BookNotFound`].
    fn persist_favorite(&self, book_id: &str, is_favorite: bool) -> Result<()>;
}

impl BookSource for [BookRecord] {
    fn load_books(&self, filter: &BookFilter) -> Result<Vec<BookRecord>> {
        let mut books: Vec<BookRecord> = self.iter().filter(|b| filter.matches(b)).cloned().collect();
        books.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(books)
    }
}

/// Collection held entirely in memory. Handy for tests and for callers that
/// already have a full snapshot.
#[derive(Debug, Default)]
pub struct MemoryLibrary {
    books: Mutex<Vec<BookRecord>>,
}

impl MemoryLibrary {
    pub fn new(books: Vec<BookRecord>) -> Self {
        Self {
            books: Mutex::new(books),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<BookRecord>> {
        self.books.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BookSource for MemoryLibrary {
    fn load_books(&self, filter: &BookFilter) -> Result<Vec<BookRecord>> {
        self.lock().as_slice().load_books(filter)
    }
}

impl FavoritePersister for MemoryLibrary {
    fn persist_favorite(&self, book_id: &str, is_favorite: bool) -> Result<()> {
        let mut books = self.lock();
        let book = books
            .iter_mut()
            .find(|b| b.id == book_id)
            .ok_or_else(|| ShelfError::BookNotFound(book_id.to_string()))?;
        book.set_favorite(is_favorite);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::favorites::{FavoritesStore, ToggleOutcome};

    fn books() -> Vec<BookRecord> {
        let now = Utc::now();
        let mut a = BookRecord::new("A", "x");
        a.id = "a".into();
        a.last_updated = now - Duration::hours(2);
        let mut b = BookRecord::new("B", "y");
        b.id = "b".into();
        b.is_favorite = true;
        b.status = ReadingStatus::Completed;
        b.last_updated = now;
        let mut c = BookRecord::new("C", "z");
        c.id = "c".into();
        c.status = ReadingStatus::Completed;
        c.last_updated = now - Duration::hours(1);
        vec![a, b, c]
    }

    #[test]
    fn test_in_memory_source_filters_and_orders() {
        let source = MemoryLibrary::new(books());
        let all = source.load_books(&BookFilter::all()).unwrap();
        let ids: Vec<&str> = all.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        let done = source.load_books(&BookFilter::by_status(ReadingStatus::Completed)).unwrap();
        assert_eq!(done.len(), 2);

        let favs = source.load_books(&BookFilter::favorites()).unwrap();
        assert_eq!(favs.len(), 1);
        assert_eq!(favs[0].id, "b");
    }

    #[test]
    fn test_persist_favorite_bumps_last_updated() {
        let library = MemoryLibrary::new(books());
        let before = library.load_books(&BookFilter::all()).unwrap();
        let old = before.iter().find(|b| b.id == "a").unwrap().last_updated;

        library.persist_favorite("a", true).unwrap();
        let after = library.load_books(&BookFilter::favorites()).unwrap();
        let a = after.iter().find(|b| b.id == "a").unwrap();
        assert!(a.is_favorite);
        assert!(a.last_updated > old);

        assert!(library.persist_favorite("ghost", true).unwrap_err().is_not_found());
    }

    #[test]
    fn test_failed_persist_rolled_back_by_second_toggle() {
        let library = MemoryLibrary::new(books());
        let mut store = FavoritesStore::new(library.load_books(&BookFilter::all()).unwrap(), 3);
        let before = store.stats().clone();

        let outcome = store.toggle_favorite("c");
        assert_eq!(outcome, ToggleOutcome::Added);
        // Simulate the write going to a record the backend no longer has.
        if library.persist_favorite("c-deleted", true).is_err() {
            store.toggle_favorite("c");
        }
        assert!(!store.is_favorite("c"));
        assert_eq!(*store.stats(), before);
    }
}

//! In-memory mirror of the favorited part of a collection.
//!
//! The store owns a snapshot of the whole collection (the catalog) and keeps
//! three views consistent with it after every mutation: the favorites
//! themselves, a short "recently added" list and the collection statistics of
//! the favorites. Nothing here touches storage; pairing a toggle with
//! [`FavoritePersister`](crate::source::FavoritePersister) is up to the caller.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{BookRecord, ReadingStatus};
use crate::query::matches_text;
use crate::stats::{compute_collection_stats, CollectionStats, NamedCount};

/// Length of the recently-added list unless configured otherwise.
pub const DEFAULT_RECENT_LIMIT: usize = 3;

/// Overview card numbers for the favorites collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FavoritesStats {
    pub total_favorites: usize,
    pub top_genre: NamedCount,
    pub favorite_author: NamedCount,
    pub average_rating: f64,
}

impl From<CollectionStats> for FavoritesStats {
    fn from(stats: CollectionStats) -> Self {
        Self {
            total_favorites: stats.total_count,
            top_genre: stats.top_genre,
            favorite_author: stats.top_author,
            average_rating: stats.average_rating,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// The id is not in the catalog; nothing changed.
    NotFound,
}

impl ToggleOutcome {
    /// Favorite flag after the toggle, if anything changed.
    pub fn new_state(self) -> Option<bool> {
        match self {
            Self::Added => Some(true),
            Self::Removed => Some(false),
            Self::NotFound => None,
        }
    }
}

/// Which shelf the favorites listing is narrowed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FavoritesTab {
    #[default]
    All,
    Shelf(ReadingStatus),
}

impl std::str::FromStr for FavoritesTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            other => other
                .parse::<ReadingStatus>()
                .map(Self::Shelf)
                .map_err(|_| format!("Invalid favorites tab: {s}")),
        }
    }
}

/// What the latest toggle changed, kept so that toggling the same id again
/// restores the previous state exactly.
#[derive(Debug, Clone)]
enum LastToggle {
    Added {
        id: String,
        /// Entry pushed off the end of the recently-added list.
        evicted: Option<BookRecord>,
    },
    Removed {
        id: String,
        favorites_slot: usize,
        recent_slot: Option<usize>,
    },
}

#[derive(Debug, Clone)]
pub struct FavoritesStore {
    catalog: Vec<BookRecord>,
    /// In the order the books were favorited.
    favorites: Vec<BookRecord>,
    recently_added: Vec<BookRecord>,
    recent_limit: usize,
    stats: FavoritesStats,
    last_toggle: Option<LastToggle>,
}

impl FavoritesStore {
    pub fn new(catalog: Vec<BookRecord>, recent_limit: usize) -> Self {
        let mut store = Self {
            catalog: Vec::new(),
            favorites: Vec::new(),
            recently_added: Vec::new(),
            recent_limit,
            stats: FavoritesStats::default(),
            last_toggle: None,
        };
        store.reload(catalog);
        store
    }

    /// Replace the catalog with a fresh snapshot and rebuild every view.
    ///
    /// Favorites keep catalog order; the recently-added list is reseeded
    /// from `date_added`, newest first. Later duplicates of an id are dropped.
    pub fn reload(&mut self, catalog: Vec<BookRecord>) {
        let mut seen = HashSet::new();
        self.catalog = catalog
            .into_iter()
            .filter(|b| seen.insert(b.id.clone()))
            .collect();

        self.favorites = self.catalog.iter().filter(|b| b.is_favorite).cloned().collect();

        let mut seeded = self.favorites.clone();
        seeded.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        seeded.truncate(self.recent_limit);
        self.recently_added = seeded;
        self.last_toggle = None;

        self.recompute_stats();
        debug!(
            catalog = self.catalog.len(),
            favorites = self.favorites.len(),
            "favorites store reloaded"
        );
    }

    /// Flip the favorite flag of `book_id`.
    ///
    /// Adding appends the book to the favorites and puts it at the front of
    /// the recently-added list, dropping the oldest entry past the bound.
    /// Removing takes it out of both; the recently-added list shrinks and is
    /// not refilled. Toggling the id of the previous toggle again undoes it
    /// exactly. Unknown ids change nothing. Statistics are recomputed before
    /// this returns.
    pub fn toggle_favorite(&mut self, book_id: &str) -> ToggleOutcome {
        let Some(book) = self.catalog.iter_mut().find(|b| b.id == book_id) else {
            debug!(book_id, "toggle ignored: unknown book");
            return ToggleOutcome::NotFound;
        };

        // The flag is mirrored without bumping `last_updated`; that timestamp
        // belongs to whoever persists the change.
        book.is_favorite = !book.is_favorite;
        let record = book.clone();

        let previous = self.last_toggle.take();
        let outcome = if record.is_favorite {
            self.add(record, previous);
            ToggleOutcome::Added
        } else {
            self.remove(book_id, previous);
            ToggleOutcome::Removed
        };

        self.recompute_stats();
        debug!(book_id, ?outcome, favorites = self.favorites.len(), "favorite toggled");
        outcome
    }

    fn add(&mut self, record: BookRecord, previous: Option<LastToggle>) {
        match previous {
            Some(LastToggle::Removed {
                id,
                favorites_slot,
                recent_slot,
            }) if id == record.id => {
                if let Some(slot) = recent_slot {
                    let slot = slot.min(self.recently_added.len());
                    self.recently_added.insert(slot, record.clone());
                }
                let slot = favorites_slot.min(self.favorites.len());
                self.favorites.insert(slot, record);
                return;
            }
            _ => {}
        }

        let mut evicted = None;
        if self.recent_limit > 0 {
            self.recently_added.insert(0, record.clone());
            if self.recently_added.len() > self.recent_limit {
                evicted = self.recently_added.pop();
            }
        }
        self.last_toggle = Some(LastToggle::Added {
            id: record.id.clone(),
            evicted,
        });
        self.favorites.push(record);
    }

    fn remove(&mut self, book_id: &str, previous: Option<LastToggle>) {
        let favorites_slot = self.favorites.iter().position(|b| b.id == book_id);
        if let Some(slot) = favorites_slot {
            self.favorites.remove(slot);
        }
        let recent_slot = self.recently_added.iter().position(|b| b.id == book_id);
        if let Some(slot) = recent_slot {
            self.recently_added.remove(slot);
        }

        match previous {
            Some(LastToggle::Added { id, evicted }) if id == book_id => {
                self.recently_added.extend(evicted);
                return;
            }
            _ => {}
        }

        self.last_toggle = Some(LastToggle::Removed {
            id: book_id.to_string(),
            favorites_slot: favorites_slot.unwrap_or(self.favorites.len()),
            recent_slot,
        });
    }

    fn recompute_stats(&mut self) {
        self.stats = compute_collection_stats(&self.favorites).into();
    }

    /// Current favorites, in the order they were favorited.
    pub fn favorites(&self) -> &[BookRecord] {
        &self.favorites
    }

    /// Most recently favorited first, at most `recent_limit` entries.
    pub fn recently_added(&self) -> &[BookRecord] {
        &self.recently_added
    }

    pub fn stats(&self) -> &FavoritesStats {
        &self.stats
    }

    pub fn catalog(&self) -> &[BookRecord] {
        &self.catalog
    }

    pub fn recent_limit(&self) -> usize {
        self.recent_limit
    }

    pub fn is_favorite(&self, book_id: &str) -> bool {
        self.favorites.iter().any(|b| b.id == book_id)
    }

    /// Favorites matching `query` (title, author or genre) on the given tab.
    pub fn filter(&self, query: &str, tab: FavoritesTab) -> Vec<&BookRecord> {
        self.favorites
            .iter()
            .filter(|b| matches_text(b, query))
            .filter(|b| match tab {
                FavoritesTab::All => true,
                FavoritesTab::Shelf(status) => b.status == status,
            })
            .collect()
    }
}

impl Default for FavoritesStore {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_RECENT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn book(id: &str, genre: &str, author: &str, rating: Option<u8>) -> BookRecord {
        let mut b = BookRecord::new(format!("Book {id}"), author);
        b.id = id.to_string();
        b.genre = genre.to_string();
        b.rating = rating;
        b
    }

    fn catalog() -> Vec<BookRecord> {
        vec![
            book("a", "Fiction", "Le Guin", Some(5)),
            book("b", "Drama", "Ibsen", Some(3)),
            book("c", "Fiction, Fantasy", "Le Guin", None),
            book("d", "Poetry", "Rilke", Some(4)),
            book("e", "Drama", "Chekhov", Some(2)),
        ]
    }

    fn ids(books: &[BookRecord]) -> Vec<&str> {
        books.iter().map(|b| b.id.as_str()).collect()
    }

    fn snapshot(store: &FavoritesStore) -> (Vec<BookRecord>, Vec<BookRecord>, FavoritesStats) {
        (
            store.favorites().to_vec(),
            store.recently_added().to_vec(),
            store.stats().clone(),
        )
    }

    #[test]
    fn test_empty_store() {
        let store = FavoritesStore::default();
        assert!(store.favorites().is_empty());
        assert!(store.recently_added().is_empty());
        assert_eq!(store.stats().total_favorites, 0);
        assert_eq!(store.stats().top_genre, NamedCount::default());
        assert_eq!(store.stats().average_rating, 0.0);
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut store = FavoritesStore::new(catalog(), 3);
        assert_eq!(store.toggle_favorite("a"), ToggleOutcome::Added);
        assert!(store.is_favorite("a"));
        assert_eq!(ids(store.recently_added()), vec!["a"]);
        assert_eq!(store.stats().total_favorites, 1);
        assert_eq!(store.stats().average_rating, 5.0);

        assert_eq!(store.toggle_favorite("a"), ToggleOutcome::Removed);
        assert!(!store.is_favorite("a"));
        assert!(store.recently_added().is_empty());
        assert_eq!(store.stats().total_favorites, 0);
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut store = FavoritesStore::new(catalog(), 3);
        store.toggle_favorite("b");
        let before = snapshot(&store);

        assert_eq!(store.toggle_favorite("zzz"), ToggleOutcome::NotFound);
        assert_eq!(snapshot(&store), before);
    }

    #[test]
    fn test_double_toggle_restores_state() {
        let mut store = FavoritesStore::new(catalog(), 3);
        for id in ["a", "b", "c"] {
            store.toggle_favorite(id);
        }

        for id in ["a", "b", "c", "d", "e"] {
            let before = snapshot(&store);
            store.toggle_favorite(id);
            store.toggle_favorite(id);
            let after = snapshot(&store);
            assert_eq!(after.0, before.0, "favorites differ after double toggle of {id}");
            assert_eq!(after.1, before.1, "recent list differs after double toggle of {id}");
            assert_eq!(after.2, before.2, "stats differ after double toggle of {id}");
        }
    }

    #[test]
    fn test_readd_after_other_toggle_goes_to_front() {
        let mut store = FavoritesStore::new(catalog(), 3);
        for id in ["a", "b", "c"] {
            store.toggle_favorite(id);
        }
        store.toggle_favorite("b");
        store.toggle_favorite("d");
        store.toggle_favorite("b");
        assert_eq!(ids(store.recently_added()), vec!["b", "d", "c"]);
    }

    #[test]
    fn test_recently_added_is_bounded() {
        let mut store = FavoritesStore::new(catalog(), 3);
        for id in ["a", "b", "c", "d", "e"] {
            store.toggle_favorite(id);
        }
        assert_eq!(ids(store.recently_added()), vec!["e", "d", "c"]);
        assert_eq!(store.favorites().len(), 5);
    }

    #[test]
    fn test_removal_shrinks_recent_list() {
        let mut store = FavoritesStore::new(catalog(), 3);
        for id in ["a", "b", "c", "d", "e"] {
            store.toggle_favorite(id);
        }
        store.toggle_favorite("a");
        assert_eq!(ids(store.recently_added()), vec!["e", "d", "c"]);

        store.toggle_favorite("d");
        assert_eq!(ids(store.recently_added()), vec!["e", "c"]);
        assert_eq!(ids(store.favorites()), vec!["b", "c", "e"]);
    }

    #[test]
    fn test_favorites_keep_toggle_order() {
        let mut store = FavoritesStore::new(
            vec![
                book("a", "Drama", "Ibsen", None),
                book("b", "Fiction", "Le Guin", None),
            ],
            3,
        );
        store.toggle_favorite("b");
        store.toggle_favorite("a");

        assert_eq!(ids(store.favorites()), vec!["b", "a"]);
        assert_eq!(store.stats().top_genre, NamedCount::new("Fiction", 1));
        assert_eq!(store.stats().favorite_author, NamedCount::new("Le Guin", 1));
    }

    #[test]
    fn test_add_then_remove_restores_evicted_entry() {
        let mut store = FavoritesStore::new(catalog(), 3);
        for id in ["a", "b", "c"] {
            store.toggle_favorite(id);
        }
        store.toggle_favorite("d");
        assert_eq!(ids(store.recently_added()), vec!["d", "c", "b"]);

        store.toggle_favorite("d");
        assert_eq!(ids(store.recently_added()), vec!["c", "b", "a"]);
        assert_eq!(ids(store.favorites()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_eviction_not_restored_after_other_toggle() {
        let mut store = FavoritesStore::new(catalog(), 3);
        for id in ["a", "b", "c", "d"] {
            store.toggle_favorite(id);
        }
        store.toggle_favorite("e");
        store.toggle_favorite("d");
        assert_eq!(ids(store.recently_added()), vec!["e", "c"]);
    }

    #[test]
    fn test_zero_recent_limit() {
        let mut store = FavoritesStore::new(catalog(), 0);
        store.toggle_favorite("a");
        store.toggle_favorite("a");
        store.toggle_favorite("b");
        assert!(store.recently_added().is_empty());
        assert_eq!(ids(store.favorites()), vec!["b"]);
    }

    #[test]
    fn test_stats_track_membership() {
        let mut store = FavoritesStore::new(catalog(), 3);
        let sequence = ["a", "c", "b", "a", "e", "zzz", "c", "d", "b"];
        for id in sequence {
            store.toggle_favorite(id);
            assert_eq!(store.stats().total_favorites, store.favorites().len());
            assert_eq!(
                *store.stats(),
                FavoritesStats::from(compute_collection_stats(store.favorites()))
            );
        }
    }

    #[test]
    fn test_stats_over_favorites() {
        let mut store = FavoritesStore::new(catalog(), 3);
        for id in ["a", "c", "b"] {
            store.toggle_favorite(id);
        }
        let stats = store.stats();
        assert_eq!(stats.top_genre, NamedCount::new("Fiction", 2));
        assert_eq!(stats.favorite_author, NamedCount::new("Le Guin", 2));
        assert_eq!(stats.average_rating, 4.0);
    }

    #[test]
    fn test_reload_seeds_recent_by_date_added() {
        let now = Utc::now();
        let mut books = catalog();
        for (i, b) in books.iter_mut().enumerate() {
            b.is_favorite = i != 1;
            b.date_added = now - Duration::days(i as i64);
        }
        let store = FavoritesStore::new(books, 3);
        assert_eq!(ids(store.favorites()), vec!["a", "c", "d", "e"]);
        assert_eq!(ids(store.recently_added()), vec!["a", "c", "d"]);
        assert_eq!(store.stats().total_favorites, 4);
    }

    #[test]
    fn test_reload_drops_duplicate_ids() {
        let mut books = catalog();
        books.push(book("a", "Horror", "Someone", None));
        let store = FavoritesStore::new(books, 3);
        assert_eq!(store.catalog().len(), 5);
        assert_eq!(store.catalog()[0].genre, "Fiction");
    }

    #[test]
    fn test_toggle_mirrors_flag_in_catalog() {
        let mut store = FavoritesStore::new(catalog(), 3);
        let updated = store.catalog()[3].last_updated;
        store.toggle_favorite("d");
        assert!(store.catalog()[3].is_favorite);
        assert_eq!(store.catalog()[3].last_updated, updated);
    }

    #[test]
    fn test_filter_by_query_and_tab() {
        let mut books = catalog();
        books[0].status = ReadingStatus::Completed;
        let mut store = FavoritesStore::new(books, 3);
        for id in ["a", "b", "c"] {
            store.toggle_favorite(id);
        }

        assert_eq!(store.filter("le guin", FavoritesTab::All).len(), 2);
        assert_eq!(store.filter("", FavoritesTab::Shelf(ReadingStatus::Completed)).len(), 1);
        assert_eq!(store.filter("fantasy", FavoritesTab::Shelf(ReadingStatus::WantToRead)).len(), 1);
        assert!(store.filter("rilke", FavoritesTab::All).is_empty());
    }

    #[test]
    fn test_tab_parse() {
        assert_eq!("all".parse::<FavoritesTab>().unwrap(), FavoritesTab::All);
        assert_eq!(
            "currently-reading".parse::<FavoritesTab>().unwrap(),
            FavoritesTab::Shelf(ReadingStatus::CurrentlyReading)
        );
        assert!("everything".parse::<FavoritesTab>().is_err());
    }

    #[test]
    fn test_independent_instances() {
        let mut first = FavoritesStore::new(catalog(), 3);
        let second = FavoritesStore::new(catalog(), 3);
        first.toggle_favorite("a");
        assert!(first.is_favorite("a"));
        assert!(!second.is_favorite("a"));
    }
}

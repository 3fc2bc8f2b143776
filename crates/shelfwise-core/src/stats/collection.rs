//! Collection-level summaries: top genre, top author, average rating,
//! shelf counts and the genre breakdown.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{BookRecord, ReadingStatus};

/// Name with the number of books it accounts for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

impl NamedCount {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Derived summary of a list of books. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub total_count: usize,
    pub top_genre: NamedCount,
    pub top_author: NamedCount,
    /// Mean of the ratings that are present and within 1..=5; 0 when none are.
    pub average_rating: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfCounts {
    pub want_to_read: usize,
    pub currently_reading: usize,
    pub completed: usize,
}

impl ShelfCounts {
    pub fn get(&self, status: ReadingStatus) -> usize {
        match status {
            ReadingStatus::WantToRead => self.want_to_read,
            ReadingStatus::CurrentlyReading => self.currently_reading,
            ReadingStatus::Completed => self.completed,
        }
    }

    pub fn total(&self) -> usize {
        self.want_to_read + self.currently_reading + self.completed
    }
}

/// Label used in the genre breakdown for books without any genre.
pub const UNKNOWN_GENRE: &str = "Unknown";

pub fn compute_collection_stats(books: &[BookRecord]) -> CollectionStats {
    CollectionStats {
        total_count: books.len(),
        top_genre: leader(tally(books.iter().map(BookRecord::main_genre))),
        top_author: leader(tally(books.iter().map(|b| b.author.as_str()))),
        average_rating: average_rating(books),
    }
}

pub fn average_rating(books: &[BookRecord]) -> f64 {
    let (sum, rated) = books
        .iter()
        .filter_map(BookRecord::valid_rating)
        .fold((0u32, 0u32), |(sum, n), r| (sum + u32::from(r), n + 1));

    if rated == 0 {
        0.0
    } else {
        f64::from(sum) / f64::from(rated)
    }
}

pub fn compute_shelf_counts(books: &[BookRecord]) -> ShelfCounts {
    let mut counts = ShelfCounts::default();
    for book in books {
        match book.status {
            ReadingStatus::WantToRead => counts.want_to_read += 1,
            ReadingStatus::CurrentlyReading => counts.currently_reading += 1,
            ReadingStatus::Completed => counts.completed += 1,
        }
    }
    counts
}

/// Main-genre histogram, largest first. Equal counts keep first-seen order.
pub fn genre_distribution(books: &[BookRecord]) -> Vec<NamedCount> {
    let mut entries: Vec<NamedCount> = tally(books.iter().map(BookRecord::main_genre))
        .into_iter()
        .map(|(name, count)| {
            let name = if name.is_empty() { UNKNOWN_GENRE } else { name };
            NamedCount::new(name, count)
        })
        .collect();

    // Empty genres and a literal "Unknown" genre land in separate tally
    // buckets; fold them together.
    let mut merged: Vec<NamedCount> = Vec::with_capacity(entries.len());
    for entry in entries.drain(..) {
        match merged.iter_mut().find(|m| m.name == entry.name) {
            Some(existing) => existing.count += entry.count,
            None => merged.push(entry),
        }
    }

    merged.sort_by(|a, b| b.count.cmp(&a.count));
    merged
}

/// Occurrence counts in first-seen order.
fn tally<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut order: Vec<(&'a str, usize)> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for key in keys {
        match index.get(key) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(key, order.len());
                order.push((key, 1));
            }
        }
    }
    order
}

/// First entry holding the maximum count. A later equal count does not
/// replace it.
fn leader(counts: Vec<(&str, usize)>) -> NamedCount {
    let mut best = NamedCount::default();
    for (name, count) in counts {
        if count > best.count {
            best = NamedCount::new(name, count);
        }
    }
    best
}

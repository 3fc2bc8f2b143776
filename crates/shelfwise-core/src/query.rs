//! In-memory listing: text search, field filters, sorting and paging over a
//! snapshot of books.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{BookRecord, ReadingStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Newest `date_added` first.
    #[default]
    RecentlyAdded,
    Title,
    Author,
    /// Highest completion percentage first; books without progress count as 0.
    Progress,
    /// Newest `last_updated` first.
    LastUpdated,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RecentlyAdded => "recently-added",
            Self::Title => "title",
            Self::Author => "author",
            Self::Progress => "progress",
            Self::LastUpdated => "last-updated",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recently-added" => Ok(Self::RecentlyAdded),
            "title" => Ok(Self::Title),
            "author" => Ok(Self::Author),
            "progress" => Ok(Self::Progress),
            "last-updated" => Ok(Self::LastUpdated),
            _ => Err(format!("Invalid SortOrder: {s}")),
        }
    }
}

/// Filters combine with AND; empty strings are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookQuery {
    /// Matches title, author or genre.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReadingStatus>,
    #[serde(default)]
    pub favorites_only: bool,
    #[serde(default)]
    pub sort: SortOrder,
}

impl BookQuery {
    pub fn matches(&self, book: &BookRecord) -> bool {
        matches_text(book, &self.text)
            && contains_ci(&book.title, &self.title)
            && contains_ci(&book.author, &self.author)
            && contains_ci(&book.genre, &self.genre)
            && self.status.is_none_or(|s| book.status == s)
            && (!self.favorites_only || book.is_favorite)
    }

    /// Matching books in the requested order. The input is left untouched.
    pub fn apply<'a>(&self, books: &'a [BookRecord]) -> Vec<&'a BookRecord> {
        let mut result: Vec<&BookRecord> = books.iter().filter(|b| self.matches(b)).collect();
        sort_books(&mut result, self.sort);
        result
    }
}

/// Case-insensitive match of `needle` against title, author or genre.
pub fn matches_text(book: &BookRecord, needle: &str) -> bool {
    needle.is_empty()
        || contains_ci(&book.title, needle)
        || contains_ci(&book.author, needle)
        || contains_ci(&book.genre, needle)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn sort_books(books: &mut [&BookRecord], order: SortOrder) {
    books.sort_by(|a, b| compare(a, b, order));
}

fn compare(a: &BookRecord, b: &BookRecord, order: SortOrder) -> Ordering {
    match order {
        SortOrder::RecentlyAdded => b.date_added.cmp(&a.date_added),
        SortOrder::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortOrder::Author => a.author.to_lowercase().cmp(&b.author.to_lowercase()),
        SortOrder::Progress => progress_of(b).cmp(&progress_of(a)),
        SortOrder::LastUpdated => b.last_updated.cmp(&a.last_updated),
    }
}

fn progress_of(book: &BookRecord) -> u8 {
    book.progress.map(|p| p.percentage).unwrap_or(0)
}

// ─── Paging ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice out one page. Pages are 1-based; page 0 reads as 1 and pages past
/// the end read as the last page. There is always at least one page.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total_items);

    Page {
        items: items[start..end].to_vec(),
        page,
        total_pages,
        total_items,
    }
}

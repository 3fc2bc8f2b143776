use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ShelfError};

// ─── ReadingStatus ──────────────────────────────────────────

/// Shelf a book sits on. Exactly one at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingStatus {
    #[default]
    WantToRead,
    CurrentlyReading,
    Completed,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [
        ReadingStatus::WantToRead,
        ReadingStatus::CurrentlyReading,
        ReadingStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WantToRead => "want-to-read",
            Self::CurrentlyReading => "currently-reading",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReadingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "want-to-read" => Ok(Self::WantToRead),
            "currently-reading" => Ok(Self::CurrentlyReading),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid ReadingStatus: {s}")),
        }
    }
}

// ─── Progress ───────────────────────────────────────────────

/// Reading position inside a book.
///
/// `percentage` is always `round(current_page / page_count * 100)` clamped
/// to `0..=100`; build it through [`Progress::at_page`] to keep that true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current_page: u32,
    pub percentage: u8,
}

impl Progress {
    pub fn at_page(current_page: u32, page_count: u32) -> Self {
        Self {
            current_page,
            percentage: percentage_of(current_page, page_count),
        }
    }
}

/// Whole-number completion percentage, 0 when the page count is unknown.
pub fn percentage_of(current_page: u32, page_count: u32) -> u8 {
    if page_count == 0 {
        return 0;
    }
    let pct = (f64::from(current_page) / f64::from(page_count) * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

// ─── BookRecord ─────────────────────────────────────────────

/// One catalog entry in a reader's collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    pub author: String,

    #[serde(default)]
    pub cover_image: String,

    #[serde(default)]
    pub description: String,

    /// Comma-separated genre tags. The first one is the main genre.
    #[serde(default)]
    pub genre: String,

    #[serde(default)]
    pub page_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_reading: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_reading: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,

    #[serde(default)]
    pub status: ReadingStatus,

    #[serde(default)]
    pub is_favorite: bool,

    pub date_added: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl BookRecord {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            title: title.into(),
            author: author.into(),
            cover_image: String::new(),
            description: String::new(),
            genre: String::new(),
            page_count: 0,
            progress: None,
            started_reading: None,
            finished_reading: None,
            rating: None,
            status: ReadingStatus::default(),
            is_favorite: false,
            date_added: now,
            last_updated: now,
        }
    }

    /// First comma-separated genre segment, trimmed.
    ///
    /// Falls back to the whole trimmed field when the first segment is empty
    /// (e.g. `", Fantasy"`).
    pub fn main_genre(&self) -> &str {
        main_genre_of(&self.genre)
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    /// Record the current page. Pages past the end are clamped when the
    /// page count is known.
    pub fn update_progress(&mut self, current_page: u32) {
        let page = if self.page_count > 0 {
            current_page.min(self.page_count)
        } else {
            current_page
        };
        self.progress = Some(Progress::at_page(page, self.page_count));
        self.touch();
    }

    /// Move the book to another shelf, stamping reading dates on the way.
    pub fn set_status(&mut self, status: ReadingStatus) {
        let now = Utc::now();
        match status {
            ReadingStatus::CurrentlyReading => {
                self.started_reading.get_or_insert(now);
            }
            ReadingStatus::Completed => {
                self.finished_reading.get_or_insert(now);
            }
            ReadingStatus::WantToRead => {}
        }
        self.status = status;
        self.touch();
    }

    pub fn set_rating(&mut self, rating: Option<u8>) -> Result<()> {
        if let Some(r) = rating {
            validate_rating(r)?;
        }
        self.rating = rating;
        self.touch();
        Ok(())
    }

    pub fn set_favorite(&mut self, is_favorite: bool) {
        self.is_favorite = is_favorite;
        self.touch();
    }

    /// Rating usable for averages: present and within 1..=5.
    pub fn valid_rating(&self) -> Option<u8> {
        self.rating.filter(|r| (1..=5).contains(r))
    }
}

pub(crate) fn main_genre_of(genre: &str) -> &str {
    let first = genre.split(',').next().unwrap_or_default().trim();
    if first.is_empty() { genre.trim() } else { first }
}

pub(crate) fn validate_rating(rating: u8) -> Result<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(ShelfError::ValidationError(format!(
            "rating must be between 1 and 5, got {rating}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_record_new() {
        let book = BookRecord::new("Dune", "Frank Herbert");
        assert_eq!(book.title, "Dune");
        assert_eq!(book.status, ReadingStatus::WantToRead);
        assert!(!book.is_favorite);
        assert!(book.progress.is_none());
        assert_eq!(book.date_added, book.last_updated);
        assert!(!book.id.is_empty());
    }

    #[test]
    fn test_main_genre() {
        let mut book = BookRecord::new("t", "a");
        book.genre = "Fiction, Fantasy".to_string();
        assert_eq!(book.main_genre(), "Fiction");

        book.genre = "  Sci-Fi  ".to_string();
        assert_eq!(book.main_genre(), "Sci-Fi");

        book.genre = ", Fantasy".to_string();
        assert_eq!(book.main_genre(), ", Fantasy");

        book.genre = String::new();
        assert_eq!(book.main_genre(), "");
    }

    #[test]
    fn test_percentage_rounds_and_clamps() {
        assert_eq!(percentage_of(1, 3), 33);
        assert_eq!(percentage_of(2, 3), 67);
        assert_eq!(percentage_of(500, 100), 100);
        assert_eq!(percentage_of(10, 0), 0);
    }

    #[test]
    fn test_update_progress_clamps_page() {
        let mut book = BookRecord::new("t", "a");
        book.page_count = 200;
        book.update_progress(50);
        assert_eq!(book.progress, Some(Progress { current_page: 50, percentage: 25 }));

        book.update_progress(999);
        assert_eq!(book.progress, Some(Progress { current_page: 200, percentage: 100 }));
    }

    #[test]
    fn test_set_status_stamps_dates() {
        let mut book = BookRecord::new("t", "a");
        book.set_status(ReadingStatus::CurrentlyReading);
        let started = book.started_reading.expect("started stamped");
        assert!(book.finished_reading.is_none());

        book.set_status(ReadingStatus::Completed);
        assert_eq!(book.started_reading, Some(started), "start date is kept");
        assert!(book.finished_reading.is_some());
        assert_eq!(book.status, ReadingStatus::Completed);
    }

    #[test]
    fn test_set_rating_rejects_out_of_range() {
        let mut book = BookRecord::new("t", "a");
        assert!(book.set_rating(Some(6)).is_err());
        assert!(book.set_rating(Some(0)).is_err());
        assert!(book.rating.is_none());
        book.set_rating(Some(4)).unwrap();
        assert_eq!(book.rating, Some(4));
        book.set_rating(None).unwrap();
        assert!(book.rating.is_none());
    }

    #[test]
    fn test_valid_rating_filters_range() {
        let mut book = BookRecord::new("t", "a");
        book.rating = Some(9);
        assert_eq!(book.valid_rating(), None);
        book.rating = Some(3);
        assert_eq!(book.valid_rating(), Some(3));
    }

    #[test]
    fn test_reading_status_wire_names() {
        assert_eq!(ReadingStatus::CurrentlyReading.to_string(), "currently-reading");
        assert_eq!("completed".parse::<ReadingStatus>().unwrap(), ReadingStatus::Completed);
        assert!("read".parse::<ReadingStatus>().is_err());
        let json = serde_json::to_string(&ReadingStatus::WantToRead).unwrap();
        assert_eq!(json, "\"want-to-read\"");
    }

    #[test]
    fn test_book_record_json_roundtrip() {
        let mut book = BookRecord::new("Emma", "Jane Austen");
        book.genre = "Classic, Romance".to_string();
        book.page_count = 474;
        book.update_progress(100);
        book.rating = Some(5);

        let json = serde_json::to_string_pretty(&book).unwrap();
        let restored: BookRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, book);
    }
}

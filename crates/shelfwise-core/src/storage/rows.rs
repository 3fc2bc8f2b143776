//! Row shapes of the `books` and `reviews` tables and the total mappings
//! between them and the domain models.
//!
//! Every optional column has an explicit default, so nothing half-parsed
//! reaches the statistics code.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{BookRecord, Progress, ReadingStatus, Review};

/// One row of the `books` table, column for column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRow {
    pub id: String,
    pub title: String,
    pub author: String,
    pub cover_image: String,
    pub description: String,
    pub genre: String,
    pub page_count: i64,
    pub current_page: Option<i64>,
    pub progress_percentage: Option<f64>,
    pub started_reading: Option<String>,
    pub finished_reading: Option<String>,
    pub rating: Option<i64>,
    pub status: String,
    pub is_favorite: bool,
    pub date_added: String,
    pub last_updated: String,
}

impl BookRow {
    pub const COLUMNS: &'static str = "id, title, author, cover_image, description, genre, \
         page_count, current_page, progress_percentage, started_reading, finished_reading, \
         rating, status, is_favorite, date_added, last_updated";

    /// Read a row selected with [`BookRow::COLUMNS`].
    pub fn from_sql_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            cover_image: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            description: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            genre: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            page_count: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
            current_page: row.get(7)?,
            progress_percentage: row.get(8)?,
            started_reading: row.get(9)?,
            finished_reading: row.get(10)?,
            rating: row.get(11)?,
            status: row.get(12)?,
            is_favorite: row.get(13)?,
            date_added: row.get(14)?,
            last_updated: row.get(15)?,
        })
    }

    pub fn from_record(book: &BookRecord) -> Self {
        Self {
            id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            cover_image: book.cover_image.clone(),
            description: book.description.clone(),
            genre: book.genre.clone(),
            page_count: i64::from(book.page_count),
            current_page: book.progress.map(|p| i64::from(p.current_page)),
            progress_percentage: book.progress.map(|p| f64::from(p.percentage)),
            started_reading: book.started_reading.map(|d| d.to_rfc3339()),
            finished_reading: book.finished_reading.map(|d| d.to_rfc3339()),
            rating: book.rating.map(i64::from),
            status: book.status.to_string(),
            is_favorite: book.is_favorite,
            date_added: book.date_added.to_rfc3339(),
            last_updated: book.last_updated.to_rfc3339(),
        }
    }
}

impl From<BookRow> for BookRecord {
    fn from(row: BookRow) -> Self {
        let page_count = clamp_u32(row.page_count, &row.id, "page_count");

        let progress = row.progress_percentage.map(|pct| Progress {
            current_page: row
                .current_page
                .map(|p| clamp_u32(p, &row.id, "current_page"))
                .unwrap_or(0),
            percentage: if pct.is_finite() {
                pct.round().clamp(0.0, 100.0) as u8
            } else {
                0
            },
        });

        let rating = match row.rating {
            None | Some(0) => None,
            Some(r) => match u8::try_from(r) {
                Ok(r) => Some(r),
                Err(_) => {
                    warn!(book_id = %row.id, rating = r, "dropping unrepresentable rating");
                    None
                }
            },
        };

        let status = row.status.parse::<ReadingStatus>().unwrap_or_else(|e| {
            warn!(book_id = %row.id, "{e}; defaulting to want-to-read");
            ReadingStatus::WantToRead
        });

        let last_updated = parse_timestamp(&row.last_updated, &row.id, "last_updated");
        let date_added = parse_timestamp(&row.date_added, &row.id, "date_added")
            .or(last_updated)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        Self {
            started_reading: row
                .started_reading
                .as_deref()
                .and_then(|s| parse_timestamp(s, &row.id, "started_reading")),
            finished_reading: row
                .finished_reading
                .as_deref()
                .and_then(|s| parse_timestamp(s, &row.id, "finished_reading")),
            last_updated: last_updated.unwrap_or(date_added),
            date_added,
            page_count,
            progress,
            rating,
            status,
            is_favorite: row.is_favorite,
            id: row.id,
            title: row.title,
            author: row.author,
            cover_image: row.cover_image,
            description: row.description,
            genre: row.genre,
        }
    }
}

/// One row of the `reviews` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRow {
    pub id: String,
    pub book_id: String,
    pub title: String,
    pub content: String,
    pub rating: i64,
    pub date_started: Option<String>,
    pub date_finished: Option<String>,
    pub is_public: bool,
    pub is_favorite: bool,
    pub created_at: String,
}

impl ReviewRow {
    pub const COLUMNS: &'static str = "id, book_id, title, content, rating, date_started, \
         date_finished, is_public, is_favorite, created_at";

    pub fn from_sql_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            book_id: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            rating: row.get(4)?,
            date_started: row.get(5)?,
            date_finished: row.get(6)?,
            is_public: row.get::<_, Option<bool>>(7)?.unwrap_or(true),
            is_favorite: row.get::<_, Option<bool>>(8)?.unwrap_or(false),
            created_at: row.get(9)?,
        })
    }

    pub fn from_review(review: &Review) -> Self {
        Self {
            id: review.id.clone(),
            book_id: review.book_id.clone(),
            title: review.title.clone(),
            content: review.content.clone(),
            rating: i64::from(review.rating),
            date_started: review.date_started.map(|d| d.to_rfc3339()),
            date_finished: review.date_finished.map(|d| d.to_rfc3339()),
            is_public: review.is_public,
            is_favorite: review.is_favorite,
            created_at: review.created_at.to_rfc3339(),
        }
    }
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        let rating = u8::try_from(row.rating).unwrap_or_else(|_| {
            warn!(review_id = %row.id, rating = row.rating, "review rating out of range");
            0
        });
        Self {
            date_started: row
                .date_started
                .as_deref()
                .and_then(|s| parse_timestamp(s, &row.id, "date_started")),
            date_finished: row
                .date_finished
                .as_deref()
                .and_then(|s| parse_timestamp(s, &row.id, "date_finished")),
            created_at: parse_timestamp(&row.created_at, &row.id, "created_at")
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            rating,
            id: row.id,
            book_id: row.book_id,
            title: row.title,
            content: row.content,
            is_public: row.is_public,
            is_favorite: row.is_favorite,
        }
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (SQLite `CURRENT_TIMESTAMP`) and
/// bare dates, all read as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}

/// [`parse_datetime`] for a stored column. Blank is `None`; anything
/// unparsable is logged and dropped.
pub fn parse_timestamp(raw: &str, id: &str, column: &str) -> Option<DateTime<Utc>> {
    if raw.trim().is_empty() {
        return None;
    }
    let parsed = parse_datetime(raw);
    if parsed.is_none() {
        warn!(id, column, value = raw, "unparsable timestamp");
    }
    parsed
}

fn clamp_u32(value: i64, id: &str, column: &str) -> u32 {
    u32::try_from(value.max(0)).unwrap_or_else(|_| {
        warn!(id, column, value, "value too large, clamping");
        u32::MAX
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn row() -> BookRow {
        BookRow {
            id: "b1".into(),
            title: "Middlemarch".into(),
            author: "George Eliot".into(),
            cover_image: String::new(),
            description: String::new(),
            genre: "Classic, Realism".into(),
            page_count: 880,
            current_page: None,
            progress_percentage: None,
            started_reading: None,
            finished_reading: None,
            rating: None,
            status: "want-to-read".into(),
            is_favorite: false,
            date_added: "2024-01-02T03:04:05Z".into(),
            last_updated: "2024-02-02T03:04:05Z".into(),
        }
    }

    #[test]
    fn test_progress_only_when_percentage_present() {
        let mut r = row();
        r.current_page = Some(120);
        assert!(BookRecord::from(r.clone()).progress.is_none());

        r.progress_percentage = Some(13.64);
        let book = BookRecord::from(r);
        assert_eq!(book.progress, Some(Progress { current_page: 120, percentage: 14 }));
    }

    #[test]
    fn test_zero_percentage_still_builds_progress() {
        let mut r = row();
        r.progress_percentage = Some(0.0);
        let book = BookRecord::from(r);
        assert_eq!(book.progress, Some(Progress { current_page: 0, percentage: 0 }));
    }

    #[test]
    fn test_rating_defaults() {
        let mut r = row();
        r.rating = Some(0);
        assert_eq!(BookRecord::from(r.clone()).rating, None);
        r.rating = Some(4);
        assert_eq!(BookRecord::from(r.clone()).rating, Some(4));
        r.rating = Some(1000);
        assert_eq!(BookRecord::from(r).rating, None);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let mut r = row();
        r.status = "reading".into();
        r.page_count = -5;
        r.started_reading = Some("last tuesday".into());
        r.date_added = "garbage".into();
        let book = BookRecord::from(r);

        assert_eq!(book.status, ReadingStatus::WantToRead);
        assert_eq!(book.page_count, 0);
        assert!(book.started_reading.is_none());
        assert_eq!(book.date_added, Utc.with_ymd_and_hms(2024, 2, 2, 3, 4, 5).unwrap());
    }

    #[test]
    fn test_timestamp_formats() {
        let sqlite = parse_timestamp("2023-05-06 07:08:09", "x", "c").unwrap();
        assert_eq!(sqlite, Utc.with_ymd_and_hms(2023, 5, 6, 7, 8, 9).unwrap());

        let date_only = parse_timestamp("2023-05-06", "x", "c").unwrap();
        assert_eq!(date_only.day(), 6);

        let offset = parse_timestamp("2023-12-31T23:30:00-02:00", "x", "c").unwrap();
        assert_eq!(offset.year(), 2024);

        assert!(parse_timestamp("", "x", "c").is_none());
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert_eq!(
            parse_datetime(" 2024-03-01 "),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert!(parse_datetime("03/01/2024").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn test_record_row_record_is_stable() {
        let mut book = BookRecord::from(row());
        book.page_count = 300;
        book.update_progress(150);
        book.set_status(ReadingStatus::Completed);
        book.rating = Some(5);
        book.is_favorite = true;

        let back = BookRecord::from(BookRow::from_record(&book));
        assert_eq!(back, book);
    }

    #[test]
    fn test_review_row_mapping() {
        let mut review = Review::new("b1", "Slow start", "Worth it.", 4);
        review.is_public = false;
        let back = Review::from(ReviewRow::from_review(&review));
        assert_eq!(back, review);
    }
}

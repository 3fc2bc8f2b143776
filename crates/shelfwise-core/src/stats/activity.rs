//! Calendar views over finished books: per-month buckets for one year, a
//! yearly summary and the list of years worth offering.

use std::collections::BTreeSet;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::models::{BookRecord, ReadingStatus};

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Books finished in one calendar month. `month` is 0-based (Jan = 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyActivity {
    pub month: u32,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: i32,
    /// Completed books finished during the year.
    pub books_read: usize,
    /// Sum of `page_count` over those books.
    pub pages_read: u64,
}

/// Twelve buckets, January first, counting books whose `finished_reading`
/// falls in `year` (UTC). Always returns all twelve months.
pub fn compute_monthly_activity(books: &[BookRecord], year: i32) -> Vec<MonthlyActivity> {
    let mut counts = [0usize; 12];
    for finished in books.iter().filter_map(|b| b.finished_reading) {
        if finished.year() == year {
            counts[finished.month0() as usize] += 1;
        }
    }

    counts
        .iter()
        .zip(MONTH_LABELS)
        .enumerate()
        .map(|(month, (&count, label))| MonthlyActivity {
            month: month as u32,
            label: label.to_string(),
            count,
        })
        .collect()
}

pub fn compute_year_summary(books: &[BookRecord], year: i32) -> YearSummary {
    books
        .iter()
        .filter(|b| b.status == ReadingStatus::Completed)
        .filter(|b| b.finished_reading.is_some_and(|f| f.year() == year))
        .fold(YearSummary { year, ..Default::default() }, |mut acc, b| {
            acc.books_read += 1;
            acc.pages_read += u64::from(b.page_count);
            acc
        })
}

/// Upper bound on the always-listed years before the current one.
pub const MAX_EXTRA_YEARS: u32 = 100;

/// Years in which any book was started or finished, newest first. The
/// current year and the `extra_years` before it (at most
/// [`MAX_EXTRA_YEARS`]) are always listed.
pub fn available_years(books: &[BookRecord], current_year: i32, extra_years: u32) -> Vec<i32> {
    let extra = extra_years.min(MAX_EXTRA_YEARS) as i32;
    let mut years: BTreeSet<i32> = (0..=extra).map(|i| current_year.saturating_sub(i)).collect();

    for book in books {
        years.extend(book.started_reading.map(|d| d.year()));
        years.extend(book.finished_reading.map(|d| d.year()));
    }

    years.into_iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn finished(y: i32, m: u32, d: u32) -> BookRecord {
        let mut b = BookRecord::new("t", "a");
        b.status = ReadingStatus::Completed;
        b.page_count = 300;
        b.finished_reading = Some(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap());
        b
    }

    #[test]
    fn test_monthly_activity_always_twelve_buckets() {
        let empty = compute_monthly_activity(&[], 2023);
        assert_eq!(empty.len(), 12);
        assert!(empty.iter().all(|m| m.count == 0));
        assert_eq!(empty[0].label, "Jan");
        assert_eq!(empty[11].label, "Dec");
        assert!(empty.iter().enumerate().all(|(i, m)| m.month == i as u32));
    }

    #[test]
    fn test_monthly_activity_counts_target_year_only() {
        let books = vec![
            finished(2023, 3, 14),
            finished(2023, 3, 1),
            finished(2022, 3, 10),
            finished(2023, 12, 31),
            BookRecord::new("unfinished", "a"),
        ];
        let buckets = compute_monthly_activity(&books, 2023);
        assert_eq!(buckets[2].count, 2);
        assert_eq!(buckets[11].count, 1);
        assert_eq!(buckets.iter().map(|m| m.count).sum::<usize>(), 3);
    }

    #[test]
    fn test_monthly_activity_ignores_input_order() {
        let mut books = vec![finished(2023, 1, 5), finished(2023, 6, 5), finished(2023, 6, 9)];
        let forward = compute_monthly_activity(&books, 2023);
        books.reverse();
        assert_eq!(compute_monthly_activity(&books, 2023), forward);
    }

    #[test]
    fn test_year_summary_counts_completed_only() {
        let mut abandoned = finished(2023, 5, 1);
        abandoned.status = ReadingStatus::CurrentlyReading;
        let books = vec![finished(2023, 1, 1), finished(2023, 2, 1), finished(2021, 2, 1), abandoned];

        let summary = compute_year_summary(&books, 2023);
        assert_eq!(summary.year, 2023);
        assert_eq!(summary.books_read, 2);
        assert_eq!(summary.pages_read, 600);
    }

    #[test]
    fn test_available_years() {
        let mut started = BookRecord::new("t", "a");
        started.started_reading = Some(Utc.with_ymd_and_hms(2019, 7, 1, 0, 0, 0).unwrap());
        let books = vec![finished(2021, 1, 1), started, finished(2024, 1, 1)];

        assert_eq!(available_years(&books, 2024, 1), vec![2024, 2023, 2021, 2019]);
        assert_eq!(available_years(&[], 2024, 0), vec![2024]);
    }

    #[test]
    fn test_available_years_caps_extra_years() {
        let years = available_years(&[], 2024, u32::MAX);
        assert_eq!(years.len(), MAX_EXTRA_YEARS as usize + 1);
        assert_eq!(years[0], 2024);
        assert_eq!(*years.last().unwrap(), 2024 - MAX_EXTRA_YEARS as i32);
    }
}

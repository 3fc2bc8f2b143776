mod activity;
mod collection;

pub use activity::{
    available_years, compute_monthly_activity, compute_year_summary, MonthlyActivity,
    YearSummary, MAX_EXTRA_YEARS, MONTH_LABELS,
};
pub use collection::{
    average_rating, compute_collection_stats, compute_shelf_counts, genre_distribution,
    CollectionStats, NamedCount, ShelfCounts, UNKNOWN_GENRE,
};

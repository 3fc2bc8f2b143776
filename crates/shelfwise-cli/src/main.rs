use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use shelfwise_core::{
    available_years, compute_collection_stats, compute_monthly_activity, compute_shelf_counts,
    compute_year_summary, genre_distribution, paginate, parse_datetime, AppConfig, BookFilter,
    BookQuery, BookRecord, BookSource, ChallengeUpdate, Database, ExitCode, FavoritePersister,
    FavoritesStore, FavoritesTab, ReadingStatus, Review, ReviewUpdate, ShelfError, SortOrder,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "shelfwise",
    about = "Personal reading tracker: shelves, progress, reviews and favorites",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting SHELFWISE_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List books in the library.
    List {
        /// Free text matched against title, author and genre.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        status: Option<ReadingStatus>,
        #[arg(long)]
        favorites: bool,
        #[arg(long)]
        sort: Option<SortOrder>,
        #[arg(long, default_value = "1")]
        page: usize,
    },

    /// Add a book to the library.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        /// Comma-separated; the first genre is the main one.
        #[arg(long, default_value = "")]
        genre: String,
        #[arg(long, default_value = "0")]
        pages: u32,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        cover: String,
        #[arg(long)]
        status: Option<ReadingStatus>,
    },

    /// Operations on a single book.
    Book {
        #[command(subcommand)]
        action: BookAction,
    },

    /// Toggle a book's favorite flag.
    Favorite { id: String },

    /// Show favorites with their overview.
    Favorites {
        #[arg(long, default_value = "")]
        search: String,
        /// `all`, `want-to-read`, `currently-reading` or `completed`.
        #[arg(long, default_value = "all")]
        tab: FavoritesTab,
    },

    /// Show collection statistics.
    Stats {
        /// Calendar year for the activity chart (defaults to the current year).
        #[arg(long)]
        year: Option<i32>,
    },

    /// Review management.
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },

    /// Reading challenge management.
    Challenge {
        #[command(subcommand)]
        action: ChallengeAction,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information.
    Version,
}

// ─── Book Actions ───────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum BookAction {
    /// Get a book by ID.
    Get { id: String },

    /// Delete a book and its reviews.
    Delete {
        id: String,
        #[arg(long)]
        confirm: bool,
    },

    /// Move a book to another shelf.
    Status { id: String, status: ReadingStatus },

    /// Record the current page.
    Progress { id: String, page: u32 },

    /// Rate a book 1-5; omit the rating to clear it.
    Rate { id: String, rating: Option<u8> },
}

// ─── Review Actions ─────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ReviewAction {
    /// List reviews of a book.
    List { book_id: String },
    /// Write a review.
    Add {
        book_id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        private: bool,
        #[arg(long)]
        favorite: bool,
        /// Date reading started (YYYY-MM-DD or RFC 3339).
        #[arg(long, value_parser = parse_date)]
        started: Option<DateTime<Utc>>,
        /// Date reading finished (YYYY-MM-DD or RFC 3339).
        #[arg(long, value_parser = parse_date)]
        finished: Option<DateTime<Utc>>,
    },
    /// Edit a review; omitted fields keep their value.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        rating: Option<u8>,
        #[arg(long)]
        public: Option<bool>,
        #[arg(long)]
        favorite: Option<bool>,
        #[arg(long, value_parser = parse_date)]
        started: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_date)]
        finished: Option<DateTime<Utc>>,
    },
    /// Delete a review.
    Delete { id: String },
}

// ─── Challenge Actions ──────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ChallengeAction {
    /// List reading challenges.
    List,
    /// Create a challenge.
    Create {
        name: String,
        #[arg(long)]
        target: u32,
        #[arg(long, default_value = "0")]
        current: u32,
    },
    /// Update a challenge.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        target: Option<u32>,
        #[arg(long)]
        current: Option<u32>,
    },
    /// Delete a challenge.
    Delete { id: String },
}

// ─── Config Actions ─────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Get a specific config key.
    Get { key: String },
    /// Print the config file path.
    Path,
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    let start = Instant::now();
    let cli = Cli::parse();
    init_tracing();

    let out = Output {
        json: cli.json || std::env::var("SHELFWISE_JSON").as_deref() == Ok("1"),
        start,
    };

    if let Err(err) = run(cli.command, &out) {
        let code = err
            .downcast_ref::<ShelfError>()
            .map(ShelfError::exit_code)
            .unwrap_or(ExitCode::GeneralError);
        out.error(&err, code);
        std::process::exit(code.into());
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SHELFWISE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands, out: &Output) -> Result<()> {
    let mut config = AppConfig::load()?;
    if let Ok(lib_path) = std::env::var("SHELFWISE_LIBRARY_PATH") {
        config.set_library_path(lib_path);
    }

    match command {
        Commands::List {
            search,
            title,
            author,
            genre,
            status,
            favorites,
            sort,
            page,
        } => {
            let db = open_db(&config)?;
            let books = db.load_books(&BookFilter::all())?;
            let query = BookQuery {
                text: search.unwrap_or_default(),
                title: title.unwrap_or_default(),
                author: author.unwrap_or_default(),
                genre: genre.unwrap_or_default(),
                status,
                favorites_only: favorites,
                sort: sort.unwrap_or(config.list.default_sort),
            };
            let matched = query.apply(&books);
            let page = paginate(&matched, page, config.list.page_size);

            out.ok(&page, || {
                if page.items.is_empty() {
                    println!("No books found. Use `shelfwise add` to add books.");
                    return;
                }
                for book in &page.items {
                    print_book_line(book);
                }
                println!(
                    "\npage {}/{} ({} books)",
                    page.page, page.total_pages, page.total_items
                );
            })?;
        }

        Commands::Add {
            title,
            author,
            genre,
            pages,
            description,
            cover,
            status,
        } => {
            if title.trim().is_empty() || author.trim().is_empty() {
                return Err(ShelfError::ValidationError("title and author are required".into()).into());
            }
            let db = open_db(&config)?;
            let mut book = BookRecord::new(title.trim(), author.trim());
            book.genre = genre;
            book.page_count = pages;
            book.description = description;
            book.cover_image = cover;
            if let Some(status) = status {
                book.set_status(status);
            }
            db.upsert_book(&book)?;

            out.ok(&book, || println!("Added: {} ({})", book.title, book.id))?;
        }

        Commands::Book { action } => run_book(action, &config, out)?,

        Commands::Favorite { id } => {
            let db = open_db(&config)?;
            let mut store =
                FavoritesStore::new(db.load_books(&BookFilter::all())?, config.favorites.recent_limit);

            let Some(is_favorite) = store.toggle_favorite(&id).new_state() else {
                return Err(ShelfError::BookNotFound(id).into());
            };
            if let Err(err) = db.persist_favorite(&id, is_favorite) {
                store.toggle_favorite(&id);
                warn!(book_id = %id, "favorite not saved, toggle reverted: {err}");
                return Err(err.into());
            }

            let data = serde_json::json!({
                "id": id,
                "is_favorite": is_favorite,
                "total_favorites": store.stats().total_favorites,
                "recently_added": store.recently_added(),
            });
            out.ok(&data, || {
                if is_favorite {
                    println!("Added to favorites: {id}");
                } else {
                    println!("Removed from favorites: {id}");
                }
            })?;
        }

        Commands::Favorites { search, tab } => {
            let db = open_db(&config)?;
            let store =
                FavoritesStore::new(db.load_books(&BookFilter::all())?, config.favorites.recent_limit);
            let items = store.filter(&search, tab);
            let stats = store.stats();

            let data = serde_json::json!({
                "items": items,
                "recently_added": store.recently_added(),
                "stats": stats,
            });
            out.ok(&data, || {
                println!("Favorites: {}", stats.total_favorites);
                println!("  Top genre:       {}", stats.top_genre.name);
                println!("  Favorite author: {}", stats.favorite_author.name);
                println!("  Average rating:  {:.1}", stats.average_rating);

                if !store.recently_added().is_empty() {
                    println!("\nRecently added:");
                    for book in store.recently_added() {
                        println!("  {} by {}", book.title, book.author);
                    }
                }

                println!();
                if items.is_empty() {
                    println!("No favorite books match.");
                }
                for book in &items {
                    print_book_line(book);
                }
            })?;
        }

        Commands::Stats { year } => {
            let db = open_db(&config)?;
            let books = db.load_books(&BookFilter::all())?;
            let current_year = Utc::now().year();
            let year = year.unwrap_or(current_year);

            let collection = compute_collection_stats(&books);
            let shelves = compute_shelf_counts(&books);
            let genres = genre_distribution(&books);
            let summary = compute_year_summary(&books, year);
            let monthly = compute_monthly_activity(&books, year);
            let years = available_years(&books, current_year, config.stats.extra_years);

            let data = serde_json::json!({
                "collection": collection,
                "shelves": shelves,
                "genres": genres,
                "year": summary,
                "monthly": monthly,
                "available_years": years,
            });
            out.ok(&data, || {
                println!("Books:           {}", collection.total_count);
                println!("  Want to read:      {}", shelves.want_to_read);
                println!("  Currently reading: {}", shelves.currently_reading);
                println!("  Completed:         {}", shelves.completed);
                println!(
                    "Top genre:       {} ({})",
                    collection.top_genre.name, collection.top_genre.count
                );
                println!(
                    "Top author:      {} ({})",
                    collection.top_author.name, collection.top_author.count
                );
                println!("Average rating:  {:.1}", collection.average_rating);

                println!(
                    "\n{}: {} books, {} pages",
                    summary.year, summary.books_read, summary.pages_read
                );
                for bucket in &monthly {
                    println!("  {}  {:>3}  {}", bucket.label, bucket.count, "#".repeat(bucket.count));
                }

                if !genres.is_empty() {
                    println!("\nGenres:");
                    for genre in &genres {
                        println!("  {:<24} {}", genre.name, genre.count);
                    }
                }
            })?;
        }

        Commands::Review { action } => run_review(action, &config, out)?,

        Commands::Challenge { action } => run_challenge(action, &config, out)?,

        Commands::Config { action } => match action {
            ConfigAction::List => {
                let entries = config.entries();
                let data: serde_json::Map<String, serde_json::Value> = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect();
                out.ok(&data, || {
                    for (key, value) in &entries {
                        println!("{key} = {value}");
                    }
                })?;
            }
            ConfigAction::Get { key } => {
                let Some(value) = config.get(&key) else {
                    return Err(ShelfError::ConfigError(format!("unknown key: {key}")).into());
                };
                out.ok(&serde_json::json!({ "key": key, "value": value }), || println!("{value}"))?;
            }
            ConfigAction::Path => {
                let path = AppConfig::config_path();
                out.ok(&serde_json::json!({ "path": path }), || println!("{}", path.display()))?;
            }
        },

        Commands::Version => {
            let version = env!("CARGO_PKG_VERSION");
            out.ok(&serde_json::json!({ "version": version }), || {
                println!("shelfwise v{version}")
            })?;
        }
    }

    Ok(())
}

// ─── Subcommand groups ──────────────────────────────────────────────────────

fn run_book(action: BookAction, config: &AppConfig, out: &Output) -> Result<()> {
    let db = open_db(config)?;

    let book = match action {
        BookAction::Get { id } => db.get_book(&id)?,
        BookAction::Delete { id, confirm } => {
            if !confirm {
                eprintln!("Add --confirm to delete the book and its reviews.");
                std::process::exit(ExitCode::ConfirmRequired.into());
            }
            db.delete_book(&id)?;
            return out.ok(&serde_json::json!({ "deleted": id }), || println!("Deleted: {id}"));
        }
        BookAction::Status { id, status } => db.update_book(&id, |b| {
            b.set_status(status);
            Ok(())
        })?,
        BookAction::Progress { id, page } => db.update_book(&id, |b| {
            b.update_progress(page);
            Ok(())
        })?,
        BookAction::Rate { id, rating } => db.update_book(&id, |b| b.set_rating(rating))?,
    };

    out.ok(&book, || print_book_detail(&book))
}

fn run_review(action: ReviewAction, config: &AppConfig, out: &Output) -> Result<()> {
    let db = open_db(config)?;

    match action {
        ReviewAction::List { book_id } => {
            db.get_book(&book_id)?;
            let reviews = db.list_reviews(&book_id)?;
            out.ok(&reviews, || {
                if reviews.is_empty() {
                    println!("No reviews yet.");
                }
                for review in &reviews {
                    println!("{}  [{}/5]  {}", short_id(&review.id), review.rating, review.title);
                    println!("    {}", review.content);
                }
            })
        }
        ReviewAction::Add {
            book_id,
            title,
            content,
            rating,
            private,
            favorite,
            started,
            finished,
        } => {
            let mut review = Review::new(book_id, title, content, rating);
            review.is_public = !private;
            review.is_favorite = favorite;
            review.date_started = started;
            review.date_finished = finished;
            db.add_review(&review)?;
            out.ok(&review, || println!("Review saved: {}", review.id))
        }
        ReviewAction::Update {
            id,
            title,
            content,
            rating,
            public,
            favorite,
            started,
            finished,
        } => {
            let update = ReviewUpdate {
                title,
                content,
                rating,
                date_started: started,
                date_finished: finished,
                is_public: public,
                is_favorite: favorite,
            };
            let review = db.update_review(&id, update)?;
            out.ok(&review, || println!("Review updated: {}", review.id))
        }
        ReviewAction::Delete { id } => {
            db.delete_review(&id)?;
            out.ok(&serde_json::json!({ "deleted": id }), || println!("Deleted review: {id}"))
        }
    }
}

fn run_challenge(action: ChallengeAction, config: &AppConfig, out: &Output) -> Result<()> {
    let db = open_db(config)?;

    match action {
        ChallengeAction::List => {
            let challenges = db.list_challenges()?;
            out.ok(&challenges, || {
                if challenges.is_empty() {
                    println!("No reading challenges.");
                }
                for c in &challenges {
                    println!(
                        "{}  {:<30} {}/{} ({:.2}%)",
                        short_id(&c.id),
                        c.name,
                        c.current,
                        c.target,
                        c.percentage
                    );
                }
            })
        }
        ChallengeAction::Create {
            name,
            target,
            current,
        } => {
            let challenge = db.create_challenge(&name, target, current)?;
            out.ok(&challenge, || println!("Created challenge: {}", challenge.id))
        }
        ChallengeAction::Update {
            id,
            name,
            target,
            current,
        } => {
            let challenge = db.update_challenge(&id, ChallengeUpdate { name, target, current })?;
            out.ok(&challenge, || {
                println!(
                    "{}: {}/{} ({:.2}%)",
                    challenge.name, challenge.current, challenge.target, challenge.percentage
                )
            })
        }
        ChallengeAction::Delete { id } => {
            db.delete_challenge(&id)?;
            out.ok(&serde_json::json!({ "deleted": id }), || println!("Deleted challenge: {id}"))
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Writes either the JSON envelope or the human-readable form.
struct Output {
    json: bool,
    start: Instant,
}

impl Output {
    fn ok<T: Serialize + ?Sized>(&self, data: &T, human: impl FnOnce()) -> Result<()> {
        if self.json {
            print_json(&serde_json::json!({
                "status": "ok",
                "data": data,
                "meta": { "duration_ms": self.start.elapsed().as_millis() }
            }))?;
        } else {
            human();
        }
        Ok(())
    }

    fn error(&self, err: &anyhow::Error, code: ExitCode) {
        if self.json {
            let kind = match code {
                ExitCode::NotFound => "not_found",
                ExitCode::InvalidArgs => "invalid_args",
                _ => "error",
            };
            let envelope = serde_json::json!({
                "status": "error",
                "error": kind,
                "message": format!("{err:#}"),
                "meta": { "duration_ms": self.start.elapsed().as_millis() }
            });
            if print_json(&envelope).is_ok() {
                return;
            }
        }
        eprintln!("Error: {err:#}");
    }
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn open_db(config: &AppConfig) -> Result<Database> {
    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Database::open(&db_path)?)
}

fn parse_date(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_datetime(raw).ok_or_else(|| format!("expected YYYY-MM-DD or RFC 3339, got `{raw}`"))
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn print_book_line(book: &BookRecord) {
    let progress = book
        .progress
        .map(|p| format!("{:>3}%", p.percentage))
        .unwrap_or_default();
    let star = if book.is_favorite { "*" } else { " " };
    println!(
        "{id} {star} {title:<36}  {author:<24}  {status:<17} {progress}",
        id = short_id(&book.id),
        title = book.title,
        author = book.author,
        status = book.status,
    );
}

fn print_book_detail(book: &BookRecord) {
    println!("{}", book.title);
    println!("  id:        {}", book.id);
    println!("  author:    {}", book.author);
    if !book.genre.is_empty() {
        println!("  genre:     {}", book.genre);
    }
    println!("  status:    {}", book.status);
    if let Some(p) = book.progress {
        println!("  progress:  page {} of {} ({}%)", p.current_page, book.page_count, p.percentage);
    }
    if let Some(rating) = book.rating {
        println!("  rating:    {rating}/5");
    }
    println!("  favorite:  {}", if book.is_favorite { "yes" } else { "no" });
    println!("  added:     {}", book.date_added.format("%Y-%m-%d"));
}

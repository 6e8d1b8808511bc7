//! Kumo main entry point
//!
//! Command-line interface for the kumo text-content crawler: run a crawl,
//! serve the HTTP API, or manage the page database.

use clap::{Parser, Subcommand};
use kumo::config::{load_config_with_hash, Config};
use kumo::crawler::Crawler;
use kumo::export;
use kumo::storage::{PageRecord, PageStore, SqliteStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Kumo: a text-content web crawler
///
/// Kumo crawls the configured seed URLs breadth-first, extracts page titles,
/// descriptions, and visible text, and stores every page as a durable record
/// keyed by canonical URL.
#[derive(Parser, Debug)]
#[command(name = "kumo")]
#[command(version)]
#[command(about = "A text-content web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a crawl over the configured seed URLs
    Crawl {
        /// Write a delimited-text export when the run finishes
        #[arg(long, value_name = "PATH")]
        export_text: Option<PathBuf>,

        /// Write a JSON export when the run finishes
        #[arg(long, value_name = "PATH")]
        export_json: Option<PathBuf>,
    },

    /// Start the HTTP API server
    Serve,

    /// Database management commands
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommand {
    /// Create the database schema
    Init,

    /// Show database statistics
    Stats,

    /// List recently crawled pages
    List {
        #[arg(long, default_value_t = 10)]
        limit: usize,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Search pages by URL, title, or text content
    Search {
        #[arg(long)]
        query: String,
    },

    /// Delete all crawled pages
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)?;
    tracing::debug!("Configuration loaded (hash: {})", config_hash);

    match cli.command {
        Command::Crawl {
            export_text,
            export_json,
        } => handle_crawl(config, export_text, export_json).await?,
        Command::Serve => kumo::server::serve(config).await?,
        Command::Db { command } => handle_db(&config, command)?,
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kumo=info,warn"),
            1 => EnvFilter::new("kumo=debug,info"),
            2 => EnvFilter::new("kumo=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the crawl subcommand
async fn handle_crawl(
    config: Config,
    export_text: Option<PathBuf>,
    export_json: Option<PathBuf>,
) -> anyhow::Result<()> {
    tracing::info!(
        "Starting crawl: {} seeds, max {} pages, {}s delay",
        config.seeds.len(),
        config.crawler.max_pages,
        config.crawler.delay_seconds
    );

    let text_path = export_text.or_else(|| config.output.text_path.clone().map(PathBuf::from));
    let json_path = export_json.or_else(|| config.output.json_path.clone().map(PathBuf::from));

    let mut crawler = Crawler::new(config)?;

    let cancel = crawler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing the in-flight page before stopping");
            cancel.cancel();
        }
    });

    let result = crawler.run().await?;

    println!("=== Crawl Summary ===");
    println!("Pages fetched:           {}", result.pages_fetched);
    println!("Pages failed:            {}", result.pages_failed);
    println!("Duplicate links skipped: {}", result.duplicate_links_skipped);
    if result.pages_unsaved > 0 {
        println!("Pages not persisted:     {}", result.pages_unsaved);
    }

    if let Some(path) = text_path {
        export::write_text_export(&result.pages, &path)?;
        println!("Text export written to: {}", path.display());
    }
    if let Some(path) = json_path {
        export::write_json_export(&result.pages, &path)?;
        println!("JSON export written to: {}", path.display());
    }

    Ok(())
}

/// Handles the db management subcommands
fn handle_db(config: &Config, command: DbCommand) -> anyhow::Result<()> {
    let path = Path::new(&config.storage.database_path);

    match command {
        DbCommand::Init => {
            // Opening the store creates the schema
            SqliteStore::open(path)?;
            println!("Database initialized at {}", config.storage.database_path);
        }

        DbCommand::Stats => {
            let store = SqliteStore::open(path)?;
            let stats = store.stats()?;

            println!("=== Database Statistics ===");
            println!("Total pages: {}", stats.total_pages);
            println!("Total content length: {} bytes", stats.total_content_length);
            println!(
                "Average content length: {:.2} bytes",
                stats.average_content_length
            );
            if let Some(last) = stats.last_crawled_at {
                println!("Last crawled at: {}", last);
            }
        }

        DbCommand::List { limit, offset } => {
            let store = SqliteStore::open(path)?;
            let pages = store.list_pages(limit, offset)?;

            println!("=== Recent {} Pages ===", pages.len());
            for page in pages {
                print_page_summary(&page);
            }
        }

        DbCommand::Search { query } => {
            let store = SqliteStore::open(path)?;
            let pages = store.search_pages(&query)?;

            println!("=== Search Results for '{}' ===", query);
            for page in pages {
                print_page_summary(&page);
            }
        }

        DbCommand::Clear { yes } => {
            if !yes {
                anyhow::bail!("refusing to clear the database without --yes");
            }
            let mut store = SqliteStore::open(path)?;
            let deleted = store.clear()?;
            println!("Deleted {} pages", deleted);
        }
    }

    Ok(())
}

fn print_page_summary(page: &PageRecord) {
    println!("ID: {}", page.id);
    println!("URL: {}", page.url);
    println!("Title: {}", truncate(&page.title, 100));
    println!("Status: {}", page.status_code);
    println!("Created: {}", page.created_at);
    println!("Content length: {} bytes", page.content_length);
    println!("{}", "-".repeat(50));
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    }
}

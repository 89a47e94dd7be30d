//! # da-scraper CLI Application
//!
//! Command-line entry point for the register scraper.
//!
//! ## Subcommands
//!
//! - `run`: the periodic job, the most recent month plus one random historical month
//! - `crawl`: a single explicit date window
//! - `normalize`: show how an address would be normalized
//! - `list`: inspect stored applications
//!
//! Every step is narrated on stdout; structured logs go to stderr (and an
//! optional log file). Fatal errors, including transport failures and
//! malformed reference data, end the process with a non-zero status. Runs are
//! safe to repeat because the store is idempotent.

mod telemetry;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use da_scraper::address::{NormalizerConfig, Normalized, normalize_with};
use da_scraper::crawler::{
    CrawlController, CrawlerConfig, DEFAULT_COMMENT_URL, DEFAULT_INFORMATION_URL_TEMPLATE,
    DEFAULT_LISTING_URL_TEMPLATE, DEFAULT_MAX_DELAY_MS, DEFAULT_MAX_PAGES, DEFAULT_MIN_DELAY_MS,
    DEFAULT_REQUESTS_PER_SECOND, DateWindow, HttpFetcher, WindowReport,
};
use da_scraper::gazetteer::Gazetteer;
use da_scraper::store::{DEFAULT_LEGACY_URL_PATTERN, Database, StoreConfig};
use tracing::{error, instrument};

#[derive(Parser)]
#[command(author, version, about = "Scrape a council development application register", long_about = None)]
struct Cli {
    /// Directory for a daily rolling log file
    #[arg(long, global = true, env = "DA_SCRAPER_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl the most recent month and one random historical month
    Run(RunArgs),

    /// Crawl a single date window
    Crawl(CrawlArgs),

    /// Normalize an address against the gazetteer
    Normalize(NormalizeArgs),

    /// List stored applications
    List(ListArgs),
}

#[derive(Args, Debug, Clone)]
struct StoreArgs {
    /// Database path
    #[arg(long, default_value = "data.sqlite", env = "DA_SCRAPER_DATABASE")]
    database: PathBuf,

    /// SQL LIKE patterns of superseded information URLs to migrate
    #[arg(long = "legacy-url-pattern", default_values_t = [DEFAULT_LEGACY_URL_PATTERN.to_string()])]
    legacy_url_patterns: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct GazetteerArgs {
    /// Suburb list, one `NAME,STATE POSTCODE` per line
    #[arg(long, default_value = "data/suburbs.txt", env = "DA_SCRAPER_SUBURBS")]
    suburbs: PathBuf,

    /// Hundred names, one per line
    #[arg(long, default_value = "data/hundreds.txt", env = "DA_SCRAPER_HUNDREDS")]
    hundreds: PathBuf,

    /// Maximum edit distance for a suburb match
    #[arg(long, default_value = "1")]
    max_distance: usize,
}

#[derive(Args, Debug, Clone)]
struct CrawlOptions {
    #[command(flatten)]
    store: StoreArgs,

    #[command(flatten)]
    gazetteer: GazetteerArgs,

    /// Listing URL template with {page}, {from} and {to} placeholders
    #[arg(long, default_value = DEFAULT_LISTING_URL_TEMPLATE, env = "DA_SCRAPER_LISTING_URL")]
    listing_url: String,

    /// Information URL template with an {application_number} placeholder
    #[arg(long, default_value = DEFAULT_INFORMATION_URL_TEMPLATE, env = "DA_SCRAPER_INFO_URL")]
    info_url: String,

    /// Comment URL stored with every application
    #[arg(long, default_value = DEFAULT_COMMENT_URL)]
    comment_url: String,

    /// Maximum listing pages per window
    #[arg(short = 'p', long, default_value_t = DEFAULT_MAX_PAGES, value_parser = clap::value_parser!(u32).range(1..))]
    max_pages: u32,

    /// Minimum pause between requests in milliseconds
    #[arg(long, default_value_t = DEFAULT_MIN_DELAY_MS)]
    min_delay_ms: u64,

    /// Maximum pause between requests in milliseconds
    #[arg(long, default_value_t = DEFAULT_MAX_DELAY_MS)]
    max_delay_ms: u64,

    /// Hard request rate ceiling
    #[arg(long, default_value_t = DEFAULT_REQUESTS_PER_SECOND)]
    requests_per_second: u32,

    /// Earliest date historical windows are sampled from (YYYY-MM-DD)
    #[arg(long)]
    epoch: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    options: CrawlOptions,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Start of the window (YYYY-MM-DD)
    #[arg(long)]
    from: NaiveDate,

    /// End of the window (YYYY-MM-DD)
    #[arg(long)]
    to: NaiveDate,

    #[command(flatten)]
    options: CrawlOptions,
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    /// Raw address text
    #[arg(required = true)]
    address: String,

    #[command(flatten)]
    gazetteer: GazetteerArgs,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Limit results
    #[arg(short, long)]
    limit: Option<usize>,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _telemetry = telemetry::init_tracing_subscriber(cli.log_dir.as_deref())?;

    let result = match cli.command {
        Some(Commands::Run(args)) => run_command(args).await,
        Some(Commands::Crawl(args)) => crawl_command(args).await,
        Some(Commands::Normalize(args)) => normalize_command(args),
        Some(Commands::List(args)) => list_command(args).await,
        None => {
            // If no command is provided, show help
            let _ = Cli::parse_from(["da-scraper", "--help"]);
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

fn load_gazetteer(args: &GazetteerArgs) -> anyhow::Result<Gazetteer> {
    println!(
        "Loading gazetteer from {} and {}...",
        args.suburbs.display(),
        args.hundreds.display()
    );
    let gazetteer = Gazetteer::from_files(&args.suburbs, &args.hundreds)
        .context("reference data must load completely before crawling")?;
    println!(
        "Loaded {} suburbs and {} hundred names",
        gazetteer.suburb_count(),
        gazetteer.hundred_count()
    );
    Ok(gazetteer)
}

async fn open_store(args: &StoreArgs) -> anyhow::Result<Database> {
    let path = path_str(&args.database)?;
    let config = StoreConfig {
        legacy_url_patterns: args.legacy_url_patterns.clone(),
    };
    Ok(Database::new_from_path(path, config).await?)
}

fn path_str(path: &Path) -> anyhow::Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow!("Path is not valid UTF-8: {}", path.display()))
}

fn crawler_config(options: &CrawlOptions) -> CrawlerConfig {
    let mut builder = CrawlerConfig::builder()
        .listing_url_template(options.listing_url.clone())
        .information_url_template(options.info_url.clone())
        .comment_url(options.comment_url.clone())
        .max_pages(options.max_pages)
        .delay_ms(options.min_delay_ms, options.max_delay_ms)
        .requests_per_second(options.requests_per_second)
        .normalizer(NormalizerConfig {
            max_distance: options.gazetteer.max_distance,
            ..NormalizerConfig::default()
        });
    if let Some(epoch) = options.epoch {
        builder = builder.epoch(epoch);
    }
    builder.build()
}

async fn build_controller(options: &CrawlOptions) -> anyhow::Result<CrawlController<HttpFetcher>> {
    let gazetteer = load_gazetteer(&options.gazetteer)?;
    let store = open_store(&options.store).await?;
    let config = crawler_config(options);
    let fetcher = HttpFetcher::new(&config)?;
    Ok(CrawlController::new(fetcher, store, Arc::new(gazetteer), config))
}

fn print_window(window: &DateWindow, report: &WindowReport) {
    println!(
        "Window {}: {} pages, {} new, {} updated, {} unchanged, {} skipped",
        window, report.pages, report.inserted, report.updated, report.unchanged, report.skipped
    );
}

#[instrument]
async fn run_command(args: RunArgs) -> anyhow::Result<()> {
    let controller = build_controller(&args.options).await?;
    let today = chrono::Local::now().date_naive();

    println!("Scraping development applications as of {}...", today);
    let report = controller.run(today, &mut rand::thread_rng()).await?;

    for (window, window_report) in &report.windows {
        print_window(window, window_report);
    }
    println!("Scrape complete");
    Ok(())
}

#[instrument]
async fn crawl_command(args: CrawlArgs) -> anyhow::Result<()> {
    if args.from > args.to {
        return Err(anyhow!("--from {} is after --to {}", args.from, args.to));
    }

    let controller = build_controller(&args.options).await?;
    let window = DateWindow::new(args.from, args.to);
    let today = chrono::Local::now().date_naive();

    println!("Crawling window {}...", window);
    let report = controller.crawl_window(&window, today).await?;
    print_window(&window, &report);
    println!("Crawl complete");
    Ok(())
}

fn normalize_command(args: NormalizeArgs) -> anyhow::Result<()> {
    let gazetteer = load_gazetteer(&args.gazetteer)?;
    let config = NormalizerConfig {
        max_distance: args.gazetteer.max_distance,
        ..NormalizerConfig::default()
    };

    match normalize_with(&args.address, &gazetteer, &config) {
        Normalized::Matched {
            address,
            suburb,
            distance,
        } => println!("{} (suburb {}, distance {})", address, suburb, distance),
        Normalized::HundredName(address) => println!("{} (ends with a hundred name)", address),
        Normalized::Unrecognized(address) => println!("{} (suburb not recognized)", address),
    }
    Ok(())
}

#[instrument]
async fn list_command(args: ListArgs) -> anyhow::Result<()> {
    let store = open_store(&args.store).await?;
    let applications = store.list_applications(args.limit).await?;

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&applications)?);
        }
        _ => {
            println!(
                "Stored applications: {}",
                store.count_applications().await?
            );
            for application in applications {
                let received = application
                    .received_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                println!(
                    "{} - {} (received {})",
                    application.application_number, application.address, received
                );
                if !application.description.is_empty() {
                    println!("   {}", application.description);
                }
                println!("   URL: {}", application.information_url);
            }
        }
    }

    Ok(())
}

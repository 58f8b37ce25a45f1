//! Command-line entry point for dualcrawl.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use dualcrawl::{CrawlConfig, crawl};

#[derive(Parser, Debug)]
#[command(author, version, about = "Crawl a reference site and replay every page on a test site")]
struct Args {
    /// Test site base URL; credentials in the URL are used for HTTP auth
    #[arg(short, long)]
    test_url: String,

    /// Reference site base URL; omit to crawl the test site on its own
    #[arg(short, long)]
    reference_url: Option<String>,

    /// Output directory for artifacts and the metrics log
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    #[arg(short = 'd', long, default_value_t = 2)]
    max_depth: u8,

    /// Capture a full-page screenshot of every page
    #[arg(long)]
    screenshots: bool,

    /// Treat pages differing only by query string as distinct
    #[arg(long)]
    pair_by_query: bool,

    /// Replace query strings in artifact file names by a short hash
    #[arg(long)]
    hash_query: bool,

    /// Only process pages whose <html lang> equals this tag
    #[arg(long)]
    lang: Option<String>,

    /// CSS selector removed before screenshots; repeatable
    #[arg(long = "strip", value_name = "SELECTOR")]
    strip_selectors: Vec<String>,

    /// Error-log DSN for the reference site (mysql://, mariadb:// or sqlite:)
    #[arg(long)]
    reference_db: Option<String>,

    /// Error-log DSN for the test site
    #[arg(long)]
    test_db: Option<String>,

    /// Record console.error/warn/log output in the metrics log
    #[arg(long)]
    console: bool,

    /// Show the browser window (debug builds only)
    #[arg(long)]
    headed: bool,

    #[arg(long, default_value_t = 8)]
    max_concurrent_pages: usize,

    #[arg(long, default_value_t = 8)]
    max_concurrent_per_domain: usize,

    /// Disable the adaptive per-domain throttle
    #[arg(long)]
    no_throttle: bool,

    /// Initial per-domain delay in milliseconds
    #[arg(long, default_value_t = 2_000)]
    throttle_start_ms: u64,

    #[arg(long, default_value_t = 0)]
    throttle_min_ms: u64,

    #[arg(long, default_value_t = 60_000)]
    throttle_max_ms: u64,

    #[arg(long, default_value_t = 60)]
    navigation_timeout: u64,

    /// Metrics log file name inside the output directory
    #[arg(long, default_value = "log.txt")]
    log_file: String,

    /// Persistent Chrome profile directory (a temporary one is used otherwise)
    #[arg(long)]
    chrome_data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("chromiumoxide::handler", log::LevelFilter::Off)
        .filter_module("chromiumoxide::conn", log::LevelFilter::Off)
        .init();

    let args = Args::parse();

    let mut builder = CrawlConfig::builder()
        .storage_dir(args.output)
        .test_url(args.test_url)
        .max_depth(args.max_depth)
        .save_screenshots(args.screenshots)
        .pair_by_query(args.pair_by_query)
        .hash_query(args.hash_query)
        .target_lang(args.lang)
        .strip_selectors(args.strip_selectors)
        .reference_error_log_dsn(args.reference_db)
        .test_error_log_dsn(args.test_db)
        .capture_console(args.console)
        .headless(!args.headed)
        .max_concurrent_pages(args.max_concurrent_pages)
        .max_concurrent_per_domain(args.max_concurrent_per_domain)
        .throttle_delays(
            Duration::from_millis(args.throttle_start_ms),
            Duration::from_millis(args.throttle_min_ms),
            Duration::from_millis(args.throttle_max_ms),
        )
        .throttle_enabled(!args.no_throttle)
        .navigation_timeout_secs(args.navigation_timeout)
        .log_file_name(args.log_file)
        .chrome_data_dir(args.chrome_data_dir);
    if let Some(reference) = args.reference_url {
        builder = builder.reference_url(reference);
    }
    let config = builder.build().context("Invalid configuration")?;

    let summary = crawl(config).await?;
    log::info!("Done: {summary}");
    Ok(())
}

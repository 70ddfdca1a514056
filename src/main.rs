//! tophn - keep the top Hacker News stories cached and archived by day
//!
//! `serve` runs the refresh loop and prints the cached list on every refresh
//! interval; `top`, `list` and `show` are one-shot commands.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

use tophn::archive::{ArchiveReader, SnapshotStore, ITEMS_PER_PAGE};
use tophn::cache::{CacheState, ItemCache};
use tophn::cli::{parse_bucket_arg, parse_date_arg, Cli, Command, FetchArgs, ServeArgs};
use tophn::data::{HnClient, Item, ItemSource};
use tophn::logger::{self, LogConfig};
use tophn::refresh::Refresher;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Prints items as a numbered list
fn print_items(items: &[Item]) {
    for (rank, item) in items.iter().enumerate() {
        println!(
            "{:>3}. {} ({} points by {}, {} comments)",
            rank + 1,
            item.title,
            item.score,
            item.author,
            item.descendants
        );
        if !item.url.is_empty() {
            println!("     {}", item.url);
        }
    }
}

/// Opens the snapshot store, creating the parent directory if needed
async fn open_store(cli: &Cli) -> Result<Arc<SnapshotStore>> {
    let bucket = parse_bucket_arg(&cli.bucket)?;
    let path = cli.db_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Arc::new(SnapshotStore::open(&path, bucket).await?))
}

fn hn_client(args: &FetchArgs) -> Result<HnClient> {
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .user_agent(concat!("tophn/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(HnClient::with_client(http).with_list(args.list_kind()?))
}

async fn serve(cli: &Cli, args: &ServeArgs) -> Result<()> {
    let config = args.refresh_config()?;
    let source = hn_client(&args.fetch)?;
    let store = open_store(cli).await?;
    let cache = Arc::new(ItemCache::new());
    let report_every = config.refresh_interval;

    info!(
        "Refreshing {} items every {:?}, archiving into {}",
        config.cache_size,
        report_every,
        cli.db_path().display()
    );
    let refresher = Refresher::new(source, store, cache.clone(), config);
    let handle = refresher.start().await;

    if let Some(mut handle) = handle {
        let mut report = tokio::time::interval(report_every);
        loop {
            tokio::select! {
                _ = report.tick() => {
                    let status = cache.status().await;
                    if status.state == CacheState::Live {
                        if let Some(set) = status.set {
                            println!("--- {} ---", set.captured_at.format("%Y-%m-%d %H:%M"));
                            print_items(&set.items);
                        }
                    }
                }
                _ = &mut handle => break,
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, shutting down");
                    return Ok(());
                }
            }
        }
    }

    match cache.take_error().await {
        Some(e) => {
            error!("Could not refresh Hacker News: {}", e);
            Err(e.into())
        }
        None => Ok(()),
    }
}

async fn top(args: &FetchArgs) -> Result<()> {
    let filter = args.item_filter()?;
    let source = hn_client(args)?;
    let items = source.fetch_filtered(args.count, filter).await?;
    print_items(&items);
    Ok(())
}

async fn list(cli: &Cli, page: Option<usize>) -> Result<()> {
    let reader = ArchiveReader::new(open_store(cli).await?);
    let dates = match page {
        Some(page) => reader.page(page, ITEMS_PER_PAGE).await,
        None => reader.dates().await,
    };
    for date in dates {
        println!("{}", date);
    }
    Ok(())
}

async fn show(cli: &Cli, date: &str) -> Result<()> {
    let date = parse_date_arg(date)?;
    let reader = ArchiveReader::new(open_store(cli).await?);
    let items = reader.items_by_date(&date).await?;
    println!("Date: {}", date);
    print_items(&items);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    logger::init(LogConfig {
        console_level: logger::parse_log_level(&cli.log_level),
        log_file: cli.log_file.clone(),
        ..Default::default()
    })?;

    match &cli.command {
        Command::Serve(args) => serve(&cli, args).await,
        Command::Top(args) => top(args).await,
        Command::List { page } => list(&cli, *page).await,
        Command::Show { date } => show(&cli, date).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Errors are printed with Display; the store is dropped before exiting
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

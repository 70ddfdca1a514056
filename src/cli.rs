//! Command-line interface parsing for tophn
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the configuration types the library consumes.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use directories::ProjectDirs;
use thiserror::Error;

use crate::archive::{validate_bucket, DateKey, DEFAULT_BUCKET};
use crate::data::{any_item, only_ask, only_job, only_story, ItemFilter, ListKind};
use crate::refresh::RefreshConfig;

/// Database file name inside the data directory
const DB_FILE_NAME: &str = "tophn.db";

/// Longest accepted refresh interval, one week
const MAX_REFRESH_MINS: u64 = 7 * 24 * 60;

/// Longest accepted rollover check interval, one hour
const MAX_SNAPSHOT_CHECK_SECS: u64 = 60 * 60;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified filter name is not recognized
    #[error("Invalid filter: '{0}'. Valid filters: story, ask, job, all")]
    InvalidFilter(String),

    /// The specified listing name is not recognized
    #[error("Invalid list: '{0}'. Valid lists: top, new, best, ask, show, job")]
    InvalidList(String),

    /// The date argument is not in YYYY-MM-DD form
    #[error("Invalid date: '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The bucket name cannot be used as a table name
    #[error("Invalid bucket: '{0}'. Use letters, digits and '_', not starting with a digit")]
    InvalidBucket(String),
}

/// tophn - keep the top Hacker News stories cached and archived by day
#[derive(Parser, Debug)]
#[command(name = "tophn")]
#[command(about = "Cache the top Hacker News stories and browse daily snapshots")]
#[command(version)]
pub struct Cli {
    /// Snapshot database file (defaults to the user data directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Table holding the snapshots
    #[arg(long, global = true, value_name = "NAME", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Console log level: off, error, warn, info, debug, trace
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Also write debug logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Keep the cache refreshed and archive one snapshot per day
    Serve(ServeArgs),
    /// Fetch and print the current top items once
    Top(FetchArgs),
    /// List the dates that have a snapshot
    List {
        /// Show only this page (zero-based, 10 dates per page)
        #[arg(long, value_name = "PAGE")]
        page: Option<usize>,
    },
    /// Print the snapshot stored for a date
    Show {
        /// Date in YYYY-MM-DD form
        date: String,
    },
}

/// What to fetch
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Number of items to keep
    #[arg(short = 'n', long, default_value_t = 10)]
    pub count: usize,

    /// Which items to keep: story, ask, job, all
    #[arg(long, default_value = "story")]
    pub filter: String,

    /// Ranked listing to walk: top, new, best, ask, show, job
    #[arg(long, default_value = "top")]
    pub list: String,
}

/// Refresh loop settings
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Minutes between refreshes
    #[arg(long, value_name = "MINUTES", default_value_t = 15,
          value_parser = clap::value_parser!(u64).range(1..=MAX_REFRESH_MINS))]
    pub refresh_mins: u64,

    /// Seconds between day-rollover checks
    #[arg(long, value_name = "SECONDS", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..=MAX_SNAPSHOT_CHECK_SECS))]
    pub snapshot_check_secs: u64,
}

/// Parses a filter name into an item filter.
///
/// # Arguments
/// * `s` - The filter string from CLI
///
/// # Returns
/// * `Ok(ItemFilter)` if the string names a known filter
/// * `Err(CliError::InvalidFilter)` if it doesn't
pub fn parse_filter_arg(s: &str) -> Result<ItemFilter, CliError> {
    match s.to_lowercase().as_str() {
        "story" | "stories" => Ok(only_story),
        "ask" => Ok(only_ask),
        "job" | "jobs" => Ok(only_job),
        "all" | "any" => Ok(any_item),
        _ => Err(CliError::InvalidFilter(s.to_string())),
    }
}

/// Parses a listing name
pub fn parse_list_arg(s: &str) -> Result<ListKind, CliError> {
    ListKind::from_str(s).ok_or_else(|| CliError::InvalidList(s.to_string()))
}

/// Parses a snapshot date
pub fn parse_date_arg(s: &str) -> Result<DateKey, CliError> {
    s.parse().map_err(|_| CliError::InvalidDate(s.to_string()))
}

/// Checks a bucket name before any database is opened
pub fn parse_bucket_arg(s: &str) -> Result<&str, CliError> {
    validate_bucket(s).map_err(|_| CliError::InvalidBucket(s.to_string()))?;
    Ok(s)
}

impl FetchArgs {
    /// The item filter named by `--filter`
    pub fn item_filter(&self) -> Result<ItemFilter, CliError> {
        parse_filter_arg(&self.filter)
    }

    /// The listing named by `--list`
    pub fn list_kind(&self) -> Result<ListKind, CliError> {
        parse_list_arg(&self.list)
    }
}

impl ServeArgs {
    /// Builds the refresh loop configuration.
    ///
    /// # Returns
    /// * `Ok(RefreshConfig)` with intervals, size and filter applied
    /// * `Err(CliError)` if an invalid filter was specified
    pub fn refresh_config(&self) -> Result<RefreshConfig, CliError> {
        Ok(RefreshConfig {
            refresh_interval: Duration::from_secs(self.refresh_mins * 60),
            snapshot_check_interval: Duration::from_secs(self.snapshot_check_secs),
            cache_size: self.fetch.count,
            filter: self.fetch.item_filter()?,
        })
    }
}

impl Cli {
    /// Database path from `--db`, or the default location
    pub fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(default_db_path)
    }
}

/// `tophn.db` in the XDG data directory, or the working directory if there
/// is no home directory
pub fn default_db_path() -> PathBuf {
    match ProjectDirs::from("", "", "tophn") {
        Some(dirs) => dirs.data_dir().join(DB_FILE_NAME),
        None => PathBuf::from(DB_FILE_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Item, ItemKind};

    fn story(url: &str) -> Item {
        Item {
            kind: ItemKind::Story,
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_filter_arg_story_aliases() {
        let link = story("https://example.com");
        assert!(parse_filter_arg("story").unwrap()(&link));
        assert!(parse_filter_arg("Stories").unwrap()(&link));
        assert!(!parse_filter_arg("story").unwrap()(&story("")));
    }

    #[test]
    fn test_parse_filter_arg_other_names() {
        assert!(parse_filter_arg("ask").unwrap()(&story("")));
        assert!(parse_filter_arg("all").unwrap()(&story("")));
        assert!(parse_filter_arg("any").is_ok());
        assert!(parse_filter_arg("jobs").is_ok());
    }

    #[test]
    fn test_parse_filter_arg_invalid() {
        let result = parse_filter_arg("polls");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid filter"));
        assert!(err.to_string().contains("polls"));
    }

    #[test]
    fn test_parse_list_arg() {
        assert_eq!(parse_list_arg("best").unwrap(), ListKind::Best);
        assert!(matches!(
            parse_list_arg("front"),
            Err(CliError::InvalidList(_))
        ));
    }

    #[test]
    fn test_parse_date_arg() {
        assert_eq!(parse_date_arg("2024-01-01").unwrap().to_string(), "2024-01-01");
        assert!(matches!(
            parse_date_arg("01/01/2024"),
            Err(CliError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_cli_parse_serve_defaults() {
        let cli = Cli::parse_from(["tophn", "serve"]);
        let Command::Serve(args) = &cli.command else {
            panic!("expected serve");
        };

        let config = args.refresh_config().unwrap();
        assert_eq!(config.refresh_interval, Duration::from_secs(900));
        assert_eq!(config.snapshot_check_interval, Duration::from_secs(60));
        assert_eq!(config.cache_size, 10);
        assert_eq!(args.fetch.list_kind().unwrap(), ListKind::Top);
        assert_eq!(cli.bucket, DEFAULT_BUCKET);
        assert!(cli.db.is_none());
    }

    #[test]
    fn test_cli_parse_serve_custom() {
        let cli = Cli::parse_from([
            "tophn",
            "--db",
            "/tmp/hn.db",
            "serve",
            "-n",
            "30",
            "--filter",
            "job",
            "--refresh-mins",
            "5",
            "--snapshot-check-secs",
            "10",
        ]);
        let Command::Serve(args) = &cli.command else {
            panic!("expected serve");
        };

        let config = args.refresh_config().unwrap();
        assert_eq!(config.refresh_interval, Duration::from_secs(300));
        assert_eq!(config.snapshot_check_interval, Duration::from_secs(10));
        assert_eq!(config.cache_size, 30);
        assert_eq!(cli.db_path(), PathBuf::from("/tmp/hn.db"));
    }

    #[test]
    fn test_cli_rejects_zero_interval() {
        let result = Cli::try_parse_from(["tophn", "serve", "--refresh-mins", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_oversized_intervals() {
        let huge = u64::MAX.to_string();
        assert!(Cli::try_parse_from(["tophn", "serve", "--refresh-mins", &huge]).is_err());
        assert!(Cli::try_parse_from(["tophn", "serve", "--refresh-mins", "10081"]).is_err());
        assert!(Cli::try_parse_from(["tophn", "serve", "--snapshot-check-secs", "3601"]).is_err());

        let cli = Cli::parse_from(["tophn", "serve", "--refresh-mins", "10080"]);
        let Command::Serve(args) = &cli.command else {
            panic!("expected serve");
        };
        assert_eq!(
            args.refresh_config().unwrap().refresh_interval,
            Duration::from_secs(7 * 24 * 3600)
        );
    }

    #[test]
    fn test_parse_bucket_arg() {
        assert_eq!(parse_bucket_arg("snapshots").unwrap(), "snapshots");
        assert_eq!(parse_bucket_arg("order").unwrap(), "order");
        for bad in ["", "9lives", "drop table", "a\"b"] {
            assert!(
                matches!(parse_bucket_arg(bad), Err(CliError::InvalidBucket(_))),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_serve_with_invalid_filter_fails_config() {
        let cli = Cli::parse_from(["tophn", "serve", "--filter", "nope"]);
        let Command::Serve(args) = &cli.command else {
            panic!("expected serve");
        };
        assert!(matches!(
            args.refresh_config(),
            Err(CliError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_cli_parse_list_and_show() {
        let cli = Cli::parse_from(["tophn", "list", "--page", "2"]);
        assert!(matches!(cli.command, Command::List { page: Some(2) }));

        let cli = Cli::parse_from(["tophn", "show", "2024-01-01"]);
        assert!(matches!(cli.command, Command::Show { ref date } if date == "2024-01-01"));
    }

    #[test]
    fn test_default_db_path_ends_with_file_name() {
        assert!(default_db_path().ends_with(DB_FILE_NAME));
    }
}

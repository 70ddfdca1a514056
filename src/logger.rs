//! Logging setup
//!
//! Routes the `log` facade through `fern`. The console gets short colored
//! lines on stderr (stdout is reserved for command output); the optional log
//! file gets full timestamps and no color codes. Our own modules log at the
//! configured level while the chattier dependencies are held back.

use std::io;

use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// Root target of this crate's log records
const CRATE_TARGET: &str = "tophn";

/// Dependencies that log per statement or per connection
const NOISY_TARGETS: &[&str] = &["sqlx", "hyper", "hyper_util", "reqwest", "rustls"];

/// Log configuration options
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for our own records on the console
    pub console_level: LevelFilter,
    /// Level for our own records in the log file
    pub file_level: LevelFilter,
    /// Ceiling for the noisy dependencies, on every output
    pub dependency_level: LevelFilter,
    /// Path to log file (None means no file logging)
    pub log_file: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Info,
            file_level: LevelFilter::Debug,
            dependency_level: LevelFilter::Warn,
            log_file: None,
        }
    }
}

/// Drops the crate prefix so console lines read `refresh` rather than
/// `tophn::refresh`
fn short_target(target: &str) -> &str {
    match target.strip_prefix(CRATE_TARGET) {
        Some("") => CRATE_TARGET,
        Some(rest) => rest.strip_prefix("::").unwrap_or(target),
        None => target,
    }
}

/// Applies the level to our records and the dependency ceiling to the rest
fn with_levels(dispatch: fern::Dispatch, level: LevelFilter, deps: LevelFilter) -> fern::Dispatch {
    NOISY_TARGETS
        .iter()
        .fold(dispatch.level(level), |dispatch, target| {
            dispatch.level_for(*target, deps.min(level))
        })
}

fn console_dispatch(config: &LogConfig) -> fern::Dispatch {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    let dispatch = fern::Dispatch::new().format(move |out, message, record| {
        out.finish(format_args!(
            "{} {:<5} {}: {}",
            chrono::Local::now().format("%H:%M:%S"),
            colors.color(record.level()),
            short_target(record.target()),
            message
        ))
    });
    with_levels(dispatch, config.console_level, config.dependency_level).chain(io::stderr())
}

fn file_dispatch(config: &LogConfig, path: &str) -> Result<fern::Dispatch, fern::InitError> {
    let dispatch = fern::Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "{} [{}] [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.target(),
            record.level(),
            message
        ))
    });
    Ok(with_levels(dispatch, config.file_level, config.dependency_level)
        .chain(fern::log_file(path)?))
}

/// Builds the dispatch tree without installing it
///
/// Fails if the log file cannot be opened.
pub fn dispatch(config: &LogConfig) -> Result<fern::Dispatch, fern::InitError> {
    let mut root = fern::Dispatch::new().chain(console_dispatch(config));
    if let Some(path) = &config.log_file {
        root = root.chain(file_dispatch(config, path)?);
    }
    Ok(root)
}

/// Installs the global logger
///
/// Fails if the log file cannot be opened or a logger is already installed.
pub fn init(config: LogConfig) -> Result<(), fern::InitError> {
    dispatch(&config)?.apply()?;
    Ok(())
}

/// Convert a level name to a filter; unknown names fall back to info
pub fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Record};
    use tempfile::TempDir;

    fn emit(logger: &dyn Log, level: Level, target: &str, message: &str) {
        logger.log(
            &Record::builder()
                .args(format_args!("{}", message))
                .level(level)
                .target(target)
                .build(),
        );
    }

    #[test]
    fn test_parse_log_level_known_names() {
        assert_eq!(parse_log_level("off"), LevelFilter::Off);
        assert_eq!(parse_log_level("ERROR"), LevelFilter::Error);
        assert_eq!(parse_log_level("warning"), LevelFilter::Warn);
        assert_eq!(parse_log_level("Debug"), LevelFilter::Debug);
        assert_eq!(parse_log_level("trace"), LevelFilter::Trace);
    }

    #[test]
    fn test_parse_log_level_unknown_defaults_to_info() {
        assert_eq!(parse_log_level("verbose"), LevelFilter::Info);
        assert_eq!(parse_log_level(""), LevelFilter::Info);
    }

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.console_level, LevelFilter::Info);
        assert_eq!(config.file_level, LevelFilter::Debug);
        assert_eq!(config.dependency_level, LevelFilter::Warn);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_short_target_strips_crate_prefix() {
        assert_eq!(short_target("tophn::refresh"), "refresh");
        assert_eq!(short_target("tophn::archive::store"), "archive::store");
        assert_eq!(short_target("tophn"), "tophn");
        assert_eq!(short_target("tophnx::other"), "tophnx::other");
        assert_eq!(short_target("sqlx::query"), "sqlx::query");
    }

    #[test]
    fn test_file_output_filters_dependencies() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tophn.log");
        let config = LogConfig {
            console_level: LevelFilter::Off,
            log_file: Some(path.to_string_lossy().into_owned()),
            ..Default::default()
        };

        let (_, logger) = dispatch(&config).unwrap().into_log();
        emit(logger.as_ref(), Level::Debug, "tophn::refresh", "refreshed cache");
        emit(logger.as_ref(), Level::Info, "sqlx::query", "SELECT date FROM snapshots");
        emit(logger.as_ref(), Level::Warn, "sqlx::pool", "pool is slow");
        emit(logger.as_ref(), Level::Trace, "tophn::data", "too fine");
        logger.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[tophn::refresh] [DEBUG] refreshed cache"));
        assert!(contents.contains("pool is slow"));
        assert!(!contents.contains("SELECT date"));
        assert!(!contents.contains("too fine"));
    }

    #[test]
    fn test_missing_log_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = LogConfig {
            log_file: Some(
                temp_dir
                    .path()
                    .join("missing")
                    .join("tophn.log")
                    .to_string_lossy()
                    .into_owned(),
            ),
            ..Default::default()
        };

        assert!(dispatch(&config).is_err());
    }
}

//! Daily snapshot archive
//!
//! One record per calendar day holds the cached item list as it stood when
//! that day ended. Records live in an SQLite file keyed by `YYYY-MM-DD` and are
//! browsed by date through the `ArchiveReader`.

mod codec;
mod reader;
mod store;

pub use codec::{decode_items, encode_items, PAYLOAD_VERSION};
pub use reader::{paginate, ArchiveReader, ITEMS_PER_PAGE};
pub use store::{validate_bucket, SnapshotStore, DEFAULT_BUCKET};

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;

/// Format used for keys in the store
const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Identity of a snapshot: a local calendar date
///
/// Renders as `YYYY-MM-DD`, so the chronological order and the lexical order of
/// the stored keys agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // chrono accepts unpadded fields; keys must be exactly YYYY-MM-DD
        if s.len() != 10 {
            return Err(ArchiveError::InvalidDate(s.to_string()));
        }
        NaiveDate::parse_from_str(s, DATE_KEY_FORMAT)
            .map(Self)
            .map_err(|_| ArchiveError::InvalidDate(s.to_string()))
    }
}

/// Errors that can occur when reading or writing snapshots
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The database could not be opened, read or written
    #[error("Snapshot storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// No snapshot exists for the requested date
    #[error("No snapshot for {0}")]
    NotFound(DateKey),

    /// A stored payload could not be decoded
    #[error("Failed to decode snapshot: {0}")]
    Decode(#[from] serde_json::Error),

    /// A stored payload was written by an incompatible version
    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),

    /// Bucket names become table names and are restricted accordingly
    #[error("Invalid bucket name: '{0}'. Use letters, digits and '_', not starting with a digit")]
    InvalidBucket(String),

    /// A date string is not in YYYY-MM-DD form
    #[error("Invalid date: '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),
}

impl ArchiveError {
    /// Whether this is the ordinary "no snapshot for that date" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::NotFound(_))
    }
}

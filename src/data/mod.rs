//! Core data models and the item source abstraction
//!
//! This module contains the `Item` type fetched from the upstream content API,
//! the filters used to select which items are worth caching, and the
//! `ItemSource` trait the refresh loop pulls from.

pub mod hn;

pub use hn::{HnClient, ListKind};

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A single item from the upstream API (story, job, comment, ...)
///
/// Field names follow the Hacker News JSON shape so the same derive serves both
/// the API responses and the snapshot payloads. Any field may be missing or
/// `null` upstream and decodes to its zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    /// Upstream item id
    pub id: u64,
    /// Username of the submitter
    #[serde(rename = "by", deserialize_with = "null_as_default")]
    pub author: String,
    /// Title (stories, jobs and polls)
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    /// Link target; empty for text posts
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    /// HTML body; empty for link posts
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    /// Points
    #[serde(deserialize_with = "null_as_default")]
    pub score: i64,
    /// Creation time in unix seconds
    #[serde(deserialize_with = "null_as_default")]
    pub time: i64,
    /// Item type
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: ItemKind,
    /// Total comment count
    #[serde(deserialize_with = "null_as_default")]
    pub descendants: i64,
    /// Removed by its author
    pub deleted: bool,
    /// Killed by moderation
    pub dead: bool,
}

/// Types of items the API returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Story,
    Job,
    Comment,
    Poll,
    PollOpt,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Item {
    /// Creation time as a UTC timestamp, if `time` is in range
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time, 0)
    }

    /// Placeholder for an id the API answered with `null`
    pub fn deleted(id: u64) -> Self {
        Self {
            id,
            deleted: true,
            ..Default::default()
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Predicate selecting which items are kept by [`ItemSource::fetch_filtered`]
pub type ItemFilter = fn(&Item) -> bool;

/// Stories that link somewhere
pub fn only_story(item: &Item) -> bool {
    item.kind == ItemKind::Story && !item.url.is_empty()
}

/// Job postings
pub fn only_job(item: &Item) -> bool {
    item.kind == ItemKind::Job && !item.deleted && !item.dead
}

/// Text-only stories (Ask HN and friends)
pub fn only_ask(item: &Item) -> bool {
    item.kind == ItemKind::Story && item.url.is_empty() && !item.deleted && !item.dead
}

/// Everything that is still visible
pub fn any_item(item: &Item) -> bool {
    !item.deleted && !item.dead
}

/// Errors that can occur when talking to the item source
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed or returned a non-success status
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Failed to parse the response body
    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Upstream listing of ranked items
///
/// Implementations must be cheap to share between tasks; the refresh loop
/// holds one for its whole lifetime.
pub trait ItemSource: Send + Sync {
    /// Ranked item ids, truncated to `limit` when given
    fn list_ids(
        &self,
        limit: Option<usize>,
    ) -> impl Future<Output = Result<Vec<u64>, SourceError>> + Send;

    /// A single item by id
    fn fetch_item(&self, id: u64) -> impl Future<Output = Result<Item, SourceError>> + Send;

    /// Collects the first `n` items, in listing order, that pass `filter`
    ///
    /// Items are fetched one at a time and the walk stops as soon as `n` are
    /// collected. Returning fewer than `n` when the listing runs out is not an
    /// error. The first failed fetch aborts the whole walk.
    fn fetch_filtered(
        &self,
        n: usize,
        filter: ItemFilter,
    ) -> impl Future<Output = Result<Vec<Item>, SourceError>> + Send {
        async move {
            let mut items = Vec::new();
            if n == 0 {
                return Ok(items);
            }

            let ids = self.list_ids(None).await?;
            for id in ids {
                let item = self.fetch_item(id).await?;
                if filter(&item) {
                    items.push(item);
                    if items.len() == n {
                        break;
                    }
                }
            }

            Ok(items)
        }
    }
}

//! Hacker News API client
//!
//! This module fetches ranked id listings and individual items from the
//! Hacker News Firebase API and decodes them into our `Item` structures.

use log::debug;
use reqwest::Client;

use super::{Item, ItemSource, SourceError};

/// Base URL for the Hacker News API
const HN_API_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// Which ranked listing to walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListKind {
    #[default]
    Top,
    New,
    Best,
    Ask,
    Show,
    Job,
}

impl ListKind {
    /// Parses a listing name, accepting a few common aliases
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "top" | "topstories" => Some(ListKind::Top),
            "new" | "newest" | "newstories" => Some(ListKind::New),
            "best" | "beststories" => Some(ListKind::Best),
            "ask" | "askstories" => Some(ListKind::Ask),
            "show" | "showstories" => Some(ListKind::Show),
            "job" | "jobs" | "jobstories" => Some(ListKind::Job),
            _ => None,
        }
    }

    /// Name of the JSON endpoint for this listing
    pub fn endpoint(&self) -> &'static str {
        match self {
            ListKind::Top => "topstories.json",
            ListKind::New => "newstories.json",
            ListKind::Best => "beststories.json",
            ListKind::Ask => "askstories.json",
            ListKind::Show => "showstories.json",
            ListKind::Job => "jobstories.json",
        }
    }
}

/// Client for the Hacker News API
///
/// Holds no state besides the shared `reqwest::Client`, so clones are cheap
/// and it can be used from any number of tasks.
#[derive(Debug, Clone)]
pub struct HnClient {
    client: Client,
    base_url: String,
    list: ListKind,
}

impl Default for HnClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HnClient {
    /// Create a new HnClient with default settings
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Create a new HnClient with a custom HTTP client
    ///
    /// Use this to set request timeouts or a user agent; the API client adds
    /// none of its own.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: HN_API_BASE_URL.to_string(),
            list: ListKind::default(),
        }
    }

    /// Point the client at a different API root (mirrors, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Walk a different ranked listing
    pub fn with_list(mut self, list: ListKind) -> Self {
        self.list = list;
        self
    }

    fn list_url(&self) -> String {
        format!("{}/{}", self.base_url, self.list.endpoint())
    }

    fn item_url(&self, id: u64) -> String {
        format!("{}/item/{}.json", self.base_url, id)
    }

    async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Parse a listing response body into ids, keeping at most `limit`
pub fn parse_ids(body: &str, limit: Option<usize>) -> Result<Vec<u64>, SourceError> {
    let mut ids: Vec<u64> = serde_json::from_str(body)?;
    if let Some(limit) = limit {
        ids.truncate(limit);
    }
    Ok(ids)
}

/// Parse an item response body
///
/// The API answers `null` for ids that no longer exist; those become a
/// deleted placeholder so a listing walk can step over them.
pub fn parse_item(id: u64, body: &str) -> Result<Item, SourceError> {
    let item: Option<Item> = serde_json::from_str(body)?;
    Ok(item.unwrap_or_else(|| Item::deleted(id)))
}

impl ItemSource for HnClient {
    async fn list_ids(&self, limit: Option<usize>) -> Result<Vec<u64>, SourceError> {
        let body = self.get_text(&self.list_url()).await?;
        parse_ids(&body, limit)
    }

    async fn fetch_item(&self, id: u64) -> Result<Item, SourceError> {
        let body = self.get_text(&self.item_url(id)).await?;
        parse_item(id, &body)
    }
}

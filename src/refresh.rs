//! Background refresh and daily snapshot loop
//!
//! The `Refresher` pulls the top items from an `ItemSource` on a fixed interval
//! and publishes them to the shared `ItemCache`. On a separate, finer timer it
//! watches for the local calendar day to change and archives the set that was
//! current when the day ended.
//!
//! The loop is fail-fast: the first fetch or snapshot error stops it, marks the
//! cache `Failed` and leaves the error for a reader to pick up.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{debug, error, info, warn};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::archive::{encode_items, ArchiveError, DateKey, SnapshotStore};
use crate::cache::{CachedSet, ItemCache};
use crate::data::{only_story, ItemFilter, ItemSource, SourceError};

/// Tokio intervals panic on a zero period
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Errors that stop the refresh loop
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Fetching the top items failed
    #[error("could not refresh items: {0}")]
    Source(#[from] SourceError),

    /// Writing the daily snapshot failed
    #[error("could not write snapshot: {0}")]
    Snapshot(#[from] ArchiveError),
}

/// Configuration for the refresh loop
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Interval between item refreshes
    pub refresh_interval: Duration,
    /// Interval between day-rollover checks
    pub snapshot_check_interval: Duration,
    /// Number of items kept in the cache
    pub cache_size: usize,
    /// Which items are worth keeping
    pub filter: ItemFilter,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(15 * 60), // 15 minutes
            snapshot_check_interval: Duration::from_secs(60), // 1 minute
            cache_size: 10,
            filter: only_story,
        }
    }
}

/// Source of local wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The system's local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Owner of the refresh loop
///
/// Built with everything it needs passed in, then consumed by [`start`].
///
/// [`start`]: Refresher::start
pub struct Refresher<S, C = SystemClock> {
    source: S,
    store: Arc<SnapshotStore>,
    cache: Arc<ItemCache>,
    config: RefreshConfig,
    clock: C,
    /// Local date the loop last observed; a later date means a rollover
    current_day: NaiveDate,
}

impl<S: ItemSource + 'static> Refresher<S> {
    /// Creates a refresher driven by the system clock
    pub fn new(
        source: S,
        store: Arc<SnapshotStore>,
        cache: Arc<ItemCache>,
        config: RefreshConfig,
    ) -> Self {
        Self::with_clock(source, store, cache, config, SystemClock)
    }
}

impl<S, C> Refresher<S, C>
where
    S: ItemSource + 'static,
    C: Clock + 'static,
{
    /// Creates a refresher driven by `clock`
    pub fn with_clock(
        source: S,
        store: Arc<SnapshotStore>,
        cache: Arc<ItemCache>,
        config: RefreshConfig,
        clock: C,
    ) -> Self {
        let current_day = clock.now().date();
        Self {
            source,
            store,
            cache,
            config,
            clock,
            current_day,
        }
    }

    /// Runs one refresh now, then spawns the background loop
    ///
    /// # Returns
    /// * `Some(JoinHandle)` for the running loop
    /// * `None` if the initial refresh failed; the cache is then `Failed` and
    ///   holds the error
    pub async fn start(mut self) -> Option<JoinHandle<()>> {
        if let Err(e) = self.refresh_once().await {
            self.halt(e).await;
            return None;
        }
        Some(tokio::spawn(self.run()))
    }

    async fn run(mut self) {
        if let Err(e) = self.drive().await {
            self.halt(e).await;
        }
    }

    async fn drive(&mut self) -> Result<(), RefreshError> {
        let refresh_every = self.config.refresh_interval.max(MIN_INTERVAL);
        let mut refresh = time::interval_at(Instant::now() + refresh_every, refresh_every);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut rollover = time::interval(self.config.snapshot_check_interval.max(MIN_INTERVAL));
        rollover.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = refresh.tick() => {
                    self.refresh_once().await?;
                }
                _ = rollover.tick() => {
                    self.check_rollover().await?;
                }
            }
        }
    }

    async fn halt(&self, e: RefreshError) {
        error!("Refresh loop stopped: {}", e);
        self.cache.fail(e).await;
    }

    /// Fetches the top items and publishes them as the current set
    ///
    /// The fetch runs without holding any lock. If the day changed while it
    /// ran, the outgoing set is archived before the new one replaces it. On
    /// error the current set is left untouched.
    ///
    /// # Returns
    /// * `Ok(count)` - number of items now cached
    /// * `Err(RefreshError::Source)` - if the fetch failed
    /// * `Err(RefreshError::Snapshot)` - if the pending rollover could not be
    ///   written
    pub async fn refresh_once(&mut self) -> Result<usize, RefreshError> {
        let items = self
            .source
            .fetch_filtered(self.config.cache_size, self.config.filter)
            .await?;
        let count = items.len();
        if count < self.config.cache_size {
            debug!(
                "Listing ran out after {} of {} items",
                count, self.config.cache_size
            );
        }

        self.check_rollover().await?;
        self.cache
            .replace(CachedSet::new(items, self.clock.now()))
            .await;
        info!("Refreshed cache with {} items", count);
        Ok(count)
    }

    /// Archives the current set if the local day changed since the last check
    ///
    /// The set is stored under the day that just ended. If several days passed
    /// between checks, only that last observed day is written.
    ///
    /// # Returns
    /// * `Ok(Some(date))` - a snapshot was written for `date`
    /// * `Ok(None)` - same day, or nothing cached to archive
    /// * `Err(RefreshError::Snapshot)` - if encoding or storage failed
    pub async fn check_rollover(&mut self) -> Result<Option<DateKey>, RefreshError> {
        let today = self.clock.now().date();
        if today <= self.current_day {
            return Ok(None);
        }

        let completed = DateKey::new(self.current_day);
        self.current_day = today;

        let Some(set) = self.cache.current().await else {
            warn!("Day {} ended with an empty cache, nothing archived", completed);
            return Ok(None);
        };

        let payload = encode_items(&set.items)?;
        self.store.put(&completed, &payload).await?;
        info!(
            "Archived {} items for {} ({} bytes)",
            set.items.len(),
            completed,
            payload.len()
        );
        Ok(Some(completed))
    }
}

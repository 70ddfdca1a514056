//! Cache of the current top items, shared between the refresh loop and readers

use std::sync::Arc;

use chrono::NaiveDateTime;
use log::warn;
use tokio::sync::{mpsc, Mutex, RwLock};

use crate::data::Item;
use crate::refresh::RefreshError;

/// One complete refresh result
///
/// Sets are built fully before they are published and are never modified
/// afterwards, so a reader holding one always sees a whole list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSet {
    /// Items in discovery order
    pub items: Vec<Item>,
    /// Local wall-clock time the set was captured
    pub captured_at: NaiveDateTime,
}

impl CachedSet {
    pub fn new(items: Vec<Item>, captured_at: NaiveDateTime) -> Self {
        Self { items, captured_at }
    }
}

/// Lifecycle of the cache as seen by readers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No refresh has completed yet
    Empty,
    /// Serving the latest successful refresh
    Live,
    /// The refresh loop stopped on an error; the last good set (if any) is stale
    Failed,
}

/// Consistent view of state and set taken under one lock acquisition
#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub state: CacheState,
    pub set: Option<Arc<CachedSet>>,
}

#[derive(Debug, Default)]
struct Slot {
    set: Option<Arc<CachedSet>>,
    failed: bool,
}

/// Shared cache of the current top items
///
/// Cloning the `Arc` around an `ItemCache` is how request handlers get access;
/// the refresh loop holds another clone and is the only writer.
#[derive(Debug)]
pub struct ItemCache {
    slot: RwLock<Slot>,
    error_tx: mpsc::Sender<RefreshError>,
    error_rx: Mutex<mpsc::Receiver<RefreshError>>,
}

impl Default for ItemCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        // At most one undelivered error
        let (error_tx, error_rx) = mpsc::channel(1);
        Self {
            slot: RwLock::new(Slot::default()),
            error_tx,
            error_rx: Mutex::new(error_rx),
        }
    }

    /// The last successfully captured set, if any
    pub async fn current(&self) -> Option<Arc<CachedSet>> {
        self.slot.read().await.set.clone()
    }

    /// Items of the last successfully captured set; empty while still `Empty`
    pub async fn current_items(&self) -> Vec<Item> {
        let set = self.current().await;
        set.map(|set| set.items.clone()).unwrap_or_default()
    }

    /// Current lifecycle state
    pub async fn state(&self) -> CacheState {
        let slot = self.slot.read().await;
        Self::state_of(&slot)
    }

    /// State and set from the same read
    pub async fn status(&self) -> CacheStatus {
        let slot = self.slot.read().await;
        CacheStatus {
            state: Self::state_of(&slot),
            set: slot.set.clone(),
        }
    }

    /// Takes the error that stopped the refresh loop, if it has not been taken
    ///
    /// Never blocks: returns `None` when no error is waiting.
    pub async fn take_error(&self) -> Option<RefreshError> {
        self.error_rx.lock().await.try_recv().ok()
    }

    fn state_of(slot: &Slot) -> CacheState {
        match (slot.failed, &slot.set) {
            (true, _) => CacheState::Failed,
            (false, Some(_)) => CacheState::Live,
            (false, None) => CacheState::Empty,
        }
    }

    /// Publishes a new set, replacing the previous one wholesale
    pub(crate) async fn replace(&self, set: CachedSet) {
        let set = Arc::new(set);
        let mut slot = self.slot.write().await;
        slot.set = Some(set);
        slot.failed = false;
    }

    /// Marks the cache failed and hands `error` to the next reader
    ///
    /// The current set is left in place. If an earlier error is still unread,
    /// the new one is dropped rather than waiting for a reader.
    pub(crate) async fn fail(&self, error: RefreshError) {
        self.slot.write().await.failed = true;
        if let Err(e) = self.error_tx.try_send(error) {
            warn!("Dropping refresh error, previous one not yet read: {}", e);
        }
    }
}

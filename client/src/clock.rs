//! Clock synchronization against the authority's clock

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::task::JoinHandle;

use crate::store::DocumentStore;

/// Source of local wall-clock time in epoch milliseconds
pub trait LocalClock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// The operating system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl LocalClock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(now_millis),
        }
    }

    pub fn set(&self, now_millis: i64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl LocalClock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Estimated authority time: local time plus the last known offset.
///
/// A failed refresh keeps the previous offset, so deadlines stay
/// computable while the feed is down.
pub struct ClockSync {
    local: Arc<dyn LocalClock>,
    offset: AtomicI64,
}

impl ClockSync {
    pub fn new(local: Arc<dyn LocalClock>) -> Self {
        Self {
            local,
            offset: AtomicI64::new(0),
        }
    }

    /// Estimated `authority_now - local_now` in milliseconds
    pub fn offset_millis(&self) -> i64 {
        self.offset.load(Ordering::SeqCst)
    }

    /// Estimated authority time in epoch milliseconds
    pub fn now_millis(&self) -> i64 {
        self.local.now_millis().saturating_add(self.offset_millis())
    }

    /// Read the offset back from the store, keeping the last value on failure
    pub async fn refresh(&self, store: &dyn DocumentStore) {
        match store.server_offset_millis().await {
            Ok(offset) => {
                let previous = self.offset.swap(offset, Ordering::SeqCst);
                if previous != offset {
                    tracing::debug!(offset_ms = offset, previous_ms = previous, "Clock offset updated");
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    offset_ms = self.offset_millis(),
                    "Clock offset refresh failed, keeping last known offset"
                );
            }
        }
    }

    /// Spawn a task refreshing the offset every `period`, starting one
    /// period from now
    pub(crate) fn spawn_refresh(
        self: &Arc<Self>,
        store: Arc<dyn DocumentStore>,
        period: Duration,
    ) -> JoinHandle<()> {
        let clock = Arc::clone(self);
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            loop {
                ticker.tick().await;
                clock.refresh(store.as_ref()).await;
            }
        })
    }
}

//! In-memory package cache with stale fallback
//!
//! The cache publishes immutable [`Snapshot`]s. A refresh builds a complete
//! new snapshot and swaps it in as one value; readers holding the previous
//! `Arc<Snapshot>` keep a consistent view until they drop it. A failed fetch
//! publishes nothing, so the last good listing keeps being served.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::source::{fetch_with_timeout, PackageSource};
use super::PackageRecord;

/// One complete, immutable package listing
#[derive(Debug, Default)]
pub struct Snapshot {
    records: Vec<PackageRecord>,
    generation: u64,
    fetched_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn new(records: Vec<PackageRecord>, generation: u64) -> Self {
        Self {
            records,
            generation,
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn records(&self) -> &[PackageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 0 for the startup snapshot, incremented on every successful refresh
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }
}

/// Process-wide package cache
pub struct RecordCache {
    source: Arc<dyn PackageSource>,
    fetch_timeout: Duration,
    published: watch::Sender<Arc<Snapshot>>,
    /// Serialises refreshes; the periodic task and the admin command may race
    refresh_lock: Mutex<()>,
}

impl RecordCache {
    /// Create a cache holding an empty snapshot
    pub fn new(source: Arc<dyn PackageSource>, fetch_timeout: Duration) -> Self {
        let (published, _) = watch::channel(Arc::new(Snapshot::default()));
        Self {
            source,
            fetch_timeout,
            published,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Latest published snapshot
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.published.borrow())
    }

    /// Receiver notified whenever a new snapshot is published
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.published.subscribe()
    }

    /// Fetch from the source and publish the result
    ///
    /// Returns the new snapshot, or the previous one unchanged if the fetch
    /// failed. Never returns an error.
    pub async fn refresh(&self) -> Arc<Snapshot> {
        let _guard = self.refresh_lock.lock().await;
        let started = Instant::now();

        match fetch_with_timeout(self.source.as_ref(), self.fetch_timeout).await {
            Ok(records) => {
                let generation = self.current().generation() + 1;
                let snapshot = Arc::new(Snapshot::new(records, generation));
                self.published.send_replace(Arc::clone(&snapshot));

                info!(
                    source = self.source.name(),
                    packages = snapshot.len(),
                    generation,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Fetched all mods at [{}]",
                    snapshot
                        .fetched_at()
                        .map(|t| t.format("%Y-%m-%d, %H:%M:%S").to_string())
                        .unwrap_or_default()
                );
                snapshot
            }
            Err(e) => {
                let previous = self.current();
                warn!(
                    source = self.source.name(),
                    generation = previous.generation(),
                    "Package fetch failed, keeping previous snapshot: {}",
                    e
                );
                previous
            }
        }
    }

    /// Refresh now, then again `period` after each refresh completes
    ///
    /// Fixed delay: a slow fetch pushes the next one back rather than
    /// causing a burst. The task runs until the runtime shuts down.
    pub fn spawn_refresh_loop(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                cache.refresh().await;
                tokio::time::sleep(period).await;
            }
        })
    }
}

//! Test helpers shared by the integration tests
//!
//! Fixture records are built from registry-shaped JSON so they go through
//! the same lenient deserialization as live data.

#![allow(dead_code)]

use async_trait::async_trait;
use fixerbot::catalog::{PackageRecord, PackageSource, RecordCache};
use fixerbot::dispatch::{Gateway, InboundMessage, MemberPermissions, OutboundMessage};
use fixerbot::{FetchError, FixerError, Result};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// One registry package with a single active version
pub fn package(owner: &str, name: &str, description: &str, dependencies: &[&str]) -> PackageRecord {
    serde_json::from_value(json!({
        "name": name,
        "full_name": format!("{owner}-{name}"),
        "owner": owner,
        "package_url": format!("https://thunderstore.io/c/silksong/p/{owner}/{name}/"),
        "is_deprecated": false,
        "versions": [{
            "name": name,
            "version_number": "1.0.0",
            "description": description,
            "icon": format!("https://gcdn.thunderstore.io/live/repository/icons/{owner}-{name}-1.0.0.png"),
            "download_url": format!("https://thunderstore.io/package/download/{owner}/{name}/1.0.0/"),
            "website_url": format!("https://github.com/{owner}/{name}"),
            "is_active": true,
            "date_created": "2025-09-01T12:00:00Z",
            "dependencies": dependencies,
        }]
    }))
    .expect("fixture record deserializes")
}

/// Small listing used across the integration tests
pub fn fixture_records() -> Vec<PackageRecord> {
    vec![
        package(
            "Ashen",
            "Moss_Cloak",
            "A cloak woven from moss",
            &[
                "BepInEx-BepInExPack_Silksong-5.4.2304",
                "Ashen-Thread_Lib-1.2.0",
            ],
        ),
        package("Weaver", "Silk_Spool", "More silk per spool", &[]),
        package(
            "Pale",
            "Bellhart_Map",
            "Annotated map of Bellhart",
            &[
                "Ashen-Thread_Lib-1.2.0",
                "Weaver-Silk_Spool-2.0.0",
                "Pale-Map_Core-0.3.1",
                "Pale-Icons-1.0.0",
            ],
        ),
    ]
}

/// Source returning a fixed listing, or failing when `fail` is set
pub struct FakeSource {
    outcomes: Mutex<VecDeque<Option<Vec<PackageRecord>>>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl FakeSource {
    /// Replays `outcomes` in order, then repeats the last one; `None` fails
    pub fn scripted(outcomes: Vec<Option<Vec<PackageRecord>>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn serving(records: Vec<PackageRecord>) -> Self {
        Self::scripted(vec![Some(records)])
    }

    pub fn failing() -> Self {
        Self::scripted(vec![None])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PackageSource for FakeSource {
    async fn fetch_all(&self) -> std::result::Result<Vec<PackageRecord>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = {
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.len() > 1 {
                outcomes.pop_front().flatten()
            } else {
                outcomes.front().cloned().flatten()
            }
        };
        next.ok_or_else(|| FetchError::EmptyIndex("fake://index".to_string()))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Gateway that records every delivered message
#[derive(Default)]
pub struct RecordingGateway {
    delivered: Mutex<Vec<OutboundMessage>>,
    fail: bool,
}

impl RecordingGateway {
    pub fn failing() -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn delivered(&self) -> Vec<OutboundMessage> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn deliver(&self, message: OutboundMessage) -> Result<()> {
        self.delivered.lock().unwrap().push(message);
        if self.fail {
            return Err(FixerError::Gateway("channel unavailable".to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Cache over `source`, already refreshed once
pub async fn warm_cache(source: Arc<FakeSource>) -> Arc<RecordCache> {
    let cache = Arc::new(RecordCache::new(source, Duration::from_secs(5)));
    cache.refresh().await;
    cache
}

pub fn message(content: &str, manage_messages: Option<bool>) -> InboundMessage {
    InboundMessage {
        channel_id: "channel-1".to_string(),
        message_id: "message-1".to_string(),
        content: content.to_string(),
        member: manage_messages.map(|manage_messages| MemberPermissions { manage_messages }),
    }
}

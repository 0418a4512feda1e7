//! Inbound message routing
//!
//! Every `{{name}}` token in a message becomes one detached task: either a
//! lookup answered from the current snapshot, or the `{{reloadcache}}`
//! admin command. The caller delivering messages never waits on either.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::RecordCache;
use crate::error::Result;
use crate::summary::{Embed, Reply, SummaryBuilder, SummarySettings};

/// Two braces, letters/digits/underscores/spaces, two braces
static TRIGGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([A-Za-z0-9_ ]+)\}\}").expect("trigger pattern is valid"));

/// Admin query, compared with spaces removed and case ignored
pub const RELOAD_COMMAND: &str = "reloadcache";

pub const RELOAD_CONFIRMATION: &str = "Reloaded mod cache.";

/// Queries carried by every trigger token in `text`, trimmed
pub fn extract_queries(text: &str) -> Vec<String> {
    TRIGGER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        // `{{   }}` gets no reply at all, not a not-found for an empty name
        .filter(|q| !q.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Reload,
    Lookup(String),
}

impl Command {
    pub fn parse(query: &str) -> Self {
        if query.replace(' ', "").eq_ignore_ascii_case(RELOAD_COMMAND) {
            Command::Reload
        } else {
            Command::Lookup(query.to_string())
        }
    }
}

/// Permissions of the sender within the channel's server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberPermissions {
    pub manage_messages: bool,
}

/// A message as delivered by the messaging gateway
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub channel_id: String,
    pub message_id: String,
    pub content: String,
    /// `None` outside a server (direct messages)
    pub member: Option<MemberPermissions>,
}

/// A reply handed back to the messaging gateway
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub channel_id: String,
    /// Message being replied to
    pub reply_to: Option<String>,
    pub mention_author: bool,
    pub body: Reply,
    pub color: u32,
}

impl OutboundMessage {
    pub fn embed(&self) -> Option<Embed> {
        self.body.to_embed(self.color)
    }
}

/// Outbound side of the chat platform
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn deliver(&self, message: OutboundMessage) -> Result<()>;

    /// Gateway identifier for logging
    fn name(&self) -> &str;
}

/// Routes trigger tokens to lookup or reload workers
pub struct Dispatcher {
    cache: Arc<RecordCache>,
    gateway: Arc<dyn Gateway>,
    settings: SummarySettings,
    /// Unset: every trigger runs immediately, without backpressure
    limiter: Option<Arc<Semaphore>>,
}

impl Dispatcher {
    pub fn new(
        cache: Arc<RecordCache>,
        gateway: Arc<dyn Gateway>,
        settings: SummarySettings,
    ) -> Self {
        Self {
            cache,
            gateway,
            settings,
            limiter: None,
        }
    }

    /// Bound the number of lookups computed at once
    pub fn with_max_concurrent_lookups(mut self, limit: Option<usize>) -> Self {
        self.limiter = limit.map(|n| Arc::new(Semaphore::new(n)));
        self
    }

    /// Spawn one worker per trigger token and return immediately
    pub fn dispatch(self: &Arc<Self>, message: InboundMessage) -> Vec<JoinHandle<()>> {
        let queries = extract_queries(&message.content);
        if queries.is_empty() {
            return Vec::new();
        }

        debug!(
            channel = %message.channel_id,
            triggers = queries.len(),
            "Dispatching triggers"
        );
        let message = Arc::new(message);
        queries
            .into_iter()
            .map(|query| {
                let dispatcher = Arc::clone(self);
                let message = Arc::clone(&message);
                tokio::spawn(async move { dispatcher.handle(&message, &query).await })
            })
            .collect()
    }

    /// Handle one trigger query to completion
    pub async fn handle(&self, message: &InboundMessage, query: &str) {
        match Command::parse(query) {
            Command::Reload => self.reload(message).await,
            Command::Lookup(query) => self.lookup(message, &query).await,
        }
    }

    async fn reload(&self, message: &InboundMessage) {
        let allowed = message.member.is_some_and(|m| m.manage_messages);
        if !allowed {
            debug!(
                channel = %message.channel_id,
                "Ignoring cache reload without message management permission"
            );
            return;
        }

        let snapshot = self.cache.refresh().await;
        info!(
            packages = snapshot.len(),
            generation = snapshot.generation(),
            "Cache reloaded on request"
        );
        self.send(message, Reply::Text(RELOAD_CONFIRMATION.to_string()))
            .await;
    }

    async fn lookup(&self, message: &InboundMessage, query: &str) {
        let _permit = match &self.limiter {
            Some(limiter) => Arc::clone(limiter).acquire_owned().await.ok(),
            None => None,
        };

        let snapshot = self.cache.current();
        let reply = SummaryBuilder::new(snapshot.records(), &self.settings).respond(query);
        debug!(
            query,
            generation = snapshot.generation(),
            found = matches!(reply, Reply::Summary(_)),
            "Lookup answered"
        );
        self.send(message, reply).await;
    }

    async fn send(&self, message: &InboundMessage, body: Reply) {
        let outbound = OutboundMessage {
            channel_id: message.channel_id.clone(),
            reply_to: Some(message.message_id.clone()),
            mention_author: false,
            body,
            color: self.settings.embed_color,
        };

        if let Err(e) = self.gateway.deliver(outbound).await {
            warn!(gateway = self.gateway.name(), "Failed to deliver reply: {}", e);
        }
    }
}

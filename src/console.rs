//! Terminal gateway
//!
//! Treats each stdin line as one chat message and prints replies to
//! stdout. Useful for trying the bot without a chat platform connection.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::dispatch::{Dispatcher, Gateway, InboundMessage, MemberPermissions, OutboundMessage};
use crate::error::Result;
use crate::summary::{Embed, Reply};

pub const CONSOLE_CHANNEL: &str = "console";

pub struct ConsoleGateway;

#[async_trait]
impl Gateway for ConsoleGateway {
    async fn deliver(&self, message: OutboundMessage) -> Result<()> {
        println!("{}", render(&message));
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// Plain-text rendering of a reply
pub fn render(message: &OutboundMessage) -> String {
    match (&message.body, message.embed()) {
        (Reply::Text(text), _) => format!("> {text}"),
        (_, Some(embed)) => render_embed(&embed),
        (_, None) => String::new(),
    }
}

fn render_embed(embed: &Embed) -> String {
    let mut out = format!("== {} ==\n", embed.title);
    if !embed.description.is_empty() {
        out.push_str(&embed.description);
        out.push('\n');
    }
    for field in &embed.fields {
        out.push_str(&format!("{}:\n", field.name));
        for line in field.value.lines() {
            out.push_str(&format!("  {line}\n"));
        }
    }
    if let Some(thumbnail) = &embed.thumbnail {
        out.push_str(&format!("Icon: {thumbnail}\n"));
    }
    out.trim_end().to_string()
}

/// Feed stdin lines to the dispatcher until EOF, then wait for replies
///
/// `admin` grants the message management permission to every line, which
/// is what `{{reloadcache}}` requires.
pub async fn run(dispatcher: Arc<Dispatcher>, admin: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = Vec::new();
    let mut sequence: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        sequence += 1;
        let message = InboundMessage {
            channel_id: CONSOLE_CHANNEL.to_string(),
            message_id: sequence.to_string(),
            content: line,
            member: Some(MemberPermissions {
                manage_messages: admin,
            }),
        };
        in_flight.extend(dispatcher.dispatch(message));

        let (finished, pending): (Vec<_>, Vec<_>) =
            in_flight.into_iter().partition(|handle| handle.is_finished());
        in_flight = pending;
        join_workers(finished).await;
    }

    debug!("Console input closed, waiting for {} worker(s)", in_flight.len());
    join_workers(in_flight).await;
    Ok(())
}

/// Await worker tasks, logging any that panicked or were cancelled
///
/// Returns the number of workers that did not complete normally.
pub async fn join_workers(handles: Vec<JoinHandle<()>>) -> usize {
    let mut failed = 0;
    for handle in handles {
        if let Err(e) = handle.await {
            failed += 1;
            warn!("Lookup worker failed: {}", e);
        }
    }
    failed
}

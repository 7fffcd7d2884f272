//! Hosting transports: where messages come from and replies go to
//!
//! A transport feeds `(sender, text)` pairs into [`dispatch`], which runs the
//! handler under the per-message deadline and hands the reply to an
//! [`Outbound`].

pub mod console;
pub mod webhook;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::bot::MessageHandler;
use crate::models::ReplyMessage;

/// Reply sent when handling a message exceeds the deadline
pub const TIMEOUT_TEXT: &str =
    "Sorry, that took too long. Please try again in a moment.";

/// Delivers replies back to the sender
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send(&self, destination: &str, reply: &ReplyMessage) -> anyhow::Result<()>;
}

/// Handle one message and deliver its reply.
///
/// On timeout the handler future is dropped, abandoning any in-flight
/// requests, and [`TIMEOUT_TEXT`] is sent instead.
pub async fn dispatch(
    handler: &dyn MessageHandler,
    outbound: &dyn Outbound,
    sender: &str,
    text: &str,
    timeout: Duration,
) -> anyhow::Result<ReplyMessage> {
    debug!("Message from '{}': {:?}", sender, text);

    let reply = match tokio::time::timeout(timeout, handler.handle(text)).await {
        Ok(reply) => reply,
        Err(_) => {
            warn!(
                "Handling message from '{}' exceeded {:.1}s",
                sender,
                timeout.as_secs_f64()
            );
            ReplyMessage::text(TIMEOUT_TEXT)
        }
    };

    outbound.send(sender, &reply).await?;
    Ok(reply)
}

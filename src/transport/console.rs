//! Console transport: queries from stdin, replies on stdout

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use super::{Outbound, dispatch};
use crate::bot::MessageHandler;
use crate::config::TransportConfig;
use crate::models::ReplyMessage;

/// Sender id used for every console message
pub const CONSOLE_SENDER: &str = "console";

/// Prints replies and stores attachments on disk
pub struct ConsoleOutbound {
    attachments_dir: PathBuf,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleOutbound {
    pub fn new(attachments_dir: impl Into<PathBuf>) -> Self {
        Self::with_writer(attachments_dir, std::io::stdout())
    }

    /// Print replies to `out` instead of stdout
    pub fn with_writer(
        attachments_dir: impl Into<PathBuf>,
        out: impl Write + Send + 'static,
    ) -> Self {
        Self {
            attachments_dir: attachments_dir.into(),
            out: Mutex::new(Box::new(out)),
        }
    }

    fn print(&self, block: &str) -> anyhow::Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow::anyhow!("Console writer lock poisoned"))?;
        out.write_all(block.as_bytes())
            .and_then(|()| out.flush())
            .context("Failed to write reply to stdout")
    }

    /// Write the attachment, returning where it was stored
    async fn save_attachment(&self, reply: &ReplyMessage) -> anyhow::Result<Option<PathBuf>> {
        let Some(image) = &reply.attachment else {
            return Ok(None);
        };
        tokio::fs::create_dir_all(&self.attachments_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create attachments directory {}",
                    self.attachments_dir.display()
                )
            })?;
        let path = self.attachments_dir.join(&image.file_name);
        tokio::fs::write(&path, &image.bytes)
            .await
            .with_context(|| format!("Failed to write attachment {}", path.display()))?;
        Ok(Some(path))
    }
}

#[async_trait]
impl Outbound for ConsoleOutbound {
    /// The text is printed before the attachment is stored, so a disk
    /// failure only costs the image line.
    async fn send(&self, _destination: &str, reply: &ReplyMessage) -> anyhow::Result<()> {
        let mut block = String::new();
        if let Some(title) = &reply.title {
            block.push_str(&format!("== {title} ==\n"));
        }
        block.push_str(&reply.text);
        block.push('\n');
        self.print(&block)?;

        let trailer = match (self.save_attachment(reply).await, &reply.attachment) {
            (Ok(Some(path)), Some(image)) => format!(
                "[{} attachment, {} bytes, captured {}: {}]\n\n",
                image.content_type,
                image.len(),
                image.captured_at.format("%Y-%m-%d %H:%M UTC"),
                path.display()
            ),
            (Err(e), Some(image)) => {
                warn!("Could not save attachment {}: {:#}", image.file_name, e);
                format!("[{} attachment not saved]\n\n", image.content_type)
            }
            _ => "\n".to_string(),
        };
        self.print(&trailer)
    }
}

/// Serve queries from stdin until EOF
pub async fn run(handler: &dyn MessageHandler, config: &TransportConfig) -> anyhow::Result<()> {
    let outbound = ConsoleOutbound::new(&config.attachments_dir);
    let timeout = Duration::from_secs(config.request_timeout_seconds.into());
    info!("Reading queries from stdin (type 'help' for formats)");
    serve_lines(handler, &outbound, BufReader::new(tokio::io::stdin()), timeout).await
}

/// Dispatch every line of `reader` as one message. Bytes that are not
/// valid UTF-8 are replaced rather than ending the session.
pub async fn serve_lines<R>(
    handler: &dyn MessageHandler,
    outbound: &dyn Outbound,
    mut reader: R,
    timeout: Duration,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("Failed to read from stdin")?;
        if read == 0 {
            break;
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        let line = String::from_utf8_lossy(&buf);
        if let Err(e) = dispatch(handler, outbound, CONSOLE_SENDER, &line, timeout).await {
            error!("Failed to deliver reply: {:#}", e);
        }
    }
    info!("Input closed, stopping console transport");
    Ok(())
}

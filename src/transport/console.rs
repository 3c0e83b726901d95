//! Stdio console transport for local development.
//!
//! Outbound messages print to stdout; quote-replies are printed with a short
//! reference token. An input line of the form `@<ref> <text>` is delivered
//! as a reply to that token, which is how the multi-step alarm conversation
//! is exercised from a terminal.

use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

use crate::models::content::{render_text, ContentItem};
use crate::models::GroupId;
use crate::Result;

use super::{InboundMessage, MessageRef, Transport};

/// Sender id assigned to console input.
const CONSOLE_SENDER: u64 = 1;

fn short_ref() -> MessageRef {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_owned()
}

/// Transport printing all outbound traffic to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleTransport;

impl ConsoleTransport {
    /// Create a console transport.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Transport for ConsoleTransport {
    fn send<'a>(
        &'a self,
        group: GroupId,
        payload: &'a [ContentItem],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            println!("[group {group}] {}", render_text(payload));
            Ok(())
        })
    }

    fn quote_reply<'a>(
        &'a self,
        message: &'a InboundMessage,
        payload: Vec<ContentItem>,
    ) -> Pin<Box<dyn Future<Output = Result<MessageRef>> + Send + 'a>> {
        Box::pin(async move {
            let message_ref = short_ref();
            println!(
                "[group {}] #{message_ref} {}",
                message.group,
                render_text(&payload)
            );
            Ok(message_ref)
        })
    }
}

/// Spawn the stdin reader feeding inbound console messages into `tx`.
///
/// Reading stops on EOF, on a closed receiver, or when `cancel` fires.
#[must_use]
pub fn serve_stdin(
    group: GroupId,
    tx: mpsc::Sender<InboundMessage>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                () = cancel.cancelled() => return,
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => return,
                        Err(err) => {
                            warn!(%err, "stdin read failed");
                            return;
                        }
                    };
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let (reply_to, text) = parse_console_line(line);
                    let message = InboundMessage {
                        group,
                        sender: CONSOLE_SENDER,
                        text: text.to_owned(),
                        content: vec![ContentItem::Text(text.to_owned())],
                        message_ref: short_ref(),
                        reply_to,
                    };
                    if tx.send(message).await.is_err() {
                        return;
                    }
                }
            }
        }
    })
}

/// Split a console line into an optional reply token and the message text.
fn parse_console_line(line: &str) -> (Option<MessageRef>, &str) {
    match line.strip_prefix('@') {
        Some(rest) => match rest.split_once(' ') {
            Some((token, text)) => (Some(token.to_owned()), text.trim()),
            None => (Some(rest.to_owned()), ""),
        },
        None => (None, line),
    }
}

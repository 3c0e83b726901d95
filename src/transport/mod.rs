//! Messaging transport boundary.
//!
//! The scheduler and conversation core never talk to a chat platform
//! directly; they require only [`Transport`]: send a payload to a group, and
//! quote-reply to an inbound message returning a reference that later replies
//! can be correlated against. Implementations: [`console::ConsoleTransport`]
//! for development and [`channel::ChannelTransport`] for in-process use and
//! tests.

pub mod channel;
pub mod console;

use std::future::Future;
use std::pin::Pin;

use crate::models::content::ContentItem;
use crate::models::GroupId;
use crate::Result;

/// Identity of an outbound message, used as a reply-correlation key.
pub type MessageRef = String;

/// One inbound group message as delivered by a transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Group the message was posted in.
    pub group: GroupId,
    /// Platform user id of the sender.
    pub sender: u64,
    /// Plain-text portion of the message, used for command matching.
    pub text: String,
    /// Full typed content, used for payload capture.
    pub content: Vec<ContentItem>,
    /// This message's own correlation reference.
    pub message_ref: MessageRef,
    /// Reference of the message this one replies to, if any.
    pub reply_to: Option<MessageRef>,
}

/// Platform-agnostic outbound messaging interface.
pub trait Transport: Send + Sync {
    /// Send a payload to a group.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) if the
    /// send fails. Callers treat delivery as best-effort and never retry.
    fn send<'a>(
        &'a self,
        group: GroupId,
        payload: &'a [ContentItem],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Quote-reply to an inbound message, returning the new message's
    /// correlation reference.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) if the
    /// reply cannot be posted.
    fn quote_reply<'a>(
        &'a self,
        message: &'a InboundMessage,
        payload: Vec<ContentItem>,
    ) -> Pin<Box<dyn Future<Output = Result<MessageRef>> + Send + 'a>>;

    /// Quote-reply with a plain-text payload.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`quote_reply`](Self::quote_reply).
    fn quote_text<'a>(
        &'a self,
        message: &'a InboundMessage,
        text: String,
    ) -> Pin<Box<dyn Future<Output = Result<MessageRef>> + Send + 'a>> {
        self.quote_reply(message, vec![ContentItem::Text(text)])
    }
}

//! In-process transport backed by an unbounded channel.
//!
//! Outbound traffic is pushed onto a channel for the embedding side (or a
//! test) to observe. Quote-replies are assigned fresh references, so a
//! consumer can build correlated follow-up messages.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::content::ContentItem;
use crate::models::GroupId;
use crate::{AppError, Result};

use super::{InboundMessage, MessageRef, Transport};

/// One observed outbound action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// Plain send to a group (alarm delivery path).
    Send {
        /// Target group.
        group: GroupId,
        /// Delivered payload.
        payload: Vec<ContentItem>,
    },
    /// Quote-reply to a prior inbound message (conversation path).
    QuoteReply {
        /// Reference of the message being replied to.
        in_reply_to: MessageRef,
        /// Reply payload.
        payload: Vec<ContentItem>,
        /// Reference assigned to the reply itself.
        message_ref: MessageRef,
    },
}

/// Transport that records outbound traffic on an in-process channel.
#[derive(Clone)]
pub struct ChannelTransport {
    outbound: mpsc::UnboundedSender<OutboundEvent>,
}

impl ChannelTransport {
    /// Create a transport plus the receiver observing its outbound side.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { outbound: tx }, rx)
    }

    fn emit(&self, event: OutboundEvent) -> Result<()> {
        self.outbound
            .send(event)
            .map_err(|_| AppError::Transport("outbound channel closed".into()))
    }
}

impl Transport for ChannelTransport {
    fn send<'a>(
        &'a self,
        group: GroupId,
        payload: &'a [ContentItem],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.emit(OutboundEvent::Send {
                group,
                payload: payload.to_vec(),
            })
        })
    }

    fn quote_reply<'a>(
        &'a self,
        message: &'a InboundMessage,
        payload: Vec<ContentItem>,
    ) -> Pin<Box<dyn Future<Output = Result<MessageRef>> + Send + 'a>> {
        Box::pin(async move {
            let message_ref: MessageRef = Uuid::new_v4().to_string();
            self.emit(OutboundEvent::QuoteReply {
                in_reply_to: message.message_ref.clone(),
                payload,
                message_ref: message_ref.clone(),
            })?;
            Ok(message_ref)
        })
    }
}

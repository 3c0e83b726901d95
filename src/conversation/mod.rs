//! Multi-step conversational transactions correlated by reply identity.
//!
//! A transaction gathers input across several independent inbound messages.
//! After each outbound prompt, the prompt's [`MessageRef`] is registered as a
//! correlation key; a later reply addressed to that prompt is routed back
//! into the transaction's current state by the [`correlator::Correlator`].

pub mod alarm;
pub mod correlator;

use std::future::Future;
use std::pin::Pin;

use crate::transport::{InboundMessage, MessageRef};
use crate::Result;

/// Outcome of one handled reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// The transaction continues; route replies to the given prompt back
    /// here.
    Await(MessageRef),
    /// The transaction finished and must be detached.
    Complete,
}

/// One pending multi-step conversation.
///
/// A returned error means the reply was rejected; the transaction stays
/// attached at its current state so the sender can retry.
pub trait Transaction: Send {
    /// Advance the transaction with one correlated inbound message.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`](crate::AppError::Validation) for
    /// malformed input (state unchanged) and propagates scheduler or
    /// transport failures.
    fn handle<'a>(
        &'a mut self,
        message: &'a InboundMessage,
    ) -> Pin<Box<dyn Future<Output = Result<Progress>> + Send + 'a>>;
}

//! Reply-target correlation map.
//!
//! Maps the identity of a prior outbound prompt to the pending transaction
//! that sent it. Routes accumulate as a transaction prompts again at each
//! step and are all dropped together when the transaction detaches, so a
//! reply to an earlier prompt still reaches the transaction at its current
//! state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::transport::{InboundMessage, MessageRef};
use crate::Result;

use super::{Progress, Transaction};

#[derive(Default)]
struct CorrelatorInner {
    transactions: HashMap<Uuid, Arc<Mutex<Box<dyn Transaction>>>>,
    routes: HashMap<MessageRef, Uuid>,
}

/// Registry of pending transactions keyed by reply-target identity.
#[derive(Default)]
pub struct Correlator {
    inner: Mutex<CorrelatorInner>,
}

impl Correlator {
    /// Create an empty correlator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending transaction, returning its identifier.
    pub async fn insert(&self, transaction: Box<dyn Transaction>) -> Uuid {
        let id = Uuid::new_v4();
        let mut inner = self.inner.lock().await;
        inner
            .transactions
            .insert(id, Arc::new(Mutex::new(transaction)));
        id
    }

    /// Route future replies to `reply_ref` into the transaction `id`.
    pub async fn attach(&self, reply_ref: MessageRef, id: Uuid) {
        let mut inner = self.inner.lock().await;
        inner.routes.insert(reply_ref, id);
    }

    /// Detach a transaction and every route pointing at it.
    pub async fn remove(&self, id: Uuid) {
        let mut inner = self.inner.lock().await;
        inner.transactions.remove(&id);
        inner.routes.retain(|_, target| *target != id);
    }

    /// Number of pending transactions.
    pub async fn pending_count(&self) -> usize {
        self.inner.lock().await.transactions.len()
    }

    /// Route one inbound message to its pending transaction, if any.
    ///
    /// Returns `Ok(false)` when the message is not a correlated reply (no
    /// `reply_to`, or an unknown target). On success the transaction's
    /// `Progress` is applied: a new route is attached or the transaction is
    /// detached.
    ///
    /// # Errors
    ///
    /// Propagates the transaction's error; the transaction and its routes
    /// are left untouched so the sender can retry the same step.
    pub async fn dispatch(&self, message: &InboundMessage) -> Result<bool> {
        let Some(reply_ref) = message.reply_to.as_ref() else {
            return Ok(false);
        };

        // Resolve under the registry lock, then release it before running
        // the transaction: a slow step must not block unrelated dispatches.
        let (id, transaction) = {
            let inner = self.inner.lock().await;
            let Some(id) = inner.routes.get(reply_ref).copied() else {
                return Ok(false);
            };
            let Some(transaction) = inner.transactions.get(&id).cloned() else {
                return Ok(false);
            };
            (id, transaction)
        };

        let progress = transaction.lock().await.handle(message).await?;
        match progress {
            Progress::Await(next_ref) => {
                debug!(transaction_id = %id, "transaction advanced");
                self.attach(next_ref, id).await;
            }
            Progress::Complete => {
                debug!(transaction_id = %id, "transaction complete");
                self.remove(id).await;
            }
        }
        Ok(true)
    }
}

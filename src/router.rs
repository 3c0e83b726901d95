//! Inbound message routing: pending-conversation replies and the command
//! surface.
//!
//! Replies correlated to a pending prompt are dispatched first; anything
//! else is matched against the command table (`new alarm`,
//! `show all alarms`, `show alarm <id>`, `remove alarm <id>`). Every failure
//! for a single message is reported to its sender or logged; it never
//! affects another conversation or the scheduler.

use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};
use uuid::Uuid;

use crate::conversation::alarm::{AlarmTransaction, PROMPT_START_TIME};
use crate::conversation::correlator::Correlator;
use crate::models::alarm::format_interval;
use crate::models::content::render_text;
use crate::scheduler::AlarmScheduler;
use crate::transport::{InboundMessage, Transport};
use crate::{AppError, Result};

/// Dispatcher for all inbound group messages.
pub struct Router {
    scheduler: Arc<AlarmScheduler>,
    correlator: Arc<Correlator>,
    transport: Arc<dyn Transport>,
    self_id: u64,
}

impl Router {
    /// Build a router over the given scheduler, correlator, and transport.
    #[must_use]
    pub fn new(
        scheduler: Arc<AlarmScheduler>,
        correlator: Arc<Correlator>,
        transport: Arc<dyn Transport>,
        self_id: u64,
    ) -> Self {
        Self {
            scheduler,
            correlator,
            transport,
            self_id,
        }
    }

    /// Handle one inbound message end to end. Never fails the caller.
    pub async fn handle_message(&self, message: &InboundMessage) {
        match self.correlator.dispatch(message).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(err) => {
                self.report(message, &err).await;
                return;
            }
        }

        let text = message.text.trim();
        let result = if text == "new alarm" {
            self.start_creation(message).await
        } else if text == "show all alarms" {
            self.list_alarms(message).await
        } else if let Some(arg) = prefix_arg(text, "show alarm ") {
            self.show_alarm(message, arg).await
        } else if let Some(arg) = prefix_arg(text, "remove alarm ") {
            self.remove_alarm(message, arg).await
        } else {
            Ok(())
        };

        if let Err(err) = result {
            self.report(message, &err).await;
        }
    }

    /// Open an alarm creation transaction and prompt for the start time.
    async fn start_creation(&self, message: &InboundMessage) -> Result<()> {
        let transaction = AlarmTransaction::new(
            Arc::clone(&self.scheduler),
            Arc::clone(&self.transport),
            message.group,
            self.self_id,
        );
        let id = self.correlator.insert(Box::new(transaction)).await;

        match self
            .transport
            .quote_text(message, PROMPT_START_TIME.to_owned())
            .await
        {
            Ok(reply_ref) => {
                self.correlator.attach(reply_ref, id).await;
                info!(transaction_id = %id, group = %message.group, "alarm creation started");
                Ok(())
            }
            Err(err) => {
                // The prompt never reached the group; drop the orphan.
                self.correlator.remove(id).await;
                Err(err)
            }
        }
    }

    async fn list_alarms(&self, message: &InboundMessage) -> Result<()> {
        let ids = self.scheduler.list_for(message.group).await;
        let mut text = String::from("Alarms:");
        for id in ids {
            text.push('\n');
            text.push_str(&id.to_string());
        }
        self.transport.quote_text(message, text).await?;
        Ok(())
    }

    async fn show_alarm(&self, message: &InboundMessage, arg: &str) -> Result<()> {
        let id = parse_alarm_id(arg, message)?;
        let record = self.scheduler.describe(id, message.group).await?;
        let text = format!(
            "start: {}\nduration: {}\n{}",
            record.start_time.with_timezone(&Local),
            format_interval(record.interval_ms),
            render_text(&record.msg)
        );
        self.transport.quote_text(message, text).await?;
        Ok(())
    }

    async fn remove_alarm(&self, message: &InboundMessage, arg: &str) -> Result<()> {
        let id = parse_alarm_id(arg, message)?;
        self.scheduler.cancel(id, message.group).await?;
        self.transport.quote_text(message, "Done.".to_owned()).await?;
        Ok(())
    }

    /// Report a failure back to the sender; transport failures are only
    /// logged since there is nobody reachable to tell.
    async fn report(&self, message: &InboundMessage, err: &AppError) {
        if matches!(err, AppError::Transport(_)) {
            warn!(group = %message.group, %err, "outbound send failed");
            return;
        }
        if let Err(reply_err) = self.transport.quote_text(message, err.to_string()).await {
            warn!(group = %message.group, %err, %reply_err, "failed to report error to sender");
        }
    }
}

/// An id that does not parse matches no alarm, which is the same NotFound
/// the scheduler reports for an unknown one.
fn parse_alarm_id(arg: &str, message: &InboundMessage) -> Result<Uuid> {
    Uuid::parse_str(arg.trim())
        .map_err(|_| AppError::NotFound(format!("no alarm {} in group {}", arg.trim(), message.group)))
}

/// Case-insensitive prefix match, returning the remainder on success.
fn prefix_arg<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

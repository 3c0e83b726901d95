//! Three-state alarm creation transaction.
//!
//! State 0 collects the start time (`offset-day hour minute`), state 1 the
//! repeat interval (`hour minute`), state 2 the payload. A malformed reply
//! reports an error and keeps the transaction at the same state for another
//! attempt; only a successfully posted prompt advances it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Local, LocalResult, TimeZone, Utc};
use tracing::warn;

use crate::models::alarm::format_interval;
use crate::models::content::filter_payload;
use crate::models::GroupId;
use crate::scheduler::AlarmScheduler;
use crate::transport::{InboundMessage, Transport};
use crate::{AppError, Result};

use super::{Progress, Transaction};

/// Prompt sent when the transaction is opened (before state 0's reply).
pub const PROMPT_START_TIME: &str =
    "Alarm creating...\nReply this message to set start time,\nFormat: offset-day hour minute";

/// Parse the state-0 reply: day offset, hour, minute as three integers.
///
/// The start instant is `now + offset` days with the time of day set to
/// `hour:minute:00`, local calendar semantics, sub-minute precision
/// discarded.
///
/// # Errors
///
/// Returns `AppError::Validation` on a wrong token count, a non-integer
/// token, an out-of-range hour/minute, or a local time that does not exist
/// or is ambiguous (DST gap/fold).
pub fn parse_start_spec(text: &str, now: DateTime<Local>) -> Result<DateTime<Utc>> {
    let tokens = integer_tokens(text, 3, "offset-day hour minute")?;
    let (offset_days, hour, minute) = (tokens[0], tokens[1], tokens[2]);

    let date = now
        .date_naive()
        .checked_add_signed(ChronoDuration::days(offset_days))
        .ok_or_else(|| AppError::Validation("day offset out of range".into()))?;
    let hour = u32::try_from(hour)
        .map_err(|_| AppError::Validation("hour must be between 0 and 23".into()))?;
    let minute = u32::try_from(minute)
        .map_err(|_| AppError::Validation("minute must be between 0 and 59".into()))?;
    let naive = date
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| AppError::Validation("hour must be 0-23 and minute 0-59".into()))?;

    match Local.from_local_datetime(&naive) {
        LocalResult::Single(start) => Ok(start.with_timezone(&Utc)),
        LocalResult::Ambiguous(_, _) | LocalResult::None => Err(AppError::Validation(
            "that local time is ambiguous or does not exist, pick another minute".into(),
        )),
    }
}

/// Parse the state-1 reply: interval hours and minutes as two integers.
///
/// # Errors
///
/// Returns `AppError::Validation` on a wrong token count, a non-integer
/// token, hours ≤ 0, or a non-positive combined interval.
pub fn parse_interval_spec(text: &str) -> Result<i64> {
    let tokens = integer_tokens(text, 2, "hour minute")?;
    let (hours, minutes) = (tokens[0], tokens[1]);

    if hours <= 0 {
        return Err(AppError::Validation("interval hours must be positive".into()));
    }
    let interval_ms = hours
        .checked_mul(3_600_000)
        .and_then(|h| minutes.checked_mul(60_000).and_then(|m| h.checked_add(m)))
        .ok_or_else(|| AppError::Validation("interval too large".into()))?;
    if interval_ms <= 0 {
        return Err(AppError::Validation("interval must be positive".into()));
    }
    Ok(interval_ms)
}

fn integer_tokens(text: &str, expected: usize, format_hint: &str) -> Result<Vec<i64>> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != expected {
        return Err(AppError::Validation(format!(
            "expected {expected} integers: {format_hint}"
        )));
    }
    tokens
        .iter()
        .map(|token| {
            token
                .parse::<i64>()
                .map_err(|_| AppError::Validation(format!("`{token}` is not an integer")))
        })
        .collect()
}

enum TxnState {
    AwaitStartTime,
    AwaitInterval {
        start: DateTime<Utc>,
    },
    AwaitPayload {
        start: DateTime<Utc>,
        interval_ms: i64,
    },
}

/// Pending alarm creation conversation, bound to one group.
pub struct AlarmTransaction {
    scheduler: Arc<AlarmScheduler>,
    transport: Arc<dyn Transport>,
    group: GroupId,
    self_id: u64,
    state: TxnState,
}

impl AlarmTransaction {
    /// Open a new transaction for `group`, awaiting the start-time reply.
    #[must_use]
    pub fn new(
        scheduler: Arc<AlarmScheduler>,
        transport: Arc<dyn Transport>,
        group: GroupId,
        self_id: u64,
    ) -> Self {
        Self {
            scheduler,
            transport,
            group,
            self_id,
            state: TxnState::AwaitStartTime,
        }
    }

    async fn handle_start_time(&mut self, message: &InboundMessage) -> Result<Progress> {
        let start = parse_start_spec(&message.text, Local::now())?;
        let prompt = format!(
            "Alarm at {}\nReply this message to set duration,\nFormat: hour minute",
            start.with_timezone(&Local)
        );
        let reply_ref = self.transport.quote_text(message, prompt).await?;
        self.state = TxnState::AwaitInterval { start };
        Ok(Progress::Await(reply_ref))
    }

    async fn handle_interval(
        &mut self,
        message: &InboundMessage,
        start: DateTime<Utc>,
    ) -> Result<Progress> {
        let interval_ms = parse_interval_spec(&message.text)?;
        let prompt = format!(
            "Duration: {}\nReply this message to set alarm message",
            format_interval(interval_ms)
        );
        let reply_ref = self.transport.quote_text(message, prompt).await?;
        self.state = TxnState::AwaitPayload { start, interval_ms };
        Ok(Progress::Await(reply_ref))
    }

    async fn handle_payload(
        &mut self,
        message: &InboundMessage,
        start: DateTime<Utc>,
        interval_ms: i64,
    ) -> Result<Progress> {
        let payload = filter_payload(&message.content, self.self_id);
        if payload.is_empty() {
            return Err(AppError::Validation(
                "alarm message is empty after filtering".into(),
            ));
        }

        let id = self
            .scheduler
            .create(start, interval_ms, self.group, payload)
            .await?;

        // The alarm exists from here on; a failed confirmation must not
        // leave the transaction pending.
        if let Err(err) = self
            .transport
            .quote_text(message, format!("Alarm created,\nUUID: {id}."))
            .await
        {
            warn!(alarm_id = %id, %err, "failed to send creation confirmation");
        }
        Ok(Progress::Complete)
    }
}

impl Transaction for AlarmTransaction {
    fn handle<'a>(
        &'a mut self,
        message: &'a InboundMessage,
    ) -> Pin<Box<dyn Future<Output = Result<Progress>> + Send + 'a>> {
        Box::pin(async move {
            if message.group != self.group {
                return Err(AppError::Validation(
                    "this alarm conversation belongs to another group".into(),
                ));
            }
            match self.state {
                TxnState::AwaitStartTime => self.handle_start_time(message).await,
                TxnState::AwaitInterval { start } => self.handle_interval(message, start).await,
                TxnState::AwaitPayload { start, interval_ms } => {
                    self.handle_payload(message, start, interval_ms).await
                }
            }
        })
    }
}

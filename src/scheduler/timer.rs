//! Fixed-rate per-alarm timer with fast-forward catch-up.
//!
//! Each alarm record owns one [`IntervalTimer`]. On construction the start
//! instant is fast-forwarded to the first occurrence not before now, so an
//! alarm whose start time is long past resumes on its next aligned tick
//! instead of firing a backlog of missed ones. The fire callback must return
//! immediately; delivery work is handed off to an independent task by the
//! caller.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Smallest `origin + k * interval_ms` (integer `k ≥ 0`) that is `≥ now`.
///
/// Closed-form equivalent of stepping the origin forward one interval at a
/// time. Firings therefore always land on the original phase, and ticks that
/// fell while the process was down are never replayed.
#[must_use]
pub fn next_occurrence(
    origin: DateTime<Utc>,
    interval_ms: i64,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    debug_assert!(interval_ms > 0);
    let elapsed_ms = (now - origin).num_milliseconds();
    if elapsed_ms <= 0 {
        return origin;
    }
    // Signed `div_ceil` is unstable (`int_roundings`); both values are
    // strictly positive here, so the unsigned equivalent is exact.
    #[allow(clippy::cast_possible_wrap)]
    let steps = elapsed_ms.unsigned_abs().div_ceil(interval_ms.unsigned_abs()) as i64;
    origin + ChronoDuration::milliseconds(steps * interval_ms)
}

/// Builder for a per-alarm fixed-rate timer.
///
/// Call [`spawn`](Self::spawn) to start the background timer task.
pub struct IntervalTimer {
    origin: DateTime<Utc>,
    interval_ms: i64,
    cancel: CancellationToken,
}

impl IntervalTimer {
    /// Construct a new timer (does not start the task yet).
    ///
    /// `interval_ms` must be strictly positive; the scheduler validates this
    /// before any record reaches the timer.
    #[must_use]
    pub fn new(origin: DateTime<Utc>, interval_ms: i64, cancel: CancellationToken) -> Self {
        Self {
            origin,
            interval_ms,
            cancel,
        }
    }

    /// Spawn the background timer task and return a handle for stopping it.
    ///
    /// `on_fire` runs on the timer task once per due tick and must not
    /// block; it is expected to dispatch delivery via `tokio::spawn` and
    /// return.
    #[must_use]
    pub fn spawn<F>(self, on_fire: F) -> IntervalTimerHandle
    where
        F: FnMut() + Send + 'static,
    {
        let cancel_for_handle = self.cancel.clone();
        let task_handle = tokio::spawn(Self::run(
            self.origin,
            self.interval_ms,
            self.cancel,
            on_fire,
        ));

        IntervalTimerHandle {
            cancel: cancel_for_handle,
            join_handle: Some(task_handle),
        }
    }

    /// Core timer loop.
    async fn run<F>(
        origin: DateTime<Utc>,
        interval_ms: i64,
        cancel: CancellationToken,
        mut on_fire: F,
    ) where
        F: FnMut() + Send + 'static,
    {
        let first = next_occurrence(origin, interval_ms, Utc::now());
        // A past first occurrence (clock moved between computation and here)
        // collapses to an immediate tick.
        let initial_delay = (first - Utc::now()).to_std().unwrap_or_default();
        let period = std::time::Duration::from_millis(interval_ms.max(1).unsigned_abs());

        let mut ticker =
            tokio::time::interval_at(tokio::time::Instant::now() + initial_delay, period);
        // If a tick is ever delayed past the next one, skip it rather than
        // bursting: missed ticks are never replayed.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("alarm timer cancelled");
                    return;
                }
                _ = ticker.tick() => on_fire(),
            }
        }
    }
}

/// Handle returned from [`IntervalTimer::spawn`] for stopping the timer.
pub struct IntervalTimerHandle {
    cancel: CancellationToken,
    join_handle: Option<JoinHandle<()>>,
}

impl IntervalTimerHandle {
    /// Stop all future firings. Idempotent.
    ///
    /// A delivery already dispatched by an earlier tick is not revoked.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the timer has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel the timer and wait for its task to exit.
    pub async fn await_completion(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for IntervalTimerHandle {
    /// Cancel the background task when the handle is dropped.
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

//! Alarm scheduling: one timer per record, snapshot persistence, delivery.
//!
//! The scheduler owns the shared record collection behind one async mutex.
//! Creation and cancellation both mutate under that lock and re-persist the
//! full snapshot before reporting success, so concurrent conversations in
//! different groups cannot lose each other's updates.

pub mod timer;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::attachments::AttachmentStore;
use crate::models::alarm::AlarmRecord;
use crate::models::content::ContentItem;
use crate::models::GroupId;
use crate::persistence::AlarmRepo;
use crate::transport::Transport;
use crate::{AppError, Result};

use timer::{IntervalTimer, IntervalTimerHandle};

/// A record plus its running timer. The handle lives exactly as long as the
/// record is in the map.
struct ActiveAlarm {
    record: AlarmRecord,
    timer: IntervalTimerHandle,
}

/// Owner of all alarm records and their timers.
pub struct AlarmScheduler {
    alarms: Mutex<HashMap<Uuid, ActiveAlarm>>,
    repo: AlarmRepo,
    transport: Arc<dyn Transport>,
    attachments: Arc<dyn AttachmentStore>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for AlarmScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlarmScheduler").finish_non_exhaustive()
    }
}

impl AlarmScheduler {
    /// Load all persisted records, re-arm one timer per record, and
    /// re-persist the snapshot.
    ///
    /// Timers are armed with each record's original start time; the catch-up
    /// rule in [`timer`] resumes a long-past alarm on its next aligned tick.
    /// All timers stop when `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the snapshot cannot be read or
    /// rewritten.
    pub async fn load(
        repo: AlarmRepo,
        transport: Arc<dyn Transport>,
        attachments: Arc<dyn AttachmentStore>,
        shutdown: CancellationToken,
    ) -> Result<Arc<Self>> {
        let records = repo.load_all().await?;
        let scheduler = Arc::new(Self {
            alarms: Mutex::new(HashMap::new()),
            repo,
            transport,
            attachments,
            shutdown,
        });

        let count = records.len();
        {
            let mut alarms = scheduler.alarms.lock().await;
            for record in records {
                let timer = scheduler.arm(&record);
                alarms.insert(record.id, ActiveAlarm { record, timer });
            }
            scheduler.persist_locked(&alarms).await?;
        }
        info!(count, "alarm store loaded");
        Ok(scheduler)
    }

    /// Create a new alarm: allocate an id, start its timer, persist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a non-positive interval and
    /// `AppError::Storage` if the snapshot write fails (the alarm is still
    /// live in memory in that case; the next successful mutation rewrites
    /// the full snapshot).
    pub async fn create(
        &self,
        start_time: DateTime<Utc>,
        interval_ms: i64,
        group: GroupId,
        payload: Vec<ContentItem>,
    ) -> Result<Uuid> {
        if interval_ms <= 0 {
            return Err(AppError::Validation("interval must be positive".into()));
        }

        let record = AlarmRecord::new(start_time, interval_ms, group, payload);
        let id = record.id;

        let mut alarms = self.alarms.lock().await;
        let timer = self.arm(&record);
        alarms.insert(id, ActiveAlarm { record, timer });
        self.persist_locked(&alarms).await?;
        info!(alarm_id = %id, group = %group, interval_ms, "alarm created");
        Ok(id)
    }

    /// Ids of all alarms delivering to `group`, in stable order.
    pub async fn list_for(&self, group: GroupId) -> Vec<Uuid> {
        let alarms = self.alarms.lock().await;
        let mut ids: Vec<Uuid> = alarms
            .values()
            .filter(|active| active.record.group == group)
            .map(|active| active.record.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Fetch one alarm record by id, scoped to `group`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no alarm with that id exists in that
    /// group; an id belonging to a different group is indistinguishable from
    /// an unknown one.
    pub async fn describe(&self, id: Uuid, group: GroupId) -> Result<AlarmRecord> {
        let alarms = self.alarms.lock().await;
        alarms
            .get(&id)
            .filter(|active| active.record.group == group)
            .map(|active| active.record.clone())
            .ok_or_else(|| AppError::NotFound(format!("no alarm {id} in group {group}")))
    }

    /// Cancel one alarm: stop its timer, remove the record, persist, release
    /// any image attachments its payload references.
    ///
    /// Find, stop, and remove happen under one lock acquisition, so a cancel
    /// can never stop a timer belonging to a different record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` under the same conditions as
    /// [`describe`](Self::describe), and `AppError::Storage` if the snapshot
    /// write fails.
    pub async fn cancel(&self, id: Uuid, group: GroupId) -> Result<()> {
        let mut alarms = self.alarms.lock().await;
        match alarms.get(&id) {
            Some(active) if active.record.group == group => {}
            _ => return Err(AppError::NotFound(format!("no alarm {id} in group {group}"))),
        }
        let Some(active) = alarms.remove(&id) else {
            return Err(AppError::NotFound(format!("no alarm {id} in group {group}")));
        };
        active.timer.cancel();

        // Attachment cleanup is best-effort; a failed release never blocks
        // the removal itself.
        for item in &active.record.msg {
            if let Some(ref_id) = item.image_ref() {
                if let Err(err) = self.attachments.release(ref_id).await {
                    warn!(alarm_id = %id, ref_id, %err, "attachment release failed");
                }
            }
        }

        self.persist_locked(&alarms).await?;
        info!(alarm_id = %id, group = %group, "alarm cancelled");
        Ok(())
    }

    /// Arm a timer for `record` whose firings deliver the payload snapshot.
    ///
    /// The fire callback carries only immutable copies (group, payload) and
    /// hands delivery to an independent task, so a slow or failing send
    /// cannot delay this or any other alarm's ticks.
    fn arm(&self, record: &AlarmRecord) -> IntervalTimerHandle {
        let transport = Arc::clone(&self.transport);
        let group = record.group;
        let id = record.id;
        let payload = record.msg.clone();

        let interval_timer = IntervalTimer::new(
            record.start_time,
            record.interval_ms,
            self.shutdown.child_token(),
        );
        interval_timer.spawn(move || {
            let transport = Arc::clone(&transport);
            let payload = payload.clone();
            tokio::spawn(async move {
                if let Err(err) = transport.send(group, &payload).await {
                    warn!(alarm_id = %id, group = %group, %err, "alarm delivery failed");
                }
            });
        })
    }

    /// Serialize the full record set while holding the map lock.
    async fn persist_locked(&self, alarms: &HashMap<Uuid, ActiveAlarm>) -> Result<()> {
        let mut records: Vec<AlarmRecord> = alarms
            .values()
            .map(|active| active.record.clone())
            .collect();
        records.sort_unstable_by_key(|record| record.id);
        self.repo.persist_all(&records).await
    }
}

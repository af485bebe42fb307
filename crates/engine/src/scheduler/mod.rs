//! Schedule-driven triggers of the ingest pipeline.
//!
//! [`Scheduler`] keeps a [`TriggerRegistry`] in sync with the active
//! schedules and fires due triggers on every [`Scheduler::tick`]. Time comes
//! from an injected [`Clock`], so tests drive firing by moving a
//! [`ManualClock`] and calling `tick` themselves; production code calls
//! [`Scheduler::spawn`] to tick on an interval. Registering a `now` trigger
//! wakes the running loop at once instead of waiting for the next interval.
//!
//! Schedule writes that change which triggers should exist ([`Scheduler::create`],
//! [`Scheduler::toggle`], [`Scheduler::remove`]) hold the registry lock across
//! the database write, so the registry always matches the stored rows.
//!
//! A fired trigger runs [`Ingestor::run`] with `source = scheduled`. Failures
//! are logged and dropped; nothing is retried.

pub mod clock;
pub mod registry;
pub mod trigger;


use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use tokio::sync::{Mutex, Notify};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use db::models::NewSchedule;
use db::repository::schedules as schedule_repo;
use db::{NewsSource, ScheduleRow};

use crate::{EngineError, Ingestor, ScheduleSpec};

pub use clock::{Clock, ManualClock, SystemClock};
pub use registry::TriggerRegistry;
pub use trigger::{plan_triggers, trigger_id, trigger_prefix, Trigger, TriggerKind};

/// Owns the trigger registry and fires due triggers.
pub struct Scheduler {
    registry: Mutex<TriggerRegistry>,
    clock: Arc<dyn Clock>,
    ingestor: Ingestor,
    wake: Notify,
}

impl Scheduler {
    /// Create a scheduler with an empty registry; cron times are local to `tz`.
    pub fn new(ingestor: Ingestor, clock: Arc<dyn Clock>, tz: FixedOffset) -> Self {
        Self {
            registry: Mutex::new(TriggerRegistry::new(tz)),
            clock,
            ingestor,
            wake: Notify::new(),
        }
    }

    /// Store a new, active schedule and register its triggers.
    pub async fn create(&self, spec: &ScheduleSpec) -> Result<ScheduleRow, EngineError> {
        let days = spec.days_json();
        let times = spec.times_json();
        let impacts = spec.impacts_json();

        let mut registry = self.registry.lock().await;
        let row = schedule_repo::insert_schedule(
            self.ingestor.pool(),
            NewSchedule {
                asset: &spec.asset,
                language: &spec.language,
                days: &days,
                times: &times,
                mode: spec.mode.as_str(),
                impacts: &impacts,
            },
        )
        .await?;
        let triggers = self.plan(&row, true)?;
        self.install(&mut registry, row.id, triggers);
        Ok(row)
    }

    /// Flip the stored `is_active` flag of a schedule and register or remove
    /// its triggers to match. Returns the updated row.
    pub async fn toggle(&self, schedule_id: i64) -> Result<ScheduleRow, EngineError> {
        let mut registry = self.registry.lock().await;
        let row = schedule_repo::toggle_schedule(self.ingestor.pool(), schedule_id).await?;
        if row.is_active {
            let triggers = self.plan(&row, true)?;
            self.install(&mut registry, row.id, triggers);
        } else {
            let removed = registry.unregister_prefix(&trigger_prefix(schedule_id));
            info!(schedule_id, removed, "schedule triggers removed");
        }
        Ok(row)
    }

    /// Delete a stored schedule together with its triggers.
    pub async fn remove(&self, schedule_id: i64) -> Result<(), EngineError> {
        let mut registry = self.registry.lock().await;
        schedule_repo::delete_schedule(self.ingestor.pool(), schedule_id).await?;
        let removed = registry.unregister_prefix(&trigger_prefix(schedule_id));
        info!(schedule_id, removed, "schedule deleted");
        Ok(())
    }

    /// Register every trigger of `schedule`, including a one-shot for `now`.
    ///
    /// Triggers left over from an earlier registration of the same schedule
    /// are replaced. Returns the registered trigger ids.
    pub async fn activate(&self, schedule: &ScheduleRow) -> Result<Vec<String>, EngineError> {
        self.register(schedule, true).await
    }

    /// Remove every trigger of schedule `schedule_id`; returns how many.
    pub async fn deactivate(&self, schedule_id: i64) -> usize {
        let removed = self
            .registry
            .lock()
            .await
            .unregister_prefix(&trigger_prefix(schedule_id));
        info!(schedule_id, removed, "schedule triggers removed");
        removed
    }

    /// Re-register recurring triggers for already-stored active schedules.
    ///
    /// `now` entries are not replayed. Schedules whose stored tokens no
    /// longer validate are skipped with a warning. Returns how many triggers
    /// were registered.
    pub async fn restore(&self, schedules: &[ScheduleRow]) -> usize {
        let mut registered = 0;
        for schedule in schedules.iter().filter(|s| s.is_active) {
            match self.register(schedule, false).await {
                Ok(ids) => registered += ids.len(),
                Err(e) => warn!(schedule_id = schedule.id, error = %e, "cannot restore schedule"),
            }
        }
        info!(schedules = schedules.len(), triggers = registered, "schedules restored");
        registered
    }

    async fn register(
        &self,
        schedule: &ScheduleRow,
        include_now: bool,
    ) -> Result<Vec<String>, EngineError> {
        let triggers = self.plan(schedule, include_now)?;
        let mut registry = self.registry.lock().await;
        Ok(self.install(&mut registry, schedule.id, triggers))
    }

    fn plan(&self, schedule: &ScheduleRow, include_now: bool) -> Result<Vec<Trigger>, EngineError> {
        let spec = ScheduleSpec::from_row(schedule)?;
        plan_triggers(schedule.id, &spec, self.clock.now(), include_now)
    }

    /// Replace the triggers of `schedule_id` with `triggers`.
    fn install(
        &self,
        registry: &mut TriggerRegistry,
        schedule_id: i64,
        triggers: Vec<Trigger>,
    ) -> Vec<String> {
        registry.unregister_prefix(&trigger_prefix(schedule_id));
        let ids: Vec<String> = triggers.iter().map(|t| t.id.clone()).collect();
        let mut immediate = false;
        for trigger in triggers {
            match &trigger.kind {
                TriggerKind::Recurring { expression, .. } => {
                    debug!(id = %trigger.id, cron = %expression, "registering trigger");
                }
                TriggerKind::Once => immediate = true,
            }
            registry.register(trigger);
        }
        info!(schedule_id, triggers = ids.len(), "schedule triggers registered");

        if immediate {
            self.wake.notify_one();
        }
        ids
    }

    /// All registered trigger ids, sorted.
    pub async fn trigger_ids(&self) -> Vec<String> {
        self.registry.lock().await.ids()
    }

    /// Trigger ids of one schedule, sorted.
    pub async fn trigger_ids_for(&self, schedule_id: i64) -> Vec<String> {
        self.registry
            .lock()
            .await
            .ids_with_prefix(&trigger_prefix(schedule_id))
    }

    /// A snapshot of one registered trigger.
    pub async fn trigger(&self, id: &str) -> Option<Trigger> {
        self.registry.lock().await.get(id).cloned()
    }

    /// Fire every trigger due now and wait for the firings to finish.
    /// Returns how many fired.
    pub async fn tick(&self) -> usize {
        let now = self.clock.now();
        let due = self.registry.lock().await.take_due(now);
        let fired = due.len();

        let mut firings = JoinSet::new();
        for trigger in due {
            firings.spawn(fire(self.ingestor.clone(), trigger));
        }
        while let Some(joined) = firings.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "trigger task aborted");
            }
        }
        fired
    }

    /// Tick every `every` in a background task, forever, and additionally
    /// right after a `now` trigger is registered.
    ///
    /// Each tick runs in its own task, so a slow webhook never delays the
    /// next tick.
    pub fn spawn(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(?every, "scheduler started");
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = self.wake.notified() => debug!("woken by an immediate trigger"),
                }
                let scheduler = Arc::clone(&self);
                tokio::spawn(async move {
                    scheduler.tick().await;
                });
            }
        })
    }
}

#[instrument(skip_all, fields(trigger = %trigger.id, run_id = %Uuid::new_v4()))]
async fn fire(ingestor: Ingestor, trigger: Trigger) {
    info!(
        asset = %trigger.request.asset,
        language = %trigger.request.language,
        "trigger fired"
    );
    match ingestor.run(&trigger.request, NewsSource::Scheduled).await {
        Ok(report) if report.stored.is_empty() => {
            warn!("scheduled run produced no news");
        }
        Ok(report) => {
            info!(stored = report.stored.len(), "scheduled run finished");
        }
        Err(e) => {
            warn!(error = %e, "scheduled run failed");
        }
    }
}

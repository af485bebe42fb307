//! Trigger definitions and the schedule → trigger expansion.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use cron::Schedule;
use webhook::AssetRequest;

use crate::schedule::{DayToken, ScheduleSpec, TimeToken};
use crate::EngineError;

/// Id prefix shared by every trigger of one schedule.
pub fn trigger_prefix(schedule_id: i64) -> String {
    format!("schedule_{schedule_id}_")
}

/// `schedule_<id>_<HH:MM>` or `schedule_<id>_now`.
pub fn trigger_id(schedule_id: i64, time: &TimeToken) -> String {
    format!("{}{}", trigger_prefix(schedule_id), time)
}

/// Six-field cron expression (seconds first) firing at `hour:minute` on `days`.
pub fn cron_expression(days: &[DayToken], hour: u32, minute: u32) -> String {
    let days: Vec<String> = days.iter().map(ToString::to_string).collect();
    format!("0 {minute} {hour} * * {}", days.join(","))
}

#[derive(Debug, Clone)]
pub enum TriggerKind {
    /// Fires on every cron occurrence.
    Recurring { expression: String, schedule: Schedule },
    /// Fires once, at the first tick after registration.
    Once,
}

/// One registered trigger.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub id: String,
    pub schedule_id: i64,
    /// Posted to the webhook on every firing.
    pub request: AssetRequest,
    pub kind: TriggerKind,
    /// Occurrences at or before this instant have been handled.
    pub checked_at: DateTime<Utc>,
}

impl Trigger {
    pub fn is_once(&self) -> bool {
        matches!(self.kind, TriggerKind::Once)
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self.kind, TriggerKind::Recurring { .. })
    }

    /// Next occurrence strictly after `checked_at`, evaluated in `tz`.
    pub fn next_fire(&self, tz: &FixedOffset) -> Option<DateTime<Utc>> {
        match &self.kind {
            TriggerKind::Once => Some(self.checked_at),
            TriggerKind::Recurring { schedule, .. } => schedule
                .after(&self.checked_at.with_timezone(tz))
                .next()
                .map(|next| next.with_timezone(&Utc)),
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>, tz: &FixedOffset) -> bool {
        self.next_fire(tz).is_some_and(|next| next <= now)
    }
}

/// Expand a schedule into its triggers.
///
/// One recurring trigger per `HH:MM` token covering every configured day,
/// plus a one-shot trigger for `now` when `include_now` is set.
pub fn plan_triggers(
    schedule_id: i64,
    spec: &ScheduleSpec,
    now: DateTime<Utc>,
    include_now: bool,
) -> Result<Vec<Trigger>, EngineError> {
    let mut triggers = Vec::with_capacity(spec.times.len());
    let request = spec.request();

    for time in &spec.times {
        let kind = match time.hour_minute() {
            Some((hour, minute)) => {
                let expression = cron_expression(&spec.days, hour, minute);
                let schedule = Schedule::from_str(&expression).map_err(|e| {
                    EngineError::InvalidSchedule(format!("cron '{expression}': {e}"))
                })?;
                TriggerKind::Recurring { expression, schedule }
            }
            None if include_now => TriggerKind::Once,
            None => continue,
        };

        triggers.push(Trigger {
            id: trigger_id(schedule_id, time),
            schedule_id,
            request: request.clone(),
            kind,
            checked_at: now,
        });
    }

    Ok(triggers)
}

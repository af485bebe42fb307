//! [`TriggerRegistry`]: the live set of triggers, keyed by trigger id.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};

use super::trigger::Trigger;

/// Owns every registered trigger.
///
/// Registering an id that already exists replaces it, so re-activating a
/// schedule never duplicates its triggers.
#[derive(Debug)]
pub struct TriggerRegistry {
    triggers: HashMap<String, Trigger>,
    tz: FixedOffset,
}

impl TriggerRegistry {
    /// Create an empty registry evaluating cron times at UTC offset `tz`.
    pub fn new(tz: FixedOffset) -> Self {
        Self {
            triggers: HashMap::new(),
            tz,
        }
    }

    /// Insert or replace a trigger; returns the replaced one.
    pub fn register(&mut self, trigger: Trigger) -> Option<Trigger> {
        self.triggers.insert(trigger.id.clone(), trigger)
    }

    /// Remove every trigger whose id starts with `prefix`; returns how many.
    pub fn unregister_prefix(&mut self, prefix: &str) -> usize {
        let before = self.triggers.len();
        self.triggers.retain(|id, _| !id.starts_with(prefix));
        before - self.triggers.len()
    }

    pub fn get(&self, id: &str) -> Option<&Trigger> {
        self.triggers.get(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.triggers.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Registered ids starting with `prefix`, sorted.
    pub fn ids_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .triggers
            .keys()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Collect every trigger due at `now` and mark it handled.
    ///
    /// One-shot triggers are removed; recurring ones advance their check
    /// point to `now`, so several missed occurrences yield one firing.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<Trigger> {
        let tz = self.tz;
        let due_ids: Vec<String> = self
            .triggers
            .values()
            .filter(|t| t.is_due(now, &tz))
            .map(|t| t.id.clone())
            .collect();

        let mut due = Vec::with_capacity(due_ids.len());
        for id in due_ids {
            let once = self.triggers.get(&id).is_some_and(Trigger::is_once);
            if once {
                due.extend(self.triggers.remove(&id));
            } else if let Some(trigger) = self.triggers.get_mut(&id) {
                due.push(trigger.clone());
                trigger.checked_at = now;
            }
        }
        due
    }
}

//! One self-renewing daily reminder per prayer.
//!
//! The scheduler is a plain state machine: hosts feed it `now` through
//! `tick` (or call `on_fire` from their own timer primitive) and it decides
//! what to deliver and when each prayer fires next. At most one entry per
//! prayer is outstanding; re-arming replaces, never duplicates.

use chrono::{Duration, NaiveDateTime};
use log::{debug, error, info};
use std::collections::BTreeMap;

use crate::error::ScheduleError;
use crate::models::{PrayerTable, PrayerType};
use crate::notify::{NotificationSignal, Notifier, Permission, PrayerNotification};
use crate::prayer_times::resolver::all_occurrences;

/// Identifies one armed action. A fire carrying a handle that is no longer
/// outstanding belongs to a cancelled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledNotification {
    pub prayer: PrayerType,
    pub fire_at: NaiveDateTime,
    pub handle: TimerHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    Delivered { next_fire_at: NaiveDateTime },
    DeliveryFailed { next_fire_at: NaiveDateTime },
    Cancelled,
}

/// The daily repeat: a fired reminder comes back exactly one day later.
pub fn next_fire_at(last_fire_at: NaiveDateTime) -> NaiveDateTime {
    last_fire_at + Duration::hours(24)
}

#[derive(Debug, Default)]
pub struct NotificationScheduler {
    pending: BTreeMap<PrayerType, ScheduledNotification>,
    next_handle: u64,
}

impl NotificationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn schedule(&mut self, prayer: PrayerType, fire_at: NaiveDateTime) -> TimerHandle {
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        self.pending.insert(
            prayer,
            ScheduledNotification {
                prayer,
                fire_at,
                handle,
            },
        );
        handle
    }

    /// Replace the whole schedule from `table`. Without a granted
    /// permission the schedule is left empty.
    pub fn arm(
        &mut self,
        table: &PrayerTable,
        now: NaiveDateTime,
        permission: Permission,
    ) -> Result<usize, ScheduleError> {
        self.cancel_all();
        if !permission.is_granted() {
            info!("Not arming prayer notifications: permission {}", permission);
            return Err(ScheduleError::NotPermitted(permission));
        }

        for occ in all_occurrences(table, now) {
            self.schedule(occ.prayer, occ.at);
            debug!("Armed {} for {}", occ.prayer, occ.at);
        }
        info!("Armed {} prayer notifications", self.pending.len());
        Ok(self.pending.len())
    }

    /// Run the action armed under `handle`. Delivery failures are logged and
    /// the prayer is re-armed regardless.
    pub fn on_fire(
        &mut self,
        prayer: PrayerType,
        handle: TimerHandle,
        notifier: &dyn Notifier,
    ) -> FireOutcome {
        let entry = match self.pending.get(&prayer) {
            Some(entry) if entry.handle == handle => *entry,
            _ => {
                debug!("Ignoring fire for cancelled {} action {:?}", prayer, handle);
                return FireOutcome::Cancelled;
            }
        };

        let notification = PrayerNotification::for_prayer(prayer);
        let delivered = match notifier.show(&notification) {
            Ok(()) => {
                info!("Delivered {} via {}", notification.tag, notifier.name());
                true
            }
            Err(e) => {
                error!("Notification send error for {}: {}", prayer, e);
                false
            }
        };

        let next = next_fire_at(entry.fire_at);
        self.schedule(prayer, next);
        debug!("Re-armed {} for {}", prayer, next);

        if delivered {
            FireOutcome::Delivered { next_fire_at: next }
        } else {
            FireOutcome::DeliveryFailed { next_fire_at: next }
        }
    }

    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            info!("Cancelled {} prayer notifications", self.pending.len());
        }
        self.pending.clear();
    }

    /// Apply an external enable/disable event.
    pub fn on_signal(
        &mut self,
        signal: NotificationSignal,
        table: Option<&PrayerTable>,
        now: NaiveDateTime,
        permission: Permission,
    ) -> Result<usize, ScheduleError> {
        match (signal, table) {
            (NotificationSignal::Enabled, Some(table)) => self.arm(table, now, permission),
            (NotificationSignal::Enabled, None) => {
                debug!("Notifications enabled before a prayer table is available");
                self.cancel_all();
                Ok(0)
            }
            (NotificationSignal::Disabled, _) => {
                self.cancel_all();
                Ok(0)
            }
        }
    }

    /// Actions whose fire time has been reached, earliest first.
    pub fn due(&self, now: NaiveDateTime) -> Vec<(PrayerType, TimerHandle)> {
        let mut due: Vec<_> = self
            .pending
            .values()
            .filter(|e| e.fire_at <= now)
            .collect();
        due.sort_by_key(|e| e.fire_at);
        due.into_iter().map(|e| (e.prayer, e.handle)).collect()
    }

    /// Fire everything due at `now`. Returns how many actions ran.
    pub fn tick(&mut self, now: NaiveDateTime, notifier: &dyn Notifier) -> usize {
        let mut fired = 0;
        for (prayer, handle) in self.due(now) {
            if self.on_fire(prayer, handle, notifier) != FireOutcome::Cancelled {
                fired += 1;
            }
            self.skip_missed(prayer, now);
        }
        fired
    }

    /// After a long suspension the re-armed time can still be in the past.
    /// Roll it forward without replaying the days that were missed.
    fn skip_missed(&mut self, prayer: PrayerType, now: NaiveDateTime) {
        if let Some(entry) = self.pending.get_mut(&prayer) {
            let mut skipped = 0;
            while entry.fire_at <= now {
                entry.fire_at = next_fire_at(entry.fire_at);
                skipped += 1;
            }
            if skipped > 0 {
                info!("Skipped {} missed {} reminder(s)", skipped, prayer);
            }
        }
    }

    pub fn get(&self, prayer: PrayerType) -> Option<&ScheduledNotification> {
        self.pending.get(&prayer)
    }

    pub fn pending(&self) -> impl Iterator<Item = &ScheduledNotification> {
        self.pending.values()
    }

    /// The entry that fires soonest.
    pub fn next_due(&self) -> Option<&ScheduledNotification> {
        self.pending.values().min_by_key(|e| e.fire_at)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

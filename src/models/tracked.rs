use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::models::PrayerType;

/// When each prayer was last marked as prayed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackedPrayerLog {
    entries: BTreeMap<PrayerType, DateTime<Utc>>,
}

impl TrackedPrayerLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, prayer: PrayerType, at: DateTime<Utc>) {
        self.entries.insert(prayer, at);
    }

    pub fn clear(&mut self, prayer: PrayerType) -> Option<DateTime<Utc>> {
        self.entries.remove(&prayer)
    }

    pub fn last_marked(&self, prayer: PrayerType) -> Option<DateTime<Utc>> {
        self.entries.get(&prayer).copied()
    }

    pub fn is_marked(&self, prayer: PrayerType) -> bool {
        self.entries.contains_key(&prayer)
    }

    /// Number of prayers with a mark, out of five.
    pub fn tracked_count(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<(PrayerType, DateTime<Utc>)> for TrackedPrayerLog {
    fn from_iter<I: IntoIterator<Item = (PrayerType, DateTime<Utc>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

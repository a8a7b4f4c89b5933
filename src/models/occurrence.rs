use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::PrayerType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceDay {
    Today,
    Tomorrow,
}

/// A concrete local date-time instance of one prayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrayerOccurrence {
    pub prayer: PrayerType,
    pub at: NaiveDateTime,
    pub day: OccurrenceDay,
}

impl PrayerOccurrence {
    pub fn is_tomorrow(&self) -> bool {
        self.day == OccurrenceDay::Tomorrow
    }
}

use log::{info, warn};

use crate::error::TableError;
use crate::models::{PrayerTable, Timings};

/// The current day's prayer table, replaced wholesale whenever a new
/// location fix (or the fallback location) resolves.
#[derive(Debug, Clone, Default)]
pub struct PrayerTimeStore {
    table: Option<PrayerTable>,
    location: Option<String>,
}

impl PrayerTimeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the table from raw provider timings. On error the previous
    /// table is kept.
    pub fn set(&mut self, timings: &Timings) -> Result<(), TableError> {
        match PrayerTable::from_timings(timings) {
            Ok(table) => {
                self.set_table(table);
                Ok(())
            }
            Err(e) => {
                warn!("Rejected prayer table: {}", e);
                Err(e)
            }
        }
    }

    pub fn set_table(&mut self, table: PrayerTable) {
        info!(
            "Prayer table set: fajr={} dhuhr={} asr={} maghrib={} isha={}",
            table.fajr, table.dhuhr, table.asr, table.maghrib, table.isha
        );
        self.table = Some(table);
    }

    pub fn get(&self) -> Option<&PrayerTable> {
        self.table.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.table.is_some()
    }

    pub fn set_location(&mut self, label: impl Into<String>) {
        self.location = Some(label.into());
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

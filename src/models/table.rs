use chrono::NaiveTime;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::TableError;
use crate::models::PrayerType;

/// Raw provider timings, name -> "HH:MM". Providers send extra keys
/// (Sunrise, Imsak, Midnight ...) which are ignored.
pub type Timings = HashMap<String, String>;

/// Time of day for each of the five prayers. No date is attached; times are
/// placed on whatever local date the caller resolves them against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrayerTable {
    pub fajr: NaiveTime,
    pub dhuhr: NaiveTime,
    pub asr: NaiveTime,
    pub maghrib: NaiveTime,
    pub isha: NaiveTime,
}

impl PrayerTable {
    pub fn time(&self, prayer: PrayerType) -> NaiveTime {
        match prayer {
            PrayerType::Fajr => self.fajr,
            PrayerType::Dhuhr => self.dhuhr,
            PrayerType::Asr => self.asr,
            PrayerType::Maghrib => self.maghrib,
            PrayerType::Isha => self.isha,
        }
    }

    /// Entries in canonical order.
    pub fn entries(&self) -> [(PrayerType, NaiveTime); 5] {
        PrayerType::ALL.map(|p| (p, self.time(p)))
    }

    /// Build a table from provider timings. Every prayer must be present and
    /// well-formed. The canonical key ("Dhuhr") wins over any alias ("Zuhr");
    /// among aliases alone the lexically smallest key is used.
    pub fn from_timings(timings: &Timings) -> Result<Self, TableError> {
        let pick = |prayer: PrayerType| -> Result<NaiveTime, TableError> {
            let value = lookup(timings, prayer).ok_or(TableError::Missing(prayer))?;
            parse_time(value).ok_or_else(|| TableError::Malformed {
                prayer,
                value: value.clone(),
            })
        };
        Ok(Self {
            fajr: pick(PrayerType::Fajr)?,
            dhuhr: pick(PrayerType::Dhuhr)?,
            asr: pick(PrayerType::Asr)?,
            maghrib: pick(PrayerType::Maghrib)?,
            isha: pick(PrayerType::Isha)?,
        })
    }
}

fn lookup(timings: &Timings, prayer: PrayerType) -> Option<&String> {
    timings.get(prayer.display_name()).or_else(|| {
        timings
            .iter()
            .filter(|(key, _)| PrayerType::from_str(key).ok() == Some(prayer))
            .min_by(|a, b| a.0.cmp(b.0))
            .map(|(_, value)| value)
    })
}

/// Parse a strict "HH:MM" wall-clock time. Seconds are always zero.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let (h, m) = s.trim().split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveTime::from_hms_opt(h.parse().ok()?, m.parse().ok()?, 0)
}

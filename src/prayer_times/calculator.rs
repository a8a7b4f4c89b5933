use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Timelike, Utc};
use log::{debug, warn};
use rusqlite::Connection;
use salah::prelude::*;

use crate::config::SalahConfig;
use crate::db::repository::CacheRepo;
use crate::models::PrayerTable;
use crate::prayer_times::PrayerTimeStore;

/// Offline prayer-time source for a fixed location.
pub struct PrayerCalculator {
    pub lat: f64,
    pub lng: f64,
    pub method_str: String,
    pub madhab_str: String,
    /// Fixed offset in minutes; `None` follows the device's local zone.
    pub tz_offset_minutes: Option<i32>,
}

impl PrayerCalculator {
    pub fn new(
        lat: f64,
        lng: f64,
        method: &str,
        madhab: &str,
        tz_offset_minutes: Option<i32>,
    ) -> Result<Self> {
        // Validate method + madhab early
        parse_method(method)?;
        parse_madhab(madhab)?;
        if let Some(minutes) = tz_offset_minutes {
            FixedOffset::east_opt(minutes * 60)
                .ok_or_else(|| anyhow!("Invalid timezone offset: {}", minutes))?;
        }
        Ok(Self {
            lat,
            lng,
            method_str: method.to_string(),
            madhab_str: madhab.to_string(),
            tz_offset_minutes,
        })
    }

    pub fn from_config(salah: &SalahConfig) -> Result<Self> {
        Self::new(
            salah.latitude,
            salah.longitude,
            &salah.calc_method,
            &salah.madhab,
            salah.timezone_offset,
        )
    }

    pub fn table_for_date(&self, date: NaiveDate) -> Result<PrayerTable> {
        let coords = Coordinates::new(self.lat, self.lng);
        let method = parse_method(&self.method_str)?;
        let madhab = parse_madhab(&self.madhab_str)?;
        let params = Configuration::with(method, madhab);

        let times = PrayerSchedule::new()
            .on(date)
            .for_location(coords)
            .with_configuration(params)
            .calculate()
            .map_err(|e| anyhow!("Prayer calculation failed: {}", e))?;

        let offset = match self.tz_offset_minutes {
            Some(minutes) => Some(
                FixedOffset::east_opt(minutes * 60)
                    .ok_or_else(|| anyhow!("Invalid timezone offset: {}", minutes))?,
            ),
            None => None,
        };

        // Tables hold whole minutes, like provider "HH:MM" strings. Without a
        // fixed offset each time takes the device zone's offset at that
        // instant, so DST is honoured.
        let to_local = |utc: DateTime<Utc>| {
            let local = match offset {
                Some(offset) => utc.with_timezone(&offset).time(),
                None => utc.with_timezone(&Local).time(),
            };
            local.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(local)
        };

        Ok(PrayerTable {
            fajr: to_local(times.time(Prayer::Fajr)),
            dhuhr: to_local(times.time(Prayer::Dhuhr)),
            asr: to_local(times.time(Prayer::Asr)),
            maghrib: to_local(times.time(Prayer::Maghrib)),
            isha: to_local(times.time(Prayer::Isha)),
        })
    }

    /// Cached table for `date`, computing and caching it when missing.
    /// Imported provider tables live in the same cache and win.
    pub fn get_cached_or_compute(&self, conn: &Connection, date: NaiveDate) -> Result<PrayerTable> {
        let date_str = date.format("%Y-%m-%d").to_string();

        if let Some(cached) = CacheRepo::get_table_for_date(conn, &date_str)? {
            debug!("Using cached prayer table for {}", date_str);
            return Ok(cached);
        }

        let table = self.table_for_date(date)?;
        CacheRepo::store_table(conn, &date_str, &table)?;
        debug!("Computed prayer table for {}", date_str);
        Ok(table)
    }
}

/// Today's store for the configured location. An unusable location config
/// falls back to the default location rather than leaving the table unset.
pub fn load_store(conn: &Connection, salah: &SalahConfig, date: NaiveDate) -> Result<PrayerTimeStore> {
    let (calc, label) = match PrayerCalculator::from_config(salah) {
        Ok(calc) => (calc, salah.location_name.clone()),
        Err(e) => {
            warn!("Falling back to default location: {}", e);
            let fallback = SalahConfig::default();
            let label = fallback.location_name.clone();
            (PrayerCalculator::from_config(&fallback)?, label)
        }
    };

    let mut store = PrayerTimeStore::new();
    store.set_table(calc.get_cached_or_compute(conn, date)?);
    store.set_location(label);
    Ok(store)
}

fn parse_method(s: &str) -> Result<Method> {
    match s {
        "MuslimWorldLeague" => Ok(Method::MuslimWorldLeague),
        "Egyptian" => Ok(Method::Egyptian),
        "Karachi" => Ok(Method::Karachi),
        "UmmAlQura" => Ok(Method::UmmAlQura),
        "Dubai" => Ok(Method::Dubai),
        "MoonsightingCommittee" => Ok(Method::MoonsightingCommittee),
        "NorthAmerica" => Ok(Method::NorthAmerica),
        "Kuwait" => Ok(Method::Kuwait),
        "Qatar" => Ok(Method::Qatar),
        "Singapore" => Ok(Method::Singapore),
        "Tehran" => Ok(Method::Tehran),
        "Turkey" => Ok(Method::Turkey),
        "Other" => Ok(Method::Other),
        _ => Err(anyhow!(
            "Unknown calculation method: '{}' (expected one of {})",
            s,
            CALC_METHODS.join(", ")
        )),
    }
}

fn parse_madhab(s: &str) -> Result<Madhab> {
    match s {
        "Hanafi" => Ok(Madhab::Hanafi),
        "Shafi" | "Shafi'i" => Ok(Madhab::Shafi),
        _ => Err(anyhow!("Unknown madhab: '{}'", s)),
    }
}

pub const CALC_METHODS: &[&str] = &[
    "MuslimWorldLeague",
    "Egyptian",
    "Karachi",
    "UmmAlQura",
    "Dubai",
    "MoonsightingCommittee",
    "NorthAmerica",
    "Kuwait",
    "Qatar",
    "Singapore",
    "Tehran",
    "Turkey",
    "Other",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::PrayerType;
    use chrono::NaiveTime;

    fn london() -> PrayerCalculator {
        PrayerCalculator::new(51.5074, -0.1278, "NorthAmerica", "Shafi", Some(0)).unwrap()
    }

    #[test]
    fn rejects_unknown_method_and_madhab() {
        assert!(PrayerCalculator::new(0.0, 0.0, "Lunar", "Hanafi", None).is_err());
        assert!(PrayerCalculator::new(0.0, 0.0, "Karachi", "Maliki", None).is_err());
    }

    #[test]
    fn computed_table_is_in_day_order_and_whole_minutes() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
        let table = london().table_for_date(date).unwrap();
        let times: Vec<NaiveTime> = table.entries().iter().map(|(_, t)| *t).collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]), "{:?}", times);
        assert!(times.iter().all(|t| t.second() == 0));
    }

    #[test]
    fn unset_offset_gives_device_local_times() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 21).unwrap();
        let noon_utc = date.and_hms_opt(12, 0, 0).unwrap().and_utc();
        let local_minutes = noon_utc.with_timezone(&Local).offset().local_minus_utc() / 60;

        let device = PrayerCalculator::new(51.5074, -0.1278, "NorthAmerica", "Shafi", None)
            .unwrap()
            .table_for_date(date)
            .unwrap();
        let fixed = PrayerCalculator::new(51.5074, -0.1278, "NorthAmerica", "Shafi", Some(local_minutes))
            .unwrap()
            .table_for_date(date)
            .unwrap();
        assert_eq!(device, fixed);
    }

    #[test]
    fn explicit_offset_shifts_the_table() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 21).unwrap();
        let utc = london().table_for_date(date).unwrap();
        let bst = PrayerCalculator::new(51.5074, -0.1278, "NorthAmerica", "Shafi", Some(60))
            .unwrap()
            .table_for_date(date)
            .unwrap();
        assert_eq!(bst.maghrib, utc.maghrib + chrono::Duration::hours(1));
        assert!(PrayerCalculator::new(0.0, 0.0, "Karachi", "Hanafi", Some(24 * 60)).is_err());
    }

    #[test]
    fn cache_takes_precedence_over_calculation() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();

        let imported = PrayerTable {
            fajr: NaiveTime::from_hms_opt(4, 0, 0).unwrap(),
            dhuhr: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            asr: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            maghrib: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            isha: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        };
        CacheRepo::store_table(&conn, "2026-03-20", &imported).unwrap();

        let table = london().get_cached_or_compute(&conn, date).unwrap();
        assert_eq!(table.time(PrayerType::Fajr), imported.fajr);
    }

    #[test]
    fn bad_method_falls_back_to_default_location() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let salah = SalahConfig {
            location_name: "Somewhere".to_string(),
            calc_method: "Lunar".to_string(),
            ..SalahConfig::default()
        };
        let date = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();

        let store = load_store(&conn, &salah, date).unwrap();
        assert!(store.is_set());
        assert_eq!(store.location(), Some("London (Default)"));
    }

    #[test]
    fn computed_tables_are_cached() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();

        let first = london().get_cached_or_compute(&conn, date).unwrap();
        assert_eq!(
            CacheRepo::get_table_for_date(&conn, "2026-06-01").unwrap(),
            Some(first)
        );
    }
}

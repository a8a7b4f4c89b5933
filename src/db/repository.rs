use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;

use crate::models::table::parse_time;
use crate::models::{PrayerTable, PrayerType, TrackedPrayerLog};

// ─── Cached prayer tables ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSource {
    Calculated,
    Imported,
}

impl TableSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableSource::Calculated => "calculated",
            TableSource::Imported => "imported",
        }
    }
}

fn time_column(s: &str) -> Result<NaiveTime> {
    parse_time(s).ok_or_else(|| anyhow!("Bad time '{}' in prayer_table_cache", s))
}

fn hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

pub struct CacheRepo;

impl CacheRepo {
    pub fn get_table_for_date(conn: &Connection, date: &str) -> Result<Option<PrayerTable>> {
        let row = conn
            .query_row(
                "SELECT fajr, dhuhr, asr, maghrib, isha FROM prayer_table_cache WHERE date = ?1",
                params![date],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((fajr, dhuhr, asr, maghrib, isha)) => Ok(Some(PrayerTable {
                fajr: time_column(&fajr)?,
                dhuhr: time_column(&dhuhr)?,
                asr: time_column(&asr)?,
                maghrib: time_column(&maghrib)?,
                isha: time_column(&isha)?,
            })),
        }
    }

    pub fn source_for_date(conn: &Connection, date: &str) -> Result<Option<TableSource>> {
        let source: Option<String> = conn
            .query_row(
                "SELECT source FROM prayer_table_cache WHERE date = ?1",
                params![date],
                |row| row.get(0),
            )
            .optional()?;
        Ok(source.map(|s| match s.as_str() {
            "imported" => TableSource::Imported,
            _ => TableSource::Calculated,
        }))
    }

    pub fn clear_all(conn: &Connection) -> Result<()> {
        conn.execute("DELETE FROM prayer_table_cache", [])?;
        Ok(())
    }

    /// Drop calculated rows only; imported tables stay authoritative.
    pub fn clear_calculated(conn: &Connection) -> Result<usize> {
        Ok(conn.execute(
            "DELETE FROM prayer_table_cache WHERE source = 'calculated'",
            [],
        )?)
    }

    pub fn store_table(conn: &Connection, date: &str, table: &PrayerTable) -> Result<()> {
        Self::store_table_from(conn, date, table, TableSource::Calculated)
    }

    pub fn store_table_from(
        conn: &Connection,
        date: &str,
        table: &PrayerTable,
        source: TableSource,
    ) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO prayer_table_cache (date, fajr, dhuhr, asr, maghrib, isha, source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                date,
                hhmm(table.fajr),
                hhmm(table.dhuhr),
                hhmm(table.asr),
                hhmm(table.maghrib),
                hhmm(table.isha),
                source.as_str(),
            ],
        )?;
        Ok(())
    }
}

// ─── Tracked prayers ─────────────────────────────────────────────────────────

pub struct TrackedRepo;

impl TrackedRepo {
    pub fn load(conn: &Connection) -> Result<TrackedPrayerLog> {
        let mut stmt = conn.prepare("SELECT prayer, marked_at FROM tracked_prayers")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        rows.map(|r| -> Result<(PrayerType, DateTime<Utc>)> {
            let (prayer, marked_at) = r?;
            let prayer = PrayerType::from_str(&prayer)?;
            let marked_at = DateTime::parse_from_rfc3339(&marked_at)
                .map_err(|e| anyhow!("Bad timestamp '{}': {}", marked_at, e))?
                .with_timezone(&Utc);
            Ok((prayer, marked_at))
        })
        .collect()
    }

    pub fn mark(conn: &Connection, prayer: PrayerType, at: DateTime<Utc>) -> Result<()> {
        conn.execute(
            "INSERT INTO tracked_prayers (prayer, marked_at) VALUES (?1, ?2)
             ON CONFLICT(prayer) DO UPDATE SET marked_at = ?2",
            params![prayer.as_str(), at.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn clear(conn: &Connection, prayer: PrayerType) -> Result<bool> {
        let n = conn.execute(
            "DELETE FROM tracked_prayers WHERE prayer = ?1",
            params![prayer.as_str()],
        )?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use chrono::TimeZone;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn table() -> PrayerTable {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        PrayerTable {
            fajr: t(5, 0),
            dhuhr: t(12, 30),
            asr: t(16, 0),
            maghrib: t(19, 45),
            isha: t(21, 15),
        }
    }

    #[test]
    fn cache_store_and_fetch() {
        let conn = conn();
        assert_eq!(CacheRepo::get_table_for_date(&conn, "2026-10-19").unwrap(), None);

        CacheRepo::store_table(&conn, "2026-10-19", &table()).unwrap();
        assert_eq!(
            CacheRepo::get_table_for_date(&conn, "2026-10-19").unwrap(),
            Some(table())
        );
        assert_eq!(
            CacheRepo::source_for_date(&conn, "2026-10-19").unwrap(),
            Some(TableSource::Calculated)
        );

        CacheRepo::store_table_from(&conn, "2026-10-19", &table(), TableSource::Imported).unwrap();
        assert_eq!(
            CacheRepo::source_for_date(&conn, "2026-10-19").unwrap(),
            Some(TableSource::Imported)
        );

        CacheRepo::clear_all(&conn).unwrap();
        assert_eq!(CacheRepo::get_table_for_date(&conn, "2026-10-19").unwrap(), None);
    }

    #[test]
    fn tracked_marks_round_trip_through_sqlite() {
        let conn = conn();
        let first = Utc.with_ymd_and_hms(2026, 10, 19, 5, 20, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 10, 20, 5, 12, 0).unwrap();

        TrackedRepo::mark(&conn, PrayerType::Fajr, first).unwrap();
        TrackedRepo::mark(&conn, PrayerType::Fajr, later).unwrap();
        TrackedRepo::mark(&conn, PrayerType::Isha, first).unwrap();

        let log = TrackedRepo::load(&conn).unwrap();
        assert_eq!(log.tracked_count(), 2);
        assert_eq!(log.last_marked(PrayerType::Fajr), Some(later));

        assert!(TrackedRepo::clear(&conn, PrayerType::Isha).unwrap());
        assert!(!TrackedRepo::clear(&conn, PrayerType::Isha).unwrap());
        assert!(!TrackedRepo::load(&conn).unwrap().is_marked(PrayerType::Isha));
    }

    #[test]
    fn corrupt_mark_fails_the_whole_load() {
        let conn = conn();
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 5, 20, 0).unwrap();
        TrackedRepo::mark(&conn, PrayerType::Fajr, at).unwrap();
        conn.execute(
            "INSERT INTO tracked_prayers (prayer, marked_at) VALUES ('asr', 'yesterday')",
            [],
        )
        .unwrap();

        assert!(TrackedRepo::load(&conn).is_err());
    }

    #[test]
    fn clear_calculated_keeps_imports() {
        let conn = conn();
        CacheRepo::store_table(&conn, "2026-10-19", &table()).unwrap();
        CacheRepo::store_table_from(&conn, "2026-10-20", &table(), TableSource::Imported).unwrap();

        assert_eq!(CacheRepo::clear_calculated(&conn).unwrap(), 1);
        assert_eq!(CacheRepo::get_table_for_date(&conn, "2026-10-19").unwrap(), None);
        assert_eq!(
            CacheRepo::source_for_date(&conn, "2026-10-20").unwrap(),
            Some(TableSource::Imported)
        );
    }
}

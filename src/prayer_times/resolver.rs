//! Next-occurrence resolution for the countdown display and the scheduler.
//!
//! Everything here is a pure function of the table and an explicit `now`
//! on the device's local wall clock.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::models::{OccurrenceDay, PrayerOccurrence, PrayerTable, PrayerType};
use crate::utils::format::format_countdown;

/// The next instance of `prayer` strictly after `now`: today if still
/// upcoming, otherwise tomorrow.
pub fn occurrence_of(table: &PrayerTable, prayer: PrayerType, now: NaiveDateTime) -> PrayerOccurrence {
    let today = now.date().and_time(table.time(prayer));
    if today > now {
        PrayerOccurrence {
            prayer,
            at: today,
            day: OccurrenceDay::Today,
        }
    } else {
        PrayerOccurrence {
            prayer,
            at: today + Duration::days(1),
            day: OccurrenceDay::Tomorrow,
        }
    }
}

/// The first prayer, in canonical order, still ahead today; Fajr tomorrow
/// once all five have passed. Equal times resolve to the earlier-listed
/// prayer.
pub fn next_occurrence(table: &PrayerTable, now: NaiveDateTime) -> PrayerOccurrence {
    PrayerType::ALL
        .into_iter()
        .map(|prayer| PrayerOccurrence {
            prayer,
            at: now.date().and_time(table.time(prayer)),
            day: OccurrenceDay::Today,
        })
        .find(|occ| occ.at > now)
        .unwrap_or_else(|| occurrence_of(table, PrayerType::Fajr, now))
}

/// Remaining time until `occurrence`, never negative.
pub fn time_until(occurrence: &PrayerOccurrence, now: NaiveDateTime) -> Duration {
    (occurrence.at - now).max(Duration::zero())
}

/// The next instance of every prayer, in canonical order.
pub fn all_occurrences(table: &PrayerTable, now: NaiveDateTime) -> [PrayerOccurrence; 5] {
    PrayerType::ALL.map(|prayer| occurrence_of(table, prayer, now))
}

/// A prayer can be marked as prayed once its time has come today, or while
/// it is the next prayer.
pub fn is_trackable(prayer: PrayerType, table: &PrayerTable, now: NaiveDateTime) -> bool {
    let occurred = now.date().and_time(table.time(prayer)) <= now;
    occurred || next_occurrence(table, now).prayer == prayer
}

/// One row of the per-prayer countdown display.
#[derive(Debug, Clone, Serialize)]
pub struct Countdown {
    pub prayer: PrayerType,
    pub time: String,
    pub occurrence: PrayerOccurrence,
    pub remaining: String,
    pub remaining_secs: i64,
    pub is_next: bool,
    pub trackable: bool,
}

pub fn countdowns(table: &PrayerTable, now: NaiveDateTime) -> Vec<Countdown> {
    let next = next_occurrence(table, now);
    all_occurrences(table, now)
        .into_iter()
        .map(|occ| {
            let remaining = time_until(&occ, now);
            Countdown {
                prayer: occ.prayer,
                time: table.time(occ.prayer).format("%H:%M").to_string(),
                occurrence: occ,
                remaining: format_countdown(remaining),
                remaining_secs: remaining.num_seconds(),
                is_next: occ.prayer == next.prayer,
                trackable: is_trackable(occ.prayer, table, now),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use proptest::prelude::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn table() -> PrayerTable {
        PrayerTable {
            fajr: hm(5, 0),
            dhuhr: hm(12, 30),
            asr: hm(16, 0),
            maghrib: hm(19, 45),
            isha: hm(21, 15),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_time(hm(h, m))
    }

    #[test]
    fn evening_resolves_to_maghrib_today() {
        let now = at(18, 0);
        let next = next_occurrence(&table(), now);
        assert_eq!(next.prayer, PrayerType::Maghrib);
        assert_eq!(next.at, at(19, 45));
        assert_eq!(next.day, OccurrenceDay::Today);
        assert_eq!(time_until(&next, now), Duration::minutes(105));
    }

    #[test]
    fn after_isha_resolves_to_fajr_tomorrow() {
        let next = next_occurrence(&table(), at(22, 0));
        assert_eq!(next.prayer, PrayerType::Fajr);
        assert!(next.is_tomorrow());
        assert_eq!(next.at, day().succ_opt().unwrap().and_time(hm(5, 0)));
    }

    #[test]
    fn exact_prayer_time_is_not_next() {
        let next = next_occurrence(&table(), at(12, 30));
        assert_eq!(next.prayer, PrayerType::Asr);
    }

    #[test]
    fn equal_times_prefer_canonical_order() {
        let mut t = table();
        t.asr = hm(19, 45);
        let next = next_occurrence(&t, at(18, 0));
        assert_eq!(next.prayer, PrayerType::Asr);

        // Listing order wins even when a later-listed prayer is earlier.
        t.dhuhr = hm(20, 0);
        t.asr = hm(19, 0);
        let next = next_occurrence(&t, at(18, 0));
        assert_eq!(next.prayer, PrayerType::Dhuhr);
    }

    #[test]
    fn time_until_clamps_at_zero() {
        let occ = next_occurrence(&table(), at(18, 0));
        assert_eq!(time_until(&occ, at(20, 0)), Duration::zero());
    }

    #[test]
    fn passed_prayers_count_down_to_tomorrow() {
        let occs = all_occurrences(&table(), at(13, 0));
        let days: Vec<_> = occs.iter().map(|o| o.day).collect();
        assert_eq!(
            days,
            vec![
                OccurrenceDay::Tomorrow,
                OccurrenceDay::Tomorrow,
                OccurrenceDay::Today,
                OccurrenceDay::Today,
                OccurrenceDay::Today,
            ]
        );
        assert_eq!(time_until(&occs[0], at(13, 0)), Duration::hours(16));
    }

    #[test]
    fn trackability_allows_past_and_next_only() {
        let t = table();
        let now = at(13, 0);
        assert!(is_trackable(PrayerType::Fajr, &t, now));
        assert!(is_trackable(PrayerType::Dhuhr, &t, now));
        assert!(is_trackable(PrayerType::Asr, &t, now));
        assert!(!is_trackable(PrayerType::Maghrib, &t, now));
        assert!(!is_trackable(PrayerType::Isha, &t, now));
    }

    #[test]
    fn countdown_rows_mark_the_next_prayer() {
        let rows = countdowns(&table(), at(18, 0));
        assert_eq!(rows.len(), 5);
        let next: Vec<_> = rows.iter().filter(|r| r.is_next).collect();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].prayer, PrayerType::Maghrib);
        assert_eq!(next[0].remaining, "1h 45m");
        assert_eq!(rows[0].time, "05:00");
    }

    fn arb_time() -> impl Strategy<Value = NaiveTime> {
        (0u32..24, 0u32..60).prop_map(|(h, m)| hm(h, m))
    }

    fn arb_table() -> impl Strategy<Value = PrayerTable> {
        (arb_time(), arb_time(), arb_time(), arb_time(), arb_time()).prop_map(
            |(fajr, dhuhr, asr, maghrib, isha)| PrayerTable {
                fajr,
                dhuhr,
                asr,
                maghrib,
                isha,
            },
        )
    }

    fn arb_now() -> impl Strategy<Value = NaiveDateTime> {
        (0u32..86_400).prop_map(|secs| {
            day().and_hms_opt(secs / 3600, (secs / 60) % 60, secs % 60).unwrap()
        })
    }

    proptest! {
        #[test]
        fn next_is_strictly_after_now(t in arb_table(), now in arb_now()) {
            let next = next_occurrence(&t, now);
            prop_assert!(next.at > now);
            prop_assert!(PrayerType::ALL.contains(&next.prayer));
            prop_assert_eq!(next.at.time(), t.time(next.prayer));
        }

        #[test]
        fn all_passed_rolls_fajr_to_tomorrow(t in arb_table(), now in arb_now()) {
            let all_passed = t.entries().iter().all(|(_, time)| now.date().and_time(*time) <= now);
            let next = next_occurrence(&t, now);
            if all_passed {
                prop_assert_eq!(next.prayer, PrayerType::Fajr);
                prop_assert_eq!(next.at.date(), now.date().succ_opt().unwrap());
            } else {
                prop_assert_eq!(next.at.date(), now.date());
            }
        }

        #[test]
        fn countdown_decreases_towards_occurrence(t in arb_table(), now in arb_now(), step in 1i64..600) {
            let next = next_occurrence(&t, now);
            let later = now + Duration::seconds(step);
            prop_assume!(later < next.at);
            prop_assert!(time_until(&next, later) < time_until(&next, now));
            prop_assert!(time_until(&next, later) >= Duration::zero());
            let still_next = next_occurrence(&t, later);
            prop_assert_eq!((still_next.prayer, still_next.at), (next.prayer, next.at));
        }

        #[test]
        fn every_occurrence_is_upcoming(t in arb_table(), now in arb_now()) {
            for occ in all_occurrences(&t, now) {
                prop_assert!(occ.at > now);
                prop_assert!(occ.at - now <= Duration::days(1));
            }
        }
    }
}

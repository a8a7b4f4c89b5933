use chrono::{Datelike, Duration, NaiveDate};
use hijri_date::HijriDate;
use log::debug;

/// Islamic month names in English (index 0 = Muharram = month 1)
const HIJRI_MONTH_NAMES: &[&str] = &[
    "Muharram",
    "Safar",
    "Rabi' al-Awwal",
    "Rabi' al-Thani",
    "Jumada al-Awwal",
    "Jumada al-Thani",
    "Rajab",
    "Sha'ban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qi'dah",
    "Dhu al-Hijjah",
];

fn hijri_month_name(month: usize) -> &'static str {
    HIJRI_MONTH_NAMES
        .get(month.wrapping_sub(1))
        .copied()
        .unwrap_or("Unknown")
}

/// Hijri date label for `date`, shifted by `offset_days` for local moon
/// sighting. `None` when the date is outside the converter's range.
pub fn hijri_string(date: NaiveDate, offset_days: i32) -> Option<String> {
    let adjusted = date + Duration::days(offset_days as i64);
    match HijriDate::from_gr(
        adjusted.year() as usize,
        adjusted.month() as usize,
        adjusted.day() as usize,
    ) {
        Ok(hd) => Some(format!(
            "{} {} {}",
            hd.day(),
            hijri_month_name(hd.month()),
            hd.year()
        )),
        Err(e) => {
            debug!("Hijri conversion failed for {}: {}", adjusted, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_names_are_one_based() {
        assert_eq!(hijri_month_name(1), "Muharram");
        assert_eq!(hijri_month_name(9), "Ramadan");
        assert_eq!(hijri_month_name(0), "Unknown");
        assert_eq!(hijri_month_name(13), "Unknown");
    }

    #[test]
    fn offset_shifts_the_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let base = hijri_string(date, 0).unwrap();
        let next = hijri_string(date, 1).unwrap();
        assert_ne!(base, next);
        assert!(base.ends_with("1447"), "{}", base);
    }
}

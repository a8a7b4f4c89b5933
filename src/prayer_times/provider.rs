use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::Timings;

#[derive(Deserialize)]
struct ProviderData {
    timings: Timings,
}

/// A prayer-times provider response: either the full envelope
/// (`{"code":200,"data":{"timings":{...}}}`) or just the timings object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProviderResponse {
    Envelope { data: ProviderData },
    Bare(Timings),
}

pub fn parse_provider_timings(json: &str) -> Result<Timings> {
    let response: ProviderResponse =
        serde_json::from_str(json).context("Parsing prayer-times response")?;
    Ok(match response {
        ProviderResponse::Envelope { data } => data.timings,
        ProviderResponse::Bare(timings) => timings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PrayerTable, PrayerType};

    #[test]
    fn reads_full_envelope() {
        let json = r#"{
            "code": 200,
            "status": "OK",
            "data": {
                "timings": {
                    "Fajr": "05:00", "Sunrise": "06:40", "Dhuhr": "12:30",
                    "Asr": "16:00", "Sunset": "19:44", "Maghrib": "19:45",
                    "Isha": "21:15", "Imsak": "04:50", "Midnight": "00:30"
                },
                "date": { "readable": "19 Oct 2026" }
            }
        }"#;
        let timings = parse_provider_timings(json).unwrap();
        let table = PrayerTable::from_timings(&timings).unwrap();
        assert_eq!(table.time(PrayerType::Isha).format("%H:%M").to_string(), "21:15");
    }

    #[test]
    fn reads_bare_timings() {
        let json = r#"{"Fajr":"05:00","Dhuhr":"12:30","Asr":"16:00","Maghrib":"19:45","Isha":"21:15"}"#;
        assert_eq!(parse_provider_timings(json).unwrap().len(), 5);
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(parse_provider_timings("[1, 2, 3]").is_err());
        assert!(parse_provider_timings(r#"{"data": {"date": {}}}"#).is_err());
    }
}

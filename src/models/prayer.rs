use serde::Serialize;
use std::str::FromStr;

/// The five daily prayers. Declaration order is the canonical order and
/// drives `Ord`, which the resolver relies on for tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrayerType {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl PrayerType {
    pub const ALL: [PrayerType; 5] = [
        PrayerType::Fajr,
        PrayerType::Dhuhr,
        PrayerType::Asr,
        PrayerType::Maghrib,
        PrayerType::Isha,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrayerType::Fajr => "fajr",
            PrayerType::Dhuhr => "dhuhr",
            PrayerType::Asr => "asr",
            PrayerType::Maghrib => "maghrib",
            PrayerType::Isha => "isha",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PrayerType::Fajr => "Fajr",
            PrayerType::Dhuhr => "Dhuhr",
            PrayerType::Asr => "Asr",
            PrayerType::Maghrib => "Maghrib",
            PrayerType::Isha => "Isha",
        }
    }
}

impl std::fmt::Display for PrayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for PrayerType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fajr" => Ok(PrayerType::Fajr),
            "dhuhr" | "zuhr" | "dhuhur" => Ok(PrayerType::Dhuhr),
            "asr" => Ok(PrayerType::Asr),
            "maghrib" => Ok(PrayerType::Maghrib),
            "isha" => Ok(PrayerType::Isha),
            _ => Err(anyhow::anyhow!("Unknown prayer type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_spellings() {
        assert_eq!("Fajr".parse::<PrayerType>().unwrap(), PrayerType::Fajr);
        assert_eq!("zuhr".parse::<PrayerType>().unwrap(), PrayerType::Dhuhr);
        assert_eq!(" DHUHR ".parse::<PrayerType>().unwrap(), PrayerType::Dhuhr);
        assert!("sunrise".parse::<PrayerType>().is_err());
    }

    #[test]
    fn ordering_follows_the_day() {
        let mut shuffled = vec![
            PrayerType::Isha,
            PrayerType::Fajr,
            PrayerType::Maghrib,
            PrayerType::Dhuhr,
            PrayerType::Asr,
        ];
        shuffled.sort();
        assert_eq!(shuffled, PrayerType::ALL.to_vec());
    }
}

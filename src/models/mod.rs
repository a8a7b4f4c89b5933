pub mod occurrence;
pub mod prayer;
pub mod table;
pub mod tracked;

pub use occurrence::{OccurrenceDay, PrayerOccurrence};
pub use prayer::PrayerType;
pub use table::{PrayerTable, Timings};
pub use tracked::TrackedPrayerLog;

pub mod calculator;
pub mod provider;
pub mod resolver;
pub mod store;

pub use store::PrayerTimeStore;

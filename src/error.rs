//! Error kinds of the scheduling core.
//!
//! None of these is fatal. A rejected table leaves the previous one in place
//! and delivery failures never stop the daily re-arm chain.

use thiserror::Error;

use crate::models::PrayerType;
use crate::notify::Permission;

/// A prayer table that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("missing prayer time for {0}")]
    Missing(PrayerType),

    #[error("malformed time '{value}' for {prayer}, expected HH:MM")]
    Malformed { prayer: PrayerType, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Arming was requested without notification permission.
    #[error("notifications are not permitted (permission: {0})")]
    NotPermitted(Permission),

    #[error("scheduler worker has stopped")]
    Stopped,
}

/// A notification channel failed to show a notification.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("{channel}: {source}")]
    Io {
        channel: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{channel} exited with {status}")]
    Exit { channel: &'static str, status: String },

    #[error("{0} channel is closed")]
    Closed(&'static str),
}

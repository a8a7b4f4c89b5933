use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "waqt", version, author, about = "Prayer-time countdowns and daily prayer reminders")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show today's prayer times with a countdown for each prayer
    Times {
        /// Print the countdown rows as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the next prayer and the time left until it
    Next,
    /// Mark a prayer as prayed
    Mark {
        /// Prayer name (fajr, dhuhr, asr, maghrib, isha)
        prayer: String,
        /// Clear the mark instead
        #[arg(long)]
        undo: bool,
    },
    /// Prayer notification settings
    Notifications {
        #[command(subcommand)]
        action: NotifyCommands,
    },
    /// Set the location prayer times are calculated for
    Location {
        /// Latitude in degrees
        #[arg(allow_hyphen_values = true)]
        latitude: f64,
        /// Longitude in degrees
        #[arg(allow_hyphen_values = true)]
        longitude: f64,
        /// Display name for the location
        #[arg(long)]
        name: Option<String>,
        /// Offset from UTC in minutes (defaults to this device's zone)
        #[arg(long, allow_hyphen_values = true)]
        tz_offset: Option<i32>,
    },
    /// Import today's timings from a prayer-times provider JSON response
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
    /// Run the notification scheduler in the foreground
    Watch,
}

#[derive(Subcommand, Debug)]
pub enum NotifyCommands {
    /// Turn prayer notifications on
    On,
    /// Turn prayer notifications off
    Off,
    /// Grant notification permission
    Grant,
    /// Deny notification permission
    Deny,
    /// Show notification settings
    Status,
}

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate, Utc};
use log::{info, warn};
use rusqlite::Connection;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use crate::cli::args::NotifyCommands;
use crate::config::{AppConfig, SalahConfig};
use crate::db::repository::{CacheRepo, TableSource, TrackedRepo};
use crate::error::ScheduleError;
use crate::models::{PrayerTable, PrayerType};
use crate::notify::driver::SystemClock;
use crate::notify::{
    CommandNotifier, ConsoleNotifier, FallbackNotifier, NotificationSignal, Notifier,
    Permission, PermissionSource, SchedulerDriver,
};
use crate::prayer_times::calculator::load_store;
use crate::prayer_times::provider::parse_provider_timings;
use crate::prayer_times::resolver::{countdowns, is_trackable, next_occurrence, time_until};
use crate::prayer_times::PrayerTimeStore;
use crate::utils::format::{format_countdown, format_time};

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;2;196;160;68m";

// How often `watch` re-reads the config file for on/off and permission changes.
const CONFIG_POLL_SECS: u64 = 5;

// ─── Times ───────────────────────────────────────────────────────────────────

pub fn handle_times(conn: &Connection, config: &AppConfig, json: bool) -> Result<()> {
    let now = Local::now().naive_local();
    let store = load_store(conn, &config.salah, now.date())?;
    let table = store.get().context("No prayer table for today")?;
    let rows = countdowns(table, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let tracked = TrackedRepo::load(conn)?;
    let date_str = now.date().format("%Y-%m-%d").to_string();
    let source = match CacheRepo::source_for_date(conn, &date_str)? {
        Some(TableSource::Imported) => "imported",
        _ => "calculated",
    };

    println!();
    println_colored!(
        GOLD,
        "  Prayer Times — {} ({}, {})",
        store.location().unwrap_or("No location"),
        date_str,
        source
    );
    println!();

    for row in &rows {
        let mark = match tracked.last_marked(row.prayer) {
            Some(at) => format!(
                "✓ {}",
                at.with_timezone(&Local).format("%a %H:%M")
            ),
            None => String::new(),
        };
        let line = format!(
            "  {:<9} {}   in {:<8} {}",
            row.prayer.display_name(),
            row.time,
            row.remaining,
            mark
        );
        if row.is_next {
            println_colored!(BOLD, "{}", line);
        } else if row.occurrence.is_tomorrow() {
            println_colored!(DIM, "{}", line);
        } else {
            println!("{}", line);
        }
    }

    let next = next_occurrence(table, now);
    println!();
    println_colored!(
        AMBER,
        "  Next: {} in {}",
        next.prayer.display_name(),
        format_countdown(time_until(&next, now))
    );
    println_colored!(DIM, "  {}/5 tracked", tracked.tracked_count());
    if config.salah.is_fallback_location() {
        println_colored!(DIM, "  Using the default location. Set yours with `waqt location <lat> <lon>`.");
    }
    println!();
    Ok(())
}

pub fn handle_next(conn: &Connection, config: &AppConfig) -> Result<()> {
    let now = Local::now().naive_local();
    let store = load_store(conn, &config.salah, now.date())?;
    let table = store.get().context("No prayer table for today")?;
    let next = next_occurrence(table, now);
    println!(
        "{} at {} in {}",
        next.prayer.display_name(),
        format_time(next.at.time()),
        format_countdown(time_until(&next, now))
    );
    Ok(())
}

// ─── Mark prayer ─────────────────────────────────────────────────────────────

pub fn handle_mark(conn: &Connection, config: &AppConfig, prayer_str: &str, undo: bool) -> Result<()> {
    let prayer = PrayerType::from_str(prayer_str)
        .map_err(|_| anyhow!("Unknown prayer '{}'. Use: fajr, dhuhr, asr, maghrib, isha", prayer_str))?;

    if undo {
        if TrackedRepo::clear(conn, prayer)? {
            println_colored!(DIM, "  {} unmarked", prayer.display_name());
        } else {
            println_colored!(DIM, "  {} was not marked", prayer.display_name());
        }
        return Ok(());
    }

    let now = Local::now().naive_local();
    let store = load_store(conn, &config.salah, now.date())?;
    let table = store.get().context("No prayer table for today")?;
    if !is_trackable(prayer, table, now) {
        return Err(anyhow!(
            "{} hasn't started yet. Only past prayers and the next prayer can be marked",
            prayer.display_name()
        ));
    }

    TrackedRepo::mark(conn, prayer, Utc::now())?;
    println_colored!(GREEN, "  ✓ {} marked as prayed", prayer.display_name());
    Ok(())
}

// ─── Notifications ───────────────────────────────────────────────────────────

pub fn handle_notifications(config: &mut AppConfig, action: &NotifyCommands) -> Result<()> {
    match action {
        NotifyCommands::On => {
            config.notifications.enabled = true;
            config.save()?;
            println_colored!(GREEN, "  Prayer notifications on");
            if !config.notifications.permission().is_granted() {
                println_colored!(AMBER, "  Permission is {}: run `waqt notifications grant`", config.notifications.permission());
            }
        }
        NotifyCommands::Off => {
            config.notifications.enabled = false;
            config.save()?;
            println_colored!(DIM, "  Prayer notifications off");
        }
        NotifyCommands::Grant => {
            config.notifications.permission = Permission::Granted;
            config.save()?;
            println_colored!(GREEN, "  Notification permission granted");
        }
        NotifyCommands::Deny => {
            config.notifications.permission = Permission::Denied;
            config.save()?;
            println_colored!(DIM, "  Notification permission denied");
        }
        NotifyCommands::Status => {
            let n = &config.notifications;
            println!();
            println!("  enabled     {}", n.enabled);
            println!("  permission  {}", n.permission());
            println!("  command     {}", n.command.as_deref().unwrap_or("(console)"));
            println!("  bell        {}", n.bell);
            println!();
        }
    }
    Ok(())
}

// ─── Location ────────────────────────────────────────────────────────────────

pub fn handle_location(
    conn: &Connection,
    config: &mut AppConfig,
    latitude: f64,
    longitude: f64,
    name: Option<String>,
    tz_offset: Option<i32>,
) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(anyhow!("Coordinates out of range: {}, {}", latitude, longitude));
    }

    config.salah.latitude = latitude;
    config.salah.longitude = longitude;
    config.salah.location_name =
        name.unwrap_or_else(|| format!("{:.3}, {:.3}", latitude, longitude));
    // Without --tz-offset the device's own zone applies.
    config.salah.timezone_offset = tz_offset;
    config.save()?;

    // Cached tables belong to the old location.
    CacheRepo::clear_all(conn)?;
    info!("Location set to {}", config.salah.location_name);
    println_colored!(GREEN, "  Location set to {}", config.salah.location_name);
    Ok(())
}

// ─── Import ──────────────────────────────────────────────────────────────────

pub fn handle_import(conn: &Connection, path: &std::path::Path) -> Result<()> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Reading {:?}", path))?;
    let timings = parse_provider_timings(&content)?;

    let mut store = PrayerTimeStore::new();
    store.set(&timings).context("Imported timings are not a usable prayer table")?;
    let table = store.get().context("No prayer table after import")?;

    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    CacheRepo::store_table_from(conn, &today, table, TableSource::Imported)?;

    println_colored!(GREEN, "  Imported prayer times for {}", today);
    for (prayer, time) in table.entries() {
        println!("  {:<9} {}", prayer.display_name(), format_time(time));
    }
    Ok(())
}

// ─── Watch ───────────────────────────────────────────────────────────────────

/// Build the configured delivery channel: a desktop command when one is
/// set, backed by the console.
pub fn build_notifier(config: &AppConfig) -> Box<dyn Notifier + Send> {
    let console = ConsoleNotifier {
        bell: config.notifications.bell,
    };
    match config
        .notifications
        .command
        .as_deref()
        .and_then(CommandNotifier::parse)
    {
        Some(command) => Box::new(FallbackNotifier {
            primary: command,
            secondary: console,
        }),
        None => Box::new(console),
    }
}

fn report_armed(result: Result<usize, ScheduleError>) {
    match result {
        Ok(0) => println_colored!(DIM, "  Notifications off, nothing scheduled"),
        Ok(n) => println_colored!(GREEN, "  {} prayer reminders scheduled", n),
        Err(ScheduleError::NotPermitted(p)) => println_colored!(
            AMBER,
            "  Notification permission is {}: nothing scheduled (`waqt notifications grant`)",
            p
        ),
        Err(e) => warn!("Scheduler error: {}", e),
    }
}

/// The table `watch` should arm for `date`, or `None` while it matches the
/// one already armed. `import` and `location` replace today's cached row
/// without changing the date, so the tables themselves are compared.
fn table_update(
    conn: &Connection,
    salah: &SalahConfig,
    date: NaiveDate,
    armed: Option<&PrayerTable>,
) -> Result<Option<PrayerTable>> {
    let store = load_store(conn, salah, date)?;
    Ok(store.get().copied().filter(|table| Some(table) != armed))
}

pub fn handle_watch(conn: &Connection, config: &AppConfig) -> Result<()> {
    let mut config = config.clone();
    let store = load_store(conn, &config.salah, Local::now().date_naive())?;
    let mut armed = store.get().copied();

    let driver = SchedulerDriver::spawn(
        build_notifier(&config),
        SystemClock,
        config.notifications.permission(),
        config.notifications.enabled,
        Duration::from_millis(config.display.refresh_ms.max(100)),
    );

    println_colored!(
        GOLD,
        "  Watching prayer times for {} (Ctrl-C to stop)",
        store.location().unwrap_or("No location")
    );
    if let Some(table) = armed {
        report_armed(driver.set_table(table));
    }
    for entry in driver.snapshot() {
        println_colored!(DIM, "  {:<9} {}", entry.prayer.display_name(), entry.fire_at.format("%a %H:%M"));
    }

    loop {
        thread::sleep(Duration::from_secs(CONFIG_POLL_SECS));

        let latest = match AppConfig::load() {
            Ok(c) => c,
            Err(e) => {
                warn!("Keeping previous config: {:#}", e);
                continue;
            }
        };

        if latest.notifications.enabled != config.notifications.enabled {
            let signal = if latest.notifications.enabled {
                NotificationSignal::Enabled
            } else {
                NotificationSignal::Disabled
            };
            info!("Notifications {:?}", signal);
            config.notifications.enabled = latest.notifications.enabled;
            report_armed(driver.signal(signal));
        }

        if latest.notifications.permission != config.notifications.permission {
            config.notifications.permission = latest.notifications.permission;
            report_armed(driver.set_permission(latest.notifications.permission));
        }

        if latest.salah != config.salah {
            // Hand-edited method, madhab or offset: cached calculations are stale.
            info!("Prayer-time settings changed");
            if let Err(e) = CacheRepo::clear_calculated(conn) {
                warn!("Could not clear cached prayer tables: {:#}", e);
            }
            config.salah = latest.salah;
        }

        // A new day, an import or new settings all show up as a new table.
        match table_update(conn, &config.salah, Local::now().date_naive(), armed.as_ref()) {
            Ok(Some(table)) => {
                info!("Prayer table changed, re-arming");
                armed = Some(table);
                report_armed(driver.set_table(table));
            }
            Ok(None) => {}
            Err(e) => warn!("Keeping previous prayer table: {:#}", e),
        }
    }
}

mod cli;
mod config;
mod db;
mod error;
mod models;
mod notify;
mod prayer_times;
mod tui;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;

use cli::args::{Cli, Commands};
use cli::handlers;
use config::AppConfig;
use db::migrations::run_migrations;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = AppConfig::load().context("Loading config")?;

    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;

    // `watch` and the TUI may run side by side
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    run_migrations(&conn)?;

    match cli.command {
        Some(Commands::Times { json }) => handlers::handle_times(&conn, &config, json)?,
        Some(Commands::Next) => handlers::handle_next(&conn, &config)?,
        Some(Commands::Mark { prayer, undo }) => {
            handlers::handle_mark(&conn, &config, &prayer, undo)?;
        }
        Some(Commands::Notifications { action }) => {
            handlers::handle_notifications(&mut config, &action)?;
        }
        Some(Commands::Location {
            latitude,
            longitude,
            name,
            tz_offset,
        }) => {
            handlers::handle_location(&conn, &mut config, latitude, longitude, name, tz_offset)?;
        }
        Some(Commands::Import { file }) => handlers::handle_import(&conn, &file)?,
        Some(Commands::Watch) => handlers::handle_watch(&conn, &config)?,

        // No subcommand → launch TUI
        None => tui::app::run(conn, config)?,
    }

    Ok(())
}

use anyhow::Result;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch("
        CREATE TABLE IF NOT EXISTS prayer_table_cache (
            date     TEXT PRIMARY KEY,
            fajr     TEXT NOT NULL,
            dhuhr    TEXT NOT NULL,
            asr      TEXT NOT NULL,
            maghrib  TEXT NOT NULL,
            isha     TEXT NOT NULL,
            source   TEXT NOT NULL DEFAULT 'calculated'
                     CHECK(source IN ('calculated','imported'))
        );

        CREATE TABLE IF NOT EXISTS tracked_prayers (
            prayer     TEXT PRIMARY KEY
                       CHECK(prayer IN ('fajr','dhuhr','asr','maghrib','isha')),
            marked_at  TEXT NOT NULL
        );
    ")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }
}

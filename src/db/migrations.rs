use anyhow::Result;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch("
        CREATE TABLE IF NOT EXISTS kv_store (
            key         TEXT PRIMARY KEY,
            value       TEXT NOT NULL,
            updated_at  TEXT DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS scheduled_notifications (
            identifier  TEXT PRIMARY KEY,
            fire_at     TEXT NOT NULL,
            title       TEXT NOT NULL,
            body        TEXT NOT NULL,
            payload     TEXT NOT NULL DEFAULT 'null',
            created_at  TEXT DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_scheduled_notifications_fire_at
            ON scheduled_notifications (fire_at);
    ")?;
    Ok(())
}

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::db::migrations::run_migrations;
use crate::models::ScheduledNotification;
use crate::traits::{KeyValueStore, LocalNotifier};

const FIRE_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub type SharedConnection = Arc<Mutex<Connection>>;

/// Open the database file, enable WAL and bring the schema up to date.
pub fn open(path: &Path) -> Result<SharedConnection> {
    let conn = Connection::open(path).with_context(|| format!("Opening database at {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    run_migrations(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub fn open_in_memory() -> Result<SharedConnection> {
    let conn = Connection::open_in_memory()?;
    run_migrations(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

fn lock(conn: &SharedConnection) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run `f` against the connection on the blocking pool.
async fn with_conn<T, F>(conn: &SharedConnection, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
{
    let conn = conn.clone();
    tokio::task::spawn_blocking(move || f(&mut lock(&conn)))
        .await
        .context("Database task failed")?
}

// ─── JSON blobs ──────────────────────────────────────────────────────────────

pub async fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key).await? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .with_context(|| format!("Decoding stored value for '{}'", key)),
    }
}

pub async fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value).with_context(|| format!("Encoding value for '{}'", key))?;
    store.set(key, &raw).await
}

// ─── Key-value store ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SqliteStore {
    conn: SharedConnection,
}

impl SqliteStore {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    pub fn get_sync(&self, key: &str) -> Result<Option<String>> {
        read_value(&lock(&self.conn), key)
    }

    pub fn set_sync(&self, key: &str, value: &str) -> Result<()> {
        write_value(&lock(&self.conn), key, value)
    }
}

fn read_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| row.get(0))
        .optional()
        .map_err(anyhow::Error::from)
}

fn write_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        with_conn(&self.conn, move |conn| read_value(conn, &key)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let (key, value) = (key.to_string(), value.to_string());
        with_conn(&self.conn, move |conn| write_value(conn, &key, &value)).await
    }
}

// ─── Local notification queue ────────────────────────────────────────────────

/// Notification queue persisted next to the cache; a delivery loop drains
/// it with [`SqliteNotifier::take_due`].
#[derive(Clone)]
pub struct SqliteNotifier {
    conn: SharedConnection,
}

type NotificationRow = (String, String, String, String, String);

fn row_to_notification(row: NotificationRow) -> Result<ScheduledNotification> {
    let (identifier, fire_at, title, body, payload) = row;
    Ok(ScheduledNotification {
        fire_at: NaiveDateTime::parse_from_str(&fire_at, FIRE_AT_FORMAT)
            .map_err(|e| anyhow!("Bad fire_at '{}' for {}: {}", fire_at, identifier, e))?,
        payload: serde_json::from_str(&payload)
            .with_context(|| format!("Bad payload for {}", identifier))?,
        identifier,
        title,
        body,
    })
}

impl SqliteNotifier {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn query(conn: &Connection, sql: &str, bind: &[&dyn rusqlite::ToSql]) -> Result<Vec<ScheduledNotification>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(bind, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut result = Vec::new();
        for r in rows {
            result.push(row_to_notification(r?)?);
        }
        Ok(result)
    }

    /// Remove and return every notification due at or before `now`.
    pub fn take_due(&self, now: NaiveDateTime) -> Result<Vec<ScheduledNotification>> {
        let mut conn = lock(&self.conn);
        let tx = conn.transaction()?;
        let cutoff = now.format(FIRE_AT_FORMAT).to_string();
        let due = Self::query(
            &tx,
            "SELECT identifier, fire_at, title, body, payload FROM scheduled_notifications
             WHERE fire_at <= ?1 ORDER BY fire_at, identifier",
            &[&cutoff],
        )?;
        tx.execute("DELETE FROM scheduled_notifications WHERE fire_at <= ?1", params![cutoff])?;
        tx.commit()?;
        Ok(due)
    }
}

#[async_trait]
impl LocalNotifier for SqliteNotifier {
    async fn schedule_at(&self, notification: &ScheduledNotification) -> Result<()> {
        let n = notification.clone();
        with_conn(&self.conn, move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO scheduled_notifications (identifier, fire_at, title, body, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    n.identifier,
                    n.fire_at.format(FIRE_AT_FORMAT).to_string(),
                    n.title,
                    n.body,
                    n.payload.to_string(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn cancel(&self, identifier: &str) -> Result<()> {
        let identifier = identifier.to_string();
        with_conn(&self.conn, move |conn| {
            conn.execute(
                "DELETE FROM scheduled_notifications WHERE identifier = ?1",
                params![identifier],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>> {
        with_conn(&self.conn, |conn| {
            Self::query(
                conn,
                "SELECT identifier, fire_at, title, body, payload FROM scheduled_notifications
                 ORDER BY fire_at, identifier",
                &[],
            )
        })
        .await
    }
}

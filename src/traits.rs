//! Seams between the prayer-time core and the outside world.
//!
//! - `Clock`: current time, swappable for deterministic tests
//! - `RemoteSource`: the backend holding mosque info, events, announcements
//!   and monthly prayer schedules
//! - `AdhanLookup`: city + date to the five adhan clock times
//! - `KeyValueStore`: string-keyed JSON blobs on the device
//! - `LocalNotifier`: the device's local notification queue

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};

use crate::models::{Announcement, Event, MosqueInfo, PrayerDay, PrayerName, ScheduledNotification};

// ==================== Clock ====================

pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Wall-clock time on the device.
    fn now_local(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Test clock whose local time is pinned; UTC reads the same wall time.
#[derive(Debug, Clone)]
pub struct MockClock {
    local: Arc<Mutex<NaiveDateTime>>,
}

impl MockClock {
    pub fn new(local: NaiveDateTime) -> Self {
        Self {
            local: Arc::new(Mutex::new(local)),
        }
    }

    pub fn set_time(&self, local: NaiveDateTime) {
        *self.local.lock().unwrap_or_else(PoisonError::into_inner) = local;
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut t = self.local.lock().unwrap_or_else(PoisonError::into_inner);
        *t += duration;
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.now_local().and_utc()
    }

    fn now_local(&self) -> NaiveDateTime {
        *self.local.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ==================== Remote data source ====================

/// Every list call takes an optional `since`: only records created or
/// updated after it are returned.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_mosque(&self, mosque_id: &str) -> Result<MosqueInfo>;

    async fn fetch_events(&self, mosque_id: &str, since: Option<DateTime<Utc>>) -> Result<Vec<Event>>;

    async fn fetch_announcements(
        &self,
        mosque_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Announcement>>;

    async fn fetch_prayer_times(
        &self,
        mosque_id: &str,
        month_key: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PrayerDay>>;
}

// ==================== Adhan lookup ====================

/// Raw adhan clock strings for one date, keyed by prayer.
pub type AdhanTimes = BTreeMap<PrayerName, String>;

#[async_trait]
pub trait AdhanLookup: Send + Sync {
    async fn adhan_times(&self, city: &str, date: NaiveDate) -> Result<AdhanTimes>;
}

// ==================== Key-value store ====================

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process store, used in tests and as a scratch cache.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ==================== Local notifications ====================

#[async_trait]
pub trait LocalNotifier: Send + Sync {
    /// Schedule (or replace) the notification with this identifier.
    async fn schedule_at(&self, notification: &ScheduledNotification) -> Result<()>;

    async fn cancel(&self, identifier: &str) -> Result<()>;

    async fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>>;
}

/// Notifier that keeps the queue in memory and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    scheduled: Arc<Mutex<BTreeMap<String, ScheduledNotification>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make scheduling or cancelling `identifier` return an error.
    pub fn fail_on(&self, identifier: &str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identifier.to_string());
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.scheduled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn get(&self, identifier: &str) -> Option<ScheduledNotification> {
        self.scheduled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identifier)
            .cloned()
    }

    fn check(&self, identifier: &str) -> Result<()> {
        if self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(identifier)
        {
            return Err(anyhow!("notification subsystem rejected {}", identifier));
        }
        Ok(())
    }
}

#[async_trait]
impl LocalNotifier for MockNotifier {
    async fn schedule_at(&self, notification: &ScheduledNotification) -> Result<()> {
        self.check(&notification.identifier)?;
        self.scheduled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(notification.identifier.clone(), notification.clone());
        Ok(())
    }

    async fn cancel(&self, identifier: &str) -> Result<()> {
        self.check(identifier)?;
        self.scheduled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(identifier);
        Ok(())
    }

    async fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>> {
        Ok(self
            .scheduled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_mock_clock_advance() {
        let clock = MockClock::new(local(10));
        clock.advance(chrono::Duration::hours(2));
        assert_eq!(clock.now_local(), local(12));
        assert_eq!(clock.now_utc(), local(12).and_utc());
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_mock_notifier_failure_injection() {
        let notifier = MockNotifier::new();
        notifier.fail_on("bad");
        let n = ScheduledNotification {
            identifier: "bad".to_string(),
            fire_at: local(9),
            title: String::new(),
            body: String::new(),
            payload: serde_json::Value::Null,
        };
        assert!(notifier.schedule_at(&n).await.is_err());
        assert!(notifier.list_scheduled().await.unwrap().is_empty());
    }
}

//! Shared fixtures for the integration tests: an in-memory backend with
//! call recording and failure switches, and a fixed adhan table.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use masjid_sync::{
    AdhanLookup, AdhanTimes, Announcement, AppContext, Collaborators, DailyPrayerTimes, Event,
    JummahSlot, JummahTime, MemoryStore, MockClock, MockNotifier, MosqueInfo, PrayerDay,
    PrayerName, PrayerSlot, RemoteSource,
};

pub const MOSQUE_ID: &str = "m1";

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub resource: &'static str,
    pub since: Option<DateTime<Utc>>,
    pub month: Option<String>,
}

#[derive(Default)]
struct RemoteState {
    info: MosqueInfo,
    events: Vec<Event>,
    announcements: Vec<Announcement>,
    months: HashMap<String, Vec<PrayerDay>>,
    failing: HashSet<&'static str>,
    calls: Vec<Call>,
    delay: Option<Duration>,
}

/// Backend double. Each list call returns whatever is currently configured
/// for that resource; `since` is recorded, not applied.
#[derive(Clone, Default)]
pub struct MockRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl MockRemote {
    pub fn new(info: MosqueInfo) -> Self {
        let remote = Self::default();
        remote.state.lock().unwrap().info = info;
        remote
    }

    pub fn set_info(&self, f: impl FnOnce(&mut MosqueInfo)) {
        f(&mut self.state.lock().unwrap().info);
    }

    pub fn set_events(&self, events: Vec<Event>) {
        self.state.lock().unwrap().events = events;
    }

    pub fn set_announcements(&self, announcements: Vec<Announcement>) {
        self.state.lock().unwrap().announcements = announcements;
    }

    pub fn set_month(&self, month_key: &str, days: Vec<PrayerDay>) {
        self.state
            .lock()
            .unwrap()
            .months
            .insert(month_key.to_string(), days);
    }

    /// Make every call for `resource` ("mosque", "events",
    /// "announcements", "prayer-times") fail.
    pub fn fail(&self, resource: &'static str) {
        self.state.lock().unwrap().failing.insert(resource);
    }

    pub fn recover(&self, resource: &'static str) {
        self.state.lock().unwrap().failing.remove(resource);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn calls(&self, resource: &str) -> Vec<Call> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.resource == resource)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    async fn record(
        &self,
        resource: &'static str,
        since: Option<DateTime<Utc>>,
        month: Option<&str>,
    ) -> Result<()> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call {
                resource,
                since,
                month: month.map(str::to_string),
            });
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.state.lock().unwrap().failing.contains(resource) {
            return Err(anyhow!("{} unavailable", resource));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSource for MockRemote {
    async fn fetch_mosque(&self, _mosque_id: &str) -> Result<MosqueInfo> {
        self.record("mosque", None, None).await?;
        Ok(self.state.lock().unwrap().info.clone())
    }

    async fn fetch_events(&self, _mosque_id: &str, since: Option<DateTime<Utc>>) -> Result<Vec<Event>> {
        self.record("events", since, None).await?;
        Ok(self.state.lock().unwrap().events.clone())
    }

    async fn fetch_announcements(
        &self,
        _mosque_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Announcement>> {
        self.record("announcements", since, None).await?;
        Ok(self.state.lock().unwrap().announcements.clone())
    }

    async fn fetch_prayer_times(
        &self,
        _mosque_id: &str,
        month_key: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PrayerDay>> {
        self.record("prayer-times", since, Some(month_key)).await?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .months
            .get(month_key)
            .cloned()
            .unwrap_or_default())
    }
}

/// Same adhan times for every city and date.
pub struct FixedAdhan;

#[async_trait]
impl AdhanLookup for FixedAdhan {
    async fn adhan_times(&self, _city: &str, _date: NaiveDate) -> Result<AdhanTimes> {
        Ok([
            (PrayerName::Fajr, "5:10"),
            (PrayerName::Dhuhr, "12:58"),
            (PrayerName::Asr, "16:21"),
            (PrayerName::Maghrib, "19:02"),
            (PrayerName::Isha, "20:30"),
        ]
        .into_iter()
        .map(|(p, t)| (p, t.to_string()))
        .collect())
    }
}

/// An adhan source that is always down.
pub struct OfflineAdhan;

#[async_trait]
impl AdhanLookup for OfflineAdhan {
    async fn adhan_times(&self, city: &str, _date: NaiveDate) -> Result<AdhanTimes> {
        Err(anyhow!("no adhan table for {}", city))
    }
}

// ─── Builders ────────────────────────────────────────────────────────────────

pub fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, d, h, m, 0).unwrap()
}

pub fn local(month: u32, d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, month, d)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

pub fn mosque_info() -> MosqueInfo {
    MosqueInfo {
        id: MOSQUE_ID.to_string(),
        name: "Masjid Al-Noor".to_string(),
        city: "Austin".to_string(),
        jummah: JummahTime {
            jummah1: Some(JummahSlot {
                athan: "1:15".to_string(),
                iqama: "1:45".to_string(),
            }),
            ..Default::default()
        },
        last_event: Some(utc(1, 8, 0)),
        last_announcement: Some(utc(1, 8, 0)),
        last_prayer: Some(utc(1, 8, 0)),
        ..Default::default()
    }
}

pub fn event(id: &str, title: &str) -> Event {
    Event {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        starts_at: None,
        ends_at: None,
        location: None,
        updated_at: None,
    }
}

pub fn announcement(id: &str, title: &str) -> Announcement {
    Announcement {
        id: id.to_string(),
        title: title.to_string(),
        body: String::new(),
        updated_at: None,
    }
}

fn slot(iqama: &str) -> Option<PrayerSlot> {
    Some(PrayerSlot {
        adhan: String::new(),
        iqama: iqama.to_string(),
    })
}

/// A day as the backend stores it: bare clock values and offsets.
pub fn raw_times() -> DailyPrayerTimes {
    DailyPrayerTimes {
        fajr: slot("5:40"),
        dhuhr: slot("1:30"),
        asr: slot("+15"),
        maghrib: slot("+5"),
        isha: slot("8:45"),
        ..Default::default()
    }
}

pub fn month_days(days: std::ops::RangeInclusive<u32>) -> Vec<PrayerDay> {
    days.map(|day| PrayerDay {
        day,
        times: raw_times(),
    })
    .collect()
}

/// App context over in-memory collaborators, with handles kept for
/// inspection.
pub struct Harness {
    pub ctx: AppContext,
    pub remote: MockRemote,
    pub store: MemoryStore,
    pub notifier: MockNotifier,
    pub clock: MockClock,
}

pub fn harness(now: NaiveDateTime) -> Harness {
    harness_with_adhan(now, Arc::new(FixedAdhan))
}

pub fn harness_with_adhan(now: NaiveDateTime, adhan: Arc<dyn AdhanLookup>) -> Harness {
    let remote = MockRemote::new(mosque_info());
    remote.set_month("10-26", month_days(1..=31));
    let store = MemoryStore::new();
    let notifier = MockNotifier::new();
    let clock = MockClock::new(now);
    let ctx = AppContext::new(
        Collaborators {
            remote: Arc::new(remote.clone()),
            adhan,
            store: Arc::new(store.clone()),
            notifier: Arc::new(notifier.clone()),
            clock: Arc::new(clock.clone()),
        },
        false,
    );
    Harness {
        ctx,
        remote,
        store,
        notifier,
        clock,
    }
}

//! Mosque prayer-time core
//!
//! Normalizes iqama/adhan clock strings, works out the next prayer at any
//! instant, keeps an on-device cache of a mosque's events, announcements and
//! monthly schedule in step with the backend, and schedules iqama reminders.

pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod notifications;
pub mod prayer_times;
pub mod sync;
pub mod traits;
pub mod utils;

pub use app::{AppContext, Collaborators, ResumeOutcome};
pub use config::AppConfig;
pub use error::{ScheduleError, SyncError, TimeError};
pub use models::{
    Announcement, CacheRecord, DailyPrayerTimes, Event, JummahKey, JummahSlot, JummahTime,
    MonthlySchedule, MosqueInfo, NextPrayerState, NotificationSettings, PrayerDay, PrayerName,
    PrayerSlot, ScheduledNotification,
};
pub use notifications::{NotificationScheduler, ScheduleSummary, SchedulerState};
pub use sync::{CacheSyncEngine, HttpRemoteSource};
pub use traits::{
    AdhanLookup, AdhanTimes, Clock, KeyValueStore, LocalNotifier, MemoryStore, MockClock,
    MockNotifier, RemoteSource, SystemClock,
};

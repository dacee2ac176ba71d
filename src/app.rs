//! Application context: the collaborators and the operations the UI layer
//! calls on mount, on user action and when the app becomes active again.

use std::sync::Arc;

use log::{debug, info};

use crate::error::SyncError;
use crate::models::{CacheRecord, DailyPrayerTimes, MonthlySchedule, NotificationSettings};
use crate::notifications::{self, NotificationScheduler, ScheduleSummary};
use crate::prayer_times::{format_day, format_month, today_times};
use crate::sync::{CacheSyncEngine, SingleFlight};
use crate::traits::{AdhanLookup, Clock, KeyValueStore, LocalNotifier, RemoteSource};

/// External services the core consumes.
#[derive(Clone)]
pub struct Collaborators {
    pub remote: Arc<dyn RemoteSource>,
    pub adhan: Arc<dyn AdhanLookup>,
    pub store: Arc<dyn KeyValueStore>,
    pub notifier: Arc<dyn LocalNotifier>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Clone)]
pub struct ResumeOutcome {
    pub record: CacheRecord,
    pub today: Option<DailyPrayerTimes>,
    pub notifications: ScheduleSummary,
}

pub struct AppContext {
    adhan: Arc<dyn AdhanLookup>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    engine: CacheSyncEngine,
    scheduler: NotificationScheduler,
    rescheduling: SingleFlight<Result<ScheduleSummary, SyncError>>,
    dev_mode: bool,
}

impl AppContext {
    pub fn new(collaborators: Collaborators, dev_mode: bool) -> Self {
        let Collaborators {
            remote,
            adhan,
            store,
            notifier,
            clock,
        } = collaborators;
        Self {
            engine: CacheSyncEngine::new(remote, store.clone(), clock.clone()),
            scheduler: NotificationScheduler::new(notifier, clock.clone()),
            rescheduling: SingleFlight::new(),
            adhan,
            store,
            clock,
            dev_mode,
        }
    }

    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn engine(&self) -> &CacheSyncEngine {
        &self.engine
    }

    pub fn scheduler(&self) -> &NotificationScheduler {
        &self.scheduler
    }

    pub async fn sync(&self, mosque_id: &str) -> Result<CacheRecord, SyncError> {
        self.engine.sync(mosque_id).await
    }

    async fn record(&self, mosque_id: &str) -> Result<CacheRecord, SyncError> {
        match self.engine.cached(mosque_id).await? {
            Some(record) => Ok(record),
            None => self.engine.sync(mosque_id).await,
        }
    }

    /// Today's times for a cached record, formatted, with a fresh
    /// next-prayer state.
    pub async fn today_from(&self, record: &CacheRecord) -> Option<DailyPrayerTimes> {
        let now = self.clock.now_local();
        let raw = today_times(&record.prayer_times, now.date())?;
        Some(
            format_day(
                &raw,
                &record.info.city,
                now.date(),
                Some(&record.info.jummah),
                self.adhan.as_ref(),
                now,
            )
            .await,
        )
    }

    /// Today's prayer times, from cache when present.
    pub async fn today(&self, mosque_id: &str) -> Result<Option<DailyPrayerTimes>, SyncError> {
        let record = self.record(mosque_id).await?;
        Ok(self.today_from(&record).await)
    }

    pub async fn month(&self, mosque_id: &str) -> Result<MonthlySchedule, SyncError> {
        let record = self.record(mosque_id).await?;
        Ok(self.format_cached_month(&record).await)
    }

    async fn format_cached_month(&self, record: &CacheRecord) -> MonthlySchedule {
        format_month(
            &record.prayer_times,
            &record.info.city,
            Some(&record.info.jummah),
            self.adhan.as_ref(),
            self.clock.now_local(),
        )
        .await
    }

    /// First screen of a mosque: sync (a full pull on the first visit),
    /// then today's times.
    pub async fn open_mosque(&self, mosque_id: &str) -> Result<(CacheRecord, Option<DailyPrayerTimes>), SyncError> {
        let record = self.engine.sync(mosque_id).await?;
        let today = self.today_from(&record).await;
        Ok((record, today))
    }

    pub async fn notification_settings(&self) -> NotificationSettings {
        notifications::load_settings(self.store.as_ref()).await
    }

    /// Persist new preferences and rebuild the reminders for `mosque_id`.
    pub async fn set_notification_settings(
        &self,
        mosque_id: &str,
        settings: &NotificationSettings,
    ) -> Result<ScheduleSummary, SyncError> {
        notifications::save_settings(self.store.as_ref(), settings)
            .await
            .map_err(|e| SyncError::Storage(format!("{:#}", e)))?;
        self.reschedule_notifications(mosque_id).await
    }

    /// Cancel and recreate the prayer reminders from the cached schedule
    /// and the stored preferences.
    pub async fn reschedule_notifications(&self, mosque_id: &str) -> Result<ScheduleSummary, SyncError> {
        self.rescheduling
            .run(mosque_id, || async {
                let record = self.record(mosque_id).await?;
                Ok::<_, SyncError>(self.reschedule_from(&record).await)
            })
            .await
    }

    async fn reschedule_from(&self, record: &CacheRecord) -> ScheduleSummary {
        let settings = self.notification_settings().await;
        let month = self.format_cached_month(record).await;
        self.scheduler.schedule(&record.info, &month, &settings).await
    }

    /// The app became active: re-check the backend, recompute the next
    /// prayer and rebuild reminders.
    pub async fn on_app_resumed(&self, mosque_id: &str) -> Result<ResumeOutcome, SyncError> {
        info!("App resumed, refreshing mosque {}", mosque_id);
        let record = self.engine.sync(mosque_id).await?;
        let today = self.today_from(&record).await;
        if self.dev_mode {
            debug!("Next prayer after resume: {:?}", today.as_ref().and_then(|t| t.next_prayer.as_ref()));
        }
        let notifications = self
            .rescheduling
            .run(mosque_id, || async { Ok::<_, SyncError>(self.reschedule_from(&record).await) })
            .await?;
        Ok(ResumeOutcome {
            record,
            today,
            notifications,
        })
    }
}

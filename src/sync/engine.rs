//! Reconciles the on-device cache for a mosque with the backend.
//!
//! The first visit pulls everything. Later syncs compare the backend's
//! per-entity "last pushed" stamps with the cache's "last fetched" stamps
//! and only pull what changed since, merging by id. Fetch failures fall back
//! to the cached copy; only a failed first visit is an error.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::error::SyncError;
use crate::models::{CacheRecord, MonthlySchedule, PrayerDay, merge_by_id};
use crate::prayer_times::month_key;
use crate::sync::single_flight::SingleFlight;
use crate::traits::{Clock, KeyValueStore, RemoteSource};

/// Whether the backend has pushed anything since we last fetched.
pub fn needs_pull(remote_push: Option<DateTime<Utc>>, local_fetch: Option<DateTime<Utc>>) -> bool {
    match (remote_push, local_fetch) {
        (Some(pushed), Some(fetched)) => pushed > fetched,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Result of reconciling one entity type; `checked` is false when the
/// remote could not be reached and the cached value was kept.
struct Reconciled<C> {
    value: C,
    checked: bool,
}

async fn reconcile<C, T, Fut>(
    entity: &str,
    mosque_id: &str,
    remote_push: Option<DateTime<Utc>>,
    local_fetch: Option<DateTime<Utc>>,
    cached: C,
    fetch: impl FnOnce(Option<DateTime<Utc>>) -> Fut,
    merge: impl FnOnce(C, Vec<T>) -> C,
) -> Reconciled<C>
where
    Fut: Future<Output = anyhow::Result<Vec<T>>>,
{
    if !needs_pull(remote_push, local_fetch) {
        debug!("{} for mosque {} are up to date", entity, mosque_id);
        return Reconciled {
            value: cached,
            checked: true,
        };
    }
    match fetch(local_fetch).await {
        Ok(items) => {
            info!("Pulled {} updated {} for mosque {}", items.len(), entity, mosque_id);
            Reconciled {
                value: merge(cached, items),
                checked: true,
            }
        }
        Err(e) => {
            warn!("Fetching {} for mosque {} failed, keeping cached copy: {:#}", entity, mosque_id, e);
            Reconciled {
                value: cached,
                checked: false,
            }
        }
    }
}

pub struct CacheSyncEngine {
    remote: Arc<dyn RemoteSource>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    in_flight: SingleFlight<Result<CacheRecord, SyncError>>,
}

impl CacheSyncEngine {
    pub fn new(remote: Arc<dyn RemoteSource>, store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            remote,
            store,
            clock,
            in_flight: SingleFlight::new(),
        }
    }

    /// The stored record, without touching the network. An undecodable blob
    /// counts as no cache.
    pub async fn cached(&self, mosque_id: &str) -> Result<Option<CacheRecord>, SyncError> {
        let key = CacheRecord::storage_key(mosque_id);
        let raw = self
            .store
            .get(&key)
            .await
            .map_err(|e| SyncError::Storage(format!("{:#}", e)))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!("Discarding unreadable cache for mosque {}: {}", mosque_id, e);
                Ok(None)
            }
        }
    }

    /// Bring the cache for `mosque_id` up to date. Concurrent calls for the
    /// same mosque share one run.
    pub async fn sync(&self, mosque_id: &str) -> Result<CacheRecord, SyncError> {
        self.in_flight
            .run(mosque_id, || self.sync_now(mosque_id))
            .await
    }

    async fn sync_now(&self, mosque_id: &str) -> Result<CacheRecord, SyncError> {
        match self.cached(mosque_id).await? {
            None => self.first_visit(mosque_id).await,
            Some(record) => self.refresh(mosque_id, record).await,
        }
    }

    async fn persist(&self, record: &CacheRecord) -> Result<(), SyncError> {
        let raw = serde_json::to_string(record).map_err(|e| SyncError::Storage(e.to_string()))?;
        self.store
            .set(&CacheRecord::storage_key(&record.info.id), &raw)
            .await
            .map_err(|e| SyncError::Storage(format!("{:#}", e)))
    }

    async fn first_visit(&self, mosque_id: &str) -> Result<CacheRecord, SyncError> {
        info!("No cache for mosque {}, pulling everything", mosque_id);
        let now = self.clock.now_utc();
        let month = month_key(self.clock.now_local().date());

        let (info, events, announcements, days) = tokio::join!(
            self.remote.fetch_mosque(mosque_id),
            self.remote.fetch_events(mosque_id, None),
            self.remote.fetch_announcements(mosque_id, None),
            self.remote.fetch_prayer_times(mosque_id, &month, None),
        );
        let failed = |reason: String| SyncError::FirstVisit {
            mosque_id: mosque_id.to_string(),
            reason,
        };

        let mut info = info.map_err(|e| failed(format!("{:#}", e)))?;
        let events = events.map_err(|e| failed(format!("{:#}", e)))?;
        let announcements = announcements.map_err(|e| failed(format!("{:#}", e)))?;
        let days = days.map_err(|e| failed(format!("{:#}", e)))?;
        let prayer_times = MonthlySchedule::from_days(month, days).map_err(|e| failed(e.to_string()))?;

        info.id = mosque_id.to_string();
        info.last_event = info.last_event.or(Some(now));
        info.last_announcement = info.last_announcement.or(Some(now));
        info.last_prayer = info.last_prayer.or(Some(now));

        let record = CacheRecord {
            info,
            events: merge_by_id(Vec::new(), events),
            announcements: merge_by_id(Vec::new(), announcements),
            prayer_times,
        };
        self.persist(&record).await?;
        Ok(record)
    }

    async fn refresh(&self, mosque_id: &str, record: CacheRecord) -> Result<CacheRecord, SyncError> {
        let remote_info = match self.remote.fetch_mosque(mosque_id).await {
            Ok(info) => info,
            Err(e) => {
                warn!("Could not reach backend for mosque {}, using cache: {:#}", mosque_id, e);
                return Ok(record);
            }
        };

        let now = self.clock.now_utc();
        let current_month = month_key(self.clock.now_local().date());
        let CacheRecord {
            info: local,
            events,
            announcements,
            prayer_times,
        } = record;

        let prayers = async {
            if prayer_times.month_key != current_month {
                return self.pull_month(mosque_id, &current_month, prayer_times).await;
            }
            reconcile(
                "prayer times",
                mosque_id,
                remote_info.last_prayer,
                local.last_prayer,
                prayer_times,
                |since| self.remote.fetch_prayer_times(mosque_id, &current_month, since),
                |mut schedule: MonthlySchedule, days: Vec<PrayerDay>| {
                    schedule.merge_days(days);
                    schedule
                },
            )
            .await
        };

        let (events, announcements, prayers) = tokio::join!(
            reconcile(
                "events",
                mosque_id,
                remote_info.last_event,
                local.last_event,
                events,
                |since| self.remote.fetch_events(mosque_id, since),
                merge_by_id,
            ),
            reconcile(
                "announcements",
                mosque_id,
                remote_info.last_announcement,
                local.last_announcement,
                announcements,
                |since| self.remote.fetch_announcements(mosque_id, since),
                merge_by_id,
            ),
            prayers,
        );

        let advance = |checked: bool, previous: Option<DateTime<Utc>>| {
            if checked { Some(now) } else { previous }
        };
        let mut info = remote_info;
        info.id = mosque_id.to_string();
        info.last_event = advance(events.checked, local.last_event);
        info.last_announcement = advance(announcements.checked, local.last_announcement);
        info.last_prayer = advance(prayers.checked, local.last_prayer);

        let record = CacheRecord {
            info,
            events: events.value,
            announcements: announcements.value,
            prayer_times: prayers.value,
        };
        self.persist(&record).await?;
        Ok(record)
    }

    /// Full pull of a month the cache does not hold yet.
    async fn pull_month(
        &self,
        mosque_id: &str,
        month: &str,
        cached: MonthlySchedule,
    ) -> Reconciled<MonthlySchedule> {
        info!("Cached schedule for mosque {} is {}, pulling {}", mosque_id, cached.month_key, month);
        let fetched = self
            .remote
            .fetch_prayer_times(mosque_id, month, None)
            .await
            .and_then(|days| MonthlySchedule::from_days(month, days).map_err(anyhow::Error::from));
        match fetched {
            Ok(schedule) if !schedule.is_empty() => Reconciled {
                value: schedule,
                checked: true,
            },
            Ok(_) => {
                warn!("Backend has no {} schedule for mosque {} yet", month, mosque_id);
                Reconciled {
                    value: cached,
                    checked: false,
                }
            }
            Err(e) => {
                warn!("Fetching {} schedule for mosque {} failed: {:#}", month, mosque_id, e);
                Reconciled {
                    value: cached,
                    checked: false,
                }
            }
        }
    }
}

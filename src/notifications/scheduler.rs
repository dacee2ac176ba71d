use std::sync::Arc;

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use log::{debug, error, info, warn};

use crate::db::repository::{load_json, save_json};
use crate::models::notification::SETTINGS_KEY;
use crate::models::{MonthlySchedule, MosqueInfo, NotificationSettings, PrayerName, ScheduledNotification};
use crate::prayer_times::formatter::{month_key, parse_month_key};
use crate::prayer_times::next_prayer::jummah_iqama_24;
use crate::prayer_times::time_codec::{minutes_since_midnight, to_12_hour};
use crate::traits::{Clock, KeyValueStore, LocalNotifier};

/// Shared prefix of every identifier this scheduler creates.
pub const NOTIFICATION_PREFIX: &str = "prayer";
pub const REMINDER_LEAD_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    BeforeIqama,
    AtIqama,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::BeforeIqama => "15min",
            ReminderKind::AtIqama => "iqama",
        }
    }

    fn lead(&self) -> Duration {
        match self {
            ReminderKind::BeforeIqama => Duration::minutes(REMINDER_LEAD_MINUTES),
            ReminderKind::AtIqama => Duration::zero(),
        }
    }
}

/// `prayer-{mosqueId}-{day}-{slot}-{15min|iqama}`
pub fn notification_id(mosque_id: &str, day: u32, slot: &str, kind: ReminderKind) -> String {
    format!("{}-{}-{}-{}-{}", NOTIFICATION_PREFIX, mosque_id, day, slot, kind.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Unscheduled,
    Scheduled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleSummary {
    pub cancelled: usize,
    pub scheduled: usize,
    pub skipped_past: usize,
    pub failed: usize,
}

pub async fn load_settings(store: &dyn KeyValueStore) -> NotificationSettings {
    match load_json(store, SETTINGS_KEY).await {
        Ok(Some(settings)) => settings,
        Ok(None) => NotificationSettings::default(),
        Err(e) => {
            warn!("Using default notification settings: {:#}", e);
            NotificationSettings::default()
        }
    }
}

pub async fn save_settings(store: &dyn KeyValueStore, settings: &NotificationSettings) -> Result<()> {
    save_json(store, SETTINGS_KEY, settings).await
}

/// One reminder target: a prayer or Jummah session on a given date.
struct Slot<'a> {
    key: &'a str,
    label: String,
    date: NaiveDate,
    iqama: NaiveTime,
}

pub struct NotificationScheduler {
    notifier: Arc<dyn LocalNotifier>,
    clock: Arc<dyn Clock>,
}

impl NotificationScheduler {
    pub fn new(notifier: Arc<dyn LocalNotifier>, clock: Arc<dyn Clock>) -> Self {
        Self { notifier, clock }
    }

    pub async fn state(&self, mosque_id: &str) -> Result<SchedulerState> {
        let prefix = format!("{}-{}-", NOTIFICATION_PREFIX, mosque_id);
        let scheduled = self.notifier.list_scheduled().await?;
        Ok(if scheduled.iter().any(|n| n.identifier.starts_with(&prefix)) {
            SchedulerState::Scheduled
        } else {
            SchedulerState::Unscheduled
        })
    }

    /// Cancel every prayer reminder. Returns (cancelled, failed).
    pub async fn cancel(&self) -> (usize, usize) {
        let prefix = format!("{}-", NOTIFICATION_PREFIX);
        let scheduled = match self.notifier.list_scheduled().await {
            Ok(list) => list,
            Err(e) => {
                error!("Could not list scheduled notifications: {:#}", e);
                return (0, 0);
            }
        };

        let (mut cancelled, mut failed) = (0, 0);
        for n in scheduled.iter().filter(|n| n.identifier.starts_with(&prefix)) {
            match self.notifier.cancel(&n.identifier).await {
                Ok(()) => cancelled += 1,
                Err(e) => {
                    error!("Failed to cancel {}: {:#}", n.identifier, e);
                    failed += 1;
                }
            }
        }
        (cancelled, failed)
    }

    /// Replace all prayer reminders with fresh ones for the rest of the
    /// month. `month` must hold formatted (24-hour) iqama times.
    pub async fn schedule(
        &self,
        mosque: &MosqueInfo,
        month: &MonthlySchedule,
        settings: &NotificationSettings,
    ) -> ScheduleSummary {
        let mut summary = ScheduleSummary::default();
        let (cancelled, failed) = self.cancel().await;
        summary.cancelled = cancelled;
        summary.failed = failed;

        if !settings.enabled {
            info!("Prayer reminders disabled, {} cancelled", cancelled);
            return summary;
        }

        let now = self.clock.now_local();
        let today = now.date();
        if month.month_key != month_key(today) {
            warn!(
                "Schedule for mosque {} is for {}, not scheduling reminders",
                mosque.id, month.month_key
            );
            return summary;
        }
        let Some((year, month_no)) = parse_month_key(&month.month_key) else {
            return summary;
        };

        for slot in self.slots(mosque, month, settings, year, month_no, today.day()) {
            for kind in [ReminderKind::BeforeIqama, ReminderKind::AtIqama] {
                self.enqueue(&mut summary, mosque, &slot, kind, now).await;
            }
        }

        info!(
            "Scheduled {} reminders for mosque {} ({} past, {} failed)",
            summary.scheduled, mosque.id, summary.skipped_past, summary.failed
        );
        summary
    }

    fn slots<'a>(
        &self,
        mosque: &'a MosqueInfo,
        month: &'a MonthlySchedule,
        settings: &NotificationSettings,
        year: i32,
        month_no: u32,
        from_day: u32,
    ) -> Vec<Slot<'a>> {
        let mut slots = Vec::new();
        for day in from_day..=31 {
            let Some(date) = NaiveDate::from_ymd_opt(year, month_no, day) else {
                break;
            };
            let Some(times) = month.day(day) else {
                debug!("No prayer times for day {} of {}", day, month.month_key);
                continue;
            };
            if !times.normalized {
                warn!("Skipping day {} of {}: times were not formatted", day, month.month_key);
                continue;
            }
            let friday = date.weekday() == Weekday::Fri;

            for prayer in PrayerName::ALL {
                if !settings.prayer_enabled(prayer) {
                    continue;
                }
                if prayer == PrayerName::Dhuhr && friday && settings.any_jummah_enabled() {
                    continue;
                }
                let Some(slot) = times.slot(prayer) else {
                    continue;
                };
                match parse_iqama(&slot.iqama) {
                    Ok(iqama) => slots.push(Slot {
                        key: prayer.as_str(),
                        label: prayer.display_name().to_string(),
                        date,
                        iqama,
                    }),
                    Err(e) => warn!("Skipping {} on {}: {}", prayer, date, e),
                }
            }

            if friday {
                let jummah = if times.jummah.is_empty() {
                    &mosque.jummah
                } else {
                    &times.jummah
                };
                let sessions = jummah.slots();
                let single = sessions.len() == 1;
                for (key, session) in sessions {
                    if !settings.jummah_enabled(key) {
                        continue;
                    }
                    let iqama = jummah_iqama_24(session)
                        .map_err(anyhow::Error::from)
                        .and_then(|t| parse_iqama(&t));
                    match iqama {
                        Ok(iqama) => slots.push(Slot {
                            key: key.as_str(),
                            label: if single {
                                "Jummah".to_string()
                            } else {
                                format!("Jummah {}", key.number())
                            },
                            date,
                            iqama,
                        }),
                        Err(e) => warn!("Skipping {} on {}: {}", key.as_str(), date, e),
                    }
                }
            }
        }
        slots
    }

    async fn enqueue(
        &self,
        summary: &mut ScheduleSummary,
        mosque: &MosqueInfo,
        slot: &Slot<'_>,
        kind: ReminderKind,
        now: NaiveDateTime,
    ) {
        let fire_at = slot.date.and_time(slot.iqama) - kind.lead();
        if fire_at <= now {
            summary.skipped_past += 1;
            return;
        }

        let iqama24 = slot.iqama.format("%H:%M").to_string();
        let iqama_display = to_12_hour(&iqama24).unwrap_or(iqama24);
        let title = match kind {
            ReminderKind::BeforeIqama => format!("{} iqama in {} minutes", slot.label, REMINDER_LEAD_MINUTES),
            ReminderKind::AtIqama => format!("{} iqama now", slot.label),
        };
        let notification = ScheduledNotification {
            identifier: notification_id(&mosque.id, slot.date.day(), slot.key, kind),
            fire_at,
            title,
            body: format!("{}: iqama at {}", mosque.name, iqama_display),
            payload: serde_json::json!({
                "mosqueId": mosque.id,
                "prayer": slot.key,
                "day": slot.date.day(),
                "kind": kind.as_str(),
            }),
        };

        match self.notifier.schedule_at(&notification).await {
            Ok(()) => summary.scheduled += 1,
            Err(e) => {
                error!("Failed to schedule {}: {:#}", notification.identifier, e);
                summary.failed += 1;
            }
        }
    }
}

fn parse_iqama(iqama24: &str) -> Result<NaiveTime> {
    let minutes = minutes_since_midnight(iqama24)?;
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
        .ok_or_else(|| anyhow::anyhow!("iqama '{}' is not a time of day", iqama24))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_id_shape() {
        assert_eq!(
            notification_id("m1", 7, "asr", ReminderKind::BeforeIqama),
            "prayer-m1-7-asr-15min"
        );
        assert_eq!(
            notification_id("m1", 23, "jummah2", ReminderKind::AtIqama),
            "prayer-m1-23-jummah2-iqama"
        );
    }

    #[test]
    fn test_parse_iqama() {
        assert_eq!(parse_iqama("05:40").unwrap(), NaiveTime::from_hms_opt(5, 40, 0).unwrap());
        assert!(parse_iqama("+10").is_err());
    }
}

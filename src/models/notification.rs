use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{JummahKey, PrayerName};

pub const SETTINGS_KEY: &str = "prayerNotificationSettings";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub prayers: BTreeMap<PrayerName, bool>,
    #[serde(default)]
    pub jummah: BTreeMap<JummahKey, bool>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            prayers: PrayerName::ALL.iter().map(|p| (*p, true)).collect(),
            jummah: JummahKey::ALL.iter().map(|k| (*k, true)).collect(),
        }
    }
}

impl NotificationSettings {
    pub fn prayer_enabled(&self, prayer: PrayerName) -> bool {
        self.prayers.get(&prayer).copied().unwrap_or(false)
    }

    pub fn jummah_enabled(&self, key: JummahKey) -> bool {
        self.jummah.get(&key).copied().unwrap_or(false)
    }

    pub fn any_jummah_enabled(&self) -> bool {
        self.jummah.values().any(|on| *on)
    }
}

/// A reminder owned by the local notification subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub identifier: String,
    /// Local wall-clock time.
    pub fire_at: NaiveDateTime,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

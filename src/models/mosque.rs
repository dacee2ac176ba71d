use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{JummahTime, MonthlySchedule};

/// Anything stored in a cache collection that is unique by id.
pub trait Identified {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MosqueInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub jummah: JummahTime,
    /// Remote record: last time events were pushed. Cached record: last fetch.
    #[serde(default)]
    pub last_event: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_announcement: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_prayer: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identified for Event {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identified for Announcement {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Everything known locally about one mosque; stored as `mosqueData-{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub info: MosqueInfo,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub announcements: Vec<Announcement>,
    #[serde(default)]
    pub prayer_times: MonthlySchedule,
}

impl CacheRecord {
    pub fn storage_key(mosque_id: &str) -> String {
        format!("mosqueData-{}", mosque_id)
    }
}

/// Additive merge: incoming items replace same-id items in place, new ids
/// are appended, nothing is removed.
pub fn merge_by_id<T: Identified>(existing: Vec<T>, incoming: Vec<T>) -> Vec<T> {
    let mut merged = existing;
    for item in incoming {
        match merged.iter().position(|e| e.id() == item.id()) {
            Some(idx) => merged[idx] = item,
            None => merged.push(item),
        }
    }
    merged
}

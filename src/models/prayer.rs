use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::ScheduleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrayerName {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl PrayerName {
    pub const ALL: [PrayerName; 5] = [
        PrayerName::Fajr,
        PrayerName::Dhuhr,
        PrayerName::Asr,
        PrayerName::Maghrib,
        PrayerName::Isha,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrayerName::Fajr => "fajr",
            PrayerName::Dhuhr => "dhuhr",
            PrayerName::Asr => "asr",
            PrayerName::Maghrib => "maghrib",
            PrayerName::Isha => "isha",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PrayerName::Fajr => "Fajr",
            PrayerName::Dhuhr => "Dhuhr",
            PrayerName::Asr => "Asr",
            PrayerName::Maghrib => "Maghrib",
            PrayerName::Isha => "Isha",
        }
    }
}

impl std::fmt::Display for PrayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for PrayerName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fajr" => Ok(PrayerName::Fajr),
            "dhuhr" | "zuhr" | "dhuhur" => Ok(PrayerName::Dhuhr),
            "asr" => Ok(PrayerName::Asr),
            "maghrib" => Ok(PrayerName::Maghrib),
            "isha" => Ok(PrayerName::Isha),
            _ => Err(anyhow::anyhow!("Unknown prayer: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerSlot {
    #[serde(default)]
    pub adhan: String,
    /// Clock time ("1:45"), offset ("+10"), or after formatting always "HH:MM".
    pub iqama: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JummahKey {
    Jummah1,
    Jummah2,
    Jummah3,
}

impl JummahKey {
    pub const ALL: [JummahKey; 3] = [JummahKey::Jummah1, JummahKey::Jummah2, JummahKey::Jummah3];

    pub fn as_str(&self) -> &'static str {
        match self {
            JummahKey::Jummah1 => "jummah1",
            JummahKey::Jummah2 => "jummah2",
            JummahKey::Jummah3 => "jummah3",
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            JummahKey::Jummah1 => 1,
            JummahKey::Jummah2 => 2,
            JummahKey::Jummah3 => 3,
        }
    }
}

impl FromStr for JummahKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "jummah1" => Ok(JummahKey::Jummah1),
            "2" | "jummah2" => Ok(JummahKey::Jummah2),
            "3" | "jummah3" => Ok(JummahKey::Jummah3),
            _ => Err(anyhow::anyhow!("Unknown jummah slot: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JummahSlot {
    pub athan: String,
    pub iqama: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JummahTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jummah1: Option<JummahSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jummah2: Option<JummahSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jummah3: Option<JummahSlot>,
}

impl JummahTime {
    pub fn get(&self, key: JummahKey) -> Option<&JummahSlot> {
        match key {
            JummahKey::Jummah1 => self.jummah1.as_ref(),
            JummahKey::Jummah2 => self.jummah2.as_ref(),
            JummahKey::Jummah3 => self.jummah3.as_ref(),
        }
    }

    /// Configured slots in session order.
    pub fn slots(&self) -> Vec<(JummahKey, &JummahSlot)> {
        JummahKey::ALL
            .iter()
            .filter_map(|k| self.get(*k).map(|slot| (*k, slot)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.jummah1.is_none() && self.jummah2.is_none() && self.jummah3.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextPrayerState {
    pub name: String,
    pub minutes_to_next_prayer: u32,
    pub percent_elapsed: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPrayerTimes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fajr: Option<PrayerSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhuhr: Option<PrayerSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asr: Option<PrayerSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maghrib: Option<PrayerSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isha: Option<PrayerSlot>,
    #[serde(default, flatten)]
    pub jummah: JummahTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_prayer: Option<NextPrayerState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Set once the day has been through formatting. Every clock-string
    /// iqama is then 24-hour; a `+N` whose adhan was unavailable is kept
    /// as stored and fails to parse as a clock.
    #[serde(skip)]
    pub normalized: bool,
}

impl DailyPrayerTimes {
    pub fn slot(&self, prayer: PrayerName) -> Option<&PrayerSlot> {
        match prayer {
            PrayerName::Fajr => self.fajr.as_ref(),
            PrayerName::Dhuhr => self.dhuhr.as_ref(),
            PrayerName::Asr => self.asr.as_ref(),
            PrayerName::Maghrib => self.maghrib.as_ref(),
            PrayerName::Isha => self.isha.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, prayer: PrayerName) -> Option<&mut PrayerSlot> {
        match prayer {
            PrayerName::Fajr => self.fajr.as_mut(),
            PrayerName::Dhuhr => self.dhuhr.as_mut(),
            PrayerName::Asr => self.asr.as_mut(),
            PrayerName::Maghrib => self.maghrib.as_mut(),
            PrayerName::Isha => self.isha.as_mut(),
        }
    }
}

/// One day of a monthly schedule as it arrives from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrayerDay {
    pub day: u32,
    pub times: DailyPrayerTimes,
}

/// A month of prayer times keyed by calendar day, never by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySchedule {
    pub month_key: String,
    pub days: BTreeMap<u32, DailyPrayerTimes>,
}

impl MonthlySchedule {
    /// Re-index days by their explicit `day` field, rejecting gaps that
    /// would otherwise shift every later lookup.
    pub fn from_days(month_key: impl Into<String>, days: Vec<PrayerDay>) -> Result<Self, ScheduleError> {
        let mut map = BTreeMap::new();
        for PrayerDay { day, times } in days {
            if !(1..=31).contains(&day) {
                return Err(ScheduleError::DayOutOfRange(day));
            }
            if map.insert(day, times).is_some() {
                return Err(ScheduleError::DuplicateDay(day));
            }
        }
        Ok(Self {
            month_key: month_key.into(),
            days: map,
        })
    }

    pub fn day(&self, day: u32) -> Option<&DailyPrayerTimes> {
        self.days.get(&day)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Overwrite the given days in place; days not present in `updates` stay.
    pub fn merge_days(&mut self, updates: Vec<PrayerDay>) {
        for PrayerDay { day, times } in updates {
            if (1..=31).contains(&day) {
                self.days.insert(day, times);
            } else {
                log::warn!("Ignoring prayer times for out-of-range day {}", day);
            }
        }
    }
}

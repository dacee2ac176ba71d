pub mod mosque;
pub mod notification;
pub mod prayer;

pub use mosque::{Announcement, CacheRecord, Event, Identified, MosqueInfo, merge_by_id};
pub use notification::{NotificationSettings, ScheduledNotification};
pub use prayer::{
    DailyPrayerTimes, JummahKey, JummahSlot, JummahTime, MonthlySchedule, NextPrayerState,
    PrayerDay, PrayerName, PrayerSlot,
};

pub mod scheduler;

pub use scheduler::{
    NOTIFICATION_PREFIX, NotificationScheduler, ReminderKind, ScheduleSummary, SchedulerState,
    load_settings, notification_id, save_settings,
};

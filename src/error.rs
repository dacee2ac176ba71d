use thiserror::Error;

/// A clock string that does not match `H:MM`, `HH:MM`, `H:MM AM|PM` or `+N`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("malformed time string '{0}'")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("day {0} is outside 1..=31")]
    DayOutOfRange(u32),
    #[error("day {0} appears more than once")]
    DuplicateDay(u32),
}

/// Failures surfaced by the cache sync engine.
///
/// Cloneable so every caller waiting on the same in-flight sync gets a copy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("could not load mosque {mosque_id} for the first time: {reason}")]
    FirstVisit { mosque_id: String, reason: String },
    #[error("cache storage failed: {0}")]
    Storage(String),
}

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};

use crate::error::TimeError;
use crate::models::{DailyPrayerTimes, JummahSlot, JummahTime, NextPrayerState, PrayerName};
use crate::prayer_times::time_codec::{self, MINUTES_PER_DAY};

#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    name: String,
    display_name: Option<String>,
    minutes: u32,
}

/// Iqama of a Jummah session in 24-hour form. The athan is a midday clock,
/// so a bare value is read the way dhuhr is.
pub fn jummah_iqama_24(slot: &JummahSlot) -> Result<String, TimeError> {
    let athan24 = time_codec::apply_iqama_offset(PrayerName::Dhuhr, "12:00", &slot.athan)?;
    time_codec::apply_iqama_offset(PrayerName::Dhuhr, &athan24, &slot.iqama)
}

fn candidates(
    times: &DailyPrayerTimes,
    jummah: Option<&JummahTime>,
    weekday: Weekday,
) -> Result<Vec<Candidate>, TimeError> {
    let mut list = Vec::with_capacity(7);
    for prayer in PrayerName::ALL {
        let Some(slot) = times.slot(prayer) else {
            continue;
        };
        if slot.iqama.trim().is_empty() {
            continue;
        }
        list.push(Candidate {
            name: prayer.as_str().to_string(),
            display_name: None,
            minutes: time_codec::minutes_since_midnight(&slot.iqama)?,
        });
    }

    let sessions = jummah.map(JummahTime::slots).unwrap_or_default();
    if weekday == Weekday::Fri && !sessions.is_empty() {
        list.retain(|c| c.name != PrayerName::Dhuhr.as_str());
        let single = sessions.len() == 1;
        for (key, slot) in sessions {
            let display = if single {
                "Jummah".to_string()
            } else {
                format!("Jummah {}", key.number())
            };
            list.push(Candidate {
                name: key.as_str().to_string(),
                display_name: Some(display),
                minutes: time_codec::minutes_since_midnight(&jummah_iqama_24(slot)?)?,
            });
        }
    }

    list.sort_by_key(|c| c.minutes);
    Ok(list)
}

/// Which prayer comes next at `now`, how long until it, and how far through
/// the current interval we are. Iqama values must already be 24-hour.
///
/// Returns `None` when no prayer carries an iqama time.
pub fn next_prayer(
    times: &DailyPrayerTimes,
    jummah: Option<&JummahTime>,
    now: NaiveDateTime,
) -> Result<Option<NextPrayerState>, TimeError> {
    let list = candidates(times, jummah, now.weekday())?;
    let (Some(first), Some(last)) = (list.first(), list.last()) else {
        return Ok(None);
    };

    let current_minutes = now.hour() * 60 + now.minute();

    let (next, current, minutes_to_next) =
        match list.iter().position(|c| c.minutes > current_minutes) {
            None => (
                first,
                last,
                (MINUTES_PER_DAY - current_minutes) + first.minutes,
            ),
            Some(idx) => {
                let current = if idx == 0 { last } else { &list[idx - 1] };
                (&list[idx], current, list[idx].minutes - current_minutes)
            }
        };

    Ok(Some(NextPrayerState {
        name: next.display_name.clone().unwrap_or_else(|| next.name.clone()),
        minutes_to_next_prayer: minutes_to_next,
        percent_elapsed: percent_elapsed(current.minutes, next.minutes, current_minutes),
    }))
}

/// Fraction of the `current -> next` interval that has passed, in `[0, 1]`.
/// An interval that collapses to zero spans the whole day.
pub fn percent_elapsed(current: u32, next: u32, now: u32) -> f64 {
    let day = MINUTES_PER_DAY as i64;
    let mut interval = next as i64 - current as i64;
    if interval <= 0 {
        interval += day;
    }
    let mut elapsed = now as i64 - current as i64;
    if elapsed < 0 {
        elapsed += day;
    }
    (elapsed as f64 / interval as f64).clamp(0.0, 1.0)
}

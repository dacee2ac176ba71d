use chrono::{Datelike, NaiveDate, NaiveDateTime};
use log::{debug, error, warn};

use crate::models::{DailyPrayerTimes, JummahTime, MonthlySchedule, PrayerName};
use crate::prayer_times::next_prayer::next_prayer;
use crate::prayer_times::time_codec::{
    apply_iqama_offset, iqama_clock_to_24, is_iqama_offset, to_12_hour, to_24_hour,
};
use crate::traits::AdhanLookup;

/// `"MM-YY"` for the month containing `date`.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%m-%y").to_string()
}

/// Inverse of [`month_key`]: `(year, month)`.
pub fn parse_month_key(key: &str) -> Option<(i32, u32)> {
    let (mm, yy) = key.split_once('-')?;
    let month: u32 = mm.parse().ok()?;
    let year: i32 = yy.parse().ok()?;
    if !(1..=12).contains(&month) || !(0..=99).contains(&year) {
        return None;
    }
    Some((2000 + year, month))
}

/// Today's raw entry from a cached month, flagged when that month is not
/// the current one.
pub fn today_times(schedule: &MonthlySchedule, today: NaiveDate) -> Option<DailyPrayerTimes> {
    let mut day = schedule.day(today.day())?.clone();
    if schedule.month_key != month_key(today) {
        day.warning = Some(format!(
            "Showing prayer times from {}; this month's schedule is not available yet",
            schedule.month_key
        ));
    }
    Some(day)
}

/// Resolve one day's stored iqama values against the adhan times for
/// `city` on `date`, then attach the next-prayer state.
///
/// Clock-string iqamas are resolved even when the lookup fails; only a
/// `+N` offset needs the adhan. A prayer that cannot be resolved keeps its
/// stored values and is left out of the next-prayer computation.
pub async fn format_day(
    raw: &DailyPrayerTimes,
    city: &str,
    date: NaiveDate,
    mosque_jummah: Option<&JummahTime>,
    lookup: &dyn AdhanLookup,
    now: NaiveDateTime,
) -> DailyPrayerTimes {
    let mut day = raw.clone();

    let adhan = match lookup.adhan_times(city, date).await {
        Ok(adhan) => Some(adhan),
        Err(e) => {
            error!("Adhan lookup for {} on {} failed: {:#}", city, date, e);
            None
        }
    };

    let mut unresolved = Vec::new();
    for prayer in PrayerName::ALL {
        let Some(slot) = day.slot_mut(prayer) else {
            continue;
        };
        if slot.iqama.trim().is_empty() {
            continue;
        }
        let adhan24 = match adhan.as_ref().and_then(|a| a.get(&prayer)) {
            Some(adhan_raw) => match to_24_hour(adhan_raw) {
                Ok(t) => Some(t),
                Err(e) => {
                    warn!("Bad adhan time for {} on {}: {}", prayer, date, e);
                    None
                }
            },
            None => {
                if adhan.is_some() {
                    warn!("No adhan time for {} in {} on {}", prayer, city, date);
                }
                None
            }
        };

        let resolved = match &adhan24 {
            Some(adhan24) => apply_iqama_offset(prayer, adhan24, &slot.iqama)
                .and_then(|iqama| Ok((Some(to_12_hour(adhan24)?), iqama))),
            None if is_iqama_offset(&slot.iqama) => {
                warn!("{} iqama '{}' on {} needs the adhan time", prayer, slot.iqama, date);
                unresolved.push(prayer);
                continue;
            }
            None => iqama_clock_to_24(prayer, &slot.iqama).map(|iqama| (None, iqama)),
        };
        match resolved {
            Ok((adhan12, iqama24)) => {
                if let Some(adhan12) = adhan12 {
                    slot.adhan = adhan12;
                }
                slot.iqama = iqama24;
            }
            Err(e) => {
                warn!("Leaving {} on {} unformatted: {}", prayer, date, e);
                unresolved.push(prayer);
            }
        }
    }
    day.normalized = true;

    let jummah = if day.jummah.is_empty() {
        mosque_jummah
    } else {
        Some(&day.jummah)
    };
    let mut resolved_only = day.clone();
    for prayer in unresolved {
        if let Some(slot) = resolved_only.slot_mut(prayer) {
            slot.iqama.clear();
        }
    }
    let at = date.and_time(now.time());
    match next_prayer(&resolved_only, jummah, at) {
        Ok(state) => day.next_prayer = state,
        Err(e) => warn!("Cannot compute next prayer for {}: {}", date, e),
    }
    day
}

/// Format every day of a month; days that are not real calendar dates
/// are kept as stored.
pub async fn format_month(
    schedule: &MonthlySchedule,
    city: &str,
    mosque_jummah: Option<&JummahTime>,
    lookup: &dyn AdhanLookup,
    now: NaiveDateTime,
) -> MonthlySchedule {
    let Some((year, month)) = parse_month_key(&schedule.month_key) else {
        error!("Unreadable month key '{}'", schedule.month_key);
        return schedule.clone();
    };

    let mut formatted = MonthlySchedule {
        month_key: schedule.month_key.clone(),
        days: Default::default(),
    };
    for (day, times) in &schedule.days {
        let entry = match NaiveDate::from_ymd_opt(year, month, *day) {
            Some(date) => format_day(times, city, date, mosque_jummah, lookup, now).await,
            None => {
                debug!("Day {} does not exist in {}", day, schedule.month_key);
                times.clone()
            }
        };
        formatted.days.insert(*day, entry);
    }
    formatted
}

//! Conversions between the clock-string forms prayer times arrive in.
//!
//! Three shapes are accepted: 24-hour `HH:MM`, 12-hour `H:MM AM|PM` (the
//! suffix is optional, case-insensitive, space optional) and the iqama
//! offset form `+N` meaning N minutes after adhan. Every malformed input is
//! a [`TimeError::Malformed`]; nothing silently becomes midnight.

use crate::error::TimeError;
use crate::models::PrayerName;

pub const MINUTES_PER_DAY: u32 = 1440;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockParts {
    pub hour: u32,
    pub minute: u32,
    pub meridiem: Option<Meridiem>,
}

fn malformed(s: &str) -> TimeError {
    TimeError::Malformed(s.to_string())
}

fn digits(s: &str, max_len: usize) -> Option<u32> {
    if s.is_empty() || s.len() > max_len || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Split a clock string into hour, minute and optional AM/PM without
/// interpreting the hour.
pub fn parse_clock(s: &str) -> Result<ClockParts, TimeError> {
    let trimmed = s.trim();
    let upper = trimmed.to_ascii_uppercase();
    let (body, meridiem) = if let Some(rest) = upper.strip_suffix("AM") {
        (rest.trim_end(), Some(Meridiem::Am))
    } else if let Some(rest) = upper.strip_suffix("PM") {
        (rest.trim_end(), Some(Meridiem::Pm))
    } else {
        (upper.as_str(), None)
    };

    let (h, m) = body.split_once(':').ok_or_else(|| malformed(s))?;
    let hour = digits(h, 2).ok_or_else(|| malformed(s))?;
    if m.len() != 2 {
        return Err(malformed(s));
    }
    let minute = digits(m, 2).ok_or_else(|| malformed(s))?;
    if minute > 59 {
        return Err(malformed(s));
    }
    match meridiem {
        Some(_) if !(1..=12).contains(&hour) => Err(malformed(s)),
        None if hour > 23 => Err(malformed(s)),
        _ => Ok(ClockParts {
            hour,
            minute,
            meridiem,
        }),
    }
}

fn parse_24(s: &str) -> Result<(u32, u32), TimeError> {
    let parts = parse_clock(s)?;
    if parts.meridiem.is_some() {
        return Err(malformed(s));
    }
    Ok((parts.hour, parts.minute))
}

pub fn format_minutes(minutes: u32) -> String {
    let m = minutes % MINUTES_PER_DAY;
    format!("{:02}:{:02}", m / 60, m % 60)
}

pub fn minutes_since_midnight(time24: &str) -> Result<u32, TimeError> {
    let (h, m) = parse_24(time24)?;
    Ok(h * 60 + m)
}

/// `"13:05"` -> `"1:05"`, `"00:30"` -> `"12:30"`. No suffix is produced.
pub fn to_12_hour(time24: &str) -> Result<String, TimeError> {
    let (h, m) = parse_24(time24)?;
    let h12 = match h % 12 {
        0 => 12,
        h => h,
    };
    Ok(format!("{}:{:02}", h12, m))
}

/// `"1:05 PM"` -> `"13:05"`. Without a suffix the input is already 24-hour
/// and is only validated and zero-padded.
pub fn to_24_hour(time12: &str) -> Result<String, TimeError> {
    let parts = parse_clock(time12)?;
    let hour = match parts.meridiem {
        Some(Meridiem::Am) => parts.hour % 12,
        Some(Meridiem::Pm) => parts.hour % 12 + 12,
        None => parts.hour,
    };
    Ok(format!("{:02}:{:02}", hour, parts.minute))
}

/// Add (or subtract) minutes, wrapping around midnight in both directions.
pub fn add_minutes(time24: &str, delta: i32) -> Result<String, TimeError> {
    let base = minutes_since_midnight(time24)? as i64;
    let wrapped = (base + delta as i64).rem_euclid(MINUTES_PER_DAY as i64);
    Ok(format_minutes(wrapped as u32))
}

/// The suffix a 24-hour time carries when shown on a 12-hour clock.
pub fn inferred_suffix(time24: &str) -> Result<&'static str, TimeError> {
    let (h, _) = parse_24(time24)?;
    Ok(if h < 12 { "AM" } else { "PM" })
}

/// Whether a stored iqama is the `+N` form, which needs the day's adhan.
pub fn is_iqama_offset(iqama_raw: &str) -> bool {
    iqama_raw.trim().starts_with('+')
}

/// A clock-string iqama in 24-hour form. A suffix is taken at its word. A
/// bare value is AM for fajr and PM otherwise, unless its hour (0 or 13-23)
/// can only be 24-hour, in which case it is kept.
pub fn iqama_clock_to_24(prayer: PrayerName, iqama_raw: &str) -> Result<String, TimeError> {
    let raw = iqama_raw.trim();
    let parts = parse_clock(raw)?;
    if parts.meridiem.is_some() || parts.hour == 0 || parts.hour >= 13 {
        return to_24_hour(raw);
    }
    let suffix = match prayer {
        PrayerName::Fajr => "AM",
        _ => "PM",
    };
    to_24_hour(&format!("{} {}", raw, suffix))
}

/// Resolve a stored iqama value against the day's adhan: `+N` is N minutes
/// after `adhan24`, anything else goes through [`iqama_clock_to_24`].
pub fn apply_iqama_offset(
    prayer: PrayerName,
    adhan24: &str,
    iqama_raw: &str,
) -> Result<String, TimeError> {
    let raw = iqama_raw.trim();
    if let Some(offset) = raw.strip_prefix('+') {
        let minutes = digits(offset.trim(), 4).ok_or_else(|| malformed(iqama_raw))?;
        return add_minutes(adhan24, minutes as i32);
    }
    iqama_clock_to_24(prayer, raw)
}

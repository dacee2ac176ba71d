use crate::models::{DailyPrayerTimes, PrayerName};
use crate::prayer_times::time_codec::{inferred_suffix, to_12_hour};

/// Format a duration in minutes to "Xh Ym" or "Ym" string
pub fn format_duration_mins(mins: u32) -> String {
    if mins == 0 {
        return "now".to_string();
    }
    let hours = mins / 60;
    let minutes = mins % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Create a simple ASCII progress bar for a ratio in [0, 1]
pub fn progress_bar(ratio: f64, width: usize) -> String {
    let ratio = ratio.clamp(0.0, 1.0);
    let filled_count = (ratio * width as f64).round() as usize;
    let empty_count = width.saturating_sub(filled_count);
    format!("{}{}", "█".repeat(filled_count), "░".repeat(empty_count))
}

/// `"16:36"` -> `"4:36 PM"`; anything that is not a 24-hour time is shown as is
pub fn clock_label(time24: &str) -> String {
    match (to_12_hour(time24), inferred_suffix(time24)) {
        (Ok(t), Ok(suffix)) => format!("{} {}", t, suffix),
        _ => time24.to_string(),
    }
}

/// One `(label, adhan, iqama)` row per prayer present in the day
pub fn prayer_rows(times: &DailyPrayerTimes) -> Vec<(String, String, String)> {
    let mut rows: Vec<_> = PrayerName::ALL
        .iter()
        .filter_map(|p| {
            times
                .slot(*p)
                .map(|s| (p.display_name().to_string(), s.adhan.clone(), clock_label(&s.iqama)))
        })
        .collect();
    for (key, slot) in times.jummah.slots() {
        rows.push((format!("Jummah {}", key.number()), slot.athan.clone(), clock_label(&slot.iqama)));
    }
    rows
}

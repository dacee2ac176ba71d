use anyhow::{Context, Result, anyhow};
use std::str::FromStr;

use crate::app::AppContext;
use crate::cli::args::NotifyCommands;
use crate::db::SqliteNotifier;
use crate::models::{DailyPrayerTimes, JummahKey, NotificationSettings, PrayerName};
use crate::notifications::{SchedulerState, ScheduleSummary};
use crate::traits::LocalNotifier;
use crate::utils::format::{format_duration_mins, prayer_rows, progress_bar};

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;2;196;160;68m";

fn print_day(title: &str, times: &DailyPrayerTimes) {
    println!();
    println_colored!(GOLD, "  {}", title);
    if let Some(warning) = &times.warning {
        println_colored!(AMBER, "  ! {}", warning);
    }
    println!();
    println_colored!(DIM, "  {:<10}  {:>7}  {:>7}", "", "Adhan", "Iqama");
    for (name, adhan, iqama) in prayer_rows(times) {
        println_colored!(BOLD, "  {:<10}  {:>7}  {:>7}", name, adhan, iqama);
    }
}

fn print_summary(summary: &ScheduleSummary) {
    println_colored!(
        GREEN,
        "  ✓ {} reminders scheduled, {} cancelled",
        summary.scheduled,
        summary.cancelled
    );
    if summary.skipped_past > 0 || summary.failed > 0 {
        println_colored!(
            DIM,
            "  {} already past, {} failed",
            summary.skipped_past,
            summary.failed
        );
    }
}

// ─── Sync ────────────────────────────────────────────────────────────────────

pub async fn handle_sync(ctx: &AppContext, mosque_id: &str) -> Result<()> {
    let record = ctx.sync(mosque_id).await?;
    println!();
    println_colored!(GREEN, "  ✓ {} is up to date", record.info.name);
    println!(
        "  {} events, {} announcements, {} days of prayer times ({})",
        record.events.len(),
        record.announcements.len(),
        record.prayer_times.days.len(),
        record.prayer_times.month_key
    );
    if ctx.dev_mode() {
        println_colored!(
            DIM,
            "  last_event={:?} last_announcement={:?} last_prayer={:?}",
            record.info.last_event,
            record.info.last_announcement,
            record.info.last_prayer
        );
    }
    println!();
    Ok(())
}

// ─── Times ───────────────────────────────────────────────────────────────────

pub async fn handle_times(ctx: &AppContext, mosque_id: &str) -> Result<()> {
    let today = ctx.clock().now_local().date().format("%Y-%m-%d").to_string();
    let Some(times) = ctx.today(mosque_id).await? else {
        println_colored!(AMBER, "  No prayer times cached for today");
        return Ok(());
    };

    print_day(&format!("Prayer Times ({})", today), &times);

    if let Some(next) = &times.next_prayer {
        println!();
        println_colored!(
            AMBER,
            "  Next: {} in {}",
            next.name,
            format_duration_mins(next.minutes_to_next_prayer)
        );
        println_colored!(DIM, "  {}", progress_bar(next.percent_elapsed, 30));
    }
    println!();
    Ok(())
}

pub async fn handle_month(ctx: &AppContext, mosque_id: &str) -> Result<()> {
    let month = ctx.month(mosque_id).await?;
    if month.is_empty() {
        println_colored!(AMBER, "  No monthly schedule cached");
        return Ok(());
    }
    for (day, times) in &month.days {
        print_day(&format!("Day {} ({})", day, month.month_key), times);
    }
    println!();
    Ok(())
}

pub async fn handle_resume(ctx: &AppContext, mosque_id: &str) -> Result<()> {
    let outcome = ctx.on_app_resumed(mosque_id).await?;
    match outcome.today.as_ref().and_then(|t| t.next_prayer.as_ref()) {
        Some(next) => println_colored!(
            AMBER,
            "  Next: {} in {}",
            next.name,
            format_duration_mins(next.minutes_to_next_prayer)
        ),
        None => println_colored!(DIM, "  No prayer times for today"),
    }
    print_summary(&outcome.notifications);
    Ok(())
}

// ─── Notifications ───────────────────────────────────────────────────────────

fn parse_switch<K>(raw: &str) -> Result<(K, bool)>
where
    K: FromStr<Err = anyhow::Error>,
{
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected NAME=on|off, got '{}'", raw))?;
    let on = match value.to_lowercase().as_str() {
        "on" | "true" | "1" => true,
        "off" | "false" | "0" => false,
        _ => return Err(anyhow!("Expected on or off in '{}'", raw)),
    };
    Ok((K::from_str(name)?, on))
}

pub fn apply_settings_changes(
    mut settings: NotificationSettings,
    enable: bool,
    disable: bool,
    prayers: &[String],
    jummah: &[String],
) -> Result<NotificationSettings> {
    if enable {
        settings.enabled = true;
    }
    if disable {
        settings.enabled = false;
    }
    for raw in prayers {
        let (prayer, on) = parse_switch::<PrayerName>(raw)?;
        settings.prayers.insert(prayer, on);
    }
    for raw in jummah {
        let (key, on) = parse_switch::<JummahKey>(raw)?;
        settings.jummah.insert(key, on);
    }
    Ok(settings)
}

pub async fn handle_notify(
    ctx: &AppContext,
    notifier: &SqliteNotifier,
    mosque_id: &str,
    action: &NotifyCommands,
) -> Result<()> {
    match action {
        NotifyCommands::Settings {
            enable,
            disable,
            prayer,
            jummah,
        } => {
            let current = ctx.notification_settings().await;
            let changed = *enable || *disable || !prayer.is_empty() || !jummah.is_empty();
            if changed {
                let updated = apply_settings_changes(current, *enable, *disable, prayer, jummah)?;
                let summary = ctx.set_notification_settings(mosque_id, &updated).await?;
                print_summary(&summary);
            } else {
                println!();
                println_colored!(GOLD, "  Reminders {}", if current.enabled { "on" } else { "off" });
                for (prayer, on) in &current.prayers {
                    println!("  {:<10} {}", prayer.display_name(), if *on { "on" } else { "off" });
                }
                for (key, on) in &current.jummah {
                    println!("  Jummah {:<3} {}", key.number(), if *on { "on" } else { "off" });
                }
                println!();
            }
        }
        NotifyCommands::Schedule => {
            let summary = ctx.reschedule_notifications(mosque_id).await?;
            print_summary(&summary);
        }
        NotifyCommands::Cancel => {
            let (cancelled, failed) = ctx.scheduler().cancel().await;
            println_colored!(GREEN, "  ✓ {} reminders cancelled ({} failed)", cancelled, failed);
        }
        NotifyCommands::List => {
            let state = ctx.scheduler().state(mosque_id).await?;
            let scheduled = notifier.list_scheduled().await?;
            println!();
            println_colored!(
                GOLD,
                "  {} reminders ({})",
                scheduled.len(),
                match state {
                    SchedulerState::Scheduled => "scheduled for this mosque",
                    SchedulerState::Unscheduled => "none for this mosque",
                }
            );
            for n in &scheduled {
                println!("  {}  {}", n.fire_at.format("%d %b %H:%M"), n.title);
                println_colored!(DIM, "    {}", n.identifier);
            }
            println!();
        }
        NotifyCommands::Deliver => {
            let due = notifier
                .take_due(ctx.clock().now_local())
                .context("Reading due reminders")?;
            for n in &due {
                println_colored!(AMBER, "  🔔 {}", n.title);
                println!("     {}", n.body);
            }
            if due.is_empty() {
                println_colored!(DIM, "  Nothing due");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_settings_changes() {
        let settings = apply_settings_changes(
            NotificationSettings::default(),
            true,
            false,
            &["fajr=off".to_string(), "zuhr=on".to_string()],
            &["2=off".to_string()],
        )
        .unwrap();
        assert!(settings.enabled);
        assert!(!settings.prayer_enabled(PrayerName::Fajr));
        assert!(settings.prayer_enabled(PrayerName::Dhuhr));
        assert!(!settings.jummah_enabled(JummahKey::Jummah2));
        assert!(settings.jummah_enabled(JummahKey::Jummah1));
    }

    #[test]
    fn test_bad_switches_are_rejected() {
        let base = NotificationSettings::default();
        assert!(apply_settings_changes(base.clone(), false, false, &["fajr".to_string()], &[]).is_err());
        assert!(apply_settings_changes(base.clone(), false, false, &["fajr=maybe".to_string()], &[]).is_err());
        assert!(apply_settings_changes(base, false, false, &[], &["4=on".to_string()]).is_err());
    }
}

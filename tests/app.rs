//! End-to-end tests through `AppContext`, over both the in-memory
//! collaborators and the SQLite-backed store and notifier.

mod common;

use std::sync::Arc;

use common::{FixedAdhan, MOSQUE_ID, MockRemote, harness, local, month_days, mosque_info};
use masjid_sync::cli::args::NotifyCommands;
use masjid_sync::cli::handlers::handle_notify;
use masjid_sync::db::repository::open_in_memory;
use masjid_sync::db::{SqliteNotifier, SqliteStore};
use masjid_sync::{
    AppContext, CacheRecord, Collaborators, LocalNotifier, MockClock, NotificationSettings,
};

fn enabled() -> NotificationSettings {
    NotificationSettings {
        enabled: true,
        ..Default::default()
    }
}

/// Opening a mosque syncs it and returns today's formatted times.
#[tokio::test]
async fn test_open_mosque_formats_today() {
    let h = harness(local(10, 21, 14, 0));

    let (record, today) = h.ctx.open_mosque(MOSQUE_ID).await.unwrap();
    let today = today.unwrap();

    assert_eq!(record.prayer_times.month_key, "10-26");
    assert_eq!(today.asr.as_ref().unwrap().iqama, "16:36");
    assert_eq!(today.asr.as_ref().unwrap().adhan, "4:21");
    assert!(today.warning.is_none());

    let next = today.next_prayer.unwrap();
    assert_eq!(next.name, "asr");
    assert_eq!(next.minutes_to_next_prayer, 156);
    assert!((next.percent_elapsed - 30.0 / 186.0).abs() < 1e-9);
}

/// Reading today's times from a month that has ended carries a warning.
#[tokio::test]
async fn test_today_from_previous_month_warns() {
    let h = harness(local(10, 30, 22, 0));
    h.ctx.sync(MOSQUE_ID).await.unwrap();

    h.clock.set_time(local(11, 2, 9, 0));
    let today = h.ctx.today(MOSQUE_ID).await.unwrap().unwrap();

    assert!(today.warning.unwrap().contains("10-26"));
}

/// The whole month comes back formatted.
#[tokio::test]
async fn test_month_is_formatted() {
    let h = harness(local(10, 21, 14, 0));

    let month = h.ctx.month(MOSQUE_ID).await.unwrap();

    assert_eq!(month.days.len(), 31);
    assert!(
        month
            .days
            .values()
            .all(|d| d.maghrib.as_ref().unwrap().iqama == "19:07")
    );
}

/// Resuming re-checks the backend, recomputes the countdown and rebuilds
/// reminders.
#[tokio::test]
async fn test_on_app_resumed() {
    let h = harness(local(10, 21, 14, 0));
    h.ctx
        .set_notification_settings(MOSQUE_ID, &enabled())
        .await
        .unwrap();
    let scheduled = h.notifier.identifiers().len();

    h.clock.set_time(local(10, 21, 17, 0));
    let outcome = h.ctx.on_app_resumed(MOSQUE_ID).await.unwrap();

    assert_eq!(h.remote.calls("mosque").len(), 2);
    assert_eq!(outcome.record.info.id, MOSQUE_ID);
    assert_eq!(outcome.today.unwrap().next_prayer.unwrap().name, "maghrib");
    // asr 15min and asr iqama have passed since the first run
    assert_eq!(outcome.notifications.scheduled, scheduled - 2);
    assert_eq!(outcome.notifications.cancelled, scheduled);
}

/// The same flow over SQLite: the cache and the reminder queue are rows,
/// and due reminders are handed out once.
#[tokio::test]
async fn test_sqlite_backed_context() {
    let conn = open_in_memory().unwrap();
    let remote = MockRemote::new(mosque_info());
    remote.set_month("10-26", month_days(1..=31));
    let store = SqliteStore::new(conn.clone());
    let notifier = Arc::new(SqliteNotifier::new(conn));
    let ctx = AppContext::new(
        Collaborators {
            remote: Arc::new(remote),
            adhan: Arc::new(FixedAdhan),
            store: Arc::new(store.clone()),
            notifier: notifier.clone(),
            clock: Arc::new(MockClock::new(local(10, 21, 14, 0))),
        },
        false,
    );

    let summary = ctx
        .set_notification_settings(MOSQUE_ID, &enabled())
        .await
        .unwrap();
    assert!(summary.scheduled > 0);
    assert!(
        store
            .get_sync(&CacheRecord::storage_key(MOSQUE_ID))
            .unwrap()
            .is_some()
    );

    let due = notifier.take_due(local(10, 21, 16, 30)).unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].identifier, "prayer-m1-21-asr-15min");
    assert!(notifier.take_due(local(10, 21, 16, 30)).unwrap().is_empty());

    let remaining = notifier.list_scheduled().await.unwrap();
    assert_eq!(remaining.len(), summary.scheduled - 1);
}

/// Delivering due reminders from the command line reads the context's
/// clock, not the wall clock.
#[tokio::test]
async fn test_deliver_uses_context_clock() {
    let conn = open_in_memory().unwrap();
    let remote = MockRemote::new(mosque_info());
    remote.set_month("10-26", month_days(1..=31));
    let notifier = Arc::new(SqliteNotifier::new(conn.clone()));
    let clock = MockClock::new(local(10, 21, 14, 0));
    let ctx = AppContext::new(
        Collaborators {
            remote: Arc::new(remote),
            adhan: Arc::new(FixedAdhan),
            store: Arc::new(SqliteStore::new(conn)),
            notifier: notifier.clone(),
            clock: Arc::new(clock.clone()),
        },
        false,
    );
    let summary = ctx
        .set_notification_settings(MOSQUE_ID, &enabled())
        .await
        .unwrap();

    handle_notify(&ctx, &notifier, MOSQUE_ID, &NotifyCommands::Deliver)
        .await
        .unwrap();
    assert_eq!(notifier.list_scheduled().await.unwrap().len(), summary.scheduled);

    clock.set_time(local(10, 21, 16, 30));
    handle_notify(&ctx, &notifier, MOSQUE_ID, &NotifyCommands::Deliver)
        .await
        .unwrap();
    let remaining = notifier.list_scheduled().await.unwrap();
    assert_eq!(remaining.len(), summary.scheduled - 1);
    assert!(
        remaining
            .iter()
            .all(|n| n.identifier != "prayer-m1-21-asr-15min")
    );
}

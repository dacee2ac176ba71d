//! Integration tests for the HTTP backend client.
//!
//! These tests use wiremock to stand in for the mosque backend and check
//! request paths, the incremental `since` filter and error handling.

use chrono::{TimeZone, Utc};
use masjid_sync::config::RemoteConfig;
use masjid_sync::{HttpRemoteSource, PrayerName, RemoteSource};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn client(server: &MockServer) -> HttpRemoteSource {
    let config = RemoteConfig {
        base_url: format!("{}/", server.uri()),
        request_timeout_secs: 5,
        connect_timeout_secs: 2,
    };
    HttpRemoteSource::new(&config).expect("Client creation should succeed")
}

/// Mosque info parses, including Jummah sessions and push stamps.
#[tokio::test]
async fn test_fetch_mosque() {
    let server = MockServer::start().await;
    let body = r#"{
        "id": "m1",
        "name": "Masjid Al-Noor",
        "city": "Austin",
        "jummah": { "jummah1": { "athan": "1:15", "iqama": "1:45" } },
        "last_event": "2026-10-20T12:00:00Z",
        "last_announcement": null
    }"#;

    Mock::given(method("GET"))
        .and(path("/mosques/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let info = client(&server).fetch_mosque("m1").await.unwrap();

    assert_eq!(info.name, "Masjid Al-Noor");
    assert_eq!(info.jummah.slots().len(), 1);
    assert_eq!(
        info.last_event,
        Some(Utc.with_ymd_and_hms(2026, 10, 20, 12, 0, 0).unwrap())
    );
    assert_eq!(info.last_announcement, None);
    assert_eq!(info.last_prayer, None);
}

/// Incremental event fetches carry `since` as RFC 3339.
#[tokio::test]
async fn test_fetch_events_since() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/mosques/m1/events"))
        .and(query_param("since", "2026-10-01T08:00:00Z"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"[{ "id": "e1", "title": "Halaqa" }]"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let since = Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap();
    let events = client(&server).fetch_events("m1", Some(since)).await.unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "e1");
    assert_eq!(events[0].description, None);
}

/// Prayer times are requested per month and keep the explicit day number.
#[tokio::test]
async fn test_fetch_prayer_times_for_month() {
    let server = MockServer::start().await;
    let body = r#"[
        { "day": 2, "times": { "fajr": { "iqama": "5:40" }, "asr": { "adhan": "", "iqama": "+15" } } },
        { "day": 5, "times": { "isha": { "iqama": "8:45" }, "jummah1": { "athan": "1:15", "iqama": "1:45" } } }
    ]"#;

    Mock::given(method("GET"))
        .and(path("/mosques/m1/prayer-times"))
        .and(query_param("month", "10-26"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let days = client(&server)
        .fetch_prayer_times("m1", "10-26", None)
        .await
        .unwrap();

    assert_eq!(days.len(), 2);
    assert_eq!(days[0].day, 2);
    assert_eq!(days[0].times.slot(PrayerName::Asr).unwrap().iqama, "+15");
    assert_eq!(days[1].day, 5);
    assert!(days[1].times.jummah.jummah1.is_some());
}

/// Non-2xx responses are errors.
#[tokio::test]
async fn test_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/mosques/m1/announcements"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client(&server).fetch_announcements("m1", None).await;

    assert!(result.is_err(), "500 should be an error");
    assert!(format!("{:#}", result.unwrap_err()).contains("500"));
}

/// Bodies that are not the expected JSON are errors.
#[tokio::test]
async fn test_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/mosques/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    assert!(client(&server).fetch_mosque("m1").await.is_err());
}

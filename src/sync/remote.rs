use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;

use crate::config::RemoteConfig;
use crate::models::{Announcement, Event, MosqueInfo, PrayerDay};
use crate::traits::RemoteSource;

/// JSON-over-HTTP client for the mosque backend.
#[derive(Clone, Debug)]
pub struct HttpRemoteSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteSource {
    /// Create a new client with configurable timeouts.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, mosque_id: &str, resource: Option<&str>) -> String {
        match resource {
            Some(resource) => format!("{}/mosques/{}/{}", self.base_url, mosque_id, resource),
            None => format!("{}/mosques/{}", self.base_url, mosque_id),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("{} returned error status: {}", url, status);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }
}

fn since_query(since: Option<DateTime<Utc>>) -> Vec<(&'static str, String)> {
    since
        .map(|t| vec![("since", t.to_rfc3339_opts(SecondsFormat::Secs, true))])
        .unwrap_or_default()
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn fetch_mosque(&self, mosque_id: &str) -> Result<MosqueInfo> {
        self.get_json(&self.url(mosque_id, None), &[]).await
    }

    async fn fetch_events(&self, mosque_id: &str, since: Option<DateTime<Utc>>) -> Result<Vec<Event>> {
        self.get_json(&self.url(mosque_id, Some("events")), &since_query(since))
            .await
    }

    async fn fetch_announcements(
        &self,
        mosque_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Announcement>> {
        self.get_json(&self.url(mosque_id, Some("announcements")), &since_query(since))
            .await
    }

    async fn fetch_prayer_times(
        &self,
        mosque_id: &str,
        month_key: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PrayerDay>> {
        let mut query = vec![("month", month_key.to_string())];
        query.extend(since_query(since));
        self.get_json(&self.url(mosque_id, Some("prayer-times")), &query)
            .await
    }
}

//! HTTP client for the central check-in store.

use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use turnstile_core::events::{Event, EventAttendee};
use turnstile_core::people::Person;
use turnstile_core::sync::{ScanRecord, SyncRequest, SyncResponse};

use crate::error::{DeviceSyncError, Result};
use crate::types::{ApiErrorResponse, EventAttendeeRow, EventRow, PersonRow};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Client for the central store REST API.
#[derive(Debug, Clone)]
pub struct SyncApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl SyncApiClient {
    /// Create a new API client.
    ///
    /// `base_url` is the root of the central API (e.g. "https://checkin.example.com/api").
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            // Try to extract the structured error body
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(DeviceSyncError::api(status.as_u16(), error.error));
            }
            return Err(DeviceSyncError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!(
                "Failed to deserialize response. Body: {}, Error: {}",
                body,
                e
            );
            DeviceSyncError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    /// Fetch the full people seed.
    ///
    /// GET /people
    pub async fn get_people(&self) -> Result<Vec<Person>> {
        let url = format!("{}/people", self.base_url);
        let response = self.client.get(&url).headers(Self::headers()).send().await?;
        let rows: Vec<PersonRow> = Self::parse_response(response).await?;
        Ok(rows.into_iter().map(Person::from).collect())
    }

    /// Fetch the full events seed.
    ///
    /// GET /events
    pub async fn get_events(&self) -> Result<Vec<Event>> {
        let url = format!("{}/events", self.base_url);
        let response = self.client.get(&url).headers(Self::headers()).send().await?;
        let rows: Vec<EventRow> = Self::parse_response(response).await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    /// Fetch the full guest-list seed.
    ///
    /// GET /event_attendees
    pub async fn get_event_attendees(&self) -> Result<Vec<EventAttendee>> {
        let url = format!("{}/event_attendees", self.base_url);
        let response = self.client.get(&url).headers(Self::headers()).send().await?;
        let rows: Vec<EventAttendeeRow> = Self::parse_response(response).await?;
        Ok(rows.into_iter().map(EventAttendee::from).collect())
    }

    /// Upload one scan, best effort. Superseded by [`Self::post_sync`] but
    /// kept for servers that only expose the single-scan endpoint.
    ///
    /// POST /scans
    pub async fn post_scan(&self, record: ScanRecord) -> Result<ScanRecord> {
        let url = format!("{}/scans", self.base_url);
        debug!("Pushing single scan {}", record.id);

        let response = self
            .client
            .post(&url)
            .headers(Self::headers())
            .json(&record)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Batch sync: push the backlog and receive the delta past `last_sync`.
    ///
    /// POST /scans/sync
    pub async fn post_sync(&self, request: SyncRequest) -> Result<SyncResponse> {
        let url = format!("{}/scans/sync", self.base_url);
        debug!(
            "Syncing {} scans for event {} since {}",
            request.scans.len(),
            request.event_id,
            request.last_sync
        );

        let response = self
            .client
            .post(&url)
            .headers(Self::headers())
            .json(&request)
            .send()
            .await?;

        Self::parse_response(response).await
    }
}

#[async_trait::async_trait]
impl turnstile_core::sync::SyncTransport for SyncApiClient {
    async fn sync_scans(&self, request: SyncRequest) -> turnstile_core::Result<SyncResponse> {
        self.post_sync(request).await.map_err(Into::into)
    }
}

#[async_trait::async_trait]
impl turnstile_core::sync::SeedSource for SyncApiClient {
    async fn fetch_people(&self) -> turnstile_core::Result<Vec<Person>> {
        self.get_people().await.map_err(Into::into)
    }

    async fn fetch_events(&self) -> turnstile_core::Result<Vec<Event>> {
        self.get_events().await.map_err(Into::into)
    }

    async fn fetch_event_attendees(&self) -> turnstile_core::Result<Vec<EventAttendee>> {
        self.get_event_attendees().await.map_err(Into::into)
    }
}

//! Hourly balloon position feed client.
//!
//! The feed publishes one snapshot per hour for the last 24 hours at
//! `{base}/00.json` (newest) through `{base}/23.json` (oldest). Each snapshot
//! is a JSON array of `[lat, lon, altitude, ...]` tuples. Snapshots are often
//! partially corrupted, so every entry is validated and bad ones are dropped.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::BalloonPosition;

/// Number of hourly snapshots published by the feed.
pub const SNAPSHOT_HOURS: u32 = 24;

/// Per-snapshot request timeout.
const SNAPSHOT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Minimum tuple length: lat, lon, altitude.
const MIN_ENTRY_LEN: usize = 3;

/// Client for the hourly position snapshots.
#[derive(Debug, Clone)]
pub struct TreasureClient {
    client: reqwest::Client,
    base_url: String,
    timeout: std::time::Duration,
}

impl TreasureClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: SNAPSHOT_TIMEOUT,
        }
    }

    /// Override the per-snapshot timeout.
    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn snapshot_url(&self, hour: u32) -> String {
        format!("{}/{:02}.json", self.base_url, hour)
    }

    /// Fetch the raw entries of one hourly snapshot.
    ///
    /// A non-2xx status, transport error, timeout, or a body that is not a
    /// JSON array is an error; the entries themselves are not validated here.
    /// A number outside the f64 range (e.g. `1e400`) fails the JSON decode,
    /// so it drops the whole hour rather than only its entry.
    pub async fn fetch_snapshot(&self, hour: u32) -> Result<Vec<Value>, AppError> {
        let response = self
            .client
            .get(self.snapshot_url(hour))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("snapshot {:02} request failed: {}", hour, e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "snapshot {:02} returned HTTP {}",
                hour,
                response.status()
            )));
        }

        response.json::<Vec<Value>>().await.map_err(|e| {
            AppError::ExternalServiceError(format!("snapshot {:02} JSON parse error: {}", hour, e))
        })
    }

    /// Fetch all 24 snapshots one after another and merge their valid
    /// positions in ascending hour order.
    ///
    /// A failing hour contributes nothing and never aborts the remaining
    /// hours. An empty result means no data was available at all; callers
    /// must check for it explicitly.
    pub async fn fetch_all_positions(&self) -> Vec<BalloonPosition> {
        let now = Utc::now();
        let mut positions = Vec::new();

        for hour in 0..SNAPSHOT_HOURS {
            let entries = match self.fetch_snapshot(hour).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Skipping hour {}: {}", hour, e);
                    continue;
                }
            };

            let (valid, dropped) = parse_snapshot(hour, &entries, now);
            if dropped > 0 {
                tracing::warn!(
                    "Hour {}: dropped {} of {} invalid entries",
                    hour,
                    dropped,
                    entries.len()
                );
            }
            positions.extend(valid);
        }

        tracing::info!("Fetched {} valid balloon positions", positions.len());
        positions
    }
}

/// Validate the raw entries of one snapshot.
///
/// Returns the valid positions (ids keep the entry's index in the raw
/// snapshot, so gaps appear where entries were dropped) and the number of
/// dropped entries. This is a pure function: no I/O.
pub fn parse_snapshot(
    hour: u32,
    entries: &[Value],
    now: DateTime<Utc>,
) -> (Vec<BalloonPosition>, usize) {
    let timestamp = now - Duration::hours(i64::from(hour));
    let mut positions = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        if let Some((lat, lon, altitude)) = parse_entry(entry) {
            positions.push(BalloonPosition {
                id: format!("{}-{}", hour, index),
                lat,
                lon,
                altitude,
                timestamp,
                hour,
            });
        }
    }

    let dropped = entries.len() - positions.len();
    (positions, dropped)
}

/// Extract `(lat, lon, altitude)` from a raw tuple, or `None` if the tuple
/// is too short, has a non-numeric or NaN component, or is out of range.
/// Trailing elements beyond the third are ignored.
fn parse_entry(entry: &Value) -> Option<(f64, f64, f64)> {
    let items = entry.as_array()?;
    if items.len() < MIN_ENTRY_LEN {
        return None;
    }

    let lat = number(&items[0])?;
    let lon = number(&items[1])?;
    let altitude = number(&items[2])?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }

    Some((lat, lon, altitude))
}

fn number(v: &Value) -> Option<f64> {
    v.as_f64().filter(|n| !n.is_nan())
}

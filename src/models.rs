use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A single validated balloon position from one hourly snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BalloonPosition {
    /// `"<hour>-<index>"`, where index is the entry's ordinal in that hour's snapshot
    pub id: String,
    /// Latitude in degrees, within [-90, 90]
    pub lat: f64,
    /// Longitude in degrees, within [-180, 180]
    pub lon: f64,
    /// Altitude in kilometres
    pub altitude: f64,
    /// Approximate capture time: fetch time minus `hour` hours
    pub timestamp: DateTime<Utc>,
    /// Snapshot age in hours (0..=23)
    pub hour: u32,
}

/// Weather reading at a balloon's location.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    /// Temperature in °C
    pub temperature: f64,
    /// Condition description (e.g. "scattered clouds")
    pub description: String,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Pressure in hPa
    pub pressure: f64,
}

/// A sampled balloon position with its weather estimate attached.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EnrichedPosition {
    #[serde(flatten)]
    pub position: BalloonPosition,
    /// Absent when no weather could be produced; the popup omits the weather panel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<Weather>,
}

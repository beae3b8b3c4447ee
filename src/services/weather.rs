//! Weather estimates for balloon locations.
//!
//! Live readings come from the OpenWeatherMap current-weather endpoint. Any
//! failure falls back to a deterministic synthetic reading derived from the
//! coordinates, so [`WeatherClient::estimate`] always yields a value.
//! See: https://openweathermap.org/current

use serde::Deserialize;

use crate::config::WEATHER_API_KEY_PLACEHOLDER;
use crate::errors::AppError;
use crate::helpers::{round_1dp, round_half_up};
use crate::models::Weather;

/// Per-lookup request timeout.
const WEATHER_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(3);

/// Synthetic condition descriptions, indexed by the generator.
const SYNTHETIC_CONDITIONS: [&str; 5] = [
    "clear sky",
    "few clouds",
    "scattered clouds",
    "overcast clouds",
    "light rain",
];

/// Client for the OpenWeatherMap current-weather API.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    timeout: std::time::Duration,
}

// --- OpenWeatherMap JSON response types ---

#[derive(Debug, Deserialize)]
struct OwmResponse {
    main: OwmMain,
    weather: Vec<OwmCondition>,
    wind: OwmWind,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

impl WeatherClient {
    pub fn new(api_url: &str, api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            timeout: WEATHER_TIMEOUT,
        }
    }

    /// Override the per-lookup timeout.
    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether an operator-supplied credential is configured.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty() && self.api_key != WEATHER_API_KEY_PLACEHOLDER
    }

    /// Weather at a location. Never fails: falls back to
    /// [`synthetic_weather`] when the live lookup is unavailable.
    pub async fn estimate(&self, lat: f64, lon: f64) -> Weather {
        match self.fetch_current(lat, lon).await {
            Ok(weather) => weather,
            Err(e) => {
                tracing::debug!("Using synthetic weather for ({}, {}): {}", lat, lon, e);
                synthetic_weather(lat, lon)
            }
        }
    }

    /// Live lookup against the weather API (metric units).
    pub async fn fetch_current(&self, lat: f64, lon: f64) -> Result<Weather, AppError> {
        if !self.has_api_key() {
            return Err(AppError::ExternalServiceError(
                "weather API key not configured".to_string(),
            ));
        }

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("weather request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "weather API returned HTTP {}",
                response.status()
            )));
        }

        let body: OwmResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("weather JSON parse error: {}", e))
        })?;

        let description = body
            .weather
            .into_iter()
            .next()
            .map(|c| c.description)
            .ok_or_else(|| {
                AppError::ExternalServiceError("weather response has no conditions".to_string())
            })?;

        Ok(Weather {
            temperature: body.main.temp,
            description,
            wind_speed: body.wind.speed,
            pressure: body.main.pressure,
        })
    }
}

/// Plausible but synthetic weather for a location.
///
/// A pure function of `(lat, lon)`, seeded by `|lat * lon|`. The formulas
/// and rounding must stay exactly as they are: previously generated
/// readings are expected to match.
pub fn synthetic_weather(lat: f64, lon: f64) -> Weather {
    let seed = (lat * lon).abs();
    let temperature = 15.0 + seed.sin() * 20.0 - lat.abs() / 3.0;

    let condition_index = ((seed * 2.0).sin().abs() * SYNTHETIC_CONDITIONS.len() as f64).floor()
        as usize;
    let description = SYNTHETIC_CONDITIONS[condition_index.min(SYNTHETIC_CONDITIONS.len() - 1)];

    Weather {
        temperature: round_1dp(temperature),
        description: description.to_string(),
        wind_speed: round_half_up((seed * 3.0).cos().abs() * 20.0 * 10.0) / 10.0,
        pressure: 1000.0 + round_half_up((seed * 5.0).sin() * 30.0),
    }
}

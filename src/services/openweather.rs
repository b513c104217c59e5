//! OpenWeatherMap 2.5 client.
//!
//! Two endpoints are used: `/weather` (current conditions by place name) and
//! `/forecast` (5-day series in 3-hour steps, by coordinates).
//! See: https://openweathermap.org/current and https://openweathermap.org/forecast5
//!
//! All temperatures are requested in the API's default unit, Kelvin.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::errors::WeatherError;
use crate::models::{Condition, Coordinates, CurrentConditions, ForecastSample};

/// Client for the OpenWeatherMap API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

// --- openweathermap.org JSON response types ---

#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    name: String,
    coord: OwmCoord,
    main: OwmMain,
    wind: OwmWind,
    weather: Vec<OwmWeather>,
}

#[derive(Debug, Deserialize)]
struct OwmCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastEntry {
    dt: i64,
    main: OwmMain,
    weather: Vec<OwmWeather>,
}

/// Raw `/forecast` entries in upstream order.
///
/// Entries stay as JSON until picked with `sample`, so a malformed entry only
/// matters if it is one the widget actually shows.
#[derive(Debug, Clone)]
pub struct ForecastSeries {
    entries: Vec<serde_json::Value>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Convert the entry at `idx` into a `ForecastSample`.
    pub fn sample(&self, idx: usize) -> Result<ForecastSample, WeatherError> {
        let raw = self.entries.get(idx).ok_or_else(|| {
            WeatherError::ForecastUnavailable(format!(
                "forecast series has {} entries, need at least {}",
                self.entries.len(),
                idx + 1
            ))
        })?;
        let entry: OwmForecastEntry = serde_json::from_value(raw.clone()).map_err(|e| {
            WeatherError::ForecastUnavailable(format!("forecast entry {} malformed: {}", idx, e))
        })?;
        parse_forecast_entry(entry)
    }
}

impl OpenWeatherClient {
    pub fn new(base_url: &str, api_key: &str, user_agent: &str) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| WeatherError::InternalError(format!("HTTP client build failed: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Fetch current conditions for a free-text place name.
    ///
    /// Every failure (transport, HTTP status, body shape) is reported as
    /// `LocationNotFound`; the caller does not distinguish between them.
    pub async fn fetch_current(&self, query: &str) -> Result<CurrentConditions, WeatherError> {
        let url = format!("{}/weather", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                WeatherError::LocationNotFound(format!("weather request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(WeatherError::LocationNotFound(format!(
                "openweathermap returned HTTP {} for '{}'",
                response.status(),
                query
            )));
        }

        let raw_json: serde_json::Value = response.json().await.map_err(|e| {
            WeatherError::LocationNotFound(format!("weather JSON parse error: {}", e))
        })?;

        parse_current(raw_json)
    }

    /// Fetch the full forecast series for a coordinate pair.
    ///
    /// Returns the whole series unconverted; picking the displayed samples is
    /// the caller's job (see `services::forecast`).
    pub async fn fetch_forecast_series(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<ForecastSeries, WeatherError> {
        let url = format!("{}/forecast", self.base_url);
        let lat_str = lat.to_string();
        let lon_str = lon.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat_str.as_str()),
                ("lon", lon_str.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                WeatherError::ForecastUnavailable(format!("forecast request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(WeatherError::ForecastUnavailable(format!(
                "openweathermap returned HTTP {}",
                response.status()
            )));
        }

        let raw_json: serde_json::Value = response.json().await.map_err(|e| {
            WeatherError::ForecastUnavailable(format!("forecast JSON parse error: {}", e))
        })?;

        parse_forecast_series(raw_json)
    }
}

/// Convert a `/weather` response body into `CurrentConditions`.
fn parse_current(raw_json: serde_json::Value) -> Result<CurrentConditions, WeatherError> {
    let response: OwmCurrentResponse = serde_json::from_value(raw_json).map_err(|e| {
        WeatherError::LocationNotFound(format!("weather response structure error: {}", e))
    })?;

    let weather = response.weather.into_iter().next().ok_or_else(|| {
        WeatherError::LocationNotFound("weather response has no condition entry".to_string())
    })?;

    Ok(CurrentConditions {
        name: response.name,
        temperature_k: response.main.temp,
        feels_like_k: response.main.feels_like.unwrap_or(response.main.temp),
        humidity_pct: response.main.humidity.unwrap_or(0.0),
        wind_speed_ms: response.wind.speed,
        condition: Condition::from_main(&weather.main),
        description: weather.description,
        coordinates: Coordinates {
            lat: response.coord.lat,
            lon: response.coord.lon,
        },
    })
}

/// Split a `/forecast` response body into its raw entries.
pub(crate) fn parse_forecast_series(
    raw_json: serde_json::Value,
) -> Result<ForecastSeries, WeatherError> {
    let response: OwmForecastResponse = serde_json::from_value(raw_json).map_err(|e| {
        WeatherError::ForecastUnavailable(format!("forecast response structure error: {}", e))
    })?;

    Ok(ForecastSeries {
        entries: response.list,
    })
}

fn parse_forecast_entry(entry: OwmForecastEntry) -> Result<ForecastSample, WeatherError> {
    let timestamp: DateTime<Utc> = DateTime::from_timestamp(entry.dt, 0).ok_or_else(|| {
        WeatherError::ForecastUnavailable(format!("forecast timestamp out of range: {}", entry.dt))
    })?;

    // Missing condition entries are tolerated in the series; only the temperature is required.
    let (condition, description) = entry
        .weather
        .into_iter()
        .next()
        .map(|w| (Condition::from_main(&w.main), w.description))
        .unwrap_or_else(|| (Condition::Other("Unknown".to_string()), String::new()));

    Ok(ForecastSample {
        timestamp,
        temperature_k: entry.main.temp,
        condition,
        description,
    })
}

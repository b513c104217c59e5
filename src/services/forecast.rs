//! Forecast sample selection.
//!
//! The upstream series has 8 entries per day over 5 days (40 entries). The
//! widget shows six cards: one entry per day at the same time of day, then
//! the last entry again to fill the sixth slot.

use crate::errors::WeatherError;
use crate::models::ForecastSample;
use crate::services::openweather::{ForecastSeries, OpenWeatherClient};

/// Zero-based positions picked from the upstream series. The final position
/// is intentionally repeated: the series only covers five days.
pub const FORECAST_OFFSETS: [usize; 6] = [7, 15, 23, 31, 39, 39];

/// Number of samples in a non-empty forecast.
pub const FORECAST_LEN: usize = FORECAST_OFFSETS.len();

/// Pick the displayed samples out of a full series.
///
/// Only the entries at `FORECAST_OFFSETS` are converted. All-or-nothing: a
/// series too short for every offset, or a malformed picked entry, is an
/// error rather than a partial forecast, so a forecast is always 0 or
/// `FORECAST_LEN` long.
pub fn select_forecast_samples(
    series: &ForecastSeries,
) -> Result<Vec<ForecastSample>, WeatherError> {
    FORECAST_OFFSETS
        .iter()
        .map(|&idx| series.sample(idx))
        .collect()
}

/// Fetch and select the forecast for a coordinate pair.
pub async fn fetch_forecast(
    client: &OpenWeatherClient,
    lat: f64,
    lon: f64,
) -> Result<Vec<ForecastSample>, WeatherError> {
    let series = client.fetch_forecast_series(lat, lon).await?;
    tracing::debug!("Forecast series for ({:.4}, {:.4}) has {} entries", lat, lon, series.len());
    select_forecast_samples(&series)
}

//! Text rendering of the widget.
//!
//! Turns pipeline state plus display preferences into the lines the terminal
//! front end prints. Temperatures are converted here, never in the pipeline.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::models::{CurrentConditions, ForecastSample};
use crate::services::pipeline::{PipelineState, PipelineStatus};
use crate::store::preferences::DisplayPreferences;
use crate::units::{convert, TemperatureUnit};

const TITLE: &str = "Weather App";

/// Date label for a forecast card in the viewer's local time zone,
/// e.g. "Mon Oct 19 2026".
pub fn forecast_date(timestamp: DateTime<Utc>) -> String {
    format_date_in(timestamp, &Local)
}

fn format_date_in<Tz: TimeZone>(timestamp: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    timestamp.with_timezone(tz).format("%a %b %d %Y").to_string()
}

fn unit_selector(active: TemperatureUnit) -> String {
    TemperatureUnit::ALL
        .iter()
        .map(|unit| {
            if *unit == active {
                format!("[{}]", unit.symbol())
            } else {
                format!(" {} ", unit.symbol())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_current(current: &CurrentConditions, unit: TemperatureUnit) -> Vec<String> {
    let mut heading = current.name.clone();
    if let Some(icon) = current.condition.icon() {
        heading = format!("{} {}", heading, icon);
    }
    vec![
        heading,
        format!("  {}", convert(current.temperature_k, unit)),
        format!("  {}", current.description),
        format!("  Humidity: {}%", current.humidity_pct),
        format!("  Wind: {} m/s", current.wind_speed_ms),
        format!("  Feels Like: {}", convert(current.feels_like_k, unit)),
    ]
}

fn render_forecast(forecast: &[ForecastSample], unit: TemperatureUnit) -> Vec<String> {
    let mut lines = vec!["Forecast".to_string()];
    for sample in forecast {
        lines.push(format!(
            "  {}  {:>8}  {}",
            forecast_date(sample.timestamp),
            convert(sample.temperature_k, unit),
            sample.description
        ));
    }
    lines
}

/// Render the whole widget.
pub fn render(state: &PipelineState, prefs: &DisplayPreferences) -> String {
    let mut lines = vec![
        format!("=== {} ({}) ===", TITLE, prefs.theme.as_str()),
        format!("{}  (:theme)", prefs.theme.toggle_label()),
    ];

    if let Some(error) = &state.error {
        lines.push(format!("! {}", error));
    }

    let loading = state.status == PipelineStatus::Loading;
    if loading {
        lines.push("Loading...".to_string());
    }

    if let (Some(current), false) = (&state.current, loading) {
        lines.extend(render_current(current, prefs.unit));
    }

    lines.push(format!("Unit: {}  (:c :f :k)", unit_selector(prefs.unit)));

    if !state.forecast.is_empty() {
        lines.extend(render_forecast(&state.forecast, prefs.unit));
    }

    lines.join("\n")
}

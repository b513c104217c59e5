use chrono::{DateTime, Utc};

/// Geographic coordinates as returned by the current-conditions endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Weather category, parsed from OpenWeatherMap's `weather[0].main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Haze,
    Mist,
    Fog,
    Other(String),
}

impl Condition {
    pub fn from_main(main: &str) -> Self {
        match main {
            "Clear" => Self::Clear,
            "Clouds" => Self::Clouds,
            "Rain" => Self::Rain,
            "Drizzle" => Self::Drizzle,
            "Thunderstorm" => Self::Thunderstorm,
            "Snow" => Self::Snow,
            "Haze" => Self::Haze,
            "Mist" => Self::Mist,
            "Fog" => Self::Fog,
            other => Self::Other(other.to_string()),
        }
    }

    /// Icon for the conditions card. Only the common categories have one.
    pub fn icon(&self) -> Option<&'static str> {
        match self {
            Self::Clouds => Some("☁️"),
            Self::Rain => Some("🌧️"),
            Self::Clear => Some("☀️"),
            Self::Snow => Some("❄️"),
            Self::Haze => Some("🌫️"),
            _ => None,
        }
    }
}

/// Snapshot of the weather at one location, at fetch time.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Place name as resolved by the service (may differ from the query).
    pub name: String,
    pub temperature_k: f64,
    pub feels_like_k: f64,
    pub humidity_pct: f64,
    pub wind_speed_ms: f64,
    pub condition: Condition,
    pub description: String,
    pub coordinates: Coordinates,
}

/// One entry of the multi-day forecast series.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,
    pub temperature_k: f64,
    pub condition: Condition,
    pub description: String,
}

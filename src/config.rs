use crate::errors::WeatherError;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const DEFAULT_PREFS_PATH: &str = "./weather-widget.json";
const DEFAULT_USER_AGENT: &str = "WeatherWidget/0.1";

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    /// Base URL of the OpenWeatherMap 2.5 API, without trailing slash.
    pub base_url: String,
    /// JSON file holding the persisted preferences (last location, theme).
    pub prefs_path: String,
    pub user_agent: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, WeatherError> {
        let api_key = std::env::var("OPENWEATHER_API_KEY")
            .map_err(|_| WeatherError::Config("OPENWEATHER_API_KEY must be set".to_string()))?;
        if api_key.trim().is_empty() {
            return Err(WeatherError::Config(
                "OPENWEATHER_API_KEY must not be empty".to_string(),
            ));
        }

        let base_url = std::env::var("OPENWEATHER_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            base_url,
            prefs_path: std::env::var("WEATHER_PREFS_PATH")
                .unwrap_or_else(|_| DEFAULT_PREFS_PATH.to_string()),
            user_agent: std::env::var("WEATHER_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        })
    }
}

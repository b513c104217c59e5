/// Message shown to the user whenever a location lookup fails, whatever the cause.
pub const LOCATION_NOT_FOUND_MESSAGE: &str = "City not found. Try a different name.";

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Forecast unavailable: {0}")]
    ForecastUnavailable(String),

    #[error("Preference store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl WeatherError {
    /// Text the widget displays for this error.
    ///
    /// Only location lookups surface to the user; the other variants are
    /// logged and the widget keeps going, so they get a generic message.
    pub fn user_message(&self) -> String {
        match self {
            WeatherError::LocationNotFound(_) => LOCATION_NOT_FOUND_MESSAGE.to_string(),
            WeatherError::ForecastUnavailable(_) => "Forecast unavailable.".to_string(),
            WeatherError::Store(_) => "Could not save preferences.".to_string(),
            WeatherError::Config(msg) => format!("Configuration error: {}", msg),
            WeatherError::InternalError(_) => "Something went wrong.".to_string(),
        }
    }
}

impl From<std::io::Error> for WeatherError {
    fn from(err: std::io::Error) -> Self {
        WeatherError::Store(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        WeatherError::Store(format!("JSON error: {}", err))
    }
}

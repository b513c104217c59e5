//! Display preferences and the remembered location.
//!
//! Theme and last location are persisted through a `KeyValueStore`; the
//! temperature unit lives only for the session.

use crate::errors::WeatherError;
use crate::store::kv::KeyValueStore;
use crate::units::TemperatureUnit;

pub const LAST_LOCATION_KEY: &str = "last_location";
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Unrecognised values fall back to light.
    pub fn parse(value: &str) -> Self {
        match value {
            "dark" => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Label of the button that switches away from this theme.
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Theme::Light => "🌙 Dark Mode",
            Theme::Dark => "☀️ Light Mode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayPreferences {
    pub unit: TemperatureUnit,
    pub theme: Theme,
}

impl DisplayPreferences {
    /// Load the persisted theme. A store failure is logged and yields defaults.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let theme = match store.get(THEME_KEY) {
            Ok(Some(value)) => Theme::parse(&value),
            Ok(None) => Theme::default(),
            Err(e) => {
                tracing::warn!("Failed to read theme preference: {}", e);
                Theme::default()
            }
        };
        Self {
            unit: TemperatureUnit::default(),
            theme,
        }
    }

    pub fn select_unit(&mut self, unit: TemperatureUnit) {
        self.unit = unit;
    }

    /// Flip the theme and persist the new value.
    ///
    /// The in-memory theme flips even if the write fails; the error is
    /// returned so the caller can log it.
    pub fn toggle_theme(&mut self, store: &dyn KeyValueStore) -> Result<Theme, WeatherError> {
        self.theme = self.theme.toggled();
        store.set(THEME_KEY, self.theme.as_str())?;
        Ok(self.theme)
    }
}

/// The location submitted in a previous session, if any.
pub fn load_last_location(store: &dyn KeyValueStore) -> Option<String> {
    match store.get(LAST_LOCATION_KEY) {
        Ok(value) => value.filter(|v| !v.trim().is_empty()),
        Err(e) => {
            tracing::warn!("Failed to read last location: {}", e);
            None
        }
    }
}

pub fn save_last_location(store: &dyn KeyValueStore, query: &str) -> Result<(), WeatherError> {
    store.set(LAST_LOCATION_KEY, query)
}

//! Temperature display conversion.
//!
//! The API reports every temperature in Kelvin; conversion happens only at
//! display time so the selected unit can change without refetching.

const KELVIN_OFFSET: f64 = 273.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    pub const ALL: [TemperatureUnit; 3] = [
        TemperatureUnit::Celsius,
        TemperatureUnit::Fahrenheit,
        TemperatureUnit::Kelvin,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Kelvin => "K",
        }
    }
}

/// Format a Kelvin temperature in the given unit, to 1 decimal place.
///
/// Ties round away from zero (289.25 K shows as "289.3K"); `{:.1}` alone
/// would round them to even. No bounds checking: negative or absurd Kelvin
/// values format as-is.
pub fn convert(temp_kelvin: f64, unit: TemperatureUnit) -> String {
    let value = match unit {
        TemperatureUnit::Celsius => temp_kelvin - KELVIN_OFFSET,
        TemperatureUnit::Fahrenheit => (temp_kelvin - KELVIN_OFFSET) * 1.8 + 32.0,
        TemperatureUnit::Kelvin => temp_kelvin,
    };
    let rounded = (value * 10.0).round() / 10.0;
    format!("{:.1}{}", rounded, unit.symbol())
}

//! Weather report model, provider units and display helpers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Temperature unit requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Value of the provider's `temperature_unit` query parameter
    #[must_use]
    pub fn as_query(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    /// The unit a value in `self` is shown alongside
    #[must_use]
    pub fn counterpart(self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }

    /// Convert a temperature in `self` to `target`
    #[must_use]
    pub fn convert(self, value: f64, target: Self) -> f64 {
        match (self, target) {
            (TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit) => value * 9.0 / 5.0 + 32.0,
            (TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius) => (value - 32.0) * 5.0 / 9.0,
            _ => value,
        }
    }
}

/// Wind speed unit requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindSpeedUnit {
    Kmh,
    Ms,
    Mph,
    Kn,
}

impl WindSpeedUnit {
    /// Value of the provider's `windspeed_unit` query parameter
    #[must_use]
    pub fn as_query(self) -> &'static str {
        match self {
            WindSpeedUnit::Kmh => "kmh",
            WindSpeedUnit::Ms => "ms",
            WindSpeedUnit::Mph => "mph",
            WindSpeedUnit::Kn => "kn",
        }
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            WindSpeedUnit::Kmh => "km/h",
            WindSpeedUnit::Ms => "m/s",
            WindSpeedUnit::Mph => "mph",
            WindSpeedUnit::Kn => "kn",
        }
    }

    /// Imperial speeds are shown next to km/h, everything else next to mph
    #[must_use]
    pub fn counterpart(self) -> Self {
        match self {
            WindSpeedUnit::Mph => WindSpeedUnit::Kmh,
            _ => WindSpeedUnit::Mph,
        }
    }

    fn kmh_factor(self) -> f64 {
        match self {
            WindSpeedUnit::Kmh => 1.0,
            WindSpeedUnit::Ms => 3.6,
            WindSpeedUnit::Mph => 1.609_344,
            WindSpeedUnit::Kn => 1.852,
        }
    }

    /// Convert a speed in `self` to `target`
    #[must_use]
    pub fn convert(self, value: f64, target: Self) -> f64 {
        value * self.kmh_factor() / target.kmh_factor()
    }
}

/// One hour of the short-range outlook
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastEntry {
    /// Start of the forecast hour
    pub time: DateTime<Utc>,
    /// Temperature in the report's temperature unit
    pub temperature: Option<f64>,
    /// WMO weather code
    pub condition_code: Option<u8>,
    /// Precipitation probability (0-100)
    pub precipitation_probability: Option<u8>,
}

/// Current conditions at a location, in provider units
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherReport {
    /// Observation time reported by the provider
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub temperature_unit: TemperatureUnit,
    pub wind_speed: f64,
    pub wind_speed_unit: WindSpeedUnit,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: Option<f64>,
    /// WMO weather code
    pub condition_code: Option<u8>,
    pub is_day: bool,
    /// Hourly outlook, empty when the provider sent none
    pub forecast: Vec<ForecastEntry>,
}

/// Convert wind direction from degrees to cardinal direction
#[must_use]
pub fn wind_direction_to_cardinal(degrees: f64) -> &'static str {
    if !degrees.is_finite() {
        return "Unknown";
    }
    // rem_euclid keeps the value in 0..360, so the cast cannot truncate
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let degrees = degrees.round().rem_euclid(360.0) as u16;
    match degrees {
        0..=11 | 349..=360 => "N",
        12..=33 => "NNE",
        34..=56 => "NE",
        57..=78 => "ENE",
        79..=101 => "E",
        102..=123 => "ESE",
        124..=146 => "SE",
        147..=168 => "SSE",
        169..=191 => "S",
        192..=213 => "SSW",
        214..=236 => "SW",
        237..=258 => "WSW",
        259..=281 => "W",
        282..=303 => "WNW",
        304..=326 => "NW",
        327..=348 => "NNW",
        _ => "Unknown",
    }
}

/// Convert a WMO weather code to a human-readable description
#[must_use]
pub fn weather_code_to_description(code: u8) -> Option<&'static str> {
    let description = match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => return None,
    };
    Some(description)
}

/// Describe an optional weather code, naming unknown codes explicitly
#[must_use]
pub fn describe_condition(code: Option<u8>) -> String {
    match code {
        None => "Unknown".to_string(),
        Some(code) => weather_code_to_description(code)
            .map_or_else(|| format!("Unknown code ({code})"), str::to_string),
    }
}

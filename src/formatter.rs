//! Human-readable weather replies

use std::fmt::{self, Display};

use crate::models::weather::{describe_condition, wind_direction_to_cardinal};
use crate::models::{ForecastEntry, ResolvedLocation, WeatherReport};

/// Composes the text of a weather reply
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFormatter;

impl ResponseFormatter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Render a report. Output depends only on the arguments.
    #[must_use]
    pub fn format(&self, report: &WeatherReport, location: &ResolvedLocation) -> String {
        WeatherReply::new(report, location).to_string()
    }
}

/// A report bound to the place it describes, rendered through `Display`
#[derive(Debug, Clone, Copy)]
pub struct WeatherReply<'a> {
    report: &'a WeatherReport,
    location: &'a ResolvedLocation,
}

impl<'a> WeatherReply<'a> {
    #[must_use]
    pub fn new(report: &'a WeatherReport, location: &'a ResolvedLocation) -> Self {
        Self { report, location }
    }
}

impl Display for WeatherReply<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(f, "Weather for {}:", self.location.display_name)?;

        let other_temp = report.temperature_unit.counterpart();
        writeln!(
            f,
            "- Temp: {:.1}{} ({:.1}{})",
            report.temperature,
            report.temperature_unit.symbol(),
            report
                .temperature_unit
                .convert(report.temperature, other_temp),
            other_temp.symbol()
        )?;

        let other_speed = report.wind_speed_unit.counterpart();
        write!(
            f,
            "- Wind: {:.1} {} ({:.1} {})",
            report.wind_speed,
            report.wind_speed_unit.symbol(),
            report
                .wind_speed_unit
                .convert(report.wind_speed, other_speed),
            other_speed.symbol()
        )?;
        if let Some(direction) = report.wind_direction.filter(|d| d.is_finite()) {
            write!(
                f,
                " from {:.0}° ({})",
                direction,
                wind_direction_to_cardinal(direction)
            )?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "- Condition: {}",
            describe_condition(report.condition_code)
        )?;
        write!(
            f,
            "- Observed: {}",
            report.timestamp.format("%Y-%m-%d %H:%M UTC")
        )?;

        if !report.forecast.is_empty() {
            write!(f, "\nNext hours:")?;
            for entry in &report.forecast {
                write!(f, "\n{}", ForecastLine { entry, report })?;
            }
        }
        Ok(())
    }
}

/// One hour of the forecast block
struct ForecastLine<'a> {
    entry: &'a ForecastEntry,
    report: &'a WeatherReport,
}

impl Display for ForecastLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- {}: ", self.entry.time.format("%H:%M UTC"))?;
        match self.entry.temperature {
            Some(t) => write!(f, "{:.1}{}", t, self.report.temperature_unit.symbol())?,
            None => f.write_str("N/A")?,
        }
        write!(f, ", {}", describe_condition(self.entry.condition_code))?;
        if let Some(probability) = self.entry.precipitation_probability.filter(|p| *p > 0) {
            write!(f, ", {probability}% precip")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TemperatureUnit, WindSpeedUnit};
    use chrono::{TimeZone, Utc};

    fn paris() -> ResolvedLocation {
        ResolvedLocation::new(48.8566, 2.3522, "Paris, France", Some("FR".to_string())).unwrap()
    }

    fn report() -> WeatherReport {
        WeatherReport {
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            temperature: 21.3,
            temperature_unit: TemperatureUnit::Celsius,
            wind_speed: 11.2,
            wind_speed_unit: WindSpeedUnit::Kmh,
            wind_direction: Some(250.0),
            condition_code: Some(2),
            is_day: true,
            forecast: Vec::new(),
        }
    }

    #[test]
    fn test_format_current_conditions() {
        let text = ResponseFormatter::new().format(&report(), &paris());
        assert_eq!(
            text,
            "Weather for Paris, France:\n\
             - Temp: 21.3°C (70.3°F)\n\
             - Wind: 11.2 km/h (7.0 mph) from 250° (WSW)\n\
             - Condition: Partly cloudy\n\
             - Observed: 2024-06-01 12:00 UTC"
        );
    }

    #[test]
    fn test_format_with_forecast() {
        let mut report = report();
        report.forecast = vec![
            ForecastEntry {
                time: Utc.with_ymd_and_hms(2024, 6, 1, 13, 0, 0).unwrap(),
                temperature: Some(22.0),
                condition_code: Some(3),
                precipitation_probability: Some(0),
            },
            ForecastEntry {
                time: Utc.with_ymd_and_hms(2024, 6, 1, 14, 0, 0).unwrap(),
                temperature: None,
                condition_code: Some(61),
                precipitation_probability: Some(80),
            },
        ];

        let text = ResponseFormatter::new().format(&report, &paris());
        assert!(text.ends_with(
            "Next hours:\n\
             - 13:00 UTC: 22.0°C, Overcast\n\
             - 14:00 UTC: N/A, Slight rain, 80% precip"
        ));
    }

    #[test]
    fn test_missing_optional_fields_are_neutralised() {
        let mut report = report();
        report.wind_direction = None;
        report.condition_code = None;

        let text = ResponseFormatter::new().format(&report, &paris());
        assert!(text.contains("- Wind: 11.2 km/h (7.0 mph)\n"));
        assert!(text.contains("- Condition: Unknown"));
        assert!(!text.contains("Next hours"));
    }

    #[test]
    fn test_imperial_provider_units() {
        let mut report = report();
        report.temperature = 70.0;
        report.temperature_unit = TemperatureUnit::Fahrenheit;
        report.wind_speed = 10.0;
        report.wind_speed_unit = WindSpeedUnit::Mph;

        let text = ResponseFormatter::new().format(&report, &paris());
        assert!(text.contains("- Temp: 70.0°F (21.1°C)"));
        assert!(text.contains("- Wind: 10.0 mph (16.1 km/h)"));
    }

    #[test]
    fn test_display_matches_format() {
        let mut report = report();
        report.forecast = vec![ForecastEntry {
            time: Utc.with_ymd_and_hms(2024, 6, 1, 13, 0, 0).unwrap(),
            temperature: Some(22.0),
            condition_code: Some(3),
            precipitation_probability: Some(10),
        }];
        let location = paris();

        let reply = WeatherReply::new(&report, &location);
        assert_eq!(
            format!("{reply}"),
            ResponseFormatter::new().format(&report, &location)
        );
        assert!(format!("{reply}").ends_with("- 13:00 UTC: 22.0°C, Overcast, 10% precip"));
    }

    #[test]
    fn test_format_is_idempotent() {
        let formatter = ResponseFormatter::new();
        let report = report();
        let location = paris();
        assert_eq!(
            formatter.format(&report, &location),
            formatter.format(&report, &location)
        );
    }
}

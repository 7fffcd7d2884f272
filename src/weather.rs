//! Current conditions and short-range outlook from Open-Meteo

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use tracing::{info, instrument, warn};

use crate::config::WeatherConfig;
use crate::http;
use crate::models::{ResolvedLocation, WeatherReport};
use crate::{BotError, Result};

const SERVICE: &str = "weather";

/// Open-Meteo's timestamp format for `timezone=UTC`
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Source of current weather conditions
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn get_conditions(&self, location: &ResolvedLocation) -> Result<WeatherReport>;
}

/// Open-Meteo forecast client
pub struct OpenMeteoWeatherClient {
    client: ClientWithMiddleware,
    config: WeatherConfig,
}

impl OpenMeteoWeatherClient {
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let client = http::build_client(config.timeout_seconds, config.max_retries)?;
        Ok(Self { client, config })
    }

    fn forecast_url(&self, location: &ResolvedLocation) -> String {
        let mut url = format!(
            "{}/forecast?latitude={}&longitude={}&current_weather=true&temperature_unit={}&windspeed_unit={}&timezone=UTC",
            self.config.base_url.trim_end_matches('/'),
            location.latitude,
            location.longitude,
            self.config.temperature_unit.as_query(),
            self.config.wind_speed_unit.as_query()
        );
        if self.config.forecast_hours > 0 {
            url.push_str(&format!(
                "&hourly=temperature_2m,weathercode,precipitation_probability&forecast_hours={}",
                self.config.forecast_hours
            ));
        }
        url
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoWeatherClient {
    #[instrument(skip(self, location), fields(lat = location.latitude, lon = location.longitude))]
    async fn get_conditions(&self, location: &ResolvedLocation) -> Result<WeatherReport> {
        let response = http::get(&self.client, &self.forecast_url(location), SERVICE).await?;
        let response = http::ensure_success(response, SERVICE)?;

        let body: openmeteo::ForecastResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse weather response: {}", e);
            BotError::malformed(format!("Invalid weather data: {e}"))
        })?;

        let report = body.into_report(&self.config)?;
        info!(
            "Weather for '{}': {}{}, wind {}{}, {} forecast hours",
            location.display_name,
            report.temperature,
            report.temperature_unit.symbol(),
            report.wind_speed,
            report.wind_speed_unit.symbol(),
            report.forecast.len()
        );
        Ok(report)
    }
}

fn parse_time(value: &str) -> Option<chrono::DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .ok()
        .map(|time| time.and_utc())
}

/// `OpenMeteo` forecast response structures and conversion
mod openmeteo {
    use super::{BotError, Result, WeatherReport, parse_time};
    use crate::config::WeatherConfig;
    use crate::models::ForecastEntry;
    use chrono::Utc;
    use serde::Deserialize;
    use tracing::debug;

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub current_weather: Option<CurrentWeather>,
        pub hourly: Option<HourlyData>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentWeather {
        pub time: Option<String>,
        pub temperature: Option<f64>,
        pub windspeed: Option<f64>,
        pub winddirection: Option<f64>,
        pub weathercode: Option<f64>,
        pub is_day: Option<f64>,
    }

    /// Read a numeric code without letting one odd value reject the payload.
    /// Values that are fractional or above `max` become `None`.
    fn code_value(value: Option<f64>, max: u8) -> Option<u8> {
        let value = value?;
        let in_range = value.fract() == 0.0 && (0.0..=f64::from(max)).contains(&value);
        if !in_range {
            debug!("Ignoring out-of-range code {}", value);
            return None;
        }
        // in range and integral, so the cast is exact
        Some(value as u8)
    }

    /// Hourly columns; every value may be null
    #[derive(Debug, Deserialize)]
    pub struct HourlyData {
        #[serde(default)]
        pub time: Vec<String>,
        #[serde(rename = "temperature_2m", default)]
        pub temperature: Vec<Option<f64>>,
        #[serde(rename = "weathercode", default)]
        pub weather_code: Vec<Option<f64>>,
        #[serde(default)]
        pub precipitation_probability: Vec<Option<f64>>,
    }

    impl HourlyData {
        fn into_entries(self) -> Vec<ForecastEntry> {
            self.time
                .iter()
                .enumerate()
                .filter_map(|(i, time)| {
                    let Some(time) = parse_time(time) else {
                        debug!("Skipping hourly entry with unparseable time '{}'", time);
                        return None;
                    };
                    Some(ForecastEntry {
                        time,
                        temperature: self.temperature.get(i).copied().flatten(),
                        condition_code: code_value(
                            self.weather_code.get(i).copied().flatten(),
                            u8::MAX,
                        ),
                        precipitation_probability: code_value(
                            self.precipitation_probability.get(i).copied().flatten(),
                            100,
                        ),
                    })
                })
                .collect()
        }
    }

    impl ForecastResponse {
        pub fn into_report(self, config: &WeatherConfig) -> Result<WeatherReport> {
            let current = self
                .current_weather
                .ok_or_else(|| BotError::malformed("Weather data missing current_weather"))?;
            let temperature = current
                .temperature
                .ok_or_else(|| BotError::malformed("Weather data missing temperature"))?;
            let wind_speed = current
                .windspeed
                .ok_or_else(|| BotError::malformed("Weather data missing windspeed"))?;

            let timestamp = current
                .time
                .as_deref()
                .and_then(parse_time)
                .unwrap_or_else(Utc::now);

            Ok(WeatherReport {
                timestamp,
                temperature,
                temperature_unit: config.temperature_unit,
                wind_speed,
                wind_speed_unit: config.wind_speed_unit,
                wind_direction: current.winddirection,
                condition_code: code_value(current.weathercode, u8::MAX),
                is_day: current.is_day.is_none_or(|flag| flag != 0.0),
                forecast: self
                    .hourly
                    .map(HourlyData::into_entries)
                    .unwrap_or_default(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TemperatureUnit, WindSpeedUnit};
    use chrono::TimeZone;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn paris() -> ResolvedLocation {
        ResolvedLocation::new(48.8566, 2.3522, "Paris", Some("FR".to_string())).unwrap()
    }

    fn client(mock_server: &MockServer, forecast_hours: u32) -> OpenMeteoWeatherClient {
        OpenMeteoWeatherClient::new(WeatherConfig {
            base_url: format!("{}/v1", mock_server.uri()),
            forecast_hours,
            ..WeatherConfig::default()
        })
        .unwrap()
    }

    fn forecast_body() -> serde_json::Value {
        serde_json::json!({
            "latitude": 48.86,
            "longitude": 2.35,
            "timezone": "UTC",
            "current_weather": {
                "time": "2024-06-01T12:00",
                "temperature": 21.3,
                "windspeed": 11.2,
                "winddirection": 250.0,
                "weathercode": 2,
                "is_day": 1
            },
            "hourly": {
                "time": ["2024-06-01T13:00", "2024-06-01T14:00"],
                "temperature_2m": [22.0, null],
                "weathercode": [3, 61],
                "precipitation_probability": [10, 80]
            }
        })
    }

    #[tokio::test]
    async fn test_get_conditions() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "48.8566"))
            .and(query_param("longitude", "2.3522"))
            .and(query_param("current_weather", "true"))
            .and(query_param("temperature_unit", "celsius"))
            .and(query_param("windspeed_unit", "kmh"))
            .and(query_param("forecast_hours", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let report = client(&mock_server, 2).get_conditions(&paris()).await.unwrap();
        assert_eq!(report.temperature, 21.3);
        assert_eq!(report.temperature_unit, TemperatureUnit::Celsius);
        assert_eq!(report.wind_speed, 11.2);
        assert_eq!(report.wind_speed_unit, WindSpeedUnit::Kmh);
        assert_eq!(report.wind_direction, Some(250.0));
        assert_eq!(report.condition_code, Some(2));
        assert!(report.is_day);
        assert_eq!(
            report.timestamp,
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
        );

        assert_eq!(report.forecast.len(), 2);
        assert_eq!(report.forecast[0].temperature, Some(22.0));
        assert_eq!(report.forecast[1].temperature, None);
        assert_eq!(report.forecast[1].condition_code, Some(61));
        assert_eq!(report.forecast[1].precipitation_probability, Some(80));
    }

    #[tokio::test]
    async fn test_missing_hourly_gives_empty_forecast() {
        let mock_server = MockServer::start().await;
        let mut body = forecast_body();
        body.as_object_mut().unwrap().remove("hourly");
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let report = client(&mock_server, 0).get_conditions(&paris()).await.unwrap();
        assert!(report.forecast.is_empty());
    }

    #[tokio::test]
    async fn test_zero_forecast_hours_omits_hourly_query() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .mount(&mock_server)
            .await;

        client(&mock_server, 0).get_conditions(&paris()).await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let query = requests[0].url.query().unwrap_or_default();
        assert!(!query.contains("hourly"));
        assert!(!query.contains("forecast_hours"));
    }

    #[tokio::test]
    async fn test_missing_current_weather_is_malformed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"latitude": 48.86})),
            )
            .mount(&mock_server)
            .await;

        let err = client(&mock_server, 0).get_conditions(&paris()).await.unwrap_err();
        assert!(matches!(err, BotError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_missing_temperature_is_malformed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "current_weather": {"windspeed": 5.0, "time": "2024-06-01T12:00"}
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server, 0).get_conditions(&paris()).await.unwrap_err();
        assert!(matches!(err, BotError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_optional_fields_may_be_absent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "current_weather": {"temperature": -3.5, "windspeed": 0.0, "time": "garbage"}
            })))
            .mount(&mock_server)
            .await;

        let before = Utc::now();
        let report = client(&mock_server, 0).get_conditions(&paris()).await.unwrap();
        assert_eq!(report.temperature, -3.5);
        assert_eq!(report.wind_direction, None);
        assert_eq!(report.condition_code, None);
        assert!(report.timestamp >= before);
    }

    #[tokio::test]
    async fn test_out_of_range_codes_are_dropped_not_fatal() {
        let mock_server = MockServer::start().await;
        let mut body = forecast_body();
        body["current_weather"]["weathercode"] = serde_json::json!(300);
        body["hourly"]["weathercode"] = serde_json::json!([-1, 2.5]);
        body["hourly"]["precipitation_probability"] = serde_json::json!([1000, 40]);
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let report = client(&mock_server, 2).get_conditions(&paris()).await.unwrap();
        assert_eq!(report.temperature, 21.3);
        assert_eq!(report.condition_code, None);
        assert_eq!(report.forecast[0].condition_code, None);
        assert_eq!(report.forecast[0].precipitation_probability, None);
        assert_eq!(report.forecast[1].condition_code, None);
        assert_eq!(report.forecast[1].precipitation_probability, Some(40));
    }

    #[tokio::test]
    async fn test_server_error_is_upstream_unavailable() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server, 0).get_conditions(&paris()).await.unwrap_err();
        assert!(matches!(err, BotError::UpstreamUnavailable { .. }));
        assert!(err.user_message().contains("unavailable"));
    }
}

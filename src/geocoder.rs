//! Place-name geocoding via the Open-Meteo geocoding API

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, info, instrument, warn};

use crate::config::GeocodingConfig;
use crate::http;
use crate::models::ResolvedLocation;
use crate::{BotError, Result};

const SERVICE: &str = "geocoding";

/// Resolves free text to a single location
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a place name to the provider's top-ranked match
    async fn resolve(&self, text: &str) -> Result<ResolvedLocation>;
}

/// Open-Meteo geocoding client (no API key required)
pub struct OpenMeteoGeocoder {
    client: ClientWithMiddleware,
    config: GeocodingConfig,
}

impl OpenMeteoGeocoder {
    pub fn new(config: GeocodingConfig) -> Result<Self> {
        let client = http::build_client(config.timeout_seconds, config.max_retries)?;
        Ok(Self { client, config })
    }

    fn search_url(&self, name: &str) -> String {
        format!(
            "{}/search?name={}&count={}&language={}&format=json",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(name),
            self.config.result_count,
            urlencoding::encode(&self.config.language)
        )
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    #[instrument(skip(self))]
    async fn resolve(&self, text: &str) -> Result<ResolvedLocation> {
        let name = text.trim();
        if name.is_empty() {
            return Err(BotError::location_not_found(name));
        }

        let response = http::get(&self.client, &self.search_url(name), SERVICE).await?;
        let response = http::ensure_success(response, SERVICE)?;

        let body: openmeteo::GeocodingResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse geocoding response for '{}': {}", name, e);
            BotError::malformed(format!("Invalid geocoding data: {e}"))
        })?;

        let candidates = body.results.unwrap_or_default();
        debug!(
            "Geocoding candidates for '{}': {:?}",
            name,
            candidates
                .iter()
                .map(|r| format!("{} ({:.4}, {:.4})", r.name, r.latitude, r.longitude))
                .collect::<Vec<_>>()
        );

        let Some(best) = openmeteo::top_ranked(candidates) else {
            warn!("No results found for location '{}'", name);
            return Err(BotError::location_not_found(name));
        };

        let location = best.into_location()?;
        info!(
            "Geocoded '{}' to '{}' at ({:.4}, {:.4})",
            name, location.display_name, location.latitude, location.longitude
        );
        Ok(location)
    }
}

/// `OpenMeteo` geocoding response structures
mod openmeteo {
    use super::{BotError, ResolvedLocation, Result};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct GeocodingResponse {
        pub results: Option<Vec<GeocodingResult>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct GeocodingResult {
        pub name: String,
        pub latitude: f64,
        pub longitude: f64,
        pub country_code: Option<String>,
        pub country: Option<String>,
        pub admin1: Option<String>,
    }

    /// Open-Meteo orders results by relevance and exposes no score, so rank
    /// is position and the first candidate wins.
    pub fn top_ranked(candidates: Vec<GeocodingResult>) -> Option<GeocodingResult> {
        candidates.into_iter().next()
    }

    impl GeocodingResult {
        /// `name[, admin1][, country]`, skipping an admin1 equal to the name
        pub fn display_name(&self) -> String {
            let mut display_name = self.name.clone();
            if let Some(admin1) = self.admin1.as_deref().filter(|a| !a.is_empty()) {
                if admin1 != self.name {
                    display_name.push_str(", ");
                    display_name.push_str(admin1);
                }
            }
            if let Some(country) = self.country.as_deref().filter(|c| !c.is_empty()) {
                display_name.push_str(", ");
                display_name.push_str(country);
            }
            display_name
        }

        pub fn into_location(self) -> Result<ResolvedLocation> {
            let display_name = self.display_name();
            ResolvedLocation::new(
                self.latitude,
                self.longitude,
                display_name,
                self.country_code.map(|c| c.to_ascii_uppercase()),
            )
            .map_err(|_| {
                BotError::malformed(format!(
                    "Geocoder returned out-of-range coordinates ({}, {})",
                    self.latitude, self.longitude
                ))
            })
        }
    }
}

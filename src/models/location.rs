//! Resolved location model

use serde::{Deserialize, Serialize};

use crate::{BotError, Result};

/// A location the bot can fetch weather for.
///
/// Build it with [`ResolvedLocation::new`] or
/// [`ResolvedLocation::from_coordinates`], which enforce the coordinate
/// ranges; deserialization goes through the same check. The fields stay
/// public for reading, so consumers that gate on coordinates re-check them
/// with [`validate_coordinates`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(try_from = "LocationFields")]
pub struct ResolvedLocation {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Human-readable name (city, region, country)
    pub display_name: String,
    /// Country code (ISO 3166-1 alpha-2), unknown for raw coordinates
    pub country_code: Option<String>,
}

#[derive(Deserialize)]
struct LocationFields {
    latitude: f64,
    longitude: f64,
    display_name: String,
    #[serde(default)]
    country_code: Option<String>,
}

impl TryFrom<LocationFields> for ResolvedLocation {
    type Error = BotError;

    fn try_from(fields: LocationFields) -> Result<Self> {
        Self::new(
            fields.latitude,
            fields.longitude,
            fields.display_name,
            fields.country_code,
        )
    }
}

impl ResolvedLocation {
    /// Create a validated location
    pub fn new(
        latitude: f64,
        longitude: f64,
        display_name: impl Into<String>,
        country_code: Option<String>,
    ) -> Result<Self> {
        validate_coordinates(latitude, longitude)?;
        Ok(Self {
            latitude,
            longitude,
            display_name: display_name.into(),
            country_code,
        })
    }

    /// Create a location from raw coordinates, named after the coordinates themselves
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Result<Self> {
        Self::new(
            latitude,
            longitude,
            format!("{latitude:.2}, {longitude:.2}"),
            None,
        )
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Whether the coordinate invariant still holds
    #[must_use]
    pub fn has_valid_coordinates(&self) -> bool {
        validate_coordinates(self.latitude, self.longitude).is_ok()
    }
}

/// Check latitude ∈ [-90, 90] and longitude ∈ [-180, 180]
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) {
        Ok(())
    } else {
        Err(BotError::invalid_coordinates(latitude, longitude))
    }
}

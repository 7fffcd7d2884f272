//! Region gate for satellite imagery
//!
//! Imagery is only offered for locations inside one of a fixed set of
//! latitude/longitude boxes. The boxes are plain data (see `[[imagery.regions]]`
//! in the configuration), so adding a region never touches this code.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::location::validate_coordinates;
use crate::models::ResolvedLocation;
use crate::{BotError, Result};

/// Latest GOES-East CONUS GeoColor composite
pub const GOES_CONUS_URL: &str =
    "https://cdn.star.nesdis.noaa.gov/GOES16/ABI/CONUS/GEOCOLOR/latest.jpg";

/// A supported region: an inclusive latitude/longitude box and its image source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
    /// Short identifier, also used for attachment file names
    pub id: String,
    pub name: String,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    /// Where the latest image for this region is published
    pub image_url: String,
}

impl RegionBounds {
    /// Contiguous United States
    #[must_use]
    pub fn conus() -> Self {
        Self {
            id: "conus".to_string(),
            name: "Contiguous United States".to_string(),
            lat_min: 24.0,
            lat_max: 53.0,
            lon_min: -125.0,
            lon_max: -67.0,
            image_url: GOES_CONUS_URL.to_string(),
        }
    }

    /// Inclusive box membership
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&latitude)
            && (self.lon_min..=self.lon_max).contains(&longitude)
    }

    /// Check the box is finite, ordered and within coordinate ranges
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(BotError::config("Region id cannot be empty"));
        }
        validate_coordinates(self.lat_min, self.lon_min)
            .and_then(|()| validate_coordinates(self.lat_max, self.lon_max))
            .map_err(|_| {
                BotError::config(format!("Region '{}' has out-of-range bounds", self.id))
            })?;
        if self.lat_min > self.lat_max || self.lon_min > self.lon_max {
            return Err(BotError::config(format!(
                "Region '{}' has min bounds greater than max bounds",
                self.id
            )));
        }
        Ok(())
    }
}

/// The region a location fell into
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMatch {
    pub region: RegionBounds,
}

impl RegionMatch {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.region.id
    }

    #[must_use]
    pub fn image_url(&self) -> &str {
        &self.region.image_url
    }
}

/// Decides whether a location is covered by satellite imagery
#[derive(Debug, Clone)]
pub struct RegionGate {
    regions: Vec<RegionBounds>,
}

impl RegionGate {
    #[must_use]
    pub fn new(regions: Vec<RegionBounds>) -> Self {
        Self { regions }
    }

    #[must_use]
    pub fn regions(&self) -> &[RegionBounds] {
        &self.regions
    }

    /// First region (in table order) containing the location
    pub fn match_region(&self, location: &ResolvedLocation) -> Result<Option<RegionMatch>> {
        validate_coordinates(location.latitude, location.longitude)?;

        let matched = self
            .regions
            .iter()
            .find(|region| region.contains(location.latitude, location.longitude))
            .map(|region| RegionMatch {
                region: region.clone(),
            });

        debug!(
            "Region check for ({:.2}, {:.2}): {}",
            location.latitude,
            location.longitude,
            matched.as_ref().map_or("no match", RegionMatch::id)
        );

        Ok(matched)
    }

    pub fn is_in_supported_region(&self, location: &ResolvedLocation) -> Result<bool> {
        Ok(self.match_region(location)?.is_some())
    }
}

impl Default for RegionGate {
    fn default() -> Self {
        Self::new(vec![RegionBounds::conus()])
    }
}

//! Data models for the weather bot
//!
//! This module contains the core domain models organized by concern:
//! - Location: resolved coordinates and naming
//! - Weather: current conditions, hourly outlook and provider units
//! - Reply: satellite images and the outbound reply message

pub mod location;
pub mod reply;
pub mod weather;

// Re-export all public types for convenient access
pub use location::ResolvedLocation;
pub use reply::{ReplyMessage, SatelliteImage};
pub use weather::{ForecastEntry, TemperatureUnit, WeatherReport, WindSpeedUnit};

//! `WeatherBot` - weather replies for message-based chat
//!
//! A query names a place (or gives coordinates / an MGRS reference). The bot
//! resolves it, fetches current conditions and, for locations inside a
//! supported region, attaches the latest satellite image.

pub mod bot;
pub mod config;
pub mod error;
pub mod formatter;
pub mod geocoder;
pub mod http;
pub mod logging;
pub mod mgrs;
pub mod models;
pub mod query;
pub mod region;
pub mod satellite;
pub mod transport;
pub mod weather;

// Re-export core types for public API
pub use bot::{MessageHandler, RequestState, WeatherBot};
pub use config::BotConfig;
pub use error::BotError;
pub use formatter::{ResponseFormatter, WeatherReply};
pub use geocoder::{Geocoder, OpenMeteoGeocoder};
pub use models::{ReplyMessage, ResolvedLocation, SatelliteImage, WeatherReport};
pub use query::{LocationParser, LocationQuery};
pub use region::{RegionBounds, RegionGate, RegionMatch};
pub use satellite::{HttpSatelliteFetcher, ImagerySource};
pub use weather::{OpenMeteoWeatherClient, WeatherSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, BotError>;

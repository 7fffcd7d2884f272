//! Error types and handling for the weather bot

use thiserror::Error;

/// Main error type for the weather bot
#[derive(Error, Debug)]
pub enum BotError {
    /// The geocoder had no candidate for the query
    #[error("Location not found: {query}")]
    LocationNotFound { query: String },

    /// An upstream provider could not be reached or answered with an error status
    #[error("{service} service unavailable: {message}")]
    UpstreamUnavailable { service: String, message: String },

    /// An upstream provider answered, but the payload was unusable
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// The imagery provider has no current image
    #[error("No image available: {message}")]
    NoImageAvailable { message: String },

    /// Latitude or longitude outside the valid range
    #[error("Invalid coordinates: lat={latitude}, lon={longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl BotError {
    /// Create a new location-not-found error
    pub fn location_not_found<S: Into<String>>(query: S) -> Self {
        Self::LocationNotFound {
            query: query.into(),
        }
    }

    /// Create a new upstream-unavailable error for the named service
    pub fn upstream<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::UpstreamUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new malformed-response error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a new no-image error
    pub fn no_image<S: Into<String>>(message: S) -> Self {
        Self::NoImageAvailable {
            message: message.into(),
        }
    }

    /// Create a new invalid-coordinates error
    #[must_use]
    pub fn invalid_coordinates(latitude: f64, longitude: f64) -> Self {
        Self::InvalidCoordinates {
            latitude,
            longitude,
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether a bounded retry could help. Only upstream outages qualify.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, BotError::UpstreamUnavailable { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            BotError::LocationNotFound { .. } => {
                "I couldn't find that location. Type 'help' for format examples.".to_string()
            }
            BotError::UpstreamUnavailable { service, .. } => format!(
                "Sorry, the {service} service is unavailable right now. Please try again later."
            ),
            BotError::MalformedResponse { .. } => {
                "Sorry, I couldn't fetch the weather for that location.".to_string()
            }
            BotError::NoImageAvailable { .. } => {
                "No satellite image is available right now.".to_string()
            }
            BotError::InvalidCoordinates { .. } => {
                "Those coordinates are out of range. Latitude must be within -90..90 and longitude within -180..180."
                    .to_string()
            }
            BotError::Config { .. } => {
                "The bot is misconfigured. Please contact its operator.".to_string()
            }
        }
    }
}

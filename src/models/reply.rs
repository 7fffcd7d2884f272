//! Outbound artifacts: satellite images and reply messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used for replies that carry an image
pub const IMAGE_REPLY_TITLE: &str = "Weather Update w/ Image";

/// A satellite image ready to be attached to a reply
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SatelliteImage {
    /// Raw image bytes as served by the provider
    pub bytes: Vec<u8>,
    /// MIME type, e.g. `image/jpeg`
    pub content_type: String,
    /// When the provider captured (or last modified) the image
    pub captured_at: DateTime<Utc>,
    /// Attachment file name
    pub file_name: String,
}

impl SatelliteImage {
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The final reply handed to the messaging transport
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReplyMessage {
    pub text: String,
    pub title: Option<String>,
    pub attachment: Option<SatelliteImage>,
}

impl ReplyMessage {
    /// A plain text reply
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            title: None,
            attachment: None,
        }
    }

    /// A text reply with an image attachment
    pub fn with_image(text: impl Into<String>, image: SatelliteImage) -> Self {
        Self {
            text: text.into(),
            title: Some(IMAGE_REPLY_TITLE.to_string()),
            attachment: Some(image),
        }
    }

    #[must_use]
    pub fn has_attachment(&self) -> bool {
        self.attachment.is_some()
    }
}

//! Latest satellite image for a matched region

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, LAST_MODIFIED};
use reqwest_middleware::ClientWithMiddleware;
use tracing::{info, instrument, warn};

use crate::config::ImageryConfig;
use crate::http;
use crate::models::SatelliteImage;
use crate::region::RegionMatch;
use crate::{BotError, Result};

const SERVICE: &str = "satellite imagery";

/// Source of the latest image for a region
#[async_trait]
pub trait ImagerySource: Send + Sync {
    async fn fetch_latest(&self, region: &RegionMatch) -> Result<SatelliteImage>;
}

/// Fetches the image published at a region's `image_url`
pub struct HttpSatelliteFetcher {
    client: ClientWithMiddleware,
    accepted_content_types: Vec<String>,
}

impl HttpSatelliteFetcher {
    pub fn new(config: &ImageryConfig) -> Result<Self> {
        let client = http::build_client(config.timeout_seconds, config.max_retries)?;
        Ok(Self {
            client,
            accepted_content_types: config
                .accepted_content_types
                .iter()
                .map(|c| c.to_ascii_lowercase())
                .collect(),
        })
    }

    fn is_accepted(&self, content_type: &str) -> bool {
        self.accepted_content_types.iter().any(|c| c == content_type)
    }
}

#[async_trait]
impl ImagerySource for HttpSatelliteFetcher {
    #[instrument(skip(self, region), fields(region = region.id()))]
    async fn fetch_latest(&self, region: &RegionMatch) -> Result<SatelliteImage> {
        let response = http::get(&self.client, region.image_url(), SERVICE).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BotError::no_image(format!(
                "No current image for region '{}'",
                region.id()
            )));
        }
        let response = http::ensure_success(response, SERVICE)?;

        // Media type only, parameters such as charset are dropped
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_ascii_lowercase())
            .unwrap_or_default();
        if !self.is_accepted(&content_type) {
            warn!("Unexpected image content type '{}'", content_type);
            return Err(BotError::no_image(format!(
                "Unexpected content type '{content_type}'"
            )));
        }

        let captured_at = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_http_date)
            .unwrap_or_else(Utc::now);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BotError::upstream(SERVICE, format!("Failed to read image body: {e}")))?;
        if bytes.is_empty() {
            return Err(BotError::no_image("Image body was empty"));
        }

        info!(
            "Fetched {} byte {} image for region '{}' captured at {}",
            bytes.len(),
            content_type,
            region.id(),
            captured_at
        );

        Ok(SatelliteImage {
            bytes: bytes.to_vec(),
            file_name: attachment_name(region.id(), &content_type),
            content_type,
            captured_at,
        })
    }
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

/// `{region_id}_latest.{jpg|png}`
fn attachment_name(region_id: &str, content_type: &str) -> String {
    let extension = match content_type {
        "image/png" => "png",
        _ => "jpg",
    };
    format!("{region_id}_latest.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionBounds;
    use chrono::TimeZone;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn region(mock_server: &MockServer) -> RegionMatch {
        RegionMatch {
            region: RegionBounds {
                image_url: format!("{}/GOES16/latest.jpg", mock_server.uri()),
                ..RegionBounds::conus()
            },
        }
    }

    fn fetcher() -> HttpSatelliteFetcher {
        HttpSatelliteFetcher::new(&ImageryConfig::default()).unwrap()
    }

    async fn mount(mock_server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/GOES16/latest.jpg"))
            .respond_with(template)
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_latest_jpeg() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .insert_header("last-modified", "Sat, 01 Jun 2024 12:06:17 GMT")
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]),
        )
        .await;

        let image = fetcher().fetch_latest(&region(&mock_server)).await.unwrap();
        assert_eq!(image.bytes, vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(image.content_type, "image/jpeg");
        assert_eq!(image.file_name, "conus_latest.jpg");
        assert_eq!(
            image.captured_at,
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 6, 17).unwrap()
        );
    }

    #[tokio::test]
    async fn test_png_without_last_modified_uses_fetch_time() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0x89, 0x50, 0x4E, 0x47]),
        )
        .await;

        let before = Utc::now();
        let image = fetcher().fetch_latest(&region(&mock_server)).await.unwrap();
        assert_eq!(image.file_name, "conus_latest.png");
        assert!(image.captured_at >= before);
    }

    #[tokio::test]
    async fn test_not_found_is_no_image() {
        let mock_server = MockServer::start().await;
        mount(&mock_server, ResponseTemplate::new(404)).await;

        let err = fetcher().fetch_latest(&region(&mock_server)).await.unwrap_err();
        assert!(matches!(err, BotError::NoImageAvailable { .. }));
    }

    #[tokio::test]
    async fn test_html_content_type_is_no_image() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string("<html>maintenance</html>"),
        )
        .await;

        let err = fetcher().fetch_latest(&region(&mock_server)).await.unwrap_err();
        assert!(matches!(err, BotError::NoImageAvailable { .. }));
    }

    #[tokio::test]
    async fn test_empty_body_is_no_image() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            ResponseTemplate::new(200).insert_header("content-type", "image/jpeg"),
        )
        .await;

        let err = fetcher().fetch_latest(&region(&mock_server)).await.unwrap_err();
        assert!(matches!(err, BotError::NoImageAvailable { .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_upstream_unavailable() {
        let mock_server = MockServer::start().await;
        mount(&mock_server, ResponseTemplate::new(503)).await;

        let err = fetcher().fetch_latest(&region(&mock_server)).await.unwrap_err();
        assert!(matches!(err, BotError::UpstreamUnavailable { .. }));
    }

    #[test]
    fn test_parse_http_date() {
        assert_eq!(
            parse_http_date("Sat, 01 Jun 2024 12:06:17 GMT"),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 6, 17).unwrap())
        );
        assert_eq!(parse_http_date("yesterday"), None);
    }
}

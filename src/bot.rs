//! Request orchestration: query → location → weather (+ image) → reply
//!
//! Every query ends in exactly one reply. Geocoding and weather failures
//! turn into a user-facing error text, while the satellite image is
//! best-effort and silently dropped when it cannot be fetched.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::OptionFuture;
use tracing::{debug, error, info, instrument, warn};

use crate::config::BotConfig;
use crate::formatter::ResponseFormatter;
use crate::geocoder::{Geocoder, OpenMeteoGeocoder};
use crate::mgrs;
use crate::models::{ReplyMessage, ResolvedLocation};
use crate::query::{HELP_TEXT, LocationParser, LocationQuery, UNRECOGNIZED_TEXT};
use crate::region::RegionGate;
use crate::satellite::{HttpSatelliteFetcher, ImagerySource};
use crate::weather::{OpenMeteoWeatherClient, WeatherSource};
use crate::{BotError, Result};

/// Handles one inbound message and produces one reply
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, query: &str) -> ReplyMessage;
}

/// Progress of a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Geocoding,
    FetchingWeather,
    FetchingImage,
    Formatting,
    Replying,
    Done,
    Failed,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestState::Received => "received",
            RequestState::Geocoding => "geocoding",
            RequestState::FetchingWeather => "fetching_weather",
            RequestState::FetchingImage => "fetching_image",
            RequestState::Formatting => "formatting",
            RequestState::Replying => "replying",
            RequestState::Done => "done",
            RequestState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks and logs state transitions for one request
struct Progress {
    state: RequestState,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: RequestState::Received,
        }
    }

    fn advance(&mut self, next: RequestState) {
        debug!("Request state {} -> {}", self.state, next);
        self.state = next;
    }

    /// Hand `reply` over and end in `Done`
    fn reply(mut self, reply: ReplyMessage) -> (ReplyMessage, RequestState) {
        self.advance(RequestState::Replying);
        self.advance(RequestState::Done);
        (reply, self.state)
    }

    /// Reply with the error's user message and end in `Failed`
    fn fail(mut self, err: &BotError) -> (ReplyMessage, RequestState) {
        error!("Request failed while {}: {}", self.state, err);
        self.advance(RequestState::Failed);
        (ReplyMessage::text(err.user_message()), self.state)
    }
}

/// The weather bot: wires the geocoder, weather source and imagery source
pub struct WeatherBot {
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherSource>,
    imagery: Arc<dyn ImagerySource>,
    gate: RegionGate,
    formatter: ResponseFormatter,
}

impl WeatherBot {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn WeatherSource>,
        imagery: Arc<dyn ImagerySource>,
        gate: RegionGate,
    ) -> Self {
        Self {
            geocoder,
            weather,
            imagery,
            gate,
            formatter: ResponseFormatter::new(),
        }
    }

    /// Build the bot with the Open-Meteo and HTTP imagery clients
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(OpenMeteoGeocoder::new(config.geocoding.clone())?),
            Arc::new(OpenMeteoWeatherClient::new(config.weather.clone())?),
            Arc::new(HttpSatelliteFetcher::new(&config.imagery)?),
            RegionGate::new(config.imagery.regions.clone()),
        ))
    }

    /// Handle a query, returning the reply and the terminal state
    #[instrument(skip(self))]
    pub async fn respond(&self, query: &str) -> (ReplyMessage, RequestState) {
        let mut progress = Progress::new();

        let parsed = LocationParser::parse(query);
        debug!("Parsed query as {:?}", parsed);
        match parsed {
            LocationQuery::Help => return progress.reply(ReplyMessage::text(HELP_TEXT)),
            LocationQuery::Empty => return progress.reply(ReplyMessage::text(UNRECOGNIZED_TEXT)),
            _ => {}
        }

        progress.advance(RequestState::Geocoding);
        let location = match self.locate(parsed).await {
            Ok(location) => location,
            Err(e) => return progress.fail(&e),
        };

        let region = match self.gate.match_region(&location) {
            Ok(region) => region,
            Err(e) => return progress.fail(&e),
        };

        progress.advance(RequestState::FetchingWeather);
        let image_fetch: OptionFuture<_> = region
            .as_ref()
            .map(|region| self.imagery.fetch_latest(region))
            .into();
        let (weather, image) =
            futures::join!(self.weather.get_conditions(&location), image_fetch);

        let report = match weather {
            Ok(report) => report,
            Err(e) => return progress.fail(&e),
        };

        // The image was fetched alongside the weather; only its outcome is handled here
        if region.is_some() {
            progress.advance(RequestState::FetchingImage);
        }
        let image = match image {
            Some(Ok(image)) => Some(image),
            Some(Err(e)) => {
                warn!("Sending reply without satellite image: {}", e);
                None
            }
            None => None,
        };

        progress.advance(RequestState::Formatting);
        let text = self.formatter.format(&report, &location);
        let reply = match image {
            Some(image) => ReplyMessage::with_image(text, image),
            None => ReplyMessage::text(text),
        };

        info!(
            "Replying for '{}' (attachment: {})",
            location.display_name,
            reply.has_attachment()
        );
        progress.reply(reply)
    }

    /// Turn a classified query into coordinates
    async fn locate(&self, query: LocationQuery) -> Result<ResolvedLocation> {
        match query {
            LocationQuery::Coordinates(latitude, longitude) => {
                ResolvedLocation::from_coordinates(latitude, longitude)
            }
            LocationQuery::Mgrs(reference) => match mgrs::to_lat_lon(&reference) {
                Ok((latitude, longitude)) => {
                    ResolvedLocation::new(latitude, longitude, reference, None)
                }
                Err(e) => {
                    debug!("MGRS decoding failed ({}), trying geocoder", e);
                    self.geocoder.resolve(&reference).await
                }
            },
            LocationQuery::PlaceName(name) => self.geocoder.resolve(&name).await,
            LocationQuery::Help | LocationQuery::Empty => {
                Err(BotError::location_not_found(""))
            }
        }
    }
}

#[async_trait]
impl MessageHandler for WeatherBot {
    async fn handle(&self, query: &str) -> ReplyMessage {
        self.respond(query).await.0
    }
}

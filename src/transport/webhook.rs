//! Webhook transport
//!
//! Messages arrive as `POST /messages` with `{"sender", "text"}` and are
//! acknowledged with `202 Accepted` right away. Each one is handled on its
//! own task and the reply is posted as JSON to the configured callback URL.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use super::{Outbound, dispatch};
use crate::bot::MessageHandler;
use crate::config::TransportConfig;
use crate::http;
use crate::models::ReplyMessage;

/// Inbound message body
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub sender: String,
    pub text: String,
}

/// Reply body posted to the callback URL
#[derive(Debug, Serialize)]
struct CallbackPayload<'a> {
    destination: &'a str,
    text: &'a str,
    title: Option<&'a str>,
    attachment: Option<CallbackAttachment<'a>>,
}

#[derive(Debug, Serialize)]
struct CallbackAttachment<'a> {
    /// Base64 (standard alphabet, padded)
    data: String,
    content_type: &'a str,
    file_name: &'a str,
    captured_at: DateTime<Utc>,
}

impl<'a> CallbackPayload<'a> {
    fn new(destination: &'a str, reply: &'a ReplyMessage) -> Self {
        Self {
            destination,
            text: &reply.text,
            title: reply.title.as_deref(),
            attachment: reply.attachment.as_ref().map(|image| CallbackAttachment {
                data: general_purpose::STANDARD.encode(&image.bytes),
                content_type: &image.content_type,
                file_name: &image.file_name,
                captured_at: image.captured_at,
            }),
        }
    }
}

/// Posts replies to a callback URL
pub struct WebhookOutbound {
    client: ClientWithMiddleware,
    callback_url: String,
}

impl WebhookOutbound {
    pub fn new(callback_url: impl Into<String>, timeout_seconds: u32) -> anyhow::Result<Self> {
        Ok(Self {
            client: http::build_client(timeout_seconds, 0)?,
            callback_url: callback_url.into(),
        })
    }
}

#[async_trait]
impl Outbound for WebhookOutbound {
    async fn send(&self, destination: &str, reply: &ReplyMessage) -> anyhow::Result<()> {
        let body = serde_json::to_vec(&CallbackPayload::new(destination, reply))
            .context("Failed to serialize reply")?;

        let response = self
            .client
            .post(&self.callback_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .with_context(|| format!("Failed to post reply to {}", self.callback_url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Callback {} answered HTTP {}", self.callback_url, status);
        }
        info!(
            "Delivered reply to '{}' (attachment: {})",
            destination,
            reply.has_attachment()
        );
        Ok(())
    }
}

/// Shared state of the webhook router
#[derive(Clone)]
pub struct WebhookState {
    pub handler: Arc<dyn MessageHandler>,
    pub outbound: Arc<dyn Outbound>,
    pub request_timeout: Duration,
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/messages", post(receive_message))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn receive_message(
    State(state): State<WebhookState>,
    Json(message): Json<InboundMessage>,
) -> StatusCode {
    if message.sender.trim().is_empty() {
        warn!("Rejecting message without sender");
        return StatusCode::BAD_REQUEST;
    }

    tokio::spawn(async move {
        if let Err(e) = dispatch(
            state.handler.as_ref(),
            state.outbound.as_ref(),
            &message.sender,
            &message.text,
            state.request_timeout,
        )
        .await
        {
            error!("Failed to deliver reply to '{}': {:#}", message.sender, e);
        }
    });

    StatusCode::ACCEPTED
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

/// Serve on `listener` until `shutdown` completes
pub async fn serve<F>(listener: TcpListener, state: WebhookState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Webhook server failed")
}

/// Bind `listen_addr` and serve until Ctrl-C or SIGTERM
pub async fn run(handler: Arc<dyn MessageHandler>, config: &TransportConfig) -> anyhow::Result<()> {
    let callback_url = config
        .callback_url
        .clone()
        .context("Webhook transport requires transport.callback_url")?;

    let state = WebhookState {
        handler,
        outbound: Arc::new(WebhookOutbound::new(
            callback_url,
            config.request_timeout_seconds,
        )?),
        request_timeout: Duration::from_secs(config.request_timeout_seconds.into()),
    };

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Webhook transport listening on http://{}", config.listen_addr);

    serve(listener, state, shutdown_signal()).await?;
    info!("Webhook transport stopped");
    Ok(())
}

/// Completes on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

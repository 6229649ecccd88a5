// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact relay service.
//!
//! A submission is rate limited first, then sanitized, validated, composed
//! into an email and handed to the configured [`MailSender`].

use crate::config::Config;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::mailer::MailSender;
use crate::message::{ContactMessage, ContactRequest, ContactSubmission};
use crate::metrics::{Metrics, Outcome};
use crate::validator::{ContactValidator, ValidationError};
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info, warn};

pub const SUCCESS_MESSAGE: &str = "Thank you for your message. I will get back to you soon.";
pub const SEND_FAILURE_MESSAGE: &str = "Failed to send message. Please try again later.";
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub validator: ContactValidator,
    pub mailer: Arc<dyn MailSender>,
    pub metrics: Metrics,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, mailer: Arc<dyn MailSender>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            limiter: RateLimiter::new(config.rate_limit.clone()),
            validator: ContactValidator::new(config.validation.clone()),
            mailer,
            metrics: Metrics::new()?,
            config,
        })
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Successful submission response.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Request-terminating failures and their HTTP mapping.
#[derive(Debug)]
pub enum ApiError {
    RateLimited { remaining_minutes: i64 },
    /// Body was not a JSON object of string fields.
    InvalidBody,
    Validation(ValidationError),
    MailSend,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidBody | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::MailSend => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::RateLimited { remaining_minutes } => format!(
                "Too many attempts. Please try again in {} minutes.",
                remaining_minutes
            ),
            Self::InvalidBody => INVALID_BODY_MESSAGE.to_string(),
            Self::Validation(err) => err.to_string(),
            Self::MailSend => SEND_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.message(),
        });
        match self {
            Self::RateLimited { remaining_minutes } => {
                let retry_secs = remaining_minutes.max(0) * 60;
                (status, [(header::RETRY_AFTER, retry_secs.to_string())], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "OK" })
}

/// Prometheus metrics endpoint.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Accept a contact form submission and relay it by email.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<ContactResponse>, ApiError> {
    let client = client_identifier(addr, &headers, state.config.trust_forwarded_for);

    let rate = state.limiter.check(&client).await;
    state.metrics.set_tracked_clients(state.limiter.len().await);
    if let RateLimitResult::Blocked { remaining_minutes } = rate {
        info!(%client, remaining_minutes, "Submission rate limited");
        state.metrics.record(Outcome::RateLimited);
        return Err(ApiError::RateLimited { remaining_minutes });
    }

    let Json(req) = payload.map_err(|rejection| {
        debug!(%client, error = %rejection.body_text(), "Unreadable submission body");
        state.metrics.record(Outcome::Invalid);
        ApiError::InvalidBody
    })?;

    let submission = ContactSubmission::from_request(&req);
    if let Some(first) = state.validator.validate(&submission).into_iter().next() {
        debug!(%client, error = %first, "Submission rejected");
        state.metrics.record(Outcome::Invalid);
        return Err(ApiError::Validation(first));
    }

    let message = ContactMessage::new(submission, client.as_str(), Utc::now());
    let email = message.to_email(&state.config.mail.username);

    if let Err(err) = state.mailer.send(&email).await {
        error!(%client, error = %err, "Failed to send contact email");
        state.metrics.record(Outcome::MailFailed);
        return Err(ApiError::MailSend);
    }

    info!(%client, "Contact email sent");
    state.metrics.record(Outcome::Sent);
    Ok(Json(ContactResponse {
        success: true,
        message: SUCCESS_MESSAGE,
    }))
}

/// Identify the client by peer address, or by the first forwarded hop when
/// the service runs behind a trusted proxy.
pub fn client_identifier(
    addr: SocketAddr,
    headers: &HeaderMap,
    trust_forwarded_for: bool,
) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(hop) = forwarded {
            return hop.to_string();
        }
    }
    addr.ip().to_string()
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring unparsable allowed origin");
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let mut app = Router::new()
        .route("/api/health", get(health))
        .route("/api/contact", post(contact));
    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics_handler));
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

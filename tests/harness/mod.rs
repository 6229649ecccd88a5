// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for the contact relay.
//!
//! Provides in-memory mail senders, request generators and helpers for
//! driving the router without a network listener.

#![allow(dead_code)]

pub mod generators;
pub mod mailers;

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
    Router,
};
use contact_relay::{config::Config, handlers::AppState, router, MailSender};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

/// Configuration suitable for tests: credentials filled in, defaults kept.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.mail.username = "site@example.com".to_string();
    config.mail.password = "secret".to_string();
    config
}

/// Build shared state and router around `mailer`.
pub fn app_with(config: Config, mailer: Arc<dyn MailSender>) -> (Arc<AppState>, Router) {
    let state = Arc::new(AppState::new(config, mailer).unwrap());
    let app = router(state.clone());
    (state, app)
}

/// POST `body` to `/api/contact` as if it came from `peer`.
pub async fn post_contact(app: &Router, peer: SocketAddr, body: &Value) -> (StatusCode, Value) {
    post_raw(app, peer, body.to_string()).await
}

/// POST an arbitrary body to `/api/contact` as JSON from `peer`.
pub async fn post_raw(app: &Router, peer: SocketAddr, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .extension(ConnectInfo(peer))
        .body(body.into())
        .unwrap();
    send(app, request).await
}

/// Issue a request and decode the JSON response body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

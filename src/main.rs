// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay Service
//!
//! Accepts contact form submissions on `POST /api/contact` and relays them
//! by email once they pass rate limiting and validation.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables, optionally seeded
//! from a `.env` file:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:3000)
//! - `PORT`: Overrides the port of `BIND_ADDR`
//! - `ALLOWED_ORIGIN`: Comma-separated CORS origins (default: http://localhost:3000)
//! - `EMAIL_USER` / `EMAIL_PASS`: SMTP account, used as sender and recipient (required)
//! - `SMTP_HOST` / `SMTP_PORT`: SMTP relay (default: smtp.gmail.com:465)
//! - `RATE_LIMIT_MAX`: Submissions per window (default: 3)
//! - `RATE_LIMIT_WINDOW_SECS`: Window and block length (default: 3600)
//! - `TRUST_FORWARDED_FOR`: Key clients by `X-Forwarded-For` (default: false)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_relay::{
    config::Config,
    handlers::{router, AppState},
    mailer::SmtpMailer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;
    let addr = config.socket_addr()?;
    info!(
        bind_addr = %addr,
        allowed_origins = ?config.allowed_origins,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        smtp_host = %config.mail.smtp_host,
        "Starting contact relay"
    );

    // Create application state
    let mailer = Arc::new(SmtpMailer::new(&config.mail)?);
    let state = Arc::new(AppState::new(config.clone(), mailer)?);

    // Spawn cleanup task
    let sweep_state = state.clone();
    let sweep_interval = config.rate_limit.sweep_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            sweep_state.limiter.sweep().await;
            sweep_state
                .metrics
                .set_tracked_clients(sweep_state.limiter.len().await);
        }
    });

    // Build router
    let app = router(state);

    // Start server
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

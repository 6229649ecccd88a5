// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay
//!
//! This crate provides the backend for a website contact form:
//!
//! - Per-client rate limiting (3 submissions per hour, then a one hour block)
//! - Markup stripping of every submitted field
//! - Field validation (name, email, optional phone, subject, message)
//! - Relay of accepted submissions by email through an SMTP account

pub mod config;
pub mod handlers;
pub mod limiter;
pub mod mailer;
pub mod message;
pub mod metrics;
pub mod sanitizer;
pub mod validator;

pub use config::Config;
pub use handlers::{router, AppState};
pub use limiter::{RateLimitResult, RateLimiter};
pub use mailer::{MailError, MailSender, OutgoingEmail, SmtpMailer};
pub use sanitizer::sanitize;
pub use validator::{ContactValidator, ValidationError};

// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact relay.
//!
//! Values come from environment variables (optionally seeded from a `.env`
//! file). Defaults match the published contact form policy: three
//! submissions per client per hour.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Upper bound for the rate limit window (one year).
pub const MAX_WINDOW_SECS: u64 = 366 * 24 * 3600;

/// Errors raised while assembling configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Invalid allowed origin: {0}")]
    InvalidOrigin(String),
}

/// Configuration for the contact relay service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:3000)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Origins allowed to post the form (CORS)
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Use the first `X-Forwarded-For` hop as client identifier
    #[serde(default)]
    pub trust_forwarded_for: bool,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Field validation limits
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Mail account used as sender and recipient
    #[serde(default)]
    pub mail: MailConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Per-client rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum submissions per window (default: 3)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Counting window and block length in seconds (default: 3600)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Maximum tracked identifiers before eviction (default: 10000)
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Interval between background sweeps in seconds (default: 300)
    #[serde(default = "default_sweep_secs")]
    pub sweep_interval_secs: u64,
}

/// Length limits applied by the validator. Bounds are inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_name_len")]
    pub name_len: (usize, usize),

    #[serde(default = "default_email_max_len")]
    pub email_max_len: usize,

    /// Digit count bounds for the optional phone number
    #[serde(default = "default_tel_digits")]
    pub tel_digits: (usize, usize),

    #[serde(default = "default_subject_len")]
    pub subject_len: (usize, usize),

    #[serde(default = "default_message_len")]
    pub message_len: (usize, usize),
}

/// SMTP account configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Account address, used as both From and To
    #[serde(default)]
    pub username: String,

    #[serde(default, skip_serializing)]
    pub password: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_max_requests() -> u32 {
    3
}

fn default_window_secs() -> u64 {
    3600 // 1 hour
}

fn default_max_entries() -> usize {
    10_000
}

fn default_sweep_secs() -> u64 {
    300
}

fn default_name_len() -> (usize, usize) {
    (2, 100)
}

fn default_email_max_len() -> usize {
    254 // RFC 5321 path limit
}

fn default_tel_digits() -> (usize, usize) {
    (7, 15) // E.164 allows at most 15
}

fn default_subject_len() -> (usize, usize) {
    (3, 200)
}

fn default_message_len() -> (usize, usize) {
    (10, 5000)
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            allowed_origins: default_allowed_origins(),
            trust_forwarded_for: false,
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            mail: MailConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            max_entries: default_max_entries(),
            sweep_interval_secs: default_sweep_secs(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            name_len: default_name_len(),
            email_max_len: default_email_max_len(),
            tel_digits: default_tel_digits(),
            subject_len: default_subject_len(),
            message_len: default_message_len(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the sweep interval
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Config {
    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(port) = lookup("PORT") {
            let port: u16 = parse_var("PORT", &port)?;
            let mut addr = parse_bind_addr(&config.bind_addr)?;
            addr.set_port(port);
            config.bind_addr = addr.to_string();
        }
        parse_bind_addr(&config.bind_addr)?;

        if let Some(origins) = lookup("ALLOWED_ORIGIN") {
            config.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        for origin in &config.allowed_origins {
            validate_origin(origin)?;
        }

        if let Some(v) = lookup("TRUST_FORWARDED_FOR") {
            config.trust_forwarded_for = parse_var("TRUST_FORWARDED_FOR", &v)?;
        }

        if let Some(v) = lookup("RATE_LIMIT_MAX") {
            config.rate_limit.max_requests = parse_var("RATE_LIMIT_MAX", &v)?;
        }
        if let Some(v) = lookup("RATE_LIMIT_WINDOW_SECS") {
            let secs: u64 = parse_var("RATE_LIMIT_WINDOW_SECS", &v)?;
            if secs == 0 || secs > MAX_WINDOW_SECS {
                return Err(ConfigError::InvalidValue {
                    var: "RATE_LIMIT_WINDOW_SECS",
                    value: v,
                });
            }
            config.rate_limit.window_secs = secs;
        }
        if let Some(v) = lookup("RATE_LIMIT_MAX_ENTRIES") {
            config.rate_limit.max_entries = parse_var("RATE_LIMIT_MAX_ENTRIES", &v)?;
        }
        if let Some(v) = lookup("RATE_LIMIT_SWEEP_SECS") {
            config.rate_limit.sweep_interval_secs = parse_var("RATE_LIMIT_SWEEP_SECS", &v)?;
        }

        if let Some(host) = lookup("SMTP_HOST") {
            config.mail.smtp_host = host;
        }
        if let Some(v) = lookup("SMTP_PORT") {
            config.mail.smtp_port = parse_var("SMTP_PORT", &v)?;
        }
        config.mail.username = lookup("EMAIL_USER")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingVar("EMAIL_USER"))?;
        config.mail.password = lookup("EMAIL_PASS")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingVar("EMAIL_PASS"))?;

        if let Some(v) = lookup("METRICS_ENABLED") {
            config.metrics.enabled = parse_var("METRICS_ENABLED", &v)?;
        }

        Ok(config)
    }

    /// Parsed socket address to listen on.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_bind_addr(&self.bind_addr)
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
    })
}

fn parse_bind_addr(addr: &str) -> Result<SocketAddr, ConfigError> {
    parse_var("BIND_ADDR", addr)
}

/// An origin is scheme + host (+ port), nothing else.
fn validate_origin(origin: &str) -> Result<(), ConfigError> {
    let parsed =
        url::Url::parse(origin).map_err(|_| ConfigError::InvalidOrigin(origin.to_string()))?;
    let bare = parsed.path() == "/" && parsed.query().is_none() && parsed.fragment().is_none();
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() || !bare {
        return Err(ConfigError::InvalidOrigin(origin.to_string()));
    }
    Ok(())
}

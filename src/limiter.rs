// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter keyed by client identifier.
//!
//! Each identifier may submit `max_requests` times per window. The request
//! that exceeds the limit blocks the identifier for one further window.
//! State lives in an explicitly owned map that is swept periodically and
//! capped at `max_entries` identifiers.

use crate::config::{RateLimitConfig, MAX_WINDOW_SECS};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed,
    /// Request is blocked
    Blocked {
        /// Whole minutes until the client may retry, rounded up
        remaining_minutes: i64,
    },
}

impl RateLimitResult {
    pub fn is_blocked(&self) -> bool {
        matches!(self, RateLimitResult::Blocked { .. })
    }
}

/// Per-identifier counting state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitEntry {
    /// Requests seen in the current window
    pub count: u32,
    /// Start of the current window
    pub first_attempt: DateTime<Utc>,
    /// Set once the limit is exceeded
    pub blocked_until: Option<DateTime<Utc>>,
}

impl RateLimitEntry {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            first_attempt: now,
            blocked_until: None,
        }
    }

    fn is_blocked_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.blocked_until, Some(until) if until > now)
    }

    fn window_expired_at(&self, now: DateTime<Utc>, window: ChronoDuration) -> bool {
        now - self.first_attempt > window
    }
}

/// Thread-safe rate limiter.
pub struct RateLimiter {
    /// Configuration
    config: RateLimitConfig,
    /// Window length, also used as the block length
    window: ChronoDuration,
    /// Per-identifier entries
    entries: Arc<RwLock<HashMap<String, RateLimitEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        let window = ChronoDuration::seconds(config.window_secs.min(MAX_WINDOW_SECS) as i64);
        Self {
            config,
            window,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check the rate limit for `identifier` against the wall clock.
    pub async fn check(&self, identifier: &str) -> RateLimitResult {
        self.check_at(identifier, Utc::now()).await
    }

    /// Check the rate limit for `identifier` at instant `now`.
    ///
    /// The whole read-modify-write runs under the write lock, so concurrent
    /// calls for one identifier observe each other's increments.
    pub async fn check_at(&self, identifier: &str, now: DateTime<Utc>) -> RateLimitResult {
        let mut entries = self.entries.write().await;

        let Some(entry) = entries.get_mut(identifier) else {
            if entries.len() >= self.config.max_entries {
                self.make_room(&mut entries, now);
            }
            entries.insert(identifier.to_string(), RateLimitEntry::fresh(now));
            return RateLimitResult::Allowed;
        };

        if let Some(until) = entry.blocked_until.filter(|until| *until > now) {
            let remaining_minutes = ceil_minutes(until - now);
            debug!(%identifier, remaining_minutes, "Client still blocked");
            return RateLimitResult::Blocked { remaining_minutes };
        }

        // An expired block only clears here, measured from the window start.
        if entry.window_expired_at(now, self.window) {
            *entry = RateLimitEntry::fresh(now);
            return RateLimitResult::Allowed;
        }

        entry.count += 1;
        if entry.count > self.config.max_requests {
            entry.blocked_until = Some(now + self.window);
            warn!(%identifier, count = entry.count, "Rate limit exceeded, blocking client");
            return RateLimitResult::Blocked {
                remaining_minutes: ceil_minutes(self.window),
            };
        }

        RateLimitResult::Allowed
    }

    /// Remove entries whose window has passed and which carry no active block.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Utc::now()).await
    }

    /// Sweep against instant `now`. Returns the number of entries removed.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let removed = sweep_entries(&mut entries, now, self.window);
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "Swept rate limit entries");
        }
        removed
    }

    /// Number of identifiers currently tracked.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Snapshot of the entry for `identifier`.
    pub async fn entry(&self, identifier: &str) -> Option<RateLimitEntry> {
        self.entries.read().await.get(identifier).cloned()
    }

    /// Drop stale entries, then the oldest unblocked one if still full.
    fn make_room(&self, entries: &mut HashMap<String, RateLimitEntry>, now: DateTime<Utc>) {
        sweep_entries(entries, now, self.window);
        if entries.len() < self.config.max_entries {
            return;
        }

        let victim = entries
            .iter()
            .filter(|(_, entry)| !entry.is_blocked_at(now))
            .min_by_key(|(_, entry)| entry.first_attempt)
            .or_else(|| entries.iter().min_by_key(|(_, entry)| entry.first_attempt))
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            debug!(evicted = %key, "Rate limit table full, evicting oldest entry");
            entries.remove(&key);
        }
    }
}

fn sweep_entries(
    entries: &mut HashMap<String, RateLimitEntry>,
    now: DateTime<Utc>,
    window: ChronoDuration,
) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| entry.is_blocked_at(now) || !entry.window_expired_at(now, window));
    before - entries.len()
}

/// Minutes in `d`, rounded up.
fn ceil_minutes(d: ChronoDuration) -> i64 {
    let millis = d.num_milliseconds();
    (millis + 59_999).div_euclid(60_000)
}

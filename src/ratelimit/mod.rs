// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Rate Limiting
//!
//! Fixed-window request counting per caller and tier.
//!
//! A window opens on a caller's first request and lasts `window`. Every
//! request in the window increments the counter; once the counter exceeds
//! the tier quota the request is rejected with the seconds left until the
//! window ends. The first request after the window ends opens a new one.
//!
//! Window state lives behind [`RateLimitStore`] so the counting policy does
//! not depend on where counters are kept. The only implementation is
//! process-local ([`InMemoryRateLimitStore`]).

pub mod middleware;
pub mod sweeper;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub use middleware::{caller_ip, protected_rate_limit, public_rate_limit};
pub use sweeper::RateLimitSweeper;

/// Counter state for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub count: u32,
    pub reset_at: Instant,
}

/// Storage for rate-limit windows.
pub trait RateLimitStore: Send + Sync + 'static {
    /// Count one request for `key`, opening a fresh window when none is
    /// active at `now`. Returns the window after counting.
    fn hit(&self, key: &str, now: Instant, window: Duration) -> Window;

    /// Drop windows that ended before `now`. Returns how many were removed.
    fn remove_expired(&self, now: Instant) -> usize;
}

/// Process-local window store.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    windows: Mutex<HashMap<String, Window>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    // A panic while holding the lock cannot leave a window half-written
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Window>> {
        self.windows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn hit(&self, key: &str, now: Instant, window: Duration) -> Window {
        let mut windows = self.lock();
        match windows.get_mut(key) {
            Some(entry) if now <= entry.reset_at => {
                entry.count = entry.count.saturating_add(1);
                *entry
            }
            _ => {
                let entry = Window {
                    count: 1,
                    reset_at: now + window,
                };
                windows.insert(key.to_string(), entry);
                entry
            }
        }
    }

    fn remove_expired(&self, now: Instant) -> usize {
        let mut windows = self.lock();
        let before = windows.len();
        windows.retain(|_, w| now <= w.reset_at);
        before - windows.len()
    }
}

/// Quota class applied to a route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitTier {
    /// Anonymous read endpoints
    Public,
    /// Endpoints behind bearer authentication
    Protected,
}

impl RateLimitTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitTier::Public => "public",
            RateLimitTier::Protected => "protected",
        }
    }

    /// Requests per window when not configured otherwise.
    pub const fn default_max_requests(&self) -> u32 {
        match self {
            RateLimitTier::Public => 300,
            RateLimitTier::Protected => 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub tier: RateLimitTier,
    pub max_requests: u32,
    pub window: Duration,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32 },
    Limited { retry_after_secs: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Applies one [`RateLimitPolicy`] over a shared store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    pub fn check(&self, caller: &str) -> RateLimitDecision {
        self.check_at(caller, Instant::now())
    }

    pub fn check_at(&self, caller: &str, now: Instant) -> RateLimitDecision {
        let key = format!("rate_limit:{}:{}", self.policy.tier.as_str(), caller);
        let window = self.store.hit(&key, now, self.policy.window);

        if window.count > self.policy.max_requests {
            let left = window.reset_at.saturating_duration_since(now);
            // Round up so callers never retry inside the window
            let retry_after_secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
            RateLimitDecision::Limited {
                retry_after_secs: retry_after_secs.max(1),
            }
        } else {
            RateLimitDecision::Allowed {
                remaining: self.policy.max_requests - window.count,
            }
        }
    }
}

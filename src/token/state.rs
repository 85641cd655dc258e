//! Shared coordinator state.
//!
//! # States
//! - Idle: lookups run, a refresh may start
//! - Refreshing: one refresh is in flight, newcomers join it
//! - CooldownBlocked: last refresh too recent, no new attempt
//! - RetriesExhausted: attempt budget spent until a success or reset
//!
//! # State Transitions
//! ```text
//! Idle → Idle:             lookup returns a token (retry_count = 0)
//! Idle → CooldownBlocked:  lookup empty, last refresh < cooldown ago
//! Idle → RetriesExhausted: lookup empty, retry_count >= max_retries
//! Idle → Refreshing:       lookup empty otherwise
//! Refreshing → Idle:       refresh finishes (success resets retry_count)
//! ```
//!
//! Blocked states are re-evaluated on every call.

use futures_util::future::{BoxFuture, Shared};
use serde::Serialize;
use tokio::time::{Duration, Instant};

/// Handle every concurrent caller awaits during a refresh.
pub(crate) type SharedRefresh = Shared<BoxFuture<'static, Option<String>>>;

/// Coarse view of where the coordinator is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Refreshing,
    CooldownBlocked,
    RetriesExhausted,
}

/// Mutable bookkeeping, only touched by the coordinator while it holds
/// the lock.
#[derive(Default)]
pub(crate) struct TokenState {
    /// Last token seen. Advisory only; never used to skip a lookup.
    pub token: Option<String>,
    /// When the latest refresh started, re-stamped when it finished.
    pub last_refresh_at: Option<Instant>,
    pub retry_count: u32,
    /// Present exactly while a refresh is in flight.
    pub in_flight: Option<SharedRefresh>,
    /// Bumped by reset so detached refreshes cannot write stale results.
    pub generation: u64,
}

impl TokenState {
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_cooldown(&self, now: Instant, cooldown: Duration) -> bool {
        self.last_refresh_at
            .is_some_and(|at| now.saturating_duration_since(at) < cooldown)
    }

    pub fn phase(&self, now: Instant, cooldown: Duration, max_retries: u32) -> Phase {
        if self.is_refreshing() {
            Phase::Refreshing
        } else if self.in_cooldown(now, cooldown) {
            Phase::CooldownBlocked
        } else if self.retry_count >= max_retries {
            Phase::RetriesExhausted
        } else {
            Phase::Idle
        }
    }

    /// Back to the initial state. The generation survives, incremented.
    pub fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    pub fn snapshot(&self, now: Instant, cooldown: Duration, max_retries: u32) -> TokenStateSnapshot {
        TokenStateSnapshot {
            phase: self.phase(now, cooldown, max_retries),
            has_token: self.token.is_some(),
            retry_count: self.retry_count,
            is_refreshing: self.is_refreshing(),
            since_last_refresh: self
                .last_refresh_at
                .map(|at| now.saturating_duration_since(at)),
        }
    }
}

/// Point-in-time view of the coordinator, safe to log (no token).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenStateSnapshot {
    pub phase: Phase,
    pub has_token: bool,
    pub retry_count: u32,
    pub is_refreshing: bool,
    pub since_last_refresh: Option<Duration>,
}

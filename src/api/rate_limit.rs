// src/api/rate_limit.rs
//! Client-side request pacing for the Notion API.
//!
//! Notion allows an average of three requests per second per integration.
//! Every API call in this crate funnels through [`RateLimiter::execute`],
//! which admits up to a configured number of calls per one-second window and
//! makes later callers wait for the next window.

use std::future::Future;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::constants::{DEFAULT_MAX_REQUESTS_PER_SECOND, RATE_LIMIT_WINDOW};

struct WindowState {
    max_requests: usize,
    window_started: Option<Instant>,
    admitted: usize,
}

/// Sliding one-second admission window.
///
/// The window is anchored at the first call admitted into it, not at wall
/// clock seconds: the first call opens a window, up to `max_requests` calls
/// are admitted within it, and the next caller sleeps until the window
/// closes, then opens a fresh one.
///
/// Waiters queue on an async mutex and are released in arrival order, so a
/// burst of queued calls drains fairly instead of racing for each new
/// window.
pub struct RateLimiter {
    state: Mutex<WindowState>,
}

impl RateLimiter {
    /// A limiter admitting `max_requests_per_second` calls per window.
    /// A limit of zero is treated as one so callers can never deadlock.
    pub fn new(max_requests_per_second: usize) -> Self {
        Self {
            state: Mutex::new(WindowState {
                max_requests: max_requests_per_second.max(1),
                window_started: None,
                admitted: 0,
            }),
        }
    }

    /// Suspends until the current window has room, then claims a slot.
    pub async fn admit(&self) {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        match state.window_started {
            Some(started) if now.duration_since(started) < RATE_LIMIT_WINDOW => {
                if state.admitted < state.max_requests {
                    state.admitted += 1;
                    return;
                }
                // Window is full. Sleeping while holding the lock keeps every
                // later caller queued behind this one in arrival order.
                let wait = RATE_LIMIT_WINDOW - now.duration_since(started);
                sleep(wait).await;
                state.window_started = Some(Instant::now());
                state.admitted = 1;
            }
            _ => {
                state.window_started = Some(now);
                state.admitted = 1;
            }
        }
    }

    /// Runs `operation` after a slot has been admitted.
    ///
    /// The slot is claimed before the operation starts; the operation's own
    /// duration does not count against the window.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.admit().await;
        operation().await
    }

    /// Changes the per-window limit.
    ///
    /// Joins the same queue as [`admit`], so the new limit applies from the
    /// next opened window onward rather than tearing up the current one.
    ///
    /// [`admit`]: RateLimiter::admit
    pub async fn set_max_requests_per_second(&self, max_requests_per_second: usize) {
        let mut state = self.state.lock().await;
        state.max_requests = max_requests_per_second.max(1);
    }

    pub async fn max_requests_per_second(&self) -> usize {
        self.state.lock().await.max_requests
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS_PER_SECOND)
    }
}

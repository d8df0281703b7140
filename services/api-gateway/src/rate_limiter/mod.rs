//! Fixed-Window Rate Limiter
//!
//! Counts admissions per (caller key, route) in fixed windows. A window is
//! restarted lazily the first time it is checked after its duration has
//! elapsed; there is no background sweep.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Entry points with independent limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitedRoute {
    /// `POST /auth/login`
    Login,
    /// `POST /auth/verify`
    Verify,
    /// `GET /auth/me`
    Me,
    /// `/api/assets`
    Assets,
    /// `/api/files`
    Files,
    /// `/api/transcode`
    Transcode,
    /// `/api/search`
    Search,
    /// `GET /api/status`
    Status,
}

impl LimitedRoute {
    /// Label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Verify => "verify",
            Self::Me => "me",
            Self::Assets => "assets",
            Self::Files => "files",
            Self::Transcode => "transcode",
            Self::Search => "search",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for LimitedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rate limit decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request admitted
    Allowed {
        /// Limit of the window
        limit: u32,
        /// Admissions left in the current window
        remaining: u32,
    },
    /// Request denied until the window rolls over
    Denied {
        /// Time until the current window ends
        retry_after: Duration,
    },
}

impl RateLimitDecision {
    /// Whether the request was admitted.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Per-route limits, in requests per window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// `POST /auth/login`
    pub login: u32,
    /// `POST /auth/verify`
    pub verify: u32,
    /// `GET /auth/me`
    pub me: u32,
    /// Assets proxy
    pub assets: u32,
    /// Files proxy
    pub files: u32,
    /// Transcode proxy
    pub transcode: u32,
    /// Search proxy
    pub search: u32,
    /// `GET /api/status`
    pub status: u32,
    /// Window duration shared by every route
    pub window: Duration,
    /// Tracked windows above which expired ones are evicted
    pub max_tracked_keys: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login: 10,
            verify: 100,
            me: 100,
            assets: 100,
            files: 50,
            transcode: 30,
            search: 200,
            status: 50,
            window: Duration::from_secs(60),
            max_tracked_keys: 10_000,
        }
    }
}

impl RateLimitConfig {
    /// Limit for `route`.
    #[must_use]
    pub const fn limit_for(&self, route: LimitedRoute) -> u32 {
        match route {
            LimitedRoute::Login => self.login,
            LimitedRoute::Verify => self.verify,
            LimitedRoute::Me => self.me,
            LimitedRoute::Assets => self.assets,
            LimitedRoute::Files => self.files,
            LimitedRoute::Transcode => self.transcode,
            LimitedRoute::Search => self.search,
            LimitedRoute::Status => self.status,
        }
    }
}

/// Counter state for one (caller key, route) pair.
#[derive(Debug, Clone, Copy)]
struct RateLimitWindow {
    window_start: Instant,
    count: u32,
}

impl RateLimitWindow {
    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }
}

/// Tracked windows plus a lower bound on their earliest start.
///
/// `oldest_start` may lag behind the true minimum after a window restarts;
/// it is only ever used to decide whether an eviction scan can free anything.
#[derive(Debug, Default)]
struct WindowTable {
    windows: HashMap<(String, LimitedRoute), RateLimitWindow>,
    oldest_start: Option<Instant>,
}

impl WindowTable {
    /// Drop expired windows, scanning only when at least one can have expired.
    fn evict_expired(&mut self, now: Instant, window: Duration) {
        let Some(oldest) = self.oldest_start else {
            return;
        };
        if now.saturating_duration_since(oldest) < window {
            return;
        }

        self.windows.retain(|_, w| !w.is_expired(now, window));
        self.oldest_start = self.windows.values().map(|w| w.window_start).min();
    }

    /// Time until the earliest tracked window can be evicted.
    fn time_until_eviction(&self, now: Instant, window: Duration) -> Duration {
        self.oldest_start
            .and_then(|oldest| window.checked_sub(now.saturating_duration_since(oldest)))
            .filter(|d| !d.is_zero())
            .unwrap_or(Duration::from_secs(1))
    }
}

/// Fixed-window rate limiter.
///
/// All counters sit behind one lock, so every admission check observes and
/// updates a consistent (count, window start) pair. At most
/// `max_tracked_keys` windows are held; a caller without a window is denied
/// while the table is full of live windows.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    table: Mutex<WindowTable>,
}

impl RateLimiter {
    /// Limiter with every window empty.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            table: Mutex::new(WindowTable::default()),
        }
    }

    /// Limits this limiter enforces.
    pub const fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit or deny one request from `key` to `route` at `now`.
    ///
    /// Denied requests do not consume budget.
    pub fn admit(&self, key: &str, route: LimitedRoute, now: Instant) -> RateLimitDecision {
        let limit = self.config.limit_for(route);
        let window = self.config.window;
        let mut table = self.table.lock();

        let map_key = (key.to_string(), route);
        if !table.windows.contains_key(&map_key) {
            if table.windows.len() >= self.config.max_tracked_keys {
                table.evict_expired(now, window);
            }
            if table.windows.len() >= self.config.max_tracked_keys {
                return RateLimitDecision::Denied {
                    retry_after: table.time_until_eviction(now, window),
                };
            }
            if table.oldest_start.is_none() {
                table.oldest_start = Some(now);
            }
        }

        let state = table.windows.entry(map_key).or_insert(RateLimitWindow {
            window_start: now,
            count: 0,
        });

        if state.is_expired(now, window) {
            state.window_start = now;
            state.count = 0;
        }

        if state.count >= limit {
            let elapsed = now.saturating_duration_since(state.window_start);
            let retry_after = window
                .checked_sub(elapsed)
                .filter(|d| !d.is_zero())
                .unwrap_or(Duration::from_secs(1));
            return RateLimitDecision::Denied { retry_after };
        }

        state.count += 1;
        RateLimitDecision::Allowed {
            limit,
            remaining: limit - state.count,
        }
    }

    /// Number of windows currently tracked.
    pub fn tracked_windows(&self) -> usize {
        self.table.lock().windows.len()
    }
}

//! Rate Limiter Property Tests
//!
//! Validates rate limiting enforcement.

use std::time::{Duration, Instant};

use api_gateway::rate_limiter::{LimitedRoute, RateLimitConfig, RateLimitDecision, RateLimiter};
use proptest::prelude::*;

use super::generators::arb_caller_key;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: at most `limit` admissions per window, remaining counts down
    #[test]
    fn prop_admissions_bounded_by_limit(
        limit in 1u32..50,
        attempts in 1usize..120,
        caller in arb_caller_key(),
        offsets in prop::collection::vec(0u64..59_000, 120),
    ) {
        let limiter = RateLimiter::new(RateLimitConfig { login: limit, ..RateLimitConfig::default() });
        let start = Instant::now();
        let mut offsets: Vec<_> = offsets.into_iter().take(attempts).collect();
        offsets.sort_unstable();

        let mut admitted = 0u32;
        for offset in offsets {
            match limiter.admit(&caller, LimitedRoute::Login, start + Duration::from_millis(offset)) {
                RateLimitDecision::Allowed { limit: reported, remaining } => {
                    admitted += 1;
                    prop_assert_eq!(reported, limit);
                    prop_assert_eq!(remaining, limit - admitted);
                }
                RateLimitDecision::Denied { retry_after } => {
                    prop_assert!(admitted == limit);
                    prop_assert!(retry_after >= Duration::from_secs(1));
                    prop_assert!(retry_after <= Duration::from_secs(60));
                }
            }
        }

        prop_assert_eq!(admitted, limit.min(attempts as u32));
    }

    /// Property: a full window always restores the whole budget
    #[test]
    fn prop_budget_restored_after_window(limit in 1u32..20, caller in arb_caller_key()) {
        let limiter = RateLimiter::new(RateLimitConfig { verify: limit, ..RateLimitConfig::default() });
        let start = Instant::now();

        for _ in 0..=limit {
            limiter.admit(&caller, LimitedRoute::Verify, start);
        }

        let later = start + Duration::from_secs(60);
        prop_assert_eq!(
            limiter.admit(&caller, LimitedRoute::Verify, later),
            RateLimitDecision::Allowed { limit, remaining: limit - 1 }
        );
    }

    /// Property: tracked windows never exceed the configured capacity
    #[test]
    fn prop_tracked_windows_bounded(
        capacity in 1usize..16,
        callers in prop::collection::vec((arb_caller_key(), 0u64..180), 1..80),
    ) {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_tracked_keys: capacity,
            ..RateLimitConfig::default()
        });
        let start = Instant::now();
        let mut callers = callers;
        callers.sort_by_key(|(_, offset)| *offset);

        for (caller, offset) in callers {
            limiter.admit(&caller, LimitedRoute::Search, start + Duration::from_secs(offset));
            prop_assert!(limiter.tracked_windows() <= capacity);
        }
    }
}

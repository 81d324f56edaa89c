use axum::http::HeaderMap;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::metrics::{SWEPT_ENTRIES, TRACKED_CLIENTS};

// Key used when no address header is present. Never rate limited.
pub const UNKNOWN_CLIENT: &str = "unknown-ip";

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,         // allowed per window
    pub window: Duration,          // fixed window length
    pub emit_headers: bool,        // X-RateLimit-* on accepted responses
    pub path_prefixes: Vec<String>, // only these paths are gated
    pub max_tracked_clients: usize, // eager sweep once reached
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window: Duration::from_millis(1000),
            emit_headers: true,
            path_prefixes: vec!["/api/".to_string()],
            max_tracked_clients: 10_000,
        }
    }
}

impl RateLimitConfig {
    pub fn applies_to(&self, path: &str) -> bool {
        self.path_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

// Request accounting for one client in its current window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub count: u32,
    pub limit: u32,
    pub reset_at: DateTime<Utc>,
}

impl Admission {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub limit: u32,
    pub retry_after_secs: u64,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    // client could not be identified, let it through
    Unidentified,
    Allowed(Admission),
    Rejected(Rejection),
}

// Fixed-window counter per client. The shard lock is held across
// read-increment-compare.
pub struct RateLimiter {
    config: RateLimitConfig,
    window: TimeDelta,
    entries: DashMap<String, RateLimitEntry>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let window = TimeDelta::from_std(config.window).unwrap_or(TimeDelta::MAX);
        Self {
            config,
            window,
            entries: DashMap::new(),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn tracked_clients(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, client_key: &str) -> Option<RateLimitEntry> {
        self.entries.get(client_key).map(|e| *e.value())
    }

    pub fn check(&self, client_key: &str, now: DateTime<Utc>) -> Decision {
        if client_key == UNKNOWN_CLIENT {
            return Decision::Unidentified;
        }

        if self.entries.len() >= self.config.max_tracked_clients
            && !self.entries.contains_key(client_key)
        {
            let removed = self.sweep(now);
            SWEPT_ENTRIES.inc_by(removed as f64);
            TRACKED_CLIENTS.set(self.entries.len() as f64);
            if self.entries.len() >= self.config.max_tracked_clients {
                warn!(
                    tracked = self.entries.len(),
                    removed, "Rate limiter still at capacity after sweep"
                );
            }
        }

        let reset_at = now
            .checked_add_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let entry = {
            let mut entry = self
                .entries
                .entry(client_key.to_string())
                .or_insert(RateLimitEntry {
                    count: 0,
                    window_reset_at: reset_at,
                });

            // window expired..? start a fresh one
            if now > entry.window_reset_at {
                *entry = RateLimitEntry {
                    count: 0,
                    window_reset_at: reset_at,
                };
            }

            entry.count = entry.count.saturating_add(1);
            *entry
        };

        if entry.count > self.config.max_requests {
            let wait = (entry.window_reset_at - now).num_seconds().max(0) as u64;
            Decision::Rejected(Rejection {
                limit: self.config.max_requests,
                retry_after_secs: wait,
                reset_at: entry.window_reset_at,
            })
        } else {
            Decision::Allowed(Admission {
                count: entry.count,
                limit: self.config.max_requests,
                reset_at: entry.window_reset_at,
            })
        }
    }

    // Drops entries whose window ended before `now`
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = entry.window_reset_at >= now;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}

// CF-Connecting-IP, then X-Real-IP, then first hop of X-Forwarded-For
pub fn identify_client(headers: &HeaderMap) -> String {
    header_value(headers, "cf-connecting-ip")
        .or_else(|| header_value(headers, "x-real-ip"))
        .or_else(|| {
            header_value(headers, "x-forwarded-for")
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        })
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

// Epoch seconds of the reset instant, rounded up
pub fn reset_epoch_secs(reset_at: DateTime<Utc>) -> i64 {
    let millis = reset_at.timestamp_millis();
    millis.div_euclid(1000) + i64::from(millis.rem_euclid(1000) != 0)
}

// Background sweep - runs every `every`
pub async fn sweeper(limiter: Arc<RateLimiter>, every: Duration) {
    let mut interval = interval(every);
    // first tick fires immediately
    interval.tick().await;

    info!(interval = ?every, "Rate limit sweeper started");

    loop {
        interval.tick().await;

        let removed = limiter.sweep(Utc::now());
        let remaining = limiter.tracked_clients();
        SWEPT_ENTRIES.inc_by(removed as f64);
        TRACKED_CLIENTS.set(remaining as f64);

        debug!(removed, remaining, "Swept expired rate limit entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::TimeZone;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn limiter(max_requests: u32, window_ms: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_millis(window_ms),
            ..RateLimitConfig::default()
        })
    }

    #[test]
    fn sixth_request_in_window_is_rejected() {
        let limiter = limiter(5, 1000);
        let start = at(1_000_000);

        for expected in 1..=5 {
            match limiter.check("10.0.0.1", start) {
                Decision::Allowed(admission) => {
                    assert_eq!(admission.count, expected);
                    assert_eq!(admission.limit, 5);
                    assert_eq!(admission.remaining(), 5 - expected);
                    assert_eq!(admission.reset_at, at(1_001_000));
                }
                other => panic!("request {} not admitted: {:?}", expected, other),
            }
        }

        match limiter.check("10.0.0.1", at(1_000_250)) {
            Decision::Rejected(rejection) => {
                assert_eq!(rejection.limit, 5);
                assert_eq!(rejection.retry_after_secs, 0);
                assert_eq!(rejection.reset_at, at(1_001_000));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn retry_after_is_floored_to_seconds() {
        let limiter = limiter(1, 10_000);
        let _ = limiter.check("k", at(0));
        match limiter.check("k", at(1_500)) {
            Decision::Rejected(rejection) => assert_eq!(rejection.retry_after_secs, 8),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = limiter(1, 1000);
        assert!(matches!(limiter.check("a", at(0)), Decision::Allowed(_)));
        assert!(matches!(limiter.check("b", at(0)), Decision::Allowed(_)));
        assert!(matches!(limiter.check("a", at(1)), Decision::Rejected(_)));
    }

    #[test]
    fn window_rollover_resets_count() {
        let limiter = limiter(2, 1000);
        for _ in 0..3 {
            let _ = limiter.check("k", at(0));
        }
        assert!(matches!(limiter.check("k", at(1000)), Decision::Rejected(_)));

        match limiter.check("k", at(1001)) {
            Decision::Allowed(admission) => {
                assert_eq!(admission.count, 1);
                assert_eq!(admission.reset_at, at(2001));
            }
            other => panic!("expected fresh window, got {:?}", other),
        }
    }

    #[test]
    fn unidentified_clients_fail_open() {
        let limiter = limiter(1, 60_000);
        for _ in 0..100 {
            assert_eq!(limiter.check(UNKNOWN_CLIENT, at(0)), Decision::Unidentified);
        }
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn sweep_only_removes_expired_entries() {
        let limiter = limiter(5, 1000);
        let _ = limiter.check("old", at(0));
        let _ = limiter.check("edge", at(500));
        let _ = limiter.check("fresh", at(2000));
        let _ = limiter.check("fresh", at(2100));

        let fresh_before = limiter.entry("fresh").unwrap();
        let edge_before = limiter.entry("edge").unwrap();

        assert_eq!(limiter.sweep(at(1500)), 1);
        assert!(limiter.entry("old").is_none());
        assert_eq!(limiter.entry("edge"), Some(edge_before));
        assert_eq!(limiter.entry("fresh"), Some(fresh_before));
        assert_eq!(fresh_before.count, 2);
    }

    #[test]
    fn capacity_triggers_eager_sweep() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_tracked_clients: 2,
            ..RateLimitConfig::default()
        });
        let _ = limiter.check("a", at(0));
        let _ = limiter.check("b", at(0));
        assert_eq!(limiter.tracked_clients(), 2);

        let swept_before = SWEPT_ENTRIES.get();
        let _ = limiter.check("c", at(5_000));
        assert_eq!(limiter.tracked_clients(), 1);
        assert!(limiter.entry("c").is_some());
        // counter is process-wide, other tests may add to it
        assert!(SWEPT_ENTRIES.get() >= swept_before + 2.0);
    }

    #[test]
    fn concurrent_checks_admit_exactly_the_limit() {
        let limiter = limiter(5, 60_000);
        let now = at(0);

        let allowed: usize = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        (0..8)
                            .filter(|_| {
                                matches!(limiter.check("1.2.3.4", now), Decision::Allowed(_))
                            })
                            .count()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).sum()
        });

        assert_eq!(allowed, 5);
        assert_eq!(limiter.entry("1.2.3.4").unwrap().count, 64);
    }

    #[test]
    fn client_key_priority() {
        let mut headers = HeaderMap::new();
        assert_eq!(identify_client(&headers), UNKNOWN_CLIENT);

        headers.insert("x-forwarded-for", HeaderValue::from_static(" 1.1.1.1 , 2.2.2.2"));
        assert_eq!(identify_client(&headers), "1.1.1.1");

        headers.insert("x-real-ip", HeaderValue::from_static("3.3.3.3"));
        assert_eq!(identify_client(&headers), "3.3.3.3");

        headers.insert("cf-connecting-ip", HeaderValue::from_static("4.4.4.4"));
        assert_eq!(identify_client(&headers), "4.4.4.4");

        headers.insert("cf-connecting-ip", HeaderValue::from_static(""));
        assert_eq!(identify_client(&headers), "3.3.3.3");
    }

    #[test]
    fn malformed_forwarded_for_falls_back_to_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" , 5.5.5.5"));
        assert_eq!(identify_client(&headers), UNKNOWN_CLIENT);
    }

    #[test]
    fn path_prefixes_gate_only_api_routes() {
        let config = RateLimitConfig::default();
        assert!(config.applies_to("/api/quotes"));
        assert!(config.applies_to("/api/quotes/random"));
        assert!(!config.applies_to("/health"));
        assert!(!config.applies_to("/apis"));
    }

    #[test]
    fn reset_epoch_rounds_up() {
        assert_eq!(reset_epoch_secs(at(5_000)), 5);
        assert_eq!(reset_epoch_secs(at(5_001)), 6);
    }
}

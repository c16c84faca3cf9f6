use dashmap::{DashMap, mapref::entry::Entry};
use std::time::{Duration, Instant};

use crate::error::LimitError;
use crate::metrics::RATE_LIMIT_KEYS;

pub const DEFAULT_MAX_REQUESTS: u32 = 100;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5 * 60);

// Rate limit entry - tracks requests per client key in the current window
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_start: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit { remaining: u32 },
    Reject { retry_after: Duration },
}

#[cfg(test)]
impl Decision {
    pub fn is_admit(&self) -> bool {
        matches!(self, Decision::Admit { .. })
    }
}

// Fixed window per client key, checked and bumped under the key's shard guard
pub struct RateLimiter {
    config: LimiterConfig,
    entries: DashMap<String, RateLimitEntry>,
}

impl RateLimiter {
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
        }
    }

    pub fn check(&self, key: &str, now: Instant) -> Decision {
        // only this key's shard is locked; the gauge moves on first sight of a key
        let mut entry = match self.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) => occupied.into_ref(),
            Entry::Vacant(vacant) => {
                RATE_LIMIT_KEYS.inc();
                vacant.insert(RateLimitEntry {
                    count: 0,
                    window_start: now,
                })
            }
        };

        // window expired..? start a fresh one
        if now.saturating_duration_since(entry.window_start) >= self.config.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count = entry.count.saturating_add(1);

        if entry.count > self.config.max_requests {
            let elapsed = now.saturating_duration_since(entry.window_start);
            Decision::Reject {
                retry_after: self.config.window.saturating_sub(elapsed),
            }
        } else {
            Decision::Admit {
                remaining: self.config.max_requests - entry.count,
            }
        }
    }

    // Same as `check`, but as a Result for the middleware
    pub fn admit(&self, key: &str, now: Instant) -> Result<u32, LimitError> {
        match self.check(key, now) {
            Decision::Admit { remaining } => Ok(remaining),
            Decision::Reject { retry_after } => Err(LimitError::Exceeded {
                limit: self.config.max_requests,
                // round up so clients never retry a moment too early
                retry_after: retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0),
            }),
        }
    }

    #[cfg(test)]
    pub fn tracked_keys(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, mpsc};

    fn limiter(max_requests: u32, window: Duration) -> RateLimiter {
        RateLimiter::new(LimiterConfig {
            max_requests,
            window,
        })
    }

    #[test]
    fn admits_up_to_max_then_rejects() {
        let limiter = limiter(2, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check("10.0.0.1", now).is_admit());
        assert!(limiter.check("10.0.0.1", now).is_admit());
        assert!(!limiter.check("10.0.0.1", now).is_admit());
    }

    #[test]
    fn request_n_plus_one_rejected_only_past_max() {
        let now = Instant::now();
        for max in 1..=5 {
            let limiter = limiter(max, Duration::from_secs(60));
            for n in 1..=max + 3 {
                let admitted = limiter.check("client", now).is_admit();
                assert_eq!(admitted, n <= max, "max={max} request={n}");
            }
        }
    }

    #[test]
    fn remaining_counts_down() {
        let limiter = limiter(3, Duration::from_secs(60));
        let now = Instant::now();

        assert_eq!(limiter.check("k", now), Decision::Admit { remaining: 2 });
        assert_eq!(limiter.check("k", now), Decision::Admit { remaining: 1 });
        assert_eq!(limiter.check("k", now), Decision::Admit { remaining: 0 });
    }

    #[test]
    fn window_resets_after_full_duration() {
        let window = Duration::from_secs(60);
        let limiter = limiter(2, window);
        let start = Instant::now();

        for _ in 0..10 {
            limiter.check("k", start);
        }
        assert!(!limiter.check("k", start + window - Duration::from_millis(1)).is_admit());

        // exactly one window later counts as a fresh window
        assert_eq!(
            limiter.check("k", start + window),
            Decision::Admit { remaining: 1 }
        );
    }

    #[test]
    fn keys_are_isolated() {
        let limiter = limiter(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check("10.0.0.1", now).is_admit());
        assert!(!limiter.check("10.0.0.1", now).is_admit());
        assert!(limiter.check("10.0.0.2", now).is_admit());
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn reject_reports_time_left_in_window() {
        let limiter = limiter(1, Duration::from_secs(60));
        let start = Instant::now();

        limiter.check("k", start);
        assert_eq!(
            limiter.check("k", start + Duration::from_secs(20)),
            Decision::Reject {
                retry_after: Duration::from_secs(40)
            }
        );
        assert_eq!(
            limiter.admit("k", start + Duration::from_millis(20_500)),
            Err(LimitError::Exceeded {
                limit: 1,
                retry_after: 40
            })
        );
    }

    #[test]
    fn concurrent_checks_admit_exactly_max() {
        let limiter = Arc::new(limiter(50, Duration::from_secs(60)));
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..25)
                        .filter(|_| limiter.check("shared", now).is_admit())
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
    }

    #[test]
    fn held_key_does_not_block_other_shards() {
        let limiter = Arc::new(limiter(10, Duration::from_secs(60)));
        let now = Instant::now();
        limiter.check("a", now);

        let guard = limiter.entries.get_mut("a").unwrap();
        let other = (0..1_000)
            .map(|i| format!("k{i}"))
            .find(|key| !limiter.entries.try_get(key.as_str()).is_locked())
            .unwrap();

        let (tx, rx) = mpsc::channel();
        let worker = {
            let limiter = Arc::clone(&limiter);
            std::thread::spawn(move || {
                let decision = limiter.check(&other, now);
                tx.send(decision).unwrap();
            })
        };

        let decision = rx.recv_timeout(Duration::from_secs(2));
        drop(guard);
        worker.join().unwrap();

        assert_eq!(decision, Ok(Decision::Admit { remaining: 9 }));
    }

    #[test]
    fn default_config() {
        let config = LimiterConfig::default();
        assert_eq!(config.max_requests, 100);
        assert_eq!(config.window, Duration::from_secs(300));
    }
}

use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::error::Rejection;

// Burst window - tracks requests per IP
pub struct RateWindow {
    pub count: u32,
    pub window_start: Instant,
}

/// Short-window limiter. An IP that exceeds `limit` requests inside one
/// window lands in the block set and is refused until the block lifts
/// (never, unless a block duration is configured).
pub struct BurstLimiter {
    windows: DashMap<String, RateWindow>,
    blocked: DashMap<String, Instant>,
    limit: u32,
    window: Duration,
    block_for: Option<Duration>,
}

impl BurstLimiter {
    pub fn new(limit: u32, window: Duration, block_for: Option<Duration>) -> Self {
        Self {
            windows: DashMap::new(),
            blocked: DashMap::new(),
            limit,
            window,
            block_for,
        }
    }

    pub fn check(&self, ip: &str) -> Result<(), Rejection> {
        self.check_at(ip, Instant::now())
    }

    pub fn check_at(&self, ip: &str, now: Instant) -> Result<(), Rejection> {
        if self.is_blocked_at(ip, now) {
            return Err(Rejection::BurstBlocked);
        }

        let mut entry = self.windows.entry(ip.to_string()).or_insert(RateWindow {
            count: 0,
            window_start: now,
        });

        // window expired..? restart it
        if entry.count == 0 || now.saturating_duration_since(entry.window_start) >= self.window {
            entry.count = 1;
            entry.window_start = now;
            return Ok(());
        }

        entry.count += 1;
        if entry.count > self.limit {
            drop(entry);
            self.blocked.insert(ip.to_string(), now);
            tracing::warn!(%ip, limit = self.limit, "burst limit exceeded, blocking ip");
            return Err(Rejection::BurstBlocked);
        }

        Ok(())
    }

    pub fn is_blocked(&self, ip: &str) -> bool {
        self.is_blocked_at(ip, Instant::now())
    }

    fn is_blocked_at(&self, ip: &str, now: Instant) -> bool {
        let Some(since) = self.blocked.get(ip).map(|b| *b) else {
            return false;
        };
        match self.block_for {
            Some(duration) if now.saturating_duration_since(since) >= duration => {
                self.blocked.remove(ip);
                self.windows.remove(ip);
                tracing::info!(%ip, "burst block expired");
                false
            }
            _ => true,
        }
    }

    pub fn unblock(&self, ip: &str) {
        self.blocked.remove(ip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn sixth_request_in_window_blocks_for_good() {
        let limiter = BurstLimiter::new(5, SECOND, None);
        let start = Instant::now();

        for i in 0..5 {
            let at = start + Duration::from_millis(i * 100);
            assert!(limiter.check_at("1.2.3.4", at).is_ok(), "request {i}");
        }
        assert_eq!(
            limiter.check_at("1.2.3.4", start + Duration::from_millis(600)),
            Err(Rejection::BurstBlocked)
        );

        // still refused long after the window closed
        assert_eq!(
            limiter.check_at("1.2.3.4", start + Duration::from_secs(3600)),
            Err(Rejection::BurstBlocked)
        );
        assert!(limiter.is_blocked("1.2.3.4"));
        assert!(limiter.check_at("5.6.7.8", start).is_ok());
    }

    #[test]
    fn window_restarts_after_it_elapses() {
        let limiter = BurstLimiter::new(5, SECOND, None);
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check_at("ip", start).is_ok());
        }
        let later = start + SECOND;
        for _ in 0..5 {
            assert!(limiter.check_at("ip", later).is_ok());
        }
        assert!(limiter.check_at("ip", later).is_err());
    }

    #[test]
    fn configured_block_duration_lifts_block() {
        let limiter = BurstLimiter::new(1, SECOND, Some(Duration::from_secs(60)));
        let start = Instant::now();

        assert!(limiter.check_at("ip", start).is_ok());
        assert!(limiter.check_at("ip", start).is_err());
        assert!(limiter.check_at("ip", start + Duration::from_secs(30)).is_err());
        assert!(limiter.check_at("ip", start + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn unblock_clears_block_set_entry() {
        let limiter = BurstLimiter::new(1, SECOND, None);
        let start = Instant::now();
        let _ = limiter.check_at("ip", start);
        let _ = limiter.check_at("ip", start);
        assert!(limiter.is_blocked("ip"));

        limiter.unblock("ip");
        assert!(!limiter.is_blocked("ip"));
    }
}

//! Login rate limiter
//!
//! Two sliding windows guard `POST /auth/login`:
//! - failed attempts per account identifier (email): 5 per 15 minutes
//! - requests per client IP: 10 per minute
//!
//! State lives in memory and is pruned by a periodic task.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::net::IpAddr;
use tokio::sync::RwLock;

/// A sliding-window limit
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub max_hits: usize,
    pub period: Duration,
}

impl Window {
    pub const fn new(max_hits: usize, period: Duration) -> Self {
        Self { max_hits, period }
    }
}

/// Why a login was refused, and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throttle {
    Identifier { retry_after_secs: i64 },
    Ip { retry_after_secs: i64 },
}

impl Throttle {
    pub fn retry_after_secs(&self) -> i64 {
        match self {
            Throttle::Identifier { retry_after_secs } | Throttle::Ip { retry_after_secs } => {
                *retry_after_secs
            }
        }
    }
}

struct Tracker<K> {
    window: Window,
    hits: RwLock<HashMap<K, Vec<DateTime<Utc>>>>,
}

impl<K: Eq + Hash + Clone> Tracker<K> {
    fn new(window: Window) -> Self {
        Self {
            window,
            hits: RwLock::new(HashMap::new()),
        }
    }

    /// Seconds until the oldest hit leaves the window, if the key is over the limit
    async fn blocked_for(&self, key: &K, now: DateTime<Utc>) -> Option<i64> {
        let mut hits = self.hits.write().await;
        let cutoff = now - self.window.period;
        let entry = hits.get_mut(key)?;
        entry.retain(|t| *t > cutoff);
        if entry.len() < self.window.max_hits {
            return None;
        }
        let oldest = entry.iter().min().copied().unwrap_or(now);
        Some(((oldest + self.window.period) - now).num_seconds().max(1))
    }

    async fn record(&self, key: K, now: DateTime<Utc>) {
        self.hits.write().await.entry(key).or_default().push(now);
    }

    async fn clear(&self, key: &K) {
        self.hits.write().await.remove(key);
    }

    async fn prune(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.window.period;
        let mut hits = self.hits.write().await;
        hits.retain(|_, times| {
            times.retain(|t| *t > cutoff);
            !times.is_empty()
        });
        hits.len()
    }
}

/// Login rate limiter
pub struct LoginRateLimiter {
    identifiers: Tracker<String>,
    ips: Tracker<IpAddr>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::with_windows(
            Window::new(5, Duration::minutes(15)),
            Window::new(10, Duration::minutes(1)),
        )
    }

    pub fn with_windows(identifier: Window, ip: Window) -> Self {
        Self {
            identifiers: Tracker::new(identifier),
            ips: Tracker::new(ip),
        }
    }

    /// Count a login request from `ip` and check both windows.
    pub async fn check(&self, ip: Option<IpAddr>, identifier: &str) -> Result<(), Throttle> {
        let now = Utc::now();
        let identifier = normalize(identifier);

        if let Some(ip) = ip {
            if let Some(retry_after_secs) = self.ips.blocked_for(&ip, now).await {
                return Err(Throttle::Ip { retry_after_secs });
            }
            self.ips.record(ip, now).await;
        }

        if let Some(retry_after_secs) = self.identifiers.blocked_for(&identifier, now).await {
            return Err(Throttle::Identifier { retry_after_secs });
        }
        Ok(())
    }

    /// Record a failed password for `identifier`
    pub async fn record_failure(&self, identifier: &str) {
        self.identifiers.record(normalize(identifier), Utc::now()).await;
    }

    /// Forget failures after a successful login
    pub async fn record_success(&self, identifier: &str) {
        self.identifiers.clear(&normalize(identifier)).await;
    }

    /// Drop expired entries; returns how many keys are still tracked
    pub async fn cleanup(&self) -> usize {
        let now = Utc::now();
        self.identifiers.prune(now).await + self.ips.prune(now).await
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_identifier_limited_after_failures() {
        let limiter = LoginRateLimiter::new();

        for _ in 0..4 {
            assert!(limiter.check(None, "admin@desa.id").await.is_ok());
            limiter.record_failure("admin@desa.id").await;
        }
        assert!(limiter.check(None, "admin@desa.id").await.is_ok());
        limiter.record_failure("ADMIN@desa.id ").await;

        let throttle = limiter.check(None, "admin@desa.id").await.unwrap_err();
        assert!(matches!(throttle, Throttle::Identifier { .. }));
        assert!(throttle.retry_after_secs() > 0);

        limiter.record_success("admin@desa.id").await;
        assert!(limiter.check(None, "admin@desa.id").await.is_ok());
    }

    #[tokio::test]
    async fn test_ip_limited_after_requests() {
        let limiter = LoginRateLimiter::new();
        let ip = IpAddr::from_str("10.0.0.7").unwrap();

        for i in 0..10 {
            assert!(limiter.check(Some(ip), &format!("u{}@desa.id", i)).await.is_ok());
        }
        assert!(matches!(
            limiter.check(Some(ip), "other@desa.id").await,
            Err(Throttle::Ip { .. })
        ));

        let other_ip = IpAddr::from_str("10.0.0.8").unwrap();
        assert!(limiter.check(Some(other_ip), "other@desa.id").await.is_ok());
    }

    #[tokio::test]
    async fn test_cleanup_drops_expired() {
        let limiter = LoginRateLimiter::with_windows(
            Window::new(1, Duration::milliseconds(10)),
            Window::new(1, Duration::milliseconds(10)),
        );
        limiter.record_failure("a@desa.id").await;
        assert!(limiter.check(None, "a@desa.id").await.is_err());

        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        assert_eq!(limiter.cleanup().await, 0);
        assert!(limiter.check(None, "a@desa.id").await.is_ok());
    }
}

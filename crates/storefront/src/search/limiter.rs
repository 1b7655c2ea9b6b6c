//! Per-IP search quota.

use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use governor::clock::{Clock, DefaultClock};
use governor::middleware::StateInformationMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};

use crate::config::RateLimitSettings;

type KeyedLimiter =
    RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock, StateInformationMiddleware>;

/// Outcome of one quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests left before the client is limited.
    pub remaining: u32,
    /// When the client's quota is fully available again.
    pub reset_at: DateTime<Utc>,
}

/// `max_requests` per `window` for each client IP, replenished continuously.
#[derive(Clone)]
pub struct SearchRateLimiter {
    limiter: Arc<KeyedLimiter>,
    clock: DefaultClock,
    replenish_interval: Duration,
    burst: NonZeroU32,
}

impl SearchRateLimiter {
    #[must_use]
    pub fn new(settings: RateLimitSettings) -> Self {
        let burst = NonZeroU32::new(settings.max_requests).unwrap_or(NonZeroU32::MIN);
        let replenish_interval = settings
            .window
            .checked_div(burst.get())
            .filter(|interval| !interval.is_zero())
            .unwrap_or(Duration::from_nanos(1));
        let quota = Quota::with_period(replenish_interval)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        let clock = DefaultClock::default();
        let limiter = RateLimiter::dashmap_with_clock(quota, clock.clone())
            .with_middleware::<StateInformationMiddleware>();

        Self {
            limiter: Arc::new(limiter),
            clock,
            replenish_interval,
            burst,
        }
    }

    /// Take one request from `client`'s quota.
    pub fn check(&self, client: IpAddr) -> RateDecision {
        let now = Utc::now();

        match self.limiter.check_key(&client) {
            Ok(snapshot) => {
                let remaining = snapshot.remaining_burst_capacity();
                let used = self.burst.get().saturating_sub(remaining);
                RateDecision {
                    allowed: true,
                    remaining,
                    reset_at: after(now, self.replenish_interval.saturating_mul(used)),
                }
            }
            Err(not_until) => RateDecision {
                allowed: false,
                remaining: 0,
                reset_at: after(now, not_until.wait_time_from(self.clock.now())),
            },
        }
    }

    /// Forget clients whose quota has fully replenished.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Number of clients currently tracked.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

fn after(now: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(duration)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(now)
}

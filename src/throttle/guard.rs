use std::fmt::Display;
use std::hash::Hash;
use std::time::Duration;

use super::clock::{Clock, SystemClock};
use super::config::ThrottleConfig;
use super::store::AttemptStore;

/// Where a principal sits in the Clean -> Warned -> Blocked lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalStatus {
    Clean,
    Warned { failures: u32 },
    Blocked { retry_after: Duration },
}

/// Lockout-on-repeated-failure for one kind of principal.
///
/// A principal is blocked once it accumulates `threshold` failures without an
/// intervening success, and stays blocked for `lockout` after the failure that
/// crossed the threshold. Expiry is lazy: the stored deadline is compared with
/// the clock on the next call, there is no sweeper.
///
/// Failures that arrive while a principal is already blocked only refresh
/// its last-failure timestamp. They neither extend the lockout nor add to the
/// count, so a lockout always ends `lockout` after it started.
///
/// Every operation is total and never waits on anything but the entry lock
/// of the principal it touches.
pub struct ThrottleGuard<P, C = SystemClock> {
    store: AttemptStore<P>,
    config: ThrottleConfig,
    clock: C,
}

impl<P> ThrottleGuard<P>
where
    P: Eq + Hash + Clone + Display,
{
    pub fn new(config: ThrottleConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<P, C> ThrottleGuard<P, C>
where
    P: Eq + Hash + Clone + Display,
    C: Clock,
{
    pub fn with_clock(config: ThrottleConfig, clock: C) -> Self {
        Self {
            store: AttemptStore::new(config.max_tracked()),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// `true` while the principal's lockout deadline is in the future.
    ///
    /// A record whose deadline has passed is evicted on the way out.
    pub fn is_blocked(&self, principal: &P) -> bool {
        let now = self.clock.now();
        if self.store.evict_if_expired(principal, now) {
            tracing::debug!(scope = self.config.scope(), %principal, "lockout expired");
            return false;
        }
        self.store
            .inspect(principal, |record| record.is_blocked(now))
            .unwrap_or(false)
    }

    /// Count a failed attempt. Returns `true` only for the call whose failure
    /// started a lockout.
    pub fn record_failure(&self, principal: &P) -> bool {
        let now = self.clock.now();
        let threshold = self.config.threshold();
        let lockout = self.config.lockout();

        let locked_after = self.store.update(principal.clone(), now, |record| {
            record.last_failure_at = now;
            if record.is_blocked(now) {
                return None;
            }
            record.failure_count = record.failure_count.saturating_add(1);
            if record.failure_count >= threshold {
                record.blocked_until = Some(now + lockout);
                return Some(record.failure_count);
            }
            None
        });

        match locked_after {
            Some(failures) => {
                tracing::warn!(
                    scope = self.config.scope(),
                    %principal,
                    failures,
                    lockout_secs = lockout.as_secs(),
                    "too many failed attempts, principal locked out"
                );
                true
            }
            None => {
                tracing::debug!(scope = self.config.scope(), %principal, "failed attempt recorded");
                false
            }
        }
    }

    // Clears counters and any active lockout
    pub fn record_success(&self, principal: &P) {
        if self.store.remove(principal) {
            tracing::debug!(scope = self.config.scope(), %principal, "attempt record cleared");
        }
    }

    /// Failures left before a lockout. Observability only, never enforced.
    pub fn remaining_attempts(&self, principal: &P) -> u32 {
        let now = self.clock.now();
        let threshold = self.config.threshold();
        self.store
            .inspect(principal, |record| {
                if record.is_expired(now) {
                    threshold
                } else {
                    threshold.saturating_sub(record.failure_count)
                }
            })
            .unwrap_or(threshold)
    }

    pub fn status(&self, principal: &P) -> PrincipalStatus {
        let now = self.clock.now();
        self.store
            .inspect(principal, |record| match record.blocked_until {
                Some(until) if until > now => PrincipalStatus::Blocked {
                    retry_after: until - now,
                },
                Some(_) => PrincipalStatus::Clean,
                None if record.failure_count == 0 => PrincipalStatus::Clean,
                None => PrincipalStatus::Warned {
                    failures: record.failure_count,
                },
            })
            .unwrap_or(PrincipalStatus::Clean)
    }

    pub fn retry_after(&self, principal: &P) -> Option<Duration> {
        match self.status(principal) {
            PrincipalStatus::Blocked { retry_after } => Some(retry_after),
            _ => None,
        }
    }

    pub fn tracked(&self) -> usize {
        self.store.len()
    }

    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired(self.clock.now())
    }
}

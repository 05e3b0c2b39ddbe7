use std::time::Duration;

use crate::config::ConfigError;

pub const DEFAULT_THRESHOLD: u32 = 5;
pub const DEFAULT_LOCKOUT: Duration = Duration::from_secs(10 * 60);
// longest lockout accepted; keeps `now + lockout` far from Instant overflow
pub const MAX_LOCKOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Fixed settings of one guard, validated once at construction.
///
/// `scope` only labels log lines ("ip", "account") so the two guards of a
/// process can be told apart.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    scope: &'static str,
    threshold: u32,
    lockout: Duration,
    max_tracked: Option<usize>,
}

impl ThrottleConfig {
    pub fn new(
        scope: &'static str,
        threshold: u32,
        lockout: Duration,
    ) -> Result<Self, ConfigError> {
        if threshold == 0 {
            return Err(ConfigError::ZeroThreshold { scope });
        }
        if lockout.is_zero() {
            return Err(ConfigError::ZeroLockout { scope });
        }
        if lockout > MAX_LOCKOUT {
            return Err(ConfigError::LockoutTooLong {
                scope,
                max_secs: MAX_LOCKOUT.as_secs(),
            });
        }
        Ok(Self {
            scope,
            threshold,
            lockout,
            max_tracked: None,
        })
    }

    // Opt in to a bounded table (see AttemptStore::make_room)
    pub fn with_max_tracked(mut self, max_tracked: usize) -> Result<Self, ConfigError> {
        if max_tracked == 0 {
            return Err(ConfigError::ZeroMaxTracked { scope: self.scope });
        }
        self.max_tracked = Some(max_tracked);
        Ok(self)
    }

    pub fn scope(&self) -> &'static str {
        self.scope
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn lockout(&self) -> Duration {
        self.lockout
    }

    pub fn max_tracked(&self) -> Option<usize> {
        self.max_tracked
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            scope: "default",
            threshold: DEFAULT_THRESHOLD,
            lockout: DEFAULT_LOCKOUT,
            max_tracked: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_five_failures_and_ten_minutes() {
        let config = ThrottleConfig::default();
        assert_eq!(config.threshold(), 5);
        assert_eq!(config.lockout(), Duration::from_secs(600));
        assert_eq!(config.max_tracked(), None);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            ThrottleConfig::new("ip", 0, DEFAULT_LOCKOUT),
            Err(ConfigError::ZeroThreshold { scope: "ip" })
        ));
        assert!(matches!(
            ThrottleConfig::new("ip", 3, Duration::ZERO),
            Err(ConfigError::ZeroLockout { scope: "ip" })
        ));
        assert!(matches!(
            ThrottleConfig::new("ip", 3, Duration::from_secs(u64::MAX)),
            Err(ConfigError::LockoutTooLong { scope: "ip", .. })
        ));
        assert!(ThrottleConfig::new("ip", 3, MAX_LOCKOUT).is_ok());
        assert!(ThrottleConfig::new("ip", 3, MAX_LOCKOUT + Duration::from_secs(1)).is_err());

        let config = ThrottleConfig::new("account", 3, DEFAULT_LOCKOUT).unwrap();
        assert!(matches!(
            config.with_max_tracked(0),
            Err(ConfigError::ZeroMaxTracked { scope: "account" })
        ));
    }
}

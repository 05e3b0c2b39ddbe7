use clap::Parser;
use std::time::Duration;
use thiserror::Error;

use crate::throttle::{DEFAULT_THRESHOLD, ThrottleConfig};

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "login-guard")]
#[command(about = "Login endpoint with brute-force lockout per IP and per account")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "LOGIN_GUARD_PORT", default_value_t = 8080)]
    pub port: u16,

    // Failed attempts from one IP before it is locked out
    #[arg(long, env = "LOGIN_GUARD_IP_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    pub ip_threshold: u32,

    // IP lockout in seconds
    #[arg(long, env = "LOGIN_GUARD_IP_LOCKOUT", default_value_t = 600)]
    pub ip_lockout: u64,

    // Failed attempts against one account before it is locked out
    #[arg(long, env = "LOGIN_GUARD_ACCOUNT_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    pub account_threshold: u32,

    // Account lockout in seconds
    #[arg(long, env = "LOGIN_GUARD_ACCOUNT_LOCKOUT", default_value_t = 600)]
    pub account_lockout: u64,

    // Upper bound on principals tracked per guard (unbounded when unset)
    #[arg(long, env = "LOGIN_GUARD_MAX_TRACKED")]
    pub max_tracked: Option<usize>,

    // Accounts as "name:id:sha256-hex-of-password", repeatable
    // Example: "alice:1:5e8848...,bob:2:2bb80d..."
    #[arg(long = "user", env = "LOGIN_GUARD_USERS", value_delimiter = ',')]
    pub users: Vec<String>,
}

impl Args {
    pub fn ip_throttle(&self) -> Result<ThrottleConfig, ConfigError> {
        let config = ThrottleConfig::new(
            "ip",
            self.ip_threshold,
            Duration::from_secs(self.ip_lockout),
        )?;
        self.bounded(config)
    }

    pub fn account_throttle(&self) -> Result<ThrottleConfig, ConfigError> {
        let config = ThrottleConfig::new(
            "account",
            self.account_threshold,
            Duration::from_secs(self.account_lockout),
        )?;
        self.bounded(config)
    }

    fn bounded(&self, config: ThrottleConfig) -> Result<ThrottleConfig, ConfigError> {
        match self.max_tracked {
            Some(max) => config.with_max_tracked(max),
            None => Ok(config),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{scope} threshold must be at least 1")]
    ZeroThreshold { scope: &'static str },

    #[error("{scope} lockout must be longer than zero")]
    ZeroLockout { scope: &'static str },

    #[error("{scope} lockout must not exceed {max_secs} seconds")]
    LockoutTooLong { scope: &'static str, max_secs: u64 },

    #[error("{scope} max tracked principals must be at least 1")]
    ZeroMaxTracked { scope: &'static str },

    #[error("invalid user entry {entry:?}: {reason}")]
    InvalidUser { entry: String, reason: &'static str },

    #[error("user {0:?} is configured more than once")]
    DuplicateUser(String),

    #[error("account id {0} is assigned to more than one user")]
    DuplicateAccountId(u32),
}

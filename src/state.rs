use std::net::IpAddr;
use std::sync::Arc;

use crate::audit::{Auditor, TracingAuditor};
use crate::auth::{AccountId, Authenticator, StaticAuthenticator};
use crate::config::{Args, ConfigError};
use crate::throttle::{ThrottleConfig, ThrottleGuard};

// app's shared state, built once in main and handed to every handler
pub struct AppState {
    pub ip_guard: ThrottleGuard<IpAddr>,
    pub account_guard: ThrottleGuard<AccountId>,
    pub authenticator: Arc<dyn Authenticator>,
    pub auditor: Arc<dyn Auditor>,
}

impl AppState {
    pub fn new(
        ip: ThrottleConfig,
        account: ThrottleConfig,
        authenticator: Arc<dyn Authenticator>,
        auditor: Arc<dyn Auditor>,
    ) -> Self {
        Self {
            ip_guard: ThrottleGuard::new(ip),
            account_guard: ThrottleGuard::new(account),
            authenticator,
            auditor,
        }
    }

    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let authenticator = StaticAuthenticator::from_entries(&args.users)?;
        if authenticator.is_empty() {
            tracing::warn!("no accounts configured, every login will fail");
        } else {
            tracing::info!(accounts = authenticator.len(), "accounts loaded");
        }

        Ok(Self::new(
            args.ip_throttle()?,
            args.account_throttle()?,
            Arc::new(authenticator),
            Arc::new(TracingAuditor),
        ))
    }

    pub fn tracked(&self) -> usize {
        self.ip_guard.tracked() + self.account_guard.tracked()
    }
}

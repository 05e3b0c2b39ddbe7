//! Security event trail for login outcomes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Success,
    Failure,
    Blocked,
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityEvent {
    pub action: &'static str,
    pub username: String,
    pub outcome: Outcome,
    pub ip_address: IpAddr,
    pub timestamp: DateTime<Utc>,
    pub details: String,
}

impl SecurityEvent {
    pub fn login(
        username: &str,
        outcome: Outcome,
        ip_address: IpAddr,
        details: impl Into<String>,
    ) -> Self {
        Self {
            action: "LOGIN",
            username: username.to_string(),
            outcome,
            ip_address,
            timestamp: Utc::now(),
            details: details.into(),
        }
    }
}

/// Receives every login outcome for compliance records.
pub trait Auditor: Send + Sync {
    fn record(&self, event: SecurityEvent);
}

// Writes events to the `security` tracing target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditor;

impl Auditor for TracingAuditor {
    fn record(&self, event: SecurityEvent) {
        match event.outcome {
            Outcome::Success => tracing::info!(
                target: "security",
                action = event.action,
                username = %event.username,
                outcome = ?event.outcome,
                ip = %event.ip_address,
                details = %event.details,
                "login succeeded"
            ),
            Outcome::Failure | Outcome::Blocked => tracing::warn!(
                target: "security",
                action = event.action,
                username = %event.username,
                outcome = ?event.outcome,
                ip = %event.ip_address,
                details = %event.details,
                "login rejected"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn event_serializes_with_upper_case_outcome() {
        let event = SecurityEvent::login(
            "alice",
            Outcome::Blocked,
            IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)),
            "too many failures",
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "LOGIN");
        assert_eq!(json["outcome"], "BLOCKED");
        assert_eq!(json["ip_address"], "1.2.3.4");
        assert_eq!(json["details"], "too many failures");
    }
}

use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::audit::{Outcome, SecurityEvent};
use crate::auth::AccountId;
use crate::metrics::{
    LOCKOUTS_TOTAL, LOGIN_ATTEMPTS_TOTAL, LOGIN_BLOCKED_TOTAL, LOGIN_FAILURES_TOTAL, LOGIN_LATENCY,
    LOGIN_SUCCESS_TOTAL, TRACKED_PRINCIPALS,
};
use crate::models::{BlockedBody, InvalidCredentialsBody, LoginRequest, LoginResponse};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Too many failed attempts. Please try again later.")]
    Blocked { retry_after: Duration },

    #[error("Login failed. Please check your credentials.")]
    InvalidCredentials { remaining_attempts: u32 },
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        let error = self.to_string();
        match self {
            LoginError::Blocked { retry_after } => {
                // round up so a client never retries a moment too early
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                let secs = secs.max(1);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, secs.to_string())],
                    Json(BlockedBody {
                        error,
                        retry_after_secs: secs,
                    }),
                )
                    .into_response()
            }
            LoginError::InvalidCredentials { remaining_attempts } => (
                StatusCode::UNAUTHORIZED,
                Json(InvalidCredentialsBody {
                    error,
                    remaining_attempts,
                }),
            )
                .into_response(),
        }
    }
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, LoginError> {
    LOGIN_ATTEMPTS_TOTAL.inc();
    let start_time = Instant::now();

    let result = attempt_login(&state, addr.ip(), &payload);

    LOGIN_LATENCY.observe(start_time.elapsed().as_secs_f64());
    TRACKED_PRINCIPALS.set(state.tracked() as f64);

    result.map(Json)
}

// Blocked check, then credentials, then bookkeeping on both guards
fn attempt_login(
    state: &AppState,
    ip: IpAddr,
    req: &LoginRequest,
) -> Result<LoginResponse, LoginError> {
    let account = state.authenticator.lookup(&req.username);

    if let Some(retry_after) = blocked_for(state, ip, account) {
        LOGIN_BLOCKED_TOTAL.inc();
        state.auditor.record(SecurityEvent::login(
            &req.username,
            Outcome::Blocked,
            ip,
            "blocked due to multiple failed attempts",
        ));
        return Err(LoginError::Blocked { retry_after });
    }

    match state.authenticator.verify(&req.username, &req.password) {
        Ok(account_id) => {
            state.ip_guard.record_success(&ip);
            state.account_guard.record_success(&account_id);
            LOGIN_SUCCESS_TOTAL.inc();
            state.auditor.record(SecurityEvent::login(
                &req.username,
                Outcome::Success,
                ip,
                "user login successful",
            ));
            Ok(LoginResponse::new(account_id, &req.username))
        }
        Err(reason) => {
            LOGIN_FAILURES_TOTAL.inc();

            if state.ip_guard.record_failure(&ip) {
                LOCKOUTS_TOTAL.inc();
            }
            let mut remaining_attempts = state.ip_guard.remaining_attempts(&ip);

            if let Some(account_id) = account {
                if state.account_guard.record_failure(&account_id) {
                    LOCKOUTS_TOTAL.inc();
                }
                let account_remaining = state.account_guard.remaining_attempts(&account_id);
                remaining_attempts = remaining_attempts.min(account_remaining);
            }

            tracing::info!(
                %ip,
                username = %req.username,
                remaining_attempts,
                "remaining login attempts after failure"
            );
            state.auditor.record(SecurityEvent::login(
                &req.username,
                Outcome::Failure,
                ip,
                reason.to_string(),
            ));
            Err(LoginError::InvalidCredentials { remaining_attempts })
        }
    }
}

// Longest remaining lockout across the IP and the account, if either is blocked
fn blocked_for(state: &AppState, ip: IpAddr, account: Option<AccountId>) -> Option<Duration> {
    let ip_wait = state
        .ip_guard
        .is_blocked(&ip)
        .then(|| state.ip_guard.retry_after(&ip).unwrap_or_default());
    let account_wait = account.and_then(|id| {
        state
            .account_guard
            .is_blocked(&id)
            .then(|| state.account_guard.retry_after(&id).unwrap_or_default())
    });
    ip_wait.max(account_wait)
}

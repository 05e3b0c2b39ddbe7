//! Login endpoint with brute-force protection.
//!
//! Failed logins are counted per client IP and per account. Once either
//! principal reaches its threshold further attempts are refused with 429
//! until the lockout runs out; a successful login clears both counters.
//! All state lives in memory and is lost on restart.

pub mod audit;
pub mod auth;
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod state;
pub mod throttle;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::handlers::{health_handler, login_handler, metrics_handler};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/auth/login", post(login_handler))
        .with_state(state)
}

use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref LOGIN_ATTEMPTS_TOTAL: Counter =
        register_counter!("login_attempts_total", "Total number of login attempts").unwrap();
    pub static ref LOGIN_SUCCESS_TOTAL: Counter =
        register_counter!("login_success_total", "Successful logins").unwrap();
    pub static ref LOGIN_FAILURES_TOTAL: Counter =
        register_counter!("login_failures_total", "Logins rejected for bad credentials").unwrap();
    pub static ref LOGIN_BLOCKED_TOTAL: Counter = register_counter!(
        "login_blocked_total",
        "Logins rejected because a principal is locked out"
    )
    .unwrap();
    pub static ref LOCKOUTS_TOTAL: Counter =
        register_counter!("login_lockouts_total", "Lockouts started (IP and account)").unwrap();
    pub static ref TRACKED_PRINCIPALS: Gauge =
        register_gauge!("login_tracked_principals", "Principals with an attempt record").unwrap();
    pub static ref LOGIN_LATENCY: Histogram = register_histogram!(
        "login_latency_seconds",
        "Login handling latency in seconds"
    )
    .unwrap();
}

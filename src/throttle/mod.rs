//! Brute-force protection: per-principal failure counting with timed lockouts.

mod clock;
mod config;
mod guard;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DEFAULT_LOCKOUT, DEFAULT_THRESHOLD, MAX_LOCKOUT, ThrottleConfig};
pub use guard::{PrincipalStatus, ThrottleGuard};

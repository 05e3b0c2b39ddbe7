mod health;
mod login;
mod metrics;

pub use health::health_handler;
pub use login::{LoginError, login_handler};
pub use metrics::metrics_handler;

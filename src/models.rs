use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AccountId;

// Login request body
#[derive(Deserialize, Serialize, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// Successful login
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct LoginResponse {
    pub account_id: u32,
    pub username: String,
    pub logged_in_at: DateTime<Utc>,
}

impl LoginResponse {
    pub fn new(account_id: AccountId, username: &str) -> Self {
        Self {
            account_id: account_id.0,
            username: username.to_string(),
            logged_in_at: Utc::now(),
        }
    }
}

// 401 body
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct InvalidCredentialsBody {
    pub error: String,
    pub remaining_attempts: u32,
}

// 429 body
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct BlockedBody {
    pub error: String,
    pub retry_after_secs: u64,
}

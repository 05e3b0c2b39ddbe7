//! Credential verification seam and its in-memory implementation.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AccountId(pub u32);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("unknown user")]
    UnknownUser,
    #[error("wrong password")]
    WrongPassword,
}

/// Checks credentials. Knows nothing about lockouts.
pub trait Authenticator: Send + Sync {
    // Resolve a username without checking the password
    fn lookup(&self, username: &str) -> Option<AccountId>;

    fn verify(&self, username: &str, password: &str) -> Result<AccountId, AuthFailure>;
}

// Hex SHA-256 of a password
pub fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct Account {
    pub username: String,
    pub id: AccountId,
    digest: String,
}

impl Account {
    pub fn new(username: impl Into<String>, id: AccountId, password: &str) -> Self {
        Self {
            username: username.into(),
            id,
            digest: password_digest(password),
        }
    }

    /// Parse a `name:id:sha256hex` entry as given on the command line.
    pub fn parse(entry: &str) -> Result<Self, ConfigError> {
        let invalid = |reason| ConfigError::InvalidUser {
            entry: entry.to_string(),
            reason,
        };

        let mut parts = entry.trim().splitn(3, ':');
        let (Some(username), Some(id), Some(digest)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected name:id:sha256hex"));
        };
        if username.is_empty() {
            return Err(invalid("empty username"));
        }
        let id = id.parse::<u32>().map_err(|_| invalid("id is not a non-negative integer"))?;
        if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("password digest must be 64 hex characters"));
        }

        Ok(Self {
            username: username.to_string(),
            id: AccountId(id),
            digest: digest.to_ascii_lowercase(),
        })
    }
}

/// Fixed set of accounts loaded at startup.
#[derive(Debug, Default)]
pub struct StaticAuthenticator {
    accounts: HashMap<String, Account>,
}

impl StaticAuthenticator {
    pub fn new(accounts: Vec<Account>) -> Result<Self, ConfigError> {
        let mut by_name = HashMap::with_capacity(accounts.len());
        let mut ids = HashSet::with_capacity(accounts.len());
        for account in accounts {
            if by_name.contains_key(&account.username) {
                return Err(ConfigError::DuplicateUser(account.username));
            }
            // one id per user, or their account lockouts would be shared
            if !ids.insert(account.id) {
                return Err(ConfigError::DuplicateAccountId(account.id.0));
            }
            by_name.insert(account.username.clone(), account);
        }
        Ok(Self { accounts: by_name })
    }

    pub fn from_entries<S: AsRef<str>>(entries: &[S]) -> Result<Self, ConfigError> {
        let accounts = entries
            .iter()
            .map(|entry| Account::parse(entry.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(accounts)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Authenticator for StaticAuthenticator {
    fn lookup(&self, username: &str) -> Option<AccountId> {
        self.accounts.get(username).map(|account| account.id)
    }

    fn verify(&self, username: &str, password: &str) -> Result<AccountId, AuthFailure> {
        let account = self.accounts.get(username).ok_or(AuthFailure::UnknownUser)?;
        if account.digest == password_digest(password) {
            Ok(account.id)
        } else {
            Err(AuthFailure::WrongPassword)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha256("password")
    const PASSWORD_DIGEST: &str =
        "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8";

    #[test]
    fn digest_is_lowercase_hex_sha256() {
        assert_eq!(password_digest("password"), PASSWORD_DIGEST);
    }

    #[test]
    fn parses_cli_entries() {
        let entry = format!("alice:7:{}", PASSWORD_DIGEST.to_uppercase());
        let account = Account::parse(&entry).unwrap();
        assert_eq!(account.username, "alice");
        assert_eq!(account.id, AccountId(7));

        let auth = StaticAuthenticator::new(vec![account]).unwrap();
        assert_eq!(auth.verify("alice", "password"), Ok(AccountId(7)));
    }

    #[test]
    fn rejects_malformed_entries() {
        for entry in [
            "alice",
            "alice:1",
            ":1:5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8",
            "alice:-1:5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8",
            "alice:1:not-a-digest",
        ] {
            assert!(
                matches!(Account::parse(entry), Err(ConfigError::InvalidUser { .. })),
                "accepted {entry:?}"
            );
        }
    }

    #[test]
    fn rejects_duplicate_usernames() {
        let err = StaticAuthenticator::new(vec![
            Account::new("alice", AccountId(1), "a"),
            Account::new("alice", AccountId(2), "b"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateUser(name) if name == "alice"));
    }

    #[test]
    fn rejects_shared_account_ids() {
        let err = StaticAuthenticator::new(vec![
            Account::new("alice", AccountId(1), "a"),
            Account::new("bob", AccountId(1), "b"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateAccountId(1)));

        let err = StaticAuthenticator::from_entries(&[
            format!("alice:3:{PASSWORD_DIGEST}"),
            format!("bob:3:{PASSWORD_DIGEST}"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateAccountId(3)));
    }

    #[test]
    fn verify_distinguishes_unknown_user_and_wrong_password() {
        let auth =
            StaticAuthenticator::new(vec![Account::new("alice", AccountId(1), "s3cret")]).unwrap();
        assert_eq!(auth.lookup("alice"), Some(AccountId(1)));
        assert_eq!(auth.lookup("mallory"), None);
        assert_eq!(auth.verify("alice", "s3cret"), Ok(AccountId(1)));
        assert_eq!(auth.verify("alice", "guess"), Err(AuthFailure::WrongPassword));
        assert_eq!(auth.verify("mallory", "s3cret"), Err(AuthFailure::UnknownUser));
    }
}

//! Password reset tokens: MD5 of `email ++ unix_second`, so two requests in
//! the same second yield the same token and anyone who knows the request time
//! can derive it. One live entry per email, overwritten on reissue, deleted
//! only on successful validation.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use md5::{Digest, Md5};
use serde::Serialize;

pub const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct ResetTokenEntry {
    pub token: String,
    pub expires_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckReason {
    Valid,
    TokenMismatch,
    NoTokenFound,
}

#[derive(Debug, Clone, Copy)]
pub struct TokenCheck {
    pub valid: bool,
    pub reason: CheckReason,
}

/// One live token as exposed by the debug listing, plaintext included.
#[derive(Debug, Serialize)]
pub struct ActiveToken {
    pub email: String,
    pub token: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
    pub expired: bool,
}

/// Derive the token for an email at a given unix second.
pub fn derive_token(email: &str, unix_secs: i64) -> String {
    let digest = Md5::digest(format!("{email}{unix_secs}").as_bytes());
    hex::encode(digest)
}

/// In-process token map. The mutex guards each complete read-check-delete
/// sequence; entries live until overwritten, consumed, or the process ends.
pub struct ResetTokenStore {
    entries: Mutex<HashMap<String, ResetTokenEntry>>,
}

impl ResetTokenStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Issue and store a token for `email`, overwriting any previous entry.
    pub fn issue(&self, email: &str) -> ResetTokenEntry {
        self.issue_at(email, Utc::now().timestamp())
    }

    pub fn issue_at(&self, email: &str, now: i64) -> ResetTokenEntry {
        let entry = ResetTokenEntry {
            token: derive_token(email, now),
            expires_at: now + TOKEN_TTL_SECS,
        };
        self.entries
            .lock()
            .expect("reset token map poisoned")
            .insert(email.to_string(), entry.clone());
        entry
    }

    /// Read-only validity probe. Never consumes the entry.
    pub fn check(&self, email: &str, supplied: &str) -> TokenCheck {
        self.validate(email, supplied, Utc::now().timestamp(), false)
    }

    /// Validate and, on success, delete the entry (single-use). Failed
    /// attempts leave the entry in place.
    pub fn consume(&self, email: &str, supplied: &str) -> TokenCheck {
        self.validate(email, supplied, Utc::now().timestamp(), true)
    }

    fn validate(&self, email: &str, supplied: &str, now: i64, consume: bool) -> TokenCheck {
        let mut entries = self.entries.lock().expect("reset token map poisoned");
        let Some(entry) = entries.get(email) else {
            return TokenCheck {
                valid: false,
                reason: CheckReason::NoTokenFound,
            };
        };

        // Equality first, expiry after the loop; the reason set stays closed,
        // so an expired-but-matching token still reports token_mismatch.
        let matches = weak_equals(supplied, &entry.token);
        let expired = now > entry.expires_at;

        if matches && expired {
            tracing::warn!("reset token for {email} matched but is expired");
        }

        if matches && !expired {
            if consume {
                entries.remove(email);
            }
            TokenCheck {
                valid: true,
                reason: CheckReason::Valid,
            }
        } else {
            TokenCheck {
                valid: false,
                reason: CheckReason::TokenMismatch,
            }
        }
    }

    /// Every live entry with its plaintext token, for the debug listing.
    pub fn snapshot(&self) -> Vec<ActiveToken> {
        let now = Utc::now().timestamp();
        self.entries
            .lock()
            .expect("reset token map poisoned")
            .iter()
            .map(|(email, entry)| ActiveToken {
                email: email.clone(),
                token: entry.token.clone(),
                expires_at: entry.expires_at,
                expired: now > entry.expires_at,
            })
            .collect()
    }
}

impl Default for ResetTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Equal-length character comparison that visits every position instead of
/// returning at the first mismatch. Not a constant-time compare.
fn weak_equals(supplied: &str, stored: &str) -> bool {
    let a: Vec<char> = supplied.chars().collect();
    let b: Vec<char> = stored.chars().collect();
    if a.len() != b.len() {
        return false;
    }
    let mut equal = true;
    for i in 0..a.len() {
        if a[i] != b[i] {
            equal = false;
        }
    }
    equal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_deterministic_per_second() {
        assert_eq!(derive_token("a@x.com", 1_700_000_000), derive_token("a@x.com", 1_700_000_000));
        assert_ne!(derive_token("a@x.com", 1_700_000_000), derive_token("a@x.com", 1_700_000_001));
        assert_ne!(derive_token("a@x.com", 1_700_000_000), derive_token("b@x.com", 1_700_000_000));
    }

    #[test]
    fn token_is_a_32_char_hex_digest() {
        let token = derive_token("a@x.com", 1_700_000_000);
        assert_eq!(token.len(), 32);
        assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn check_valid_before_expiry() {
        let store = ResetTokenStore::new();
        let entry = store.issue_at("a@x.com", 1_700_000_000);
        let check = store.validate("a@x.com", &entry.token, 1_700_000_000 + TOKEN_TTL_SECS, false);
        assert!(check.valid);
        assert_eq!(check.reason, CheckReason::Valid);
    }

    #[test]
    fn matching_token_past_expiry_is_invalid() {
        let store = ResetTokenStore::new();
        let entry = store.issue_at("a@x.com", 1_700_000_000);
        let check = store.validate("a@x.com", &entry.token, 1_700_000_000 + TOKEN_TTL_SECS + 1, false);
        assert!(!check.valid);
        assert_eq!(check.reason, CheckReason::TokenMismatch);
    }

    #[test]
    fn unknown_email_reports_no_token_found() {
        let store = ResetTokenStore::new();
        let check = store.check("nobody@x.com", "whatever");
        assert!(!check.valid);
        assert_eq!(check.reason, CheckReason::NoTokenFound);
    }

    #[test]
    fn wrong_token_reports_mismatch_and_is_retained() {
        let store = ResetTokenStore::new();
        let entry = store.issue_at("a@x.com", 1_700_000_000);
        let check = store.validate("a@x.com", "0000", 1_700_000_000, true);
        assert!(!check.valid);
        assert_eq!(check.reason, CheckReason::TokenMismatch);

        // A failed consume must not delete the entry.
        let retry = store.validate("a@x.com", &entry.token, 1_700_000_000, false);
        assert!(retry.valid);
    }

    #[test]
    fn consume_is_single_use() {
        let store = ResetTokenStore::new();
        let entry = store.issue_at("a@x.com", 1_700_000_000);
        assert!(store.validate("a@x.com", &entry.token, 1_700_000_000, true).valid);

        let again = store.validate("a@x.com", &entry.token, 1_700_000_000, true);
        assert!(!again.valid);
        assert_eq!(again.reason, CheckReason::NoTokenFound);
    }

    #[test]
    fn reissue_overwrites_previous_entry() {
        let store = ResetTokenStore::new();
        let first = store.issue_at("a@x.com", 1_700_000_000);
        let second = store.issue_at("a@x.com", 1_700_000_005);
        assert_ne!(first.token, second.token);

        assert!(!store.validate("a@x.com", &first.token, 1_700_000_005, false).valid);
        assert!(store.validate("a@x.com", &second.token, 1_700_000_005, false).valid);
    }

    #[test]
    fn snapshot_lists_live_entries() {
        let store = ResetTokenStore::new();
        store.issue("a@x.com");
        store.issue("b@x.com");
        let tokens = store.snapshot();
        assert_eq!(tokens.len(), 2);
        assert!(tokens.iter().all(|t| !t.expired));
    }

    #[test]
    fn weak_equals_requires_exact_match() {
        assert!(weak_equals("abcd", "abcd"));
        assert!(!weak_equals("abcd", "abce"));
        assert!(!weak_equals("abc", "abcd"));
        assert!(!weak_equals("", "abcd"));
    }
}

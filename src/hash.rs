//! Credential codec: a shift-cipher prefix over `password ++ email` followed
//! by a random alphanumeric suffix. Deliberately reversible and keyless; the
//! prefix length leaks both input lengths through the stored hash length.

use rand::Rng;

const PRINTABLE_START: i32 = 33; // '!'
const PRINTABLE_END: i32 = 126; // '~'
const PRINTABLE_RANGE: i32 = PRINTABLE_END - PRINTABLE_START + 1; // 94

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 20;

fn wrap_to_printable(mut code: i32) -> i32 {
    while code < PRINTABLE_START {
        code += PRINTABLE_RANGE;
    }
    while code > PRINTABLE_END {
        code -= PRINTABLE_RANGE;
    }
    code
}

/// Every code point of `password ++ email` shifted down by the password
/// length and wrapped into printable ASCII.
pub fn shifted_prefix(email: &str, password: &str) -> String {
    let shift = password.chars().count() as i32;
    password
        .chars()
        .chain(email.chars())
        .map(|ch| wrap_to_printable(ch as i32 - shift) as u8 as char)
        .collect()
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ALPHANUMERIC[rng.random_range(0..ALPHANUMERIC.len())] as char)
        .collect()
}

/// Produce the stored "hash" for a credential pair.
pub fn encode(email: &str, password: &str) -> String {
    let mut hash = shifted_prefix(email, password);
    hash.push_str(&random_suffix(SUFFIX_LEN));
    hash
}

/// Check a credential pair against a stored hash. The random suffix is never
/// compared; any 20-character alphanumeric tail passes. Returns false for
/// empty or malformed stored hashes, never errors.
pub fn verify(email: &str, password: &str, stored: &str) -> bool {
    if stored.is_empty() {
        return false;
    }
    let prefix = shifted_prefix(email, password);
    let Some(suffix) = stored.strip_prefix(prefix.as_str()) else {
        return false;
    };
    suffix.len() == SUFFIX_LEN && suffix.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_shifts_by_password_length() {
        // 'a' - 2 = '_', 'b' - 2 = '`'
        assert_eq!(shifted_prefix("", "ab"), "_`");
    }

    #[test]
    fn prefix_wraps_below_printable_range() {
        // '!' (33) - 1 = 32, wraps up to '~' (126)
        assert_eq!(shifted_prefix("", "!"), "~");
    }

    #[test]
    fn prefix_covers_password_then_email() {
        let prefix = shifted_prefix("a@x.com", "secret");
        assert_eq!(prefix.chars().count(), "secret".len() + "a@x.com".len());
    }

    #[test]
    fn encode_length_is_inputs_plus_suffix() {
        let hash = encode("user@example.com", "hunter2");
        assert_eq!(hash.len(), "user@example.com".len() + "hunter2".len() + 20);
    }

    #[test]
    fn verify_round_trip() {
        let hash = encode("user@example.com", "hunter2");
        assert!(verify("user@example.com", "hunter2", &hash));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = encode("user@example.com", "hunter2");
        // Different length guarantees a different prefix.
        assert!(!verify("user@example.com", "hunter22", &hash));
    }

    #[test]
    fn verify_accepts_any_alphanumeric_suffix() {
        let mut hash = encode("user@example.com", "hunter2");
        hash.truncate(hash.len() - 20);
        hash.push_str("AAAAAAAAAAAAAAAAAAAA");
        assert!(verify("user@example.com", "hunter2", &hash));
    }

    #[test]
    fn verify_rejects_non_alphanumeric_suffix() {
        let mut hash = encode("user@example.com", "hunter2");
        hash.truncate(hash.len() - 1);
        hash.push('!');
        assert!(!verify("user@example.com", "hunter2", &hash));
    }

    #[test]
    fn verify_rejects_malformed_stored_hashes() {
        assert!(!verify("user@example.com", "hunter2", ""));
        assert!(!verify("user@example.com", "hunter2", "short"));
        assert!(!verify(
            "user@example.com",
            "hunter2",
            &shifted_prefix("user@example.com", "hunter2"),
        ));
    }
}

//! Salted SHA-1 (`{SSHA}`) password values for `userPassword`.

use base64::Engine;
use rand::RngCore;
use sha1::{Digest, Sha1};

const SCHEME: &str = "{SSHA}";
const DIGEST_LEN: usize = 20;
const SALT_LEN: usize = 4;

/// Hashes `password` with a fresh random salt.
#[must_use]
pub fn ssha_hash(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    hash_with_salt(password.as_bytes(), &salt)
}

fn hash_with_salt(password: &[u8], salt: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(password);
    hasher.update(salt);
    let mut payload = hasher.finalize().to_vec();
    payload.extend_from_slice(salt);
    format!(
        "{SCHEME}{}",
        base64::engine::general_purpose::STANDARD.encode(payload)
    )
}

/// Whether `hashed` is an `{SSHA}` value of `password`.
///
/// Values in other schemes, or that do not decode, never match.
#[must_use]
pub fn ssha_check(hashed: &str, password: &str) -> bool {
    let Some(encoded) = hashed.strip_prefix(SCHEME) else {
        return false;
    };
    let Ok(payload) = base64::engine::general_purpose::STANDARD.decode(encoded.trim()) else {
        return false;
    };
    if payload.len() <= DIGEST_LEN {
        return false;
    }
    let (digest, salt) = payload.split_at(DIGEST_LEN);

    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    hasher.update(salt);
    hasher.finalize().as_slice() == digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_salt_gives_known_value() {
        assert_eq!(
            hash_with_salt(b"test1234", &[1, 2, 3, 4]),
            "{SSHA}TD8tZq+RgKsfQXzrJH54Q5lK51gBAgME"
        );
        assert!(ssha_check("{SSHA}TD8tZq+RgKsfQXzrJH54Q5lK51gBAgME", "test1234"));
    }

    #[test]
    fn fresh_hashes_verify_and_differ() {
        let first = ssha_hash("test1234");
        let second = ssha_hash("test1234");
        assert!(first.starts_with("{SSHA}"));
        assert!(ssha_check(&first, "test1234"));
        assert!(ssha_check(&second, "test1234"));
        assert!(!ssha_check(&first, "test12345"));
        assert_ne!(first, second);
    }

    #[test]
    fn foreign_or_broken_values_never_match() {
        assert!(!ssha_check("test1234", "test1234"));
        assert!(!ssha_check("{SHA}qUqP5cyxm6YcTAhz05Hph5gvu9M=", "test"));
        assert!(!ssha_check("{SSHA}not base64!", "test1234"));
        assert!(!ssha_check("{SSHA}AAAA", "test1234"));
    }
}

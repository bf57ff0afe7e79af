/// Admin session tokens
///
/// The admin panel keeps a server-side session per login. The browser holds
/// a random token in a cookie; the database holds only its SHA-256 hash, so
/// a leaked `admin_sessions` table cannot be replayed.
///
/// Format: `ths_` followed by 40 base62 characters.
///
/// # Example
///
/// ```
/// use teamhub_shared::auth::session_token::{generate_session_token, hash_session_token, verify_session_token};
///
/// let (token, hash) = generate_session_token();
/// assert!(token.starts_with("ths_"));
/// assert_eq!(hash, hash_session_token(&token));
/// assert!(verify_session_token(&token, &hash));
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

const TOKEN_PREFIX: &str = "ths_";
const TOKEN_RANDOM_LENGTH: usize = 40;

pub const SESSION_TOKEN_LENGTH: usize = TOKEN_PREFIX.len() + TOKEN_RANDOM_LENGTH;

/// Returns `(token, sha256_hex)`
pub fn generate_session_token() -> (String, String) {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    let random: String = (0..TOKEN_RANDOM_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();

    let token = format!("{}{}", TOKEN_PREFIX, random);
    let hash = hash_session_token(&token);
    (token, hash)
}

/// Lowercase hex SHA-256 of the token (64 chars)
pub fn hash_session_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Cheap shape check done before any database lookup
pub fn is_well_formed(token: &str) -> bool {
    token.len() == SESSION_TOKEN_LENGTH
        && token
            .strip_prefix(TOKEN_PREFIX)
            .map(|rest| rest.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or(false)
}

pub fn verify_session_token(token: &str, stored_hash: &str) -> bool {
    constant_time_eq(hash_session_token(token).as_bytes(), stored_hash.as_bytes())
}

/// Compares without short-circuiting on the first differing byte
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

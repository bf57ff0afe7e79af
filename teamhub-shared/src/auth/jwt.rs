/// Bearer tokens for the `/api/v1` surface
///
/// Tokens are HS256-signed and stateless. The subject is the user's email;
/// the numeric id and role ride along so handlers need no lookup to
/// authorize a request.
///
/// # Example
///
/// ```
/// use teamhub_shared::auth::jwt::{create_token, validate_token, Claims};
/// use teamhub_shared::models::user::UserRole;
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-secret-that-is-at-least-32-bytes!!";
/// let claims = Claims::new(7, "jane@example.com", UserRole::Member, Duration::hours(24));
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_token(&token, secret)?;
/// assert_eq!(validated.sub, "jane@example.com");
/// assert_eq!(validated.uid, 7);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::user::UserRole;

/// Value of the `iss` claim
pub const ISSUER: &str = "teamhub";

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Invalid token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token issuer")]
    InvalidIssuer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's email
    pub sub: String,

    /// User id
    pub uid: i64,

    pub role: UserRole,

    pub iss: String,

    pub iat: i64,

    pub nbf: i64,

    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: i64, email: &str, role: UserRole, expires_in: Duration) -> Self {
        let now = Utc::now().timestamp();

        Self {
            sub: email.to_string(),
            uid: user_id,
            role,
            iss: ISSUER.to_string(),
            iat: now,
            nbf: now,
            exp: now + expires_in.num_seconds(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Seconds until expiry, zero once expired
    pub fn expires_in_seconds(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}

pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Verifies signature, issuer, `exp` and `nbf`, then returns the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
            _ => JwtError::ValidationError(e.to_string()),
        })
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    let token = header_value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn claims() -> Claims {
        Claims::new(42, "jane@example.com", UserRole::Admin, Duration::hours(24))
    }

    #[test]
    fn test_claims_shape() {
        let c = claims();
        assert_eq!(c.sub, "jane@example.com");
        assert_eq!(c.uid, 42);
        assert_eq!(c.iss, ISSUER);
        assert_eq!(c.exp - c.iat, 24 * 3600);
        assert!(!c.is_expired());
        assert!(c.expires_in_seconds() > 0);
    }

    #[test]
    fn test_create_and_validate() {
        let token = create_token(&claims(), SECRET).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let validated = validate_token(&token, SECRET).unwrap();
        assert_eq!(validated, claims_with_times(&validated));
        assert_eq!(validated.role, UserRole::Admin);
    }

    fn claims_with_times(reference: &Claims) -> Claims {
        Claims {
            iat: reference.iat,
            nbf: reference.nbf,
            exp: reference.exp,
            ..claims()
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(&claims(), SECRET).unwrap();
        let result = validate_token(&token, "another-secret-key-at-least-32-bytes");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_expired_rejected() {
        let mut c = claims();
        c.iat -= 7200;
        c.nbf -= 7200;
        c.exp = Utc::now().timestamp() - 3600;

        let token = create_token(&c, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let mut c = claims();
        c.iss = "someone-else".to_string();

        let token = create_token(&c, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::InvalidIssuer)));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(validate_token("not.a.jwt", SECRET).is_err());
        assert!(validate_token("", SECRET).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer_token("abc.def.ghi"), None);
    }
}

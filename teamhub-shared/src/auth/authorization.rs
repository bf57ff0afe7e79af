/// Role checks
///
/// Capabilities form a simple ladder: ADMIN can do everything MEMBER can.
/// Handlers call [`require_role`] with the caller's [`AuthContext`]
/// before doing anything privileged.
///
/// # Example
///
/// ```
/// use teamhub_shared::auth::authorization::require_role;
/// use teamhub_shared::auth::middleware::{AuthContext, AuthMethod};
/// use teamhub_shared::models::user::UserRole;
///
/// let member = AuthContext {
///     user_id: 1,
///     email: "m@example.com".to_string(),
///     role: UserRole::Member,
///     method: AuthMethod::Jwt,
/// };
/// assert!(require_role(&member, UserRole::Member).is_ok());
/// assert!(require_role(&member, UserRole::Admin).is_err());
/// ```

use super::middleware::AuthContext;
use crate::models::user::UserRole;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Access denied: requires {required} role")]
    InsufficientRole { required: UserRole, actual: UserRole },
}

pub fn require_role(auth: &AuthContext, required: UserRole) -> Result<(), AuthzError> {
    if !auth.role.satisfies(required) {
        return Err(AuthzError::InsufficientRole {
            required,
            actual: auth.role,
        });
    }
    Ok(())
}

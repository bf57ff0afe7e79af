/// Authentication and authorization
///
/// - [`password`]: Argon2id hashing
/// - [`jwt`]: bearer tokens for the API
/// - [`session_token`]: admin panel session tokens
/// - [`middleware`]: Axum middleware producing an `AuthContext`
/// - [`authorization`]: role checks against an `AuthContext`

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod session_token;

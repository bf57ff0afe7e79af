/// Middleware for the API server
///
/// Authentication middleware lives in `teamhub_shared::auth::middleware`.

pub mod security;

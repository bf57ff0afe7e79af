/// Database layer
///
/// - `pool`: connection pool with a startup health check
/// - `migrations`: embedded schema migrations
/// - `soft_delete`: live-row views and the generic soft-delete write
///
/// Entity queries live next to their types in [`crate::models`].

pub mod migrations;
pub mod pool;
pub mod soft_delete;

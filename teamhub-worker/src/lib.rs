//! # TeamHub Worker
//!
//! Background jobs for TeamHub. The only job today is the nightly project
//! status refresh in [`scheduler`]; the API server embeds the same
//! scheduler so an admin can trigger it on demand.

pub mod config;
pub mod scheduler;

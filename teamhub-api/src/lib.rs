//! # TeamHub API Server Library
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: layered configuration
//! - `error`: the `{message, success}` error envelope
//! - `extract`: request extractors (bodies, uploads, the acting user)
//! - `middleware`: security headers
//! - `routes`: route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;

//! Custom [middleware].
//!
//! [middleware]: axum::middleware

pub mod auth;
pub mod catch_panic;
pub mod cors;
pub mod request_id;
pub mod trace;

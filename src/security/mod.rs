// src/security/mod.rs
//! Error text hygiene
//!
//! Raw provider and wallet errors can carry calldata, RPC keys or signing material.
//! Everything shown to a user goes through this module first.

pub mod error_sanitizer;

pub use error_sanitizer::{sanitize_error_message, user_facing_message};

//! Auth module: admin sessions signed as HS256 tokens.
//!
//! A single administrator credential comes from configuration; the password is
//! kept only as an Argon2 hash.

pub mod domain;
pub mod errors;
pub mod service;

pub use service::{SessionConfig, SessionService};

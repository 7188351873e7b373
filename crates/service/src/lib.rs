//! Service layer: report persistence, form/dashboard actions and admin sessions.
//! - `storage` owns the on-disk JSON snapshot and serialises every read-modify-write.
//! - `reports` implements the report store on top of it, plus filtering and export.
//! - `auth` issues and verifies signed admin session tokens.

pub mod errors;
pub mod auth;
pub mod runtime;
pub mod storage;
pub mod reports;

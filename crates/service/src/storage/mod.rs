//! Storage abstractions for service layer
//!
//! Contains the file-backed snapshot store used by the report store. A snapshot
//! is one JSON array rewritten wholesale on every change.

pub mod json_snapshot_store;

pub use json_snapshot_store::JsonSnapshotStore;

//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` to keep binary crates importing
//! `service::runtime::ensure_env` without depending directly on `common`.

/// Ensure the snapshot directory exists; warn when the static front-end is missing.
pub async fn ensure_env(static_dir: &str, snapshot_path: &str) -> anyhow::Result<()> {
    common::env::ensure_env(static_dir, snapshot_path).await
}

//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::warn;

/// Ensure expected directories exist; warn on missing optional ones.
///
/// `static_dir` is optional (the JSON API works without a front-end), while the
/// directory holding the report snapshot is created if missing.
pub async fn ensure_env(static_dir: &str, snapshot_path: &str) -> anyhow::Result<()> {
    if tokio::fs::metadata(static_dir).await.is_err() {
        warn!(%static_dir, "static assets directory not found; front-end pages may 404");
    }
    if let Some(parent) = Path::new(snapshot_path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}

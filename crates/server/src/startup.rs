use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use rand::{distributions::Alphanumeric, Rng};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};
use service::{
    auth::{service::hash_password, SessionConfig, SessionService},
    reports::{ReportActions, ReportStore},
    runtime,
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

fn session_config(cfg: &AppConfig) -> Result<SessionConfig, StartupError> {
    let auth = &cfg.auth;
    let secret = if auth.session_secret.trim().is_empty() {
        warn!("SESSION_SECRET not set; generated a random one, sessions end on restart");
        rand::thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect()
    } else {
        auth.session_secret.clone()
    };
    let admin_password_hash = match &auth.admin_password_hash {
        Some(hash) => hash.clone(),
        None => {
            warn!(username = %auth.admin_username, "ADMIN_PASSWORD_HASH not set; falling back to the development password `admin`");
            hash_password("admin").map_err(|e| StartupError::Runtime(e.to_string()))?
        }
    };
    Ok(SessionConfig {
        admin_username: auth.admin_username.clone(),
        admin_password_hash,
        secret,
        ttl: chrono::Duration::hours(auth.session_ttl_hours),
    })
}

/// Wire the report store and session service from configuration.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let store = ReportStore::new(cfg.storage.reports_path.as_str(), cfg.storage.mode)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;
    let sessions = SessionService::new(session_config(cfg)?)
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    Ok(ServerState {
        reports: Arc::new(ReportActions::new(store)),
        sessions: Arc::new(sessions),
        cookie_secure: cfg.auth.cookie_secure,
    })
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_or_default()?;
    runtime::ensure_env(&cfg.server.static_dir, &cfg.storage.reports_path).await?;

    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors(), &cfg.server.static_dir);

    // Bind and serve
    let addr = bind_addr(&cfg)?;
    info!(%addr, reports_path = %cfg.storage.reports_path, mode = ?cfg.storage.mode, "starting report desk");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

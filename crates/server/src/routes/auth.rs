use std::sync::Arc;

use axum::{Extension, Json, extract::{State, Request}, http::{StatusCode, header::AUTHORIZATION}, middleware::Next, response::Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use tracing::warn;

use service::auth::{domain::{AuthUser, LoginInput}, errors::AuthError, SessionService};
use service::reports::ReportActions;

use crate::errors::JsonApiError;

pub const SESSION_COOKIE: &str = "session";

#[derive(Clone)]
pub struct ServerState {
    pub reports: Arc<ReportActions>,
    pub sessions: Arc<SessionService>,
    pub cookie_secure: bool,
}

#[derive(Serialize)]
pub struct LoginOutput { pub username: String, pub token: String, pub expires_at: i64 }

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, Json(input): Json<LoginInput>) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let session = state.sessions.login(&input).map_err(|e| match e {
        AuthError::Unauthorized => JsonApiError::unauthorized("Invalid username or password."),
        other => JsonApiError::internal(other.to_string()),
    })?;

    let mut cookie = Cookie::new(SESSION_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(state.cookie_secure);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    let out = LoginOutput { username: session.user.username, token: session.token, expires_at: session.expires_at };
    Ok((jar, Json(out)))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Session cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current administrator"), (status = 401, description = "Unauthorized")))]
pub async fn me(Extension(user): Extension<AuthUser>) -> Json<AuthUser> {
    Json(user)
}

/// Guard for dashboard routes: accepts `Authorization: Bearer <token>` or the
/// `session` cookie. Missing, forged or expired sessions get 401; the verified
/// user is put into request extensions.
pub async fn require_session_state(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();

    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());
    let token = match bearer.or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string())) {
        Some(t) if !t.is_empty() => t,
        _ => {
            warn!(path = %path, "missing Authorization header and session cookie");
            return Err(JsonApiError::unauthorized("not signed in"));
        }
    };

    match state.sessions.verify(&token) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            warn!(path = %path, error = %e, code = e.code(), "session rejected");
            Err(JsonApiError::unauthorized(e.to_string()))
        }
    }
}

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{info, instrument, warn};

use super::domain::{AuthSession, AuthUser, LoginInput, SessionClaims};
use super::errors::AuthError;

/// Session service configuration
#[derive(Clone)]
pub struct SessionConfig {
    pub admin_username: String,
    /// Argon2 PHC string
    pub admin_password_hash: String,
    pub secret: String,
    pub ttl: Duration,
}

/// Hash a password into an Argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

/// Admin session business service independent of web framework
pub struct SessionService {
    cfg: SessionConfig,
}

impl SessionService {
    pub fn new(cfg: SessionConfig) -> Result<Self, AuthError> {
        PasswordHash::new(&cfg.admin_password_hash).map_err(|e| AuthError::Config(e.to_string()))?;
        if cfg.secret.is_empty() {
            return Err(AuthError::Config("session secret is empty".into()));
        }
        Ok(Self { cfg })
    }

    /// Check the administrator credential and issue a signed session token.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub fn login(&self, input: &LoginInput) -> Result<AuthSession, AuthError> {
        let parsed = PasswordHash::new(&self.cfg.admin_password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        let password_ok = Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_ok();
        if input.username != self.cfg.admin_username || !password_ok {
            warn!(event = "login_rejected", "invalid username or password");
            return Err(AuthError::Unauthorized);
        }

        let token = self.issue(&input.username, Utc::now().timestamp())?;
        info!(event = "login", "admin session issued");
        Ok(AuthSession {
            user: AuthUser { username: input.username.clone() },
            expires_at: token.1,
            token: token.0,
        })
    }

    /// Sign a token for `username` issued at `iat` (unix seconds); returns it with its expiry.
    pub fn issue(&self, username: &str, iat: i64) -> Result<(String, i64), AuthError> {
        let exp = iat + self.cfg.ttl.num_seconds();
        let claims = SessionClaims { sub: username.to_string(), iat, exp };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok((token, exp))
    }

    /// Verify signature and expiry of a session token.
    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<SessionClaims>(token, &DecodingKey::from_secret(self.cfg.secret.as_bytes()), &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Unauthorized,
            })?;
        if data.claims.sub != self.cfg.admin_username {
            return Err(AuthError::Unauthorized);
        }
        Ok(AuthUser { username: data.claims.sub })
    }
}

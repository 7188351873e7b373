use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            worker_threads: Some(4),
            static_dir: default_static_dir(),
        }
    }
}

/// How the report snapshot reacts to unreadable or unwritable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Corrupt snapshots and failed writes are surfaced as errors.
    #[default]
    Strict,
    /// Corrupt snapshots read as empty; failed writes are only logged.
    Lenient,
}

impl std::str::FromStr for StorageMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(anyhow!("storage.mode must be `strict` or `lenient`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_reports_path")]
    pub reports_path: String,
    #[serde(default)]
    pub mode: StorageMode,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { reports_path: default_reports_path(), mode: StorageMode::default() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    /// Argon2 PHC string. When absent a development hash of `admin` is generated at startup.
    #[serde(default)]
    pub admin_password_hash: Option<String>,
    #[serde(default)]
    pub session_secret: String,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    /// Mark the session cookie `Secure` (HTTPS deployments).
    #[serde(default)]
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_password_hash: None,
            session_secret: String::new(),
            session_ttl_hours: default_session_ttl_hours(),
            cookie_secure: false,
        }
    }
}

fn default_static_dir() -> String { "frontend".to_string() }
fn default_reports_path() -> String { "data/reports.json".to_string() }
fn default_admin_username() -> String { "admin".to_string() }
fn default_session_ttl_hours() -> i64 { 24 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Like `load_and_validate`, but a missing config file yields defaults
    /// (still overridable from the environment).
    pub fn load_or_default() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server（支持 SERVER_HOST / SERVER_PORT / TOKIO_WORKER_THREADS）
        self.server.normalize_from_env();
        self.server.normalize()?;
        // 归一化 storage（支持 REPORTS_PATH / STORAGE_MODE）
        self.storage.normalize_from_env()?;
        self.storage.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(w) = std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()) {
            self.worker_threads = Some(w);
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        if self.static_dir.trim().is_empty() {
            self.static_dir = default_static_dir();
        }
        Ok(())
    }
}

impl StorageConfig {
    pub fn normalize_from_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("REPORTS_PATH") {
            self.reports_path = path;
        }
        if let Ok(mode) = std::env::var("STORAGE_MODE") {
            self.mode = mode.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.reports_path.trim().is_empty() {
            return Err(anyhow!("storage.reports_path is empty; set it in config.toml or REPORTS_PATH"));
        }
        if self.reports_path.ends_with('/') {
            return Err(anyhow!("storage.reports_path must name a file, not a directory"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        // 若 TOML 中未提供 secret，则尝试从环境变量填充
        if self.session_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("SESSION_SECRET") {
                self.session_secret = secret;
            }
        }
        if let Ok(hash) = std::env::var("ADMIN_PASSWORD_HASH") {
            if !hash.trim().is_empty() {
                self.admin_password_hash = Some(hash);
            }
        }
        if let Some(secure) = std::env::var("COOKIE_SECURE").ok().and_then(|v| v.parse::<bool>().ok()) {
            self.cookie_secure = secure;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.admin_username.trim().is_empty() {
            return Err(anyhow!("auth.admin_username must not be empty"));
        }
        if self.session_ttl_hours <= 0 {
            return Err(anyhow!("auth.session_ttl_hours must be a positive number of hours"));
        }
        if let Some(hash) = &self.admin_password_hash {
            if !hash.starts_with("$argon2") {
                return Err(anyhow!("auth.admin_password_hash must be an Argon2 PHC string"));
            }
        }
        Ok(())
    }
}

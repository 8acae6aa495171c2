use std::path::Path;

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub debug: bool,
    /// Accepted `Host` header values. `*` allows any host, a leading dot
    /// matches the domain and all of its subdomains.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
    /// Offset from UTC, in minutes, of the calendar used by the date filters
    /// of the upload listing.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl ServerConfig {
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding all uploaded blobs.
    pub media_root: String,
    /// URL prefix under which the media root is served in debug mode.
    pub media_url: String,
    /// Sub-directory of `media_root` for uploads, partitioned by year/month.
    pub upload_dir: String,
    /// Prefix of the shareable link; the record id is appended verbatim.
    pub base_download_url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    pub bootstrap_admin_username: Option<String>,
    pub bootstrap_admin_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    pub enable_hsts: Option<bool>,
    pub hsts_max_age: Option<u64>,
    pub hsts_include_subdomains: Option<bool>,
    pub csp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub security: Option<SecurityConfig>,
}

const DEFAULTS: &str = include_str!("../config/default.toml");

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        match ::config::Config::builder()
            .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
        // Optional local file: mediashare.toml (in CWD)
        .add_source(::config::File::with_name("mediashare").required(false));

    if let Ok(custom_path) = std::env::var("MEDIASHARE_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(
        ::config::Environment::with_prefix("MEDIASHARE")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("server.allowed_hosts"),
    );

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

/// Layers a TOML document over the embedded defaults and validates the result.
pub fn from_toml_str(overrides: &str) -> anyhow::Result<AppConfig> {
    let cfg = ::config::Config::builder()
        .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
        .add_source(::config::File::from_str(overrides, ::config::FileFormat::Toml))
        .build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    // Server
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    // Warn for privileged ports on Unix-like systems
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }
    if cfg.server.utc_offset_minutes.unsigned_abs() >= 24 * 60 {
        return Err(anyhow::anyhow!("invalid server.utc_offset_minutes: {}", cfg.server.utc_offset_minutes));
    }
    if cfg.server.allowed_hosts.is_empty() && !cfg.server.debug {
        tracing::warn!("server.allowed_hosts is empty, every request will be rejected");
    }

    // Storage
    if cfg.storage.media_root.trim().is_empty() {
        return Err(anyhow::anyhow!("storage.media_root must not be empty"));
    }
    if !cfg.storage.media_url.starts_with('/') || !cfg.storage.media_url.ends_with('/') {
        return Err(anyhow::anyhow!("storage.media_url must start and end with '/'"));
    }
    if cfg.storage.upload_dir.contains("..") {
        return Err(anyhow::anyhow!("storage.upload_dir must not contain '..'"));
    }
    if cfg.storage.base_download_url.trim().is_empty() {
        return Err(anyhow::anyhow!("storage.base_download_url must not be empty"));
    }
    if cfg.storage.max_upload_bytes == 0 {
        return Err(anyhow::anyhow!("storage.max_upload_bytes must be > 0"));
    }

    // Auth: both or neither
    match (&cfg.auth.bootstrap_admin_username, &cfg.auth.bootstrap_admin_token) {
        (Some(_), None) | (None, Some(_)) => {
            return Err(anyhow::anyhow!(
                "auth.bootstrap_admin_username and auth.bootstrap_admin_token must be set together"
            ));
        }
        (Some(name), Some(token)) if name.trim().is_empty() || token.len() < 16 => {
            return Err(anyhow::anyhow!(
                "auth.bootstrap_admin_username must not be empty and the token must have at least 16 characters"
            ));
        }
        _ => {}
    }

    Ok(())
}

pub fn ensure_sqlite_parent_dir(url: &str) -> anyhow::Result<()> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        // On Windows, handle URLs like sqlite:///C:/... by stripping the leading '/'
        #[cfg(windows)]
        let path = {
            let bytes = path.as_bytes();
            if bytes.len() >= 3 && bytes[0] == b'/' && bytes[2] == b':' && bytes[1].is_ascii_alphabetic() {
                &path[1..]
            } else {
                path
            }
        };
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

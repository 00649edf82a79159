//! Configuration management
//!
//! This module handles loading and parsing configuration for the Banyuanyar CMS.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// External image host configuration
    #[serde(default)]
    pub image_host: ImageHostConfig,
    /// Editor AI assist configuration
    #[serde(default)]
    pub ai: AiConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (the admin/landing front end)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Pool size; backend default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
            max_connections: None,
        }
    }
}

fn default_database_url() -> String {
    "data/banyuanyar.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_ttl() -> u64 {
    600
}

fn default_max_entries() -> u64 {
    10_000
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session lifetime in days
    #[serde(default = "default_session_days")]
    pub session_days: i64,
    /// Admin account created on startup when the users table is empty
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_days: default_session_days(),
            bootstrap_admin: None,
        }
    }
}

fn default_session_days() -> i64 {
    7
}

/// Credentials for the first admin account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Where uploaded images are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploadDriver {
    /// Local directory served under `/uploads`
    #[default]
    Local,
    /// External image hosting API
    Remote,
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Storage driver
    #[serde(default)]
    pub driver: UploadDriver,
    /// Upload directory path (local driver)
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Public URL prefix for locally stored files
    #[serde(default = "default_public_base")]
    pub public_base: String,
    /// Maximum file size in bytes (default: 5MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed image MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            driver: UploadDriver::default(),
            path: default_upload_path(),
            public_base: default_public_base(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_public_base() -> String {
    "/uploads".to_string()
}

fn default_max_file_size() -> u64 {
    5 * 1024 * 1024
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }

    /// Get file extension for a MIME type
    pub fn get_extension(&self, mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            _ => "bin",
        }
    }
}

/// External image host configuration (used when `upload.driver` is `remote`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageHostConfig {
    /// Upload endpoint; files are deleted with `DELETE {endpoint}/{key}`
    #[serde(default = "default_image_host_endpoint")]
    pub endpoint: String,
    /// API key sent as a bearer token
    #[serde(default)]
    pub api_key: Option<String>,
    /// Folder or album name passed to the host
    #[serde(default = "default_image_host_folder")]
    pub folder: String,
    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            endpoint: default_image_host_endpoint(),
            api_key: None,
            folder: default_image_host_folder(),
            timeout_seconds: default_http_timeout(),
        }
    }
}

fn default_image_host_endpoint() -> String {
    "https://api.imagehost.example/v1/files".to_string()
}

fn default_image_host_folder() -> String {
    "banyuanyar".to_string()
}

fn default_http_timeout() -> u64 {
    30
}

/// Generative text provider kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiProviderKind {
    /// Google Gemini `generateContent` API
    Gemini,
    /// Any OpenAI compatible `chat/completions` API
    OpenaiCompatible,
}

/// A single generative text provider in the fallback chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiProviderConfig {
    pub kind: AiProviderKind,
    /// Model name, e.g. `gemini-1.5-flash`
    pub model: String,
    /// API key; providers without a key are skipped
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Editor AI assist configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Whether the assist endpoint is enabled at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Providers, tried in order
    #[serde(default)]
    pub providers: Vec<AiProviderConfig>,
    /// Use the offline mock when every provider fails
    #[serde(default = "default_true")]
    pub mock_fallback: bool,
    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
    /// Maximum accepted input length in characters
    #[serde(default = "default_ai_max_input")]
    pub max_input_chars: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            providers: Vec::new(),
            mock_fallback: true,
            timeout_seconds: default_http_timeout(),
            max_input_chars: default_ai_max_input(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ai_max_input() -> usize {
    8000
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - BANYUANYAR_SERVER_HOST / _PORT / _CORS_ORIGIN
    /// - BANYUANYAR_DATABASE_DRIVER / _URL
    /// - BANYUANYAR_CACHE_TTL_SECONDS
    /// - BANYUANYAR_UPLOAD_DRIVER / _PATH / _PUBLIC_BASE
    /// - BANYUANYAR_IMAGE_HOST_ENDPOINT / _API_KEY
    /// - BANYUANYAR_AI_ENABLED, BANYUANYAR_AI_GEMINI_API_KEY, BANYUANYAR_AI_OPENAI_API_KEY
    /// - BANYUANYAR_ADMIN_NAME / _EMAIL / _PASSWORD
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("BANYUANYAR_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("BANYUANYAR_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("BANYUANYAR_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("BANYUANYAR_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("BANYUANYAR_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(max) = std::env::var("BANYUANYAR_DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse::<u32>() {
                self.database.max_connections = Some(max);
            }
        }

        if let Ok(ttl) = std::env::var("BANYUANYAR_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }

        if let Ok(driver) = std::env::var("BANYUANYAR_UPLOAD_DRIVER") {
            match driver.to_lowercase().as_str() {
                "local" => self.upload.driver = UploadDriver::Local,
                "remote" => self.upload.driver = UploadDriver::Remote,
                _ => {}
            }
        }
        if let Ok(path) = std::env::var("BANYUANYAR_UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }
        if let Ok(base) = std::env::var("BANYUANYAR_UPLOAD_PUBLIC_BASE") {
            self.upload.public_base = base;
        }

        if let Ok(endpoint) = std::env::var("BANYUANYAR_IMAGE_HOST_ENDPOINT") {
            self.image_host.endpoint = endpoint;
        }
        if let Ok(key) = std::env::var("BANYUANYAR_IMAGE_HOST_API_KEY") {
            self.image_host.api_key = Some(key);
        }

        if let Ok(enabled) = std::env::var("BANYUANYAR_AI_ENABLED") {
            if let Ok(enabled) = enabled.parse::<bool>() {
                self.ai.enabled = enabled;
            }
        }
        if let Ok(key) = std::env::var("BANYUANYAR_AI_GEMINI_API_KEY") {
            self.ai.set_provider_key(AiProviderKind::Gemini, key, "gemini-1.5-flash");
        }
        if let Ok(key) = std::env::var("BANYUANYAR_AI_OPENAI_API_KEY") {
            self.ai.set_provider_key(AiProviderKind::OpenaiCompatible, key, "gpt-4o-mini");
        }

        let admin_email = std::env::var("BANYUANYAR_ADMIN_EMAIL").ok();
        let admin_password = std::env::var("BANYUANYAR_ADMIN_PASSWORD").ok();
        if let (Some(email), Some(password)) = (admin_email, admin_password) {
            let name = std::env::var("BANYUANYAR_ADMIN_NAME")
                .unwrap_or_else(|_| "Administrator".to_string());
            self.auth.bootstrap_admin = Some(BootstrapAdmin { name, email, password });
        }
    }
}

impl AiConfig {
    /// Set the key of the first provider of `kind`, appending one if missing
    fn set_provider_key(&mut self, kind: AiProviderKind, key: String, default_model: &str) {
        match self.providers.iter_mut().find(|p| p.kind == kind) {
            Some(provider) => provider.api_key = Some(key),
            None => self.providers.push(AiProviderConfig {
                kind,
                model: default_model.to_string(),
                api_key: Some(key),
                base_url: None,
            }),
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

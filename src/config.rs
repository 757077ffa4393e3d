//! Configuration management
//!
//! Manages server, storage, authentication, LLM and demo-mode settings.
//! Values come from `config.toml` in the platform config directory and can be
//! overridden by environment variables at load time.

use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Durable store settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// JWT and password hashing settings
    #[serde(default)]
    pub auth: AuthConfig,
    /// LLM provider settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Demo-mode relaxations
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origin ("*" allows any)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
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

/// How often the persistence gateway probes the durable store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreSelection {
    /// Probe once per request and pass the result down
    #[default]
    PerRequest,
    /// Probe once when the server starts and keep that mode
    Startup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `sqlite://path`, `sqlite::memory:` or a bare file path.
    /// When unset the server runs in demo mode only.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub selection: StoreSelection,
    /// Upper bound for a single probe
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

fn default_probe_timeout() -> u64 {
    2000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: data_dir()
                .ok()
                .map(|dir| format!("sqlite://{}", dir.join("edusmart.db").display())),
            selection: StoreSelection::default(),
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT secret key (auto-generated if not set)
    pub jwt_secret: Option<String>,
    /// Token lifetime (days)
    #[serde(default = "default_token_expiry")]
    pub token_expiry_days: i64,
    /// Argon2 memory cost (KiB)
    #[serde(default = "default_password_memory")]
    pub password_memory_kib: u32,
    /// Argon2 iterations
    #[serde(default = "default_password_iterations")]
    pub password_iterations: u32,
}

fn default_token_expiry() -> i64 {
    7
}

fn default_password_memory() -> u32 {
    19456
}

fn default_password_iterations() -> u32 {
    2
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_expiry_days: default_token_expiry(),
            password_memory_kib: default_password_memory(),
            password_iterations: default_password_iterations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model_str")]
    pub model: String,
    /// API key is stored in keyring, this is only populated from the environment
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(default = "default_answer_tokens")]
    pub answer_max_tokens: u32,
    #[serde(default = "default_recommendation_tokens")]
    pub recommendation_max_tokens: u32,
    #[serde(default = "default_analysis_tokens")]
    pub analysis_max_tokens: u32,
}

fn default_base_url() -> String {
    crate::ai::llm::OPENROUTER_BASE_URL.to_string()
}

fn default_model_str() -> String {
    "anthropic/claude-3.5-sonnet".to_string()
}

fn default_answer_tokens() -> u32 {
    1024
}

fn default_recommendation_tokens() -> u32 {
    1500
}

fn default_analysis_tokens() -> u32 {
    800
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model_str(),
            api_key: None,
            answer_max_tokens: default_answer_tokens(),
            recommendation_max_tokens: default_recommendation_tokens(),
            analysis_max_tokens: default_analysis_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Accept the demo account with any password and `demo_password` for any
    /// in-memory account. Never applies to the durable store.
    #[serde(default = "default_true")]
    pub relaxed_login: bool,
    #[serde(default = "default_demo_email")]
    pub email: String,
    #[serde(default = "default_demo_password")]
    pub password: String,
}

fn default_true() -> bool {
    true
}

fn default_demo_email() -> String {
    crate::store::memory::DEMO_EMAIL.to_string()
}

fn default_demo_password() -> String {
    "demo123".to_string()
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            relaxed_login: default_true(),
            email: default_demo_email(),
            password: default_demo_password(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            llm: LlmConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, then apply environment overrides
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?, |key| std::env::var(key).ok())
    }

    pub fn load_from(path: &Path, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env(var);
        Ok(config)
    }

    /// File contents only, writing defaults when the file is missing
    fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path)
            .context("Failed to read config file")?;
        toml::from_str(&contents)
            .context("Failed to parse config file")
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(port) = var("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => tracing::warn!("Invalid PORT value {:?}: {}", port, e),
            }
        }
        if let Some(origin) = var("CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }
        if let Some(url) = var("DATABASE_URL") {
            self.storage.database_url = if url.is_empty() { None } else { Some(url) };
        }
        if let Some(secret) = var("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(key) = var("OPENROUTER_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = var("LLM_MODEL") {
            self.llm.model = model;
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Generate and save JWT secret if not exists
    pub fn ensure_jwt_secret(&mut self) -> Result<String> {
        self.ensure_jwt_secret_at(&config_path()?)
    }

    /// Only the secret is written back. Environment overrides held by `self`
    /// stay out of the file.
    pub fn ensure_jwt_secret_at(&mut self, path: &Path) -> Result<String> {
        if let Some(secret) = &self.auth.jwt_secret {
            return Ok(secret.clone());
        }

        let secret = crate::server::auth::generate_jwt_secret();
        let mut on_disk = Self::read_file(path)?;
        on_disk.auth.jwt_secret = Some(secret.clone());
        on_disk.save_to(path)?;

        self.auth.jwt_secret = Some(secret.clone());
        Ok(secret)
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "edusmart", "edusmart")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "edusmart", "edusmart")
        .context("Failed to get project directories")?;
    Ok(base.data_dir().to_path_buf())
}

/// Show current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("EduSmart configuration ({})", config_path()?.display());
    println!();
    println!("  Server:        {}:{}", config.server.host, config.server.port);
    println!("  CORS origin:   {}", config.server.cors_origin);
    println!("  Database:      {}", config.storage.database_url.as_deref().unwrap_or("(none, demo mode only)"));
    println!("  Store probing: {:?}", config.storage.selection);
    println!("  JWT secret:    {}", config.auth.jwt_secret.as_ref().map(|_| "Configured").unwrap_or("Not configured"));
    println!("  Token expiry:  {} days", config.auth.token_expiry_days);
    println!("  LLM:           {} @ {}", config.llm.model, config.llm.base_url);
    println!("  Demo login:    {}", if config.demo.relaxed_login { "Relaxed" } else { "Strict" });

    Ok(())
}

/// Set API key
pub fn set_api_key(key: &str) -> Result<()> {
    crate::ai::keyring::set_api_key(key)?;
    println!("API key stored securely.");
    Ok(())
}

/// Get default configuration as TOML string
pub fn default_config_toml() -> String {
    let config = Config::default();
    toml::to_string_pretty(&config).unwrap_or_else(|_| "# Default configuration\n".to_string())
}

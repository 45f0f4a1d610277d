//! Server configuration types

use plantworks_core::CoordinatorConfig;
use plantworks_tools::{RegistryConfig, ToolCredentials};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// App name sessions are created under
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub tools: RegistryConfig,
    #[serde(default)]
    pub credentials: ToolCredentials,
}

fn default_app_name() -> String {
    "plantworks".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            app_name: default_app_name(),
            llm: LlmConfig::default(),
            coordinator: CoordinatorConfig::default(),
            tools: RegistryConfig::default(),
            credentials: ToolCredentials::default(),
        }
    }
}

impl AppConfig {
    /// Fill unset credentials from the conventional environment variables
    ///
    /// Values set in config files or `PLANTWORKS_*` variables win.
    pub fn with_env_fallbacks(mut self) -> Self {
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        if self.llm.api_key.is_none() {
            self.llm.api_key = env("GEMINI_API_KEY").or_else(|| env("GOOGLE_API_KEY"));
        }
        if self.credentials.google_api_key.is_none() {
            self.credentials.google_api_key = env("GOOGLE_API_KEY");
        }
        if self.credentials.google_cse_id.is_none() {
            self.credentials.google_cse_id = env("GOOGLE_CSE_ID");
        }
        if self.credentials.openweather_api_key.is_none() {
            self.credentials.openweather_api_key = env("OPENWEATHER_API_KEY");
        }
        self
    }
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// A turn still running after this long is cancelled
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_turn_timeout_secs() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            turn_timeout_secs: default_turn_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address {}:{}: {}", self.host, self.port, e))
    }
}

/// Language model endpoint
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// SECURITY: keep the key out of logs
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "****"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_base_url() -> String {
    plantworks_llm::openai_compat::GEMINI_OPENAI_BASE.to_string()
}

fn default_model() -> String {
    plantworks_llm::openai_compat::DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

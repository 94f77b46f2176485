use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
const API_KEY_ENV_VARS: [&str; 2] = ["FLASHDECK_API_KEY", "OPENROUTER_API_KEY"];

// 配置文件结构
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub tts: Option<TtsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    // 不设置时使用 reqwest 默认值
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TtsConfig {
    pub azure_speech_key: String,
    pub azure_speech_region: String,
    #[serde(default = "default_audio_dir")]
    pub audio_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            dir: default_log_dir(),
        }
    }
}

fn default_endpoint() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "google/gemini-2.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    8000
}

fn default_audio_dir() -> String {
    "audio".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Config {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config_content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("config file {} is missing or unreadable: {}", path.display(), e))?;
        Config::from_toml_str(&config_content, |key| std::env::var(key).ok())
    }

    /// Parses config text; `env` supplies API key overrides.
    pub fn from_toml_str(content: &str, env: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let mut config: Config = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("failed to parse config: {}", e))?;

        if let Some(key) = API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| env(name))
            .find(|v| !v.trim().is_empty())
        {
            config.api.api_key = key;
        }

        if config.api.api_key.trim().is_empty() {
            anyhow::bail!(
                "no API key configured: set api.api_key in config.toml or {}",
                API_KEY_ENV_VARS.join(" / ")
            );
        }

        Ok(config)
    }
}

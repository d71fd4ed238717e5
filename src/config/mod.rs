//! Connector configuration.
//!
//! A [`ConnectorConfig`] can be built in code with its builder or loaded from
//! TOML. The API credential is resolved exactly once, when the connector is
//! constructed: the explicit `api_key` wins, otherwise `GOOGLE_API_KEY` and
//! then `GEMINI_API_KEY` are read from the environment (a `.env` file is
//! honored).

pub mod thinking;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, Result};
use crate::history::RetentionPolicy;
use crate::types::{
    Content, GenerationConfig, HarmBlockThreshold, HarmCategory, SafetySetting, SessionSettings,
};
use crate::util::retry::RetryPolicy;

pub use thinking::thinking_config_for_model;

pub const DEFAULT_TEMPERATURE: f32 = 2.0;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

/// Environment variables consulted, in order, when no key is configured.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_delay_secs() -> u64 {
    DEFAULT_RETRY_DELAY_SECS
}

/// Settings for one agent's connector.
#[derive(Clone, Builder, Serialize, Deserialize)]
pub struct ConnectorConfig {
    #[builder(into)]
    pub model_name: String,
    #[builder(into)]
    pub agent_name: String,
    /// Directory holding the agent's turn log.
    #[builder(into)]
    pub agent_data_path: PathBuf,
    #[builder(into)]
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[builder(into)]
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[builder(default = DEFAULT_TEMPERATURE)]
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    /// Retries after the first attempt.
    #[builder(default = DEFAULT_MAX_RETRIES)]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[builder(default = DEFAULT_RETRY_DELAY_SECS)]
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[builder(default)]
    #[serde(default)]
    pub retention: RetentionPolicy,
    /// Override for the Gemini REST endpoint.
    #[builder(into)]
    #[serde(default)]
    pub base_url: Option<String>,
}

impl fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("model_name", &self.model_name)
            .field("agent_name", &self.agent_name)
            .field("agent_data_path", &self.agent_data_path)
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("system_prompt", &self.system_prompt.as_ref().map(String::len))
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("retention", &self.retention)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ConnectorConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw)
            .map_err(|e| ConnectorError::Configuration(format!("invalid connector config: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConnectorError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Resolve the API key from configuration or the process environment.
    pub fn resolve_api_key(&self) -> Result<String> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Resolve the API key, reading fallbacks through `lookup`.
    pub fn resolve_api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
        if let Some(key) = self.api_key.as_ref().filter(|key| !key.trim().is_empty()) {
            return Ok(key.clone());
        }
        API_KEY_ENV_VARS
            .iter()
            .find_map(|name| lookup(name).filter(|key| !key.trim().is_empty()))
            .ok_or_else(|| {
                ConnectorError::Configuration(format!(
                    "Google API key not provided for {} and GOOGLE_API_KEY env variable not set.",
                    self.agent_name
                ))
            })
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay())
    }

    /// Settings sent with every request of this agent's session.
    ///
    /// All harm categories are set to `BLOCK_NONE`; refusals still surface
    /// as safety blocks through empty responses.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            system_instruction: self
                .system_prompt
                .as_deref()
                .filter(|prompt| !prompt.is_empty())
                .map(Content::instruction),
            generation_config: GenerationConfig {
                temperature: Some(self.temperature),
                max_output_tokens: self.max_output_tokens,
                thinking_config: Some(thinking_config_for_model(&self.model_name)),
            },
            safety_settings: HarmCategory::ALL
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: HarmBlockThreshold::BlockNone,
                })
                .collect(),
        }
    }
}

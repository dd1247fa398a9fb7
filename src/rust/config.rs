use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::warn;

use crate::artifact_manager::ArtifactManager;
use crate::llm::GeminiConfig;

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

/// Settings of the HTTP service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub artifacts_dir: PathBuf,
    /// JSON file for prediction history; in-memory when `None`
    pub history_path: Option<PathBuf>,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            artifacts_dir: ArtifactManager::get_default_artifacts_dir(),
            history_path: None,
            llm_api_key: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ServiceConfig {
    /// Reads the service environment, falling back to defaults for unset or
    /// unparsable values.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(port) = non_empty_var("PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!("Ignoring invalid PORT '{}', using {}", port, config.port),
            }
        }
        if let Some(host) = non_empty_var("LIFELINE_HOST") {
            config.host = host;
        }
        config.history_path = non_empty_var("LIFELINE_HISTORY").map(PathBuf::from);
        config.llm_api_key = non_empty_var("GEMINI_API_KEY");
        if let Some(model) = non_empty_var("GEMINI_MODEL") {
            config.llm_model = model;
        }
        if let Some(secs) = non_empty_var("LIFELINE_LLM_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => config.llm_timeout = Duration::from_secs(secs),
                Err(_) => warn!("Ignoring invalid LIFELINE_LLM_TIMEOUT_SECS '{}'", secs),
            }
        }
        config
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Language model settings, if an API key is configured.
    pub fn llm(&self) -> Option<GeminiConfig> {
        self.llm_api_key.as_ref().map(|key| GeminiConfig {
            model: self.llm_model.clone(),
            timeout: self.llm_timeout,
            ..GeminiConfig::new(key.clone())
        })
    }
}

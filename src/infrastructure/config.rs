use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{DomainError, ModelLimits, DEFAULT_CONTEXT_LIMIT, RESERVE_TOKENS};

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI that helps summarize and answer questions about PDF documents using provided content. Be concise and cite page numbers if known.";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub llm: LlmConfig,
    pub store: StoreConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Upstream credential. Without it the gateway answers locally.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub referer: String,
    pub timeout_seconds: u64,
    pub temperature: f32,
    pub context_limits: HashMap<String, usize>,
    pub default_context_limit: usize,
    pub reserve_tokens: usize,
    pub max_context_chars: usize,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn model_limits(&self) -> ModelLimits {
        ModelLimits::new(self.context_limits.clone(), self.default_context_limit)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        let context_limits = [
            ("anthropic/claude-3.5-sonnet", 200_000),
            ("anthropic/claude-3-haiku", 200_000),
            ("openai/gpt-4o", 128_000),
            ("openai/gpt-4o-mini", 128_000),
            ("openai/gpt-3.5-turbo", 16_385),
            ("google/gemini-pro-1.5", 1_000_000),
            ("meta-llama/llama-3.1-70b-instruct", 131_072),
        ]
        .into_iter()
        .map(|(model, limit)| (model.to_string(), limit))
        .collect();

        Self {
            api_key: None,
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "anthropic/claude-3.5-sonnet".to_string(),
            referer: "http://localhost:3000".to_string(),
            timeout_seconds: 30,
            temperature: 0.7,
            context_limits,
            default_context_limit: DEFAULT_CONTEXT_LIMIT,
            reserve_tokens: RESERVE_TOKENS,
            max_context_chars: 12_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub retention_hours: i64,
    pub sweep_interval_seconds: u64,
}

impl StoreConfig {
    /// Fails for non-positive values and values too large for `chrono`.
    pub fn retention(&self) -> Result<chrono::TimeDelta, DomainError> {
        chrono::TimeDelta::try_hours(self.retention_hours)
            .filter(|retention| *retention > chrono::TimeDelta::zero())
            .ok_or_else(|| {
                DomainError::configuration(format!(
                    "invalid store.retention_hours {}: must be a positive number of hours",
                    self.retention_hours
                ))
            })
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            retention_hours: 24,
            sweep_interval_seconds: 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_bytes: u64,
    pub temp_dir: PathBuf,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            temp_dir: std::env::temp_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub answer: AnswerPromptConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnswerPromptConfig {
    pub system: String,
}

impl Default for AnswerPromptConfig {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the YAML file named by `CONFIG_PATH` (if present) and applies
    /// environment overrides on top.
    pub fn load() -> Result<Self, DomainError> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = Self::from_file(Path::new(&path))?.unwrap_or_default();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.config.store.retention()?;
        if self.config.store.sweep_interval_seconds == 0 {
            return Err(DomainError::configuration(
                "invalid store.sweep_interval_seconds: must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Option<Self>, DomainError> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DomainError::configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&raw).map(Some)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, DomainError> {
        serde_yaml::from_str(raw)
            .map_err(|e| DomainError::configuration(format!("invalid config: {e}")))
    }

    pub fn apply_env<F>(&mut self, var: F) -> Result<(), DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let llm = &mut self.config.llm;
        if let Some(key) = var("OPENROUTER_API_KEY").filter(|k| !k.trim().is_empty()) {
            llm.api_key = Some(key);
        }
        if let Some(model) = var("OPENROUTER_MODEL") {
            llm.model = model;
        }
        if let Some(base_url) = var("OPENROUTER_BASE_URL") {
            llm.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(referer) = var("HTTP_REFERER") {
            llm.referer = referer;
        }
        if let Some(origin) = var("FRONTEND_URL") {
            self.config.cors.allowed_origins = origin
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Some(host) = var("SERVER_HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = var("PORT") {
            self.config.server.port = port
                .parse()
                .map_err(|e| DomainError::configuration(format!("invalid PORT {port:?}: {e}")))?;
        }
        if let Some(dir) = var("UPLOAD_TMP_DIR") {
            self.config.upload.temp_dir = PathBuf::from(dir);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.config.llm.api_key.is_none());
        assert_eq!(config.config.llm.timeout(), Duration::from_secs(30));
        assert_eq!(
            config.config.store.retention().unwrap(),
            chrono::TimeDelta::hours(24)
        );
        assert_eq!(config.config.store.sweep_interval(), Duration::from_secs(3600));
        assert_eq!(config.config.upload.max_bytes, 10_485_760);
        assert_eq!(config.prompts.answer.system, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml(
            r#"
config:
  server:
    port: 8080
  llm:
    model: openai/gpt-4o-mini
prompts:
  answer:
    system: Answer tersely.
"#,
        )
        .unwrap();

        assert_eq!(config.config.server.port, 8080);
        assert_eq!(config.config.server.host, "0.0.0.0");
        assert_eq!(config.config.llm.model, "openai/gpt-4o-mini");
        assert_eq!(config.config.llm.reserve_tokens, 1000);
        assert_eq!(config.prompts.answer.system, "Answer tersely.");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(|key| match key {
                "OPENROUTER_API_KEY" => Some("sk-test".to_string()),
                "OPENROUTER_BASE_URL" => Some("http://localhost:9999/v1/".to_string()),
                "FRONTEND_URL" => Some("http://a.test, http://b.test".to_string()),
                "PORT" => Some("4000".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.config.llm.base_url, "http://localhost:9999/v1");
        assert_eq!(
            config.config.cors.allowed_origins,
            vec!["http://a.test", "http://b.test"]
        );
        assert_eq!(config.config.server.port, 4000);
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let mut config = AppConfig::default();
        config
            .apply_env(|key| (key == "OPENROUTER_API_KEY").then(|| "  ".to_string()))
            .unwrap();
        assert!(config.config.llm.api_key.is_none());
    }

    #[test]
    fn test_retention_must_be_positive_and_in_range() {
        for hours in [0, -5, i64::MAX] {
            let yaml = format!("config:\n  store:\n    retention_hours: {hours}\n");
            let config = AppConfig::from_yaml(&yaml).unwrap();
            let err = config.validate().unwrap_err();
            assert!(matches!(err, DomainError::Configuration(_)), "{hours}: {err}");
        }

        let config = AppConfig::from_yaml("config:\n  store:\n    retention_hours: 48\n").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.config.store.retention().unwrap(),
            chrono::TimeDelta::hours(48)
        );
    }

    #[test]
    fn test_zero_sweep_interval_is_rejected() {
        let config =
            AppConfig::from_yaml("config:\n  store:\n    sweep_interval_seconds: 0\n").unwrap();
        assert!(matches!(
            config.validate().unwrap_err(),
            DomainError::Configuration(_)
        ));
    }

    #[test]
    fn test_invalid_port_is_configuration_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(|key| (key == "PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, DomainError::Configuration(_)));
    }
}

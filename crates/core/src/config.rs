//! Configuration management for the MedAssist CLI.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (.medassist/config.yaml)
//!
//! Besides the LLM provider selection, the config file carries the tunables of
//! the two retrieval routines (trusted domains, result caps, timeouts, retry
//! policy) so they can be adjusted without a rebuild.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Default chat model for the Gemini provider.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Environment variable holding the Google API key when no provider config names one.
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Providers this build knows how to talk to.
pub const KNOWN_PROVIDERS: [&str; 2] = ["gemini", "ollama"];

/// Main application configuration.
///
/// This struct holds all global configuration options that affect
/// CLI behavior across commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .medassist/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Active LLM provider ("gemini" or "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Log line format (text or json)
    #[serde(default)]
    pub log_format: LogFormat,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Sampling parameters sent with every advice request
    pub generation: GenerationSettings,

    /// Evidence retrieval tunables
    pub retrieval: RetrievalSettings,

    /// Pharmacy lookup tunables
    pub pharmacy: PharmacySettings,

    /// Web search backend
    pub search: SearchSettings,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Gemini {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::Gemini { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Request timeout in seconds, if configured.
    pub fn timeout_secs(&self) -> Option<u64> {
        match self {
            Self::Gemini { .. } => None,
            Self::Ollama { timeout, .. } => *timeout,
        }
    }

    /// Endpoint override, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Gemini { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }
}

/// Sampling parameters for the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub temperature: f32,
    #[serde(rename = "topP")]
    pub top_p: f32,
    #[serde(rename = "topK")]
    pub top_k: u32,
    #[serde(rename = "maxTokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_tokens: None,
        }
    }
}

/// Evidence retrieval settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Domains the search is restricted to via `site:` filters
    #[serde(rename = "trustedDomains")]
    pub trusted_domains: Vec<String>,

    /// Number of search results to fetch pages for
    #[serde(rename = "maxResults")]
    pub max_results: usize,

    /// Timeout for each page fetch, in seconds
    #[serde(rename = "pageTimeoutSecs")]
    pub page_timeout_secs: u64,

    /// Maximum characters kept from each page
    #[serde(rename = "maxExcerptChars")]
    pub max_excerpt_chars: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            trusted_domains: vec![
                "mayoclinic.org".to_string(),
                "medlineplus.gov".to_string(),
                "who.int".to_string(),
            ],
            max_results: 3,
            page_timeout_secs: 5,
            max_excerpt_chars: 2000,
        }
    }
}

/// Pharmacy lookup settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PharmacySettings {
    #[serde(rename = "maxResults")]
    pub max_results: usize,

    /// Total attempts when the search service rate-limits
    #[serde(rename = "maxRetries")]
    pub max_retries: u32,

    /// Linear backoff unit, in seconds
    #[serde(rename = "baseDelaySecs")]
    pub base_delay_secs: f64,
}

impl Default for PharmacySettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            max_retries: 3,
            base_delay_secs: 2.0,
        }
    }
}

/// Web search backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub endpoint: String,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html/".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0"
                .to_string(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    generation: Option<GenerationSettings>,
    retrieval: Option<RetrievalSettings>,
    pharmacy: Option<PharmacySettings>,
    search: Option<SearchSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "gemini".to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_format: LogFormat::default(),
            llm: None,
            generation: GenerationSettings::default(),
            retrieval: RetrievalSettings::default(),
            pharmacy: PharmacySettings::default(),
            search: SearchSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `MEDASSIST_WORKSPACE`: Override workspace path
    /// - `MEDASSIST_CONFIG`: Path to config file
    /// - `MEDASSIST_PROVIDER`: LLM provider
    /// - `MEDASSIST_MODEL`: Model identifier
    /// - `MEDASSIST_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    /// - `MEDASSIST_LOG_FORMAT`: `text` or `json`
    ///
    /// # Example
    /// ```no_run
    /// use medassist_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Provider: {}", config.provider);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`load`](Self::load), with an explicit workspace and config file
    /// taking precedence over `MEDASSIST_WORKSPACE` and `MEDASSIST_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("MEDASSIST_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("MEDASSIST_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.config_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("MEDASSIST_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("MEDASSIST_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("MEDASSIST_API_KEY").ok();
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        if let Ok(format) = std::env::var("MEDASSIST_LOG_FORMAT") {
            config.log_format = LogFormat::parse(&format).ok_or_else(|| {
                AppError::Config(format!(
                    "Invalid MEDASSIST_LOG_FORMAT '{}': expected text or json",
                    format
                ))
            })?;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents).map_err(|e| match e {
            AppError::Config(msg) => AppError::Config(format!("{:?}: {}", path, msg)),
            other => other,
        })
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        if let Some(generation) = config_file.generation {
            result.generation = generation;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(pharmacy) = config_file.pharmacy {
            result.pharmacy = pharmacy;
        }
        if let Some(search) = config_file.search {
            result.search = search;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .medassist directory.
    pub fn config_dir(&self) -> PathBuf {
        self.workspace.join(".medassist")
    }

    /// Get the provider configuration for `provider`, if the config file has one.
    pub fn get_provider_config(&self, provider: &str) -> Option<ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider).cloned())
    }

    /// Endpoint override for `provider`.
    pub fn provider_endpoint(&self, provider: &str) -> Option<String> {
        self.get_provider_config(provider)
            .and_then(|pc| pc.endpoint().map(str::to_string))
    }

    /// Request timeout configured for `provider`.
    pub fn provider_timeout(&self, provider: &str) -> Option<Duration> {
        self.get_provider_config(provider)
            .and_then(|pc| pc.timeout_secs())
            .map(Duration::from_secs)
    }

    /// Resolve the API key for `provider`.
    ///
    /// Order: `MEDASSIST_API_KEY`, the provider's `apiKeyEnv`, then
    /// `GOOGLE_API_KEY` for gemini.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::Gemini { api_key_env, .. }) => Some(api_key_env),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if provider == "gemini" => Some(GOOGLE_API_KEY_ENV.to_string()),
            None => None,
        };

        env_var
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.as_str();

        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "gemini" && self.resolve_api_key(provider).is_none() {
            let env_var = match self.get_provider_config(provider) {
                Some(ProviderConfig::Gemini { api_key_env, .. }) => api_key_env,
                _ => GOOGLE_API_KEY_ENV.to_string(),
            };
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                env_var
            )));
        }

        if self.retrieval.max_excerpt_chars == 0 {
            return Err(AppError::Config(
                "retrieval.maxExcerptChars must be greater than zero".to_string(),
            ));
        }

        if self.pharmacy.base_delay_secs < 0.0 || !self.pharmacy.base_delay_secs.is_finite() {
            return Err(AppError::Config(format!(
                "pharmacy.baseDelaySecs must be a non-negative number, got {}",
                self.pharmacy.base_delay_secs
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.retrieval.max_results, 3);
        assert_eq!(config.retrieval.page_timeout_secs, 5);
        assert_eq!(config.retrieval.max_excerpt_chars, 2000);
        assert_eq!(config.pharmacy.max_results, 5);
        assert_eq!(config.pharmacy.max_retries, 3);
        assert_eq!(config.pharmacy.base_delay_secs, 2.0);
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_config_dir() {
        let config = AppConfig::default();
        assert!(config.config_dir().ends_with(".medassist"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_sections() {
        let yaml = r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: http://localhost:11434
      model: llama3.2
    gemini:
      apiKeyEnv: MY_GEMINI_KEY
      model: gemini-1.5-pro
retrieval:
  trustedDomains: [nhs.uk]
  maxResults: 2
pharmacy:
  maxRetries: 5
  baseDelaySecs: 0.5
logging:
  level: warn
  color: false
  format: json
"#;
        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();

        assert_eq!(merged.provider, "ollama");
        assert_eq!(merged.model, "llama3.2");
        assert_eq!(merged.retrieval.trusted_domains, vec!["nhs.uk".to_string()]);
        assert_eq!(merged.retrieval.max_results, 2);
        // Unspecified keys keep their defaults
        assert_eq!(merged.retrieval.max_excerpt_chars, 2000);
        assert_eq!(merged.pharmacy.max_retries, 5);
        assert_eq!(merged.pharmacy.max_results, 5);
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert!(merged.no_color);
        assert_eq!(merged.log_format, LogFormat::Json);

        assert!(matches!(
            merged.get_provider_config("gemini"),
            Some(ProviderConfig::Gemini { ref api_key_env, .. }) if api_key_env == "MY_GEMINI_KEY"
        ));
        assert_eq!(
            merged.provider_endpoint("ollama"),
            Some("http://localhost:11434".to_string())
        );
        assert_eq!(merged.provider_timeout("ollama"), None);
    }

    #[test]
    fn test_merge_yaml_rejects_garbage() {
        let result = AppConfig::default().merge_yaml_str("llm: [unclosed");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_yaml_file_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "pharmacy:\n  maxResults: 8\n").unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.pharmacy.max_results, 8);
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let mut config = AppConfig::default();
        config.api_key = Some("explicit".to_string());
        assert_eq!(config.resolve_api_key("gemini"), Some("explicit".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_gemini_with_key() {
        let mut config = AppConfig::default();
        config.api_key = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_delay() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        config.pharmacy.base_delay_secs = -1.0;
        assert!(config.validate().is_err());
    }
}

//! Extraction configuration.
//!
//! Resolved in layers, later layers winning:
//!
//! 1. built-in defaults
//! 2. a TOML file
//! 3. a `KEY=VALUE` credentials file, which only fills values still unset
//! 4. environment variables (`OPENAI_API_KEY` or `OPENAI_API_TOKEN`,
//!    `OPENAI_MODEL`, `OPENAI_BASE_URL`, `DEMANDES_MULTI_RECORD`)
//!
//! The API key is never shown: `Debug` and [`ExtractConfig::redacted`] mask it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Credentials file looked up in the working directory when none is configured.
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.txt";

const REDACTED: &str = "***";

/// Errors from configuration loading.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(demande::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(demande::config::parse),
        help("Check the TOML syntax; see `demande config` for the expected keys.")
    )]
    Parse { path: String, message: String },

    #[error("failed to read credentials file: {path}")]
    #[diagnostic(
        code(demande::config::credentials),
        help("The credentials file holds KEY=VALUE lines such as OPENAI_API_KEY=...; remove `ai.credentials_file` to skip it.")
    )]
    Credentials {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Keep every deduplicated record instead of the single best one.
    #[serde(default)]
    pub multi_record: bool,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub nlp: NlpConfig,
}

/// Settings of the LLM-backed extractor.
#[derive(Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Try the AI extractor before the rule-based one.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// API root; endpoint paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
}

/// Settings of the rule-based extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NlpConfig {
    /// Directory of `<lang>.toml` gazetteers extending the built-in recognizers.
    #[serde(default)]
    pub gazetteer_dir: Option<PathBuf>,
}

fn default_enabled() -> bool {
    true
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_output_tokens() -> u32 {
    800
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_output_tokens: default_max_output_tokens(),
            credentials_file: None,
        }
    }
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("credentials_file", &self.credentials_file)
            .finish()
    }
}

impl AiConfig {
    /// The API key, if one is set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Whether the AI path should be attempted.
    pub fn is_usable(&self) -> bool {
        self.enabled && self.api_key().is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ExtractConfig {
    /// Load a TOML file; missing keys take their defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Full resolution: defaults, optional TOML file, credentials file, environment.
    pub fn resolve(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_credentials_file()?;
        config.apply_env();
        tracing::debug!(
            ai_enabled = config.ai.enabled,
            ai_key = config.ai.api_key().is_some(),
            model = %config.ai.model,
            multi_record = config.multi_record,
            "configuration resolved"
        );
        Ok(config)
    }

    /// Defaults overlaid with the credentials file and environment; a
    /// credentials file that cannot be read is ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Err(err) = config.apply_credentials_file() {
            tracing::warn!(error = %err, "ignoring credentials file");
        }
        config.apply_env();
        config
    }

    /// Fill the API key and model from the credentials file when still unset.
    ///
    /// A configured file must exist; the default `credentials.txt` is optional.
    pub fn apply_credentials_file(&mut self) -> ConfigResult<()> {
        let (path, required) = match &self.ai.credentials_file {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CREDENTIALS_FILE), false),
        };
        if !required && !path.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Credentials {
            path: path.display().to_string(),
            source: e,
        })?;
        let values = parse_credentials(&content);
        if self.ai.api_key().is_none() {
            if let Some(key) = values.get("OPENAI_API_KEY").filter(|v| !v.is_empty()) {
                self.ai.api_key = Some(key.clone());
            }
        }
        if self.ai.model == default_model() {
            if let Some(model) = values.get("OPENAI_MODEL").filter(|v| !v.is_empty()) {
                self.ai.model = model.clone();
            }
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any variable source.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = get("OPENAI_API_KEY").or_else(|| get("OPENAI_API_TOKEN")) {
            self.ai.api_key = Some(key);
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.ai.model = model;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.ai.base_url = url;
        }
        if let Some(flag) = get("DEMANDES_MULTI_RECORD") {
            match parse_flag(&flag) {
                Some(value) => self.multi_record = value,
                None => tracing::warn!(value = %flag, "ignoring unrecognised DEMANDES_MULTI_RECORD"),
            }
        }
    }

    /// A copy safe to print: the API key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.ai.api_key.is_some() {
            copy.ai.api_key = Some(REDACTED.into());
        }
        copy
    }

    /// Serialize the redacted configuration as TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(&self.redacted()).map_err(|e| ConfigError::Parse {
            path: "<effective config>".into(),
            message: e.to_string(),
        })
    }
}

/// `KEY=VALUE` lines; blank lines and lines without `=` are skipped.
pub fn parse_credentials(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

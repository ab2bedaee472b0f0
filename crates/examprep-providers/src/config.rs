//! Application configuration and collaborator factories.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examprep_core::engine::DEFAULT_SAMPLE_SIZE;
use examprep_core::traits::{ImageEditor, QuestionGenerator};

use crate::gemini::{GeminiProvider, DEFAULT_IMAGE_MODEL, DEFAULT_QUESTION_MODEL};

const GEMINI_KEY_ENV: &str = "EXAMPREP_GEMINI_KEY";

/// Configuration for a single provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

/// Top-level examprep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamprepConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider used by `edit-image` and `generate`.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Model used for image edits.
    #[serde(default = "default_image_model")]
    pub image_model: String,
    /// Model used for question generation.
    #[serde(default = "default_question_model")]
    pub question_model: String,
    /// Questions drawn per exam.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    /// Deadline for a single collaborator call, in seconds.
    #[serde(default = "default_edit_timeout")]
    pub edit_timeout_secs: u64,
    /// Bank file or directory used when `--bank` is not given.
    #[serde(default)]
    pub question_bank: Option<PathBuf>,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}
fn default_question_model() -> String {
    DEFAULT_QUESTION_MODEL.to_string()
}
fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}
fn default_edit_timeout() -> u64 {
    60
}

impl Default for ExamprepConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            image_model: default_image_model(),
            question_model: default_question_model(),
            sample_size: default_sample_size(),
            edit_timeout_secs: default_edit_timeout(),
            question_bank: None,
        }
    }
}

impl ExamprepConfig {
    pub fn edit_timeout(&self) -> Duration {
        Duration::from_secs(self.edit_timeout_secs)
    }

    /// Look up the configured default provider.
    pub fn default_provider_config(&self) -> Result<&ProviderConfig> {
        self.providers.get(&self.default_provider).with_context(|| {
            format!(
                "provider '{}' is not configured (set {GEMINI_KEY_ENV} or add it to examprep.toml)",
                self.default_provider
            )
        })
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + end]).unwrap_or_default();
        result.replace_range(start..start + end + 1, &value);
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Gemini { api_key, base_url } => ProviderConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examprep.toml` in the current directory
/// 2. `~/.config/examprep/config.toml`
///
/// `EXAMPREP_GEMINI_KEY` overrides the Gemini API key.
pub fn load_config() -> Result<ExamprepConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamprepConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("examprep.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ExamprepConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamprepConfig::default(),
    };

    if let Ok(key) = std::env::var(GEMINI_KEY_ENV) {
        let entry = config
            .providers
            .entry("gemini".into())
            .or_insert(ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
            });
        let ProviderConfig::Gemini { api_key, .. } = entry;
        *api_key = key;
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examprep"))
}

fn create_gemini(config: &ExamprepConfig, provider: &ProviderConfig) -> Result<GeminiProvider> {
    match provider {
        ProviderConfig::Gemini { api_key, base_url } => {
            if api_key.trim().is_empty() {
                anyhow::bail!("Gemini API key is empty (set {GEMINI_KEY_ENV})");
            }
            Ok(GeminiProvider::new(api_key, base_url.clone())?
                .with_models(&config.image_model, &config.question_model))
        }
    }
}

/// Create the configured image editor.
pub fn create_image_editor(config: &ExamprepConfig) -> Result<Box<dyn ImageEditor>> {
    let provider = config.default_provider_config()?;
    Ok(Box::new(create_gemini(config, provider)?))
}

/// Create the configured question generator.
pub fn create_question_generator(config: &ExamprepConfig) -> Result<Box<dyn QuestionGenerator>> {
    let provider = config.default_provider_config()?;
    Ok(Box::new(create_gemini(config, provider)?))
}

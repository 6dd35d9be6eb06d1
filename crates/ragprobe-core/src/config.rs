//! Layered settings loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `ragprobe.toml` + `ragprobe.<env>.toml`
//! + `RAGPROBE_*` env vars (`__` separates nested keys, e.g. `RAGPROBE_RAG__TOP_K`).

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::RagConfig;

pub const ENV_PREFIX: &str = "RAGPROBE_";
pub const ENV_SELECTOR: &str = "RAGPROBE_ENV";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    #[default]
    BagOfWords,
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    /// Only used by the hashing backend; bag-of-words has a fixed vocabulary.
    pub dimension: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self { Self { backend: EmbeddingBackend::BagOfWords, dimension: 256 } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderChoice {
    /// Pick from the API key prefix, or fall back to the extractive oracle without a key.
    #[default]
    Auto,
    Groq,
    Openai,
    Anthropic,
    Gemini,
    Extractive,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    pub provider: ProviderChoice,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            provider: ProviderChoice::Auto,
            api_key: None,
            model: None,
            base_url: None,
            temperature: 0.2,
            max_tokens: 1024,
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for OracleSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleSettings")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// What to do when the answering backend fails on one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OracleErrorPolicy {
    /// Fail the whole pass with the first error.
    #[default]
    Abort,
    /// Keep the failure on the question's result and continue. The result is
    /// an abstention and still counts toward the metrics, but it is left out
    /// of the counts recommendations are drawn from.
    Record,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalSettings {
    pub max_duration_secs: u64,
    pub on_oracle_error: OracleErrorPolicy,
    pub min_questions: usize,
    pub max_questions: usize,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self { max_duration_secs: 60, on_oracle_error: OracleErrorPolicy::Abort, min_questions: 3, max_questions: 20 }
    }
}

/// Everything a run needs besides documents and questions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub oracle: OracleSettings,
    #[serde(default)]
    pub eval: EvalSettings,
}

impl Settings {
    /// Load from the current directory.
    pub fn load() -> Result<Self> { Self::load_from(Path::new(".")) }

    /// Merge defaults, `ragprobe.toml`, `ragprobe.<env>.toml` and `RAGPROBE_*` variables.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let env_name = env::var(ENV_SELECTOR).unwrap_or_else(|_| "dev".to_string());
        let settings: Settings = Self::figment(dir, &env_name)
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        tracing::debug!(env = %env_name, ?settings, "loaded settings");
        Ok(settings)
    }

    pub fn figment(dir: &Path, env_name: &str) -> Figment {
        let mut figment = Figment::new().merge(Toml::file(dir.join("ragprobe.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("ragprobe.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("ragprobe.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("ragprobe.test.toml"))),
            _ => {}
        }
        figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["env"]).split("__"))
    }

    pub fn validate(&self) -> Result<()> {
        self.rag.validate()?;
        if self.embedding.dimension == 0 {
            return Err(Error::InvalidConfig("embedding.dimension must be positive".into()));
        }
        if self.eval.min_questions == 0 || self.eval.min_questions > self.eval.max_questions {
            return Err(Error::InvalidConfig(format!(
                "eval question bounds are inconsistent: {}..={}",
                self.eval.min_questions, self.eval.max_questions
            )));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

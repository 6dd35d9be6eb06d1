use std::env;
use std::fmt;

use ragprobe_core::config::ProviderChoice;

/// Hosted chat-completion services the HTTP oracle can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Groq,
    OpenAi,
    Anthropic,
    Gemini,
}

impl Provider {
    /// Guess the provider from the key prefix. Unknown keys are treated as Groq.
    pub fn detect(api_key: &str) -> Self {
        if api_key.starts_with("gsk_") {
            Provider::Groq
        } else if api_key.starts_with("sk-ant-") {
            Provider::Anthropic
        } else if api_key.starts_with("sk-") {
            Provider::OpenAi
        } else if api_key.starts_with("AIza") {
            Provider::Gemini
        } else {
            Provider::Groq
        }
    }

    /// The provider an explicit choice names; `None` for `auto` and `extractive`.
    pub fn from_choice(choice: ProviderChoice) -> Option<Self> {
        match choice {
            ProviderChoice::Groq => Some(Provider::Groq),
            ProviderChoice::Openai => Some(Provider::OpenAi),
            ProviderChoice::Anthropic => Some(Provider::Anthropic),
            ProviderChoice::Gemini => Some(Provider::Gemini),
            ProviderChoice::Auto | ProviderChoice::Extractive => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Provider::Groq => "groq",
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Groq => "llama-3.3-70b-versatile",
            Provider::OpenAi => "gpt-4o",
            Provider::Anthropic => "claude-3-5-sonnet-20240620",
            Provider::Gemini => "gemini-1.5-pro",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::Groq => "https://api.groq.com/openai/v1",
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Anthropic => "https://api.anthropic.com/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    /// Environment variable consulted when no key is configured.
    pub fn key_env_var(self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Configured key if non-empty, else the provider's environment variable.
pub fn resolve_api_key(configured: Option<&str>, provider: Provider) -> Option<String> {
    configured
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .or_else(|| env::var(provider.key_env_var()).ok().filter(|k| !k.trim().is_empty()))
}

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Answering backends: hosted chat models over HTTP and an offline extractive
//! fallback, sharing one grounding post-processor.

use ragprobe_core::config::{OracleSettings, ProviderChoice};
use ragprobe_core::error::OracleError;
use ragprobe_core::traits::AnsweringOracle;

pub mod extractive;
pub mod grounding;
pub mod http;
pub mod provider;

pub use extractive::ExtractiveOracle;
pub use grounding::{finalize, REFUSAL_ANSWER};
pub use http::ChatOracle;
pub use provider::{resolve_api_key, Provider};

/// Build the oracle `settings` describe.
///
/// `auto` detects the provider from the configured key (or `GROQ_API_KEY`)
/// and falls back to the extractive oracle when there is no key. An explicit
/// hosted provider without a key is an error.
pub fn build_oracle(settings: &OracleSettings) -> Result<Box<dyn AnsweringOracle>, OracleError> {
    match settings.provider {
        ProviderChoice::Extractive => Ok(Box::new(ExtractiveOracle::new())),
        ProviderChoice::Auto => match resolve_api_key(settings.api_key.as_deref(), Provider::Groq) {
            Some(key) => hosted(Provider::detect(&key), key, settings),
            None => {
                tracing::warn!("no API key configured; answering with the extractive oracle");
                Ok(Box::new(ExtractiveOracle::new()))
            }
        },
        choice => {
            let provider = Provider::from_choice(choice)
                .ok_or_else(|| OracleError::Unavailable(format!("{choice:?} is not a hosted provider")))?;
            let key = resolve_api_key(settings.api_key.as_deref(), provider)
                .ok_or_else(|| OracleError::MissingApiKey(provider.name().to_string()))?;
            hosted(provider, key, settings)
        }
    }
}

fn hosted(provider: Provider, key: String, settings: &OracleSettings) -> Result<Box<dyn AnsweringOracle>, OracleError> {
    let oracle = ChatOracle::new(provider, key, settings)?;
    tracing::info!(provider = %oracle.provider(), model = oracle.model(), "using hosted oracle");
    Ok(Box::new(oracle))
}

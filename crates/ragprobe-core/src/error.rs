use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Oracle failed on question '{question}': {source}")]
    Oracle {
        question: String,
        #[source]
        source: OracleError,
    },

    #[error("Evaluation exceeded its {budget_secs}s budget after {elapsed_secs:.1}s")]
    Timeout { budget_secs: u64, elapsed_secs: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of an answering backend. Never retried here; retries belong to the backend.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("No API key configured for {0}")]
    MissingApiKey(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("{provider} returned HTTP {status}: {body}")]
    Status { provider: String, status: u16, body: String },

    #[error("Unexpected response: {0}")]
    ResponseParse(String),

    #[error("Oracle unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("Failed to load configuration: {0}")]
    Config(String),

    #[error("Failed to bind to address {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    /// No usable store session (never connected, unreachable, or a template
    /// harvested from a session that has since been replaced).
    #[error("Store connection error: {0}")]
    Connection(String),

    /// The batched inference call failed as a whole.
    #[error("Inference error: {0}")]
    Inference(String),

    /// A write failed after inference succeeded. Rows before it stay durable.
    #[error("Persistence error after {written}/{total} rows: {message}")]
    Persistence {
        written: usize,
        total: usize,
        message: String,
    },

    /// Any other store failure (schema bootstrap, scan, rejected insert).
    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid article: {0}")]
    InvalidArticle(String),
}

impl From<clickhouse::error::Error> for SummarizerError {
    fn from(e: clickhouse::error::Error) -> Self {
        match e {
            clickhouse::error::Error::Network(_) => Self::Connection(e.to_string()),
            other => Self::Store(other.to_string()),
        }
    }
}

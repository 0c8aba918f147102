use relay_core::timestamps::TimestampError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// The `Total` header was missing or not an integer.
    #[error("page count unavailable: {0}")]
    Pagination(String),

    /// The request never produced a response (connect, timeout, TLS, body read).
    #[error("{context} failed: {source}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// The source API answered with a non-2xx status.
    #[error("{context} returned HTTP {status}")]
    Status { context: String, status: StatusCode },

    /// A page body was not a JSON array. Ends the run without failing it.
    #[error("page {page} is not a JSON array: {message}")]
    Decode { page: u64, message: String },

    /// A record's timestamp field could not be used.
    #[error("page {page} record {index}: {source}")]
    Field {
        page: u64,
        index: usize,
        #[source]
        source: TimestampError,
    },

    /// The sink answered with something other than HTTP 200.
    #[error("hec delivery failed: {0}")]
    Delivery(String),

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl RelayError {
    pub fn transport(context: impl Into<String>, source: reqwest::Error) -> Self {
        RelayError::Transport {
            context: context.into(),
            source,
        }
    }

    pub fn status(context: impl Into<String>, status: StatusCode) -> Self {
        RelayError::Status {
            context: context.into(),
            status,
        }
    }

    /// Short label used as the `kind` field in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Pagination(_) => "pagination",
            RelayError::Transport { .. } | RelayError::Status { .. } => "transport",
            RelayError::Decode { .. } => "decode",
            RelayError::Field { .. } => "field",
            RelayError::Delivery(_) => "delivery",
            RelayError::Client(_) => "client",
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

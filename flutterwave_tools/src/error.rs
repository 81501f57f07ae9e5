use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlutterwaveApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The request to Flutterwave timed out")]
    Timeout,
    #[error("Could not reach Flutterwave: {0}")]
    Transport(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Flutterwave declined the request: {0}")]
    Unsuccessful(String),
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
}

impl FlutterwaveApiError {
    /// The request may or may not have reached Flutterwave. Its effect is unknown.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) => true,
            Self::QueryError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FlutterwaveApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::JsonError(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

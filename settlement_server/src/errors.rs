use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use settlement_engine::{CheckoutError, GatewayError, LedgerError, PayoutError, ReconciliationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Webhook signature is invalid")]
    InvalidSignature,
    #[error("Payment provider error. {0}")]
    GatewayError(String),
    #[error("The payment provider is unavailable. {0}")]
    GatewayUnavailable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::CouldNotIssueToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::GatewayUnavailable(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Could not issue an access token. {0}")]
    CouldNotIssueToken(String),
}

fn from_gateway_error(e: GatewayError) -> ServerError {
    if e.is_transient() {
        ServerError::GatewayUnavailable(e.to_string())
    } else {
        ServerError::GatewayError(e.to_string())
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::DatabaseError(s) => Self::BackendError(s),
            CheckoutError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            CheckoutError::PaymentInitializationFailed { ref reason, .. } if reason.is_transient() => {
                Self::GatewayUnavailable(e.to_string())
            },
            CheckoutError::PaymentInitializationFailed { .. } => Self::GatewayError(e.to_string()),
            CheckoutError::EmptyCart |
            CheckoutError::MissingDeliveryAddress |
            CheckoutError::InsufficientStock(_) |
            CheckoutError::ProductNotFound(_) |
            CheckoutError::InvalidQuantity(_) |
            CheckoutError::MultipleSellers |
            CheckoutError::OrderNotPayable(_) => Self::ValidationError(e.to_string()),
        }
    }
}

impl From<ReconciliationError> for ServerError {
    fn from(e: ReconciliationError) -> Self {
        match e {
            ReconciliationError::DatabaseError(s) => Self::BackendError(s),
            ReconciliationError::InvalidSignature => Self::InvalidSignature,
            ReconciliationError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            ReconciliationError::ReferenceMismatch { .. } | ReconciliationError::MalformedPayload(_) => {
                Self::ValidationError(e.to_string())
            },
            ReconciliationError::Gateway(g) => from_gateway_error(g),
        }
    }
}

impl From<PayoutError> for ServerError {
    fn from(e: PayoutError) -> Self {
        match e {
            PayoutError::DatabaseError(s) => Self::BackendError(s),
            PayoutError::PayoutNotFound(_) => Self::NoRecordFound(e.to_string()),
            PayoutError::GatewayRejected(_) => Self::GatewayError(e.to_string()),
            PayoutError::GatewayUnavailable(_) => Self::GatewayUnavailable(e.to_string()),
            PayoutError::InsufficientBalance { .. } |
            PayoutError::BelowMinimum { .. } |
            PayoutError::InvalidAccountDetails(_) => Self::ValidationError(e.to_string()),
        }
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DatabaseError(s) => Self::BackendError(s),
        }
    }
}

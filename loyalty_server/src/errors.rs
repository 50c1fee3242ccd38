use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use loyalty_common::Points;
use loyalty_engine::{LedgerApiError, OrderIntakeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error. {0}")]
    CouldNotDeserializePayload(String),
    #[error("The request body is empty")]
    EmptyRequestBody,
    #[error("{0} is not a valid order number")]
    InvalidOrderNumber(String),
    #[error("Withdrawal amounts must be positive. {0} is not")]
    InvalidAmount(Points),
    #[error("Order {0} has already been submitted by another user")]
    OrderConflict(String),
    #[error("Insufficient funds. Requested {requested}, but only {available} is available")]
    InsufficientFunds { available: Points, requested: Points },
    #[error("No balance exists for this account. {0}")]
    AccountNotFound(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload(_) => StatusCode::BAD_REQUEST,
            Self::EmptyRequestBody => StatusCode::BAD_REQUEST,
            Self::InvalidOrderNumber(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::OrderConflict(_) => StatusCode::CONFLICT,
            Self::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            // Every user gets a balance on sign-up, so a missing one is a server-side fault.
            Self::AccountNotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Access token has expired.")]
    Expired,
}

impl From<OrderIntakeError> for ServerError {
    fn from(e: OrderIntakeError) -> Self {
        match e {
            OrderIntakeError::InvalidOrderNumber(n) => Self::InvalidOrderNumber(n),
            OrderIntakeError::OrderBelongsToAnotherUser(n) => Self::OrderConflict(n.as_str().to_string()),
            OrderIntakeError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}

impl From<LedgerApiError> for ServerError {
    fn from(e: LedgerApiError) -> Self {
        match e {
            LedgerApiError::InvalidOrderNumber(n) => Self::InvalidOrderNumber(n),
            LedgerApiError::InvalidAmount(p) => Self::InvalidAmount(p),
            LedgerApiError::InsufficientFunds { available, requested } => {
                Self::InsufficientFunds { available, requested }
            },
            LedgerApiError::AccountNotFound(id) => Self::AccountNotFound(format!("Owner {id}")),
            LedgerApiError::BalanceOverflow(id) => Self::BackendError(format!("Balance overflow for owner {id}")),
            LedgerApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}

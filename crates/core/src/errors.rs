use thiserror::Error;

use crate::recommendations::DataAccessError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown recommendation kind `{0}`")]
    InvalidRecommendationKind(String),
    #[error("invalid viewer key `{0}` (expected user:<id> or anon:<address>)")]
    InvalidViewerKey(String),
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("catalog or interaction data unavailable: {0}")]
    Persistence(String),
    #[error("misconfigured: {0}")]
    Configuration(String),
}

impl From<DataAccessError> for ApplicationError {
    fn from(error: DataAccessError) -> Self {
        Self::Persistence(error.to_string())
    }
}

/// Errors as shown to HTTP and CLI callers. `message` is for logs only;
/// responses carry [`InterfaceError::user_message`] and the correlation id.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("[{correlation_id}] rejected: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("[{correlation_id}] unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("[{correlation_id}] internal: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "Unsupported recommendation request. Check the kind, viewer and limit."
            }
            Self::ServiceUnavailable { .. } => {
                "Recommendations are temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "Something went wrong while computing recommendations.",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::ServiceUnavailable { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::BadRequest { .. })
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        match self {
            Self::Domain(error) => {
                InterfaceError::BadRequest { message: error.to_string(), correlation_id }
            }
            Self::Persistence(message) => {
                InterfaceError::ServiceUnavailable { message, correlation_id }
            }
            Self::Configuration(message) => InterfaceError::Internal { message, correlation_id },
        }
    }
}

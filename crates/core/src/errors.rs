use thiserror::Error;

use crate::config::ConfigError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid selection: {field} {message}")]
    InvalidSelection { field: &'static str, message: String },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("catalog ingestion failure: {0}")]
    Ingestion(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::InvalidSelection { .. }) => {
                "The selection could not be added. Check quantity, discount and branding price."
            }
            Self::Domain(DomainError::InvariantViolation(_)) => {
                "The offer is in an inconsistent state. Clear it and try again."
            }
            Self::Ingestion(_) => {
                "The product catalog is unavailable right now. The offer can still be edited."
            }
            Self::Configuration(_) => "The application is misconfigured.",
        }
    }

    pub fn is_degradable(&self) -> bool {
        matches!(self, Self::Ingestion(_))
    }
}

impl From<ConfigError> for ApplicationError {
    fn from(value: ConfigError) -> Self {
        Self::Configuration(value.to_string())
    }
}

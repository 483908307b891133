use thiserror::Error;

use super::types::EntityKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid language: {code}")]
    InvalidLanguage { code: String },
    #[error("{kind} models are not tracked in the changes registry")]
    Untrackable { kind: EntityKind },
    #[error("domain validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn invalid_language(code: impl Into<String>) -> Self {
        Self::InvalidLanguage { code: code.into() }
    }

    pub fn untrackable(kind: EntityKind) -> Self {
        Self::Untrackable { kind }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

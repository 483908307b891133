use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    cache::RenderError, config::LoadError, content::ContentError, domain::error::DomainError,
    infra::error::InfraError,
};

/// An error flattened into its message chain for reporting.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }

    /// `outer: inner: innermost`.
    pub fn summary(&self) -> String {
        let mut summary = String::new();
        for message in &self.messages {
            if summary.contains(message.as_str()) {
                continue;
            }
            if !summary.is_empty() {
                summary.push_str(": ");
            }
            summary.push_str(message);
        }
        summary
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error("entity `{0}` not found")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn not_found(reference: impl Into<String>) -> Self {
        Self::NotFound(reference.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code for the CLI, following `sysexits.h`.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::NotFound(_) => 66,
            AppError::Content(err) if err.is_not_found() => 66,
            AppError::Domain(DomainError::InvalidLanguage { .. }) => 66,
            AppError::Domain(_) | AppError::Validation(_) => 65,
            AppError::Content(ContentError::AlreadyPublished) => 65,
            AppError::Config(_) => 78,
            AppError::Content(ContentError::Io { .. }) | AppError::Infra(InfraError::Io(_)) => 74,
            AppError::Content(_)
            | AppError::Render(_)
            | AppError::Infra(_)
            | AppError::Unexpected(_) => 70,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}

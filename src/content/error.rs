use std::path::PathBuf;

use thiserror::Error;

use super::version_id::VersionId;
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Version \"{}\" does not already exist", describe(.version, .language))]
    VersionNotFound {
        version: VersionId,
        language: Option<String>,
    },
    #[error("This version is already published")]
    AlreadyPublished,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("content file `{}` could not be accessed", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("content file `{}` could not be decoded: {message}", .path.display())]
    Codec { path: PathBuf, message: String },
}

impl ContentError {
    pub fn version_not_found(version: VersionId, language: Option<String>) -> Self {
        Self::VersionNotFound { version, language }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn codec(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Codec {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Missing versions and unknown languages both surface as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ContentError::VersionNotFound { .. }
                | ContentError::Domain(DomainError::InvalidLanguage { .. })
        )
    }
}

fn describe(version: &VersionId, language: &Option<String>) -> String {
    match language {
        Some(code) => format!("{version} ({code})"),
        None => version.to_string(),
    }
}

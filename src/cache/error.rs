use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache file `{}` could not be accessed", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cache value could not be (de)serialized")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid cache key `{key}`")]
    InvalidKey { key: String },
}

impl CacheError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey { key: key.into() }
    }
}

/// Failures of the external renderer. Never cached.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("The content representation cannot be found")]
    RepresentationNotFound { representation: String },
    #[error("The default template does not exist")]
    TemplateNotFound { template: String },
    #[error("render failed: {message}")]
    Failed { message: String },
}

impl RenderError {
    pub fn representation_not_found(representation: impl Into<String>) -> Self {
        Self::RepresentationNotFound {
            representation: representation.into(),
        }
    }

    pub fn template_not_found(template: impl Into<String>) -> Self {
        Self::TemplateNotFound {
            template: template.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

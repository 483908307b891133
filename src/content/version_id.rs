use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Names one variant of an entity's content.
///
/// `Published` is the authoritative state; `Changes` holds unsaved drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionId {
    #[serde(alias = "latest")]
    Published,
    Changes,
}

impl VersionId {
    pub fn value(self) -> &'static str {
        match self {
            VersionId::Published => "published",
            VersionId::Changes => "changes",
        }
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

impl FromStr for VersionId {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "published" | "latest" => Ok(VersionId::Published),
            "changes" => Ok(VersionId::Changes),
            other => Err(DomainError::validation(format!(
                "unknown version id `{other}`"
            ))),
        }
    }
}

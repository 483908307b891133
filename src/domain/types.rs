//! Shared domain enumerations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of content-bearing model an [`Entity`](super::entities::Entity) represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Site,
    Page,
    File,
    User,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Site => "site",
            EntityKind::Page => "page",
            EntityKind::File => "file",
            EntityKind::User => "user",
        }
    }

    /// Bucket of the changes registry that holds drafts of this kind.
    ///
    /// The site is not tracked; its drafts are discovered from disk.
    pub fn changes_bucket(self) -> Option<ChangesBucket> {
        match self {
            EntityKind::Page => Some(ChangesBucket::Pages),
            EntityKind::File => Some(ChangesBucket::Files),
            EntityKind::User => Some(ChangesBucket::Users),
            EntityKind::Site => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed partitions of the changes registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangesBucket {
    Pages,
    Files,
    Users,
}

impl ChangesBucket {
    pub const ALL: [ChangesBucket; 3] = [
        ChangesBucket::Pages,
        ChangesBucket::Files,
        ChangesBucket::Users,
    ];

    /// Cache key under which the bucket's UUID list is stored.
    pub fn as_str(self) -> &'static str {
        match self {
            ChangesBucket::Pages => "pages",
            ChangesBucket::Files => "files",
            ChangesBucket::Users => "users",
        }
    }

    /// Entity kind whose drafts land in this bucket.
    pub fn kind(self) -> EntityKind {
        match self {
            ChangesBucket::Pages => EntityKind::Page,
            ChangesBucket::Files => EntityKind::File,
            ChangesBucket::Users => EntityKind::User,
        }
    }
}

impl fmt::Display for ChangesBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

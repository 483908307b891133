//! Content-bearing models as seen by the content store.

use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use super::types::{ChangesBucket, EntityKind};

/// A site, page, file or user whose fields live in content files.
///
/// The store never creates or destroys entities; it only reads and writes
/// the content files below [`Entity::root`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    kind: EntityKind,
    id: String,
    uuid: Uuid,
    root: PathBuf,
    content_name: String,
}

impl Entity {
    pub fn new(
        kind: EntityKind,
        id: impl Into<String>,
        uuid: Uuid,
        root: impl Into<PathBuf>,
        content_name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            id: id.into(),
            uuid,
            root: root.into(),
            content_name: content_name.into(),
        }
    }

    pub fn site(uuid: Uuid, root: impl Into<PathBuf>) -> Self {
        Self::new(EntityKind::Site, "site", uuid, root, "site")
    }

    pub fn page(
        id: impl Into<String>,
        uuid: Uuid,
        root: impl Into<PathBuf>,
        template: impl Into<String>,
    ) -> Self {
        Self::new(EntityKind::Page, id, uuid, root, template)
    }

    /// A file's meta content lives next to it as `<filename>[.<lang>].txt`.
    pub fn file(
        id: impl Into<String>,
        uuid: Uuid,
        root: impl Into<PathBuf>,
        filename: impl Into<String>,
    ) -> Self {
        Self::new(EntityKind::File, id, uuid, root, filename)
    }

    pub fn user(id: impl Into<String>, uuid: Uuid, root: impl Into<PathBuf>) -> Self {
        Self::new(EntityKind::User, id, uuid, root, "user")
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Path-like identifier, e.g. `blog/hello-world`; used for cache ids.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Folder holding the entity's published content files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Base name of the content file (template name, `site`, `user`, or the
    /// file name for file meta content).
    pub fn content_name(&self) -> &str {
        &self.content_name
    }

    pub fn changes_bucket(&self) -> Option<ChangesBucket> {
        self.kind.changes_bucket()
    }
}

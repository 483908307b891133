//! Versioned flat-file content.
//!
//! Every entity keeps one text file per (version, language). Published files
//! sit in the entity's folder, drafts in its `_changes` subfolder.

use std::collections::BTreeMap;

pub mod changes;
pub mod codec;
pub mod error;
pub mod file;
pub mod tree;
pub mod version;
pub mod version_id;

/// Field name to raw field value, as stored in a content file.
pub type Fields = BTreeMap<String, String>;

pub use changes::{ChangesRegistry, EntityResolver};
pub use error::ContentError;
pub use tree::ContentTree;
pub use version::{Content, Version};
pub use version_id::VersionId;

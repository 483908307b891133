//! Content file locations.
//!
//! `root[/_changes]/<name>[.<lang>].txt`: drafts live in a `_changes` folder
//! inside the entity's folder, published files sit directly in it. Nothing
//! else differs between the two.

use std::path::{Path, PathBuf};

use super::version_id::VersionId;

pub const CHANGES_DIR: &str = "_changes";
pub const CONTENT_EXTENSION: &str = "txt";
const LEGACY_LOCK_FILE: &str = ".lock";

/// Folder holding the content files of `version` below `root`.
pub fn version_dir(root: &Path, version: VersionId) -> PathBuf {
    match version {
        VersionId::Published => root.to_path_buf(),
        VersionId::Changes => root.join(CHANGES_DIR),
    }
}

/// Resolve the content file for one (version, language) pair.
pub fn content_file(
    root: &Path,
    name: &str,
    version: VersionId,
    language: Option<&str>,
) -> PathBuf {
    let filename = match language {
        Some(code) => format!("{name}.{code}.{CONTENT_EXTENSION}"),
        None => format!("{name}.{CONTENT_EXTENSION}"),
    };
    version_dir(root, version).join(filename)
}

/// Lock file written by older editors next to the content files.
pub fn legacy_lock_file(root: &Path) -> PathBuf {
    root.join(LEGACY_LOCK_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_files_sit_in_the_root() {
        let path = content_file(Path::new("/site/blog"), "article", VersionId::Published, None);
        assert_eq!(path, Path::new("/site/blog/article.txt"));
    }

    #[test]
    fn drafts_live_in_the_changes_folder() {
        let path = content_file(
            Path::new("/site/blog"),
            "article",
            VersionId::Changes,
            Some("de"),
        );
        assert_eq!(path, Path::new("/site/blog/_changes/article.de.txt"));
    }

    #[test]
    fn file_meta_keeps_the_file_extension() {
        let path = content_file(
            Path::new("/site/blog"),
            "cover.jpg",
            VersionId::Published,
            Some("en"),
        );
        assert_eq!(path, Path::new("/site/blog/cover.jpg.en.txt"));
    }
}

//! Filesystem index of the content-bearing entities of a site.
//!
//! ```text
//! content/
//!   site.txt
//!   1_blog/
//!     blog.txt
//!     hello/
//!       article.en.txt
//!       cover.jpg
//!       cover.jpg.en.txt
//! site/accounts/
//!   editor/user.txt
//! ```
//!
//! Page ids are folder paths with sorting prefixes (`1_`) removed. Folders
//! starting with `_` or `.` are not pages. Every non-text file is a file
//! entity; its meta content is the `<filename>[.<lang>].txt` sidecar.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use super::changes::EntityResolver;
use super::error::ContentError;
use super::file::CONTENT_EXTENSION;
use super::version::Version;
use super::version_id::VersionId;
use super::Fields;
use crate::domain::entities::Entity;
use crate::domain::languages::{Lang, Languages};
use crate::domain::types::EntityKind;
use crate::util::fs::is_hidden;

const UUID_FIELD: &str = "uuid";
const DEFAULT_TEMPLATE: &str = "default";

#[derive(Debug, Clone)]
pub struct ContentTree {
    root: PathBuf,
    languages: Languages,
    entities: Vec<Entity>,
}

impl ContentTree {
    /// Walk `root` and `accounts`.
    ///
    /// Scanning writes to disk: an entity without a stored UUID gets a new
    /// one saved into its published content, or into its draft when only a
    /// draft exists. A file without a meta sidecar gets one holding just the
    /// UUID.
    pub fn scan(
        root: impl Into<PathBuf>,
        accounts: impl AsRef<Path>,
        languages: &Languages,
    ) -> Result<Self, ContentError> {
        let mut scanner = Scanner {
            languages,
            entities: Vec::new(),
        };
        let root = root.into();

        if root.is_dir() {
            scanner.add(Entity::site(Uuid::nil(), &root))?;
            scanner.scan_files(&root, None)?;
            scanner.scan_pages(&root, None)?;
        }
        scanner.scan_users(accounts.as_ref())?;

        debug!(
            op = "tree.scan",
            root = %root.display(),
            entities = scanner.entities.len(),
            "content tree scanned"
        );
        Ok(Self {
            root,
            languages: languages.clone(),
            entities: scanner.entities,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn languages(&self) -> &Languages {
        &self.languages
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn site(&self) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|entity| entity.kind() == EntityKind::Site)
    }

    pub fn find_by_id(&self, kind: EntityKind, id: &str) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|entity| entity.kind() == kind && entity.id() == id)
    }

    /// Resolve `site`, `page:<id>`, `file:<page-id>/<filename>` or `user:<id>`.
    pub fn find_by_ref(&self, reference: &str) -> Option<&Entity> {
        if reference == "site" {
            return self.site();
        }
        let (kind, id) = reference.split_once(':')?;
        let kind = match kind {
            "page" => EntityKind::Page,
            "file" => EntityKind::File,
            "user" => EntityKind::User,
            _ => return None,
        };
        self.find_by_id(kind, id.trim_matches('/'))
    }

    pub fn version<'a>(&'a self, entity: &'a Entity, id: VersionId) -> Version<'a> {
        Version::new(entity, &self.languages, id)
    }
}

impl EntityResolver for ContentTree {
    fn find(&self, kind: EntityKind, uuid: &Uuid) -> Option<Entity> {
        self.entities
            .iter()
            .find(|entity| entity.kind() == kind && entity.uuid() == *uuid)
            .cloned()
    }
}

struct Scanner<'a> {
    languages: &'a Languages,
    entities: Vec<Entity>,
}

impl Scanner<'_> {
    fn scan_pages(&mut self, dir: &Path, parent_id: Option<&str>) -> Result<(), ContentError> {
        for (name, path) in list(dir)? {
            if !path.is_dir() || is_hidden(&name) || name.starts_with('_') {
                continue;
            }

            let slug = strip_sort_prefix(&name);
            let id = match parent_id {
                Some(parent) => format!("{parent}/{slug}"),
                None => slug.to_string(),
            };
            let template = self.template_of(&path)?;
            self.add(Entity::page(&id, Uuid::nil(), &path, template))?;
            self.scan_files(&path, Some(&id))?;
            self.scan_pages(&path, Some(&id))?;
        }
        Ok(())
    }

    fn scan_files(&mut self, dir: &Path, page_id: Option<&str>) -> Result<(), ContentError> {
        for (name, path) in list(dir)? {
            if !path.is_file() || is_hidden(&name) || is_content_file(&name) {
                continue;
            }
            let id = match page_id {
                Some(page) => format!("{page}/{name}"),
                None => name.clone(),
            };
            self.add(Entity::file(id, Uuid::nil(), dir, name))?;
        }
        Ok(())
    }

    fn scan_users(&mut self, accounts: &Path) -> Result<(), ContentError> {
        if !accounts.is_dir() {
            return Ok(());
        }
        for (name, path) in list(accounts)? {
            if path.is_dir() && !is_hidden(&name) {
                self.add(Entity::user(name, Uuid::nil(), &path))?;
            }
        }
        Ok(())
    }

    /// Content name of a page folder: the first text file that is not a
    /// file sidecar, without its language suffix.
    fn template_of(&self, dir: &Path) -> Result<String, ContentError> {
        let entries = list(dir)?;
        let template = entries
            .iter()
            .filter(|(name, path)| path.is_file() && is_content_file(name) && !is_hidden(name))
            .map(|(name, _)| self.base_name(name))
            .find(|base| {
                !entries
                    .iter()
                    .any(|(other, path)| other == base && path.is_file())
            });
        Ok(template.unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()))
    }

    /// `article.de.txt` -> `article`, `cover.jpg.txt` -> `cover.jpg`.
    fn base_name(&self, filename: &str) -> String {
        let stem = filename
            .strip_suffix(&format!(".{CONTENT_EXTENSION}"))
            .unwrap_or(filename);
        match stem.rsplit_once('.') {
            Some((base, code)) if self.languages.find(code).is_some() => base.to_string(),
            _ => stem.to_string(),
        }
    }

    fn add(&mut self, entity: Entity) -> Result<(), ContentError> {
        let uuid = self.ensure_uuid(&entity)?;
        self.entities.push(Entity::new(
            entity.kind(),
            entity.id(),
            uuid,
            entity.root(),
            entity.content_name(),
        ));
        Ok(())
    }

    /// Reads the UUID from the published content, then from the draft. A new
    /// one goes into whichever of the two exists, published first; only an
    /// entity with neither gets a published file created for it.
    fn ensure_uuid(&self, entity: &Entity) -> Result<Uuid, ContentError> {
        let published = Version::published(entity, self.languages);
        let changes = published.sibling(VersionId::Changes);
        for version in [&published, &changes] {
            if !version.exists(&Lang::Default) {
                continue;
            }
            let content = version.content(&Lang::Default)?;
            if let Some(uuid) = content.get(UUID_FIELD).and_then(parse_uuid) {
                return Ok(uuid);
            }
        }

        let target = if !published.exists(&Lang::Default) && changes.exists(&Lang::Default) {
            &changes
        } else {
            &published
        };
        let uuid = Uuid::new_v4();
        let mut fields = Fields::new();
        fields.insert(UUID_FIELD.to_string(), uuid.to_string());
        target.update(fields, &Lang::Default)?;
        info!(
            op = "tree.assign_uuid",
            kind = %entity.kind(),
            entity = entity.id(),
            version = %target.id(),
            %uuid,
            "assigned uuid"
        );
        Ok(uuid)
    }
}

fn list(dir: &Path) -> Result<Vec<(String, PathBuf)>, ContentError> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(ContentError::io(dir, err)),
    };

    let mut entries = Vec::new();
    for entry in read {
        let entry = entry.map_err(|err| ContentError::io(dir, err))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push((name, entry.path()));
    }
    entries.sort();
    Ok(entries)
}

fn is_content_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext == CONTENT_EXTENSION)
}

/// `1_blog` -> `blog`, `20240101_post` -> `post`.
fn strip_sort_prefix(name: &str) -> &str {
    match name.split_once('_') {
        Some((prefix, rest))
            if !prefix.is_empty() && !rest.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) =>
        {
            rest
        }
        _ => name,
    }
}

/// Accepts bare UUIDs and `page://<uuid>` style references.
fn parse_uuid(value: &str) -> Option<Uuid> {
    let value = value.trim();
    let value = value
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(value);
    Uuid::parse_str(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::languages::Language;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, contents).expect("write");
    }

    #[test]
    fn sort_prefixes_are_removed() {
        assert_eq!(strip_sort_prefix("1_blog"), "blog");
        assert_eq!(strip_sort_prefix("blog_archive"), "blog_archive");
        assert_eq!(strip_sort_prefix("2024_"), "2024_");
    }

    #[test]
    fn uuid_references_are_accepted() {
        let uuid = Uuid::new_v4();
        assert_eq!(parse_uuid(&format!("page://{uuid}")), Some(uuid));
        assert_eq!(parse_uuid(&uuid.to_string()), Some(uuid));
        assert_eq!(parse_uuid("nope"), None);
    }

    #[test]
    fn scan_finds_site_pages_files_and_users() {
        let dir = tempfile::tempdir().expect("tempdir");
        let content = dir.path().join("content");
        let accounts = dir.path().join("accounts");
        let known = Uuid::new_v4();

        write(&content.join("site.txt"), "Title: Site");
        write(
            &content.join("1_blog/blog.txt"),
            &format!("Title: Blog\n\n----\n\nUuid: page://{known}"),
        );
        write(&content.join("1_blog/hello/article.txt"), "Title: Hello");
        write(&content.join("1_blog/hello/cover.jpg"), "binary");
        write(&content.join("1_blog/hello/cover.jpg.txt"), "Alt: Cover");
        write(&content.join("1_blog/hello/_changes/article.txt"), "Title: Draft");
        write(&accounts.join("editor/user.txt"), "Name: Ed");

        let tree = ContentTree::scan(&content, &accounts, &Languages::single()).expect("scan");

        let blog = tree.find_by_ref("page:blog").expect("blog");
        assert_eq!(blog.uuid(), known);
        assert_eq!(blog.content_name(), "blog");

        let hello = tree.find_by_ref("page:blog/hello").expect("hello");
        assert_eq!(hello.content_name(), "article");

        let cover = tree.find_by_ref("file:blog/hello/cover.jpg").expect("cover");
        assert_eq!(cover.content_name(), "cover.jpg");
        assert_eq!(cover.root(), hello.root());

        assert!(tree.find_by_ref("user:editor").is_some());
        assert!(tree.find_by_ref("site").is_some());
        assert!(tree.find_by_ref("page:blog/hello/_changes").is_none());
        assert_eq!(tree.find(EntityKind::Page, &known), Some(blog.clone()));
    }

    #[test]
    fn missing_uuids_are_generated_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let content = dir.path().join("content");
        write(&content.join("about/default.txt"), "Title: About");

        let languages = Languages::single();
        let first = ContentTree::scan(&content, dir.path().join("accounts"), &languages)
            .expect("first scan");
        let second = ContentTree::scan(&content, dir.path().join("accounts"), &languages)
            .expect("second scan");

        let uuid = first.find_by_ref("page:about").expect("about").uuid();
        assert_eq!(second.find_by_ref("page:about").expect("about").uuid(), uuid);
        let stored = fs::read_to_string(content.join("about/default.txt")).expect("read");
        assert!(stored.contains("Title: About"));
        assert!(stored.contains(&uuid.to_string()));
    }

    #[test]
    fn language_suffixes_are_not_part_of_the_template() {
        let dir = tempfile::tempdir().expect("tempdir");
        let content = dir.path().join("content");
        write(&content.join("home/home.de.txt"), "Title: Start");
        write(&content.join("home/home.en.txt"), "Title: Home");

        let languages =
            Languages::new(vec![Language::new("en", true), Language::new("de", false)])
                .expect("languages");
        let tree = ContentTree::scan(&content, dir.path().join("accounts"), &languages)
            .expect("scan");

        assert_eq!(tree.find_by_ref("page:home").expect("home").content_name(), "home");
    }

    #[test]
    fn draft_only_pages_keep_their_uuid_in_the_draft() {
        let dir = tempfile::tempdir().expect("tempdir");
        let content = dir.path().join("content");
        write(&content.join("news/_changes/default.txt"), "Title: Unpublished");

        let languages = Languages::single();
        let first = ContentTree::scan(&content, dir.path().join("accounts"), &languages)
            .expect("first scan");
        let second = ContentTree::scan(&content, dir.path().join("accounts"), &languages)
            .expect("second scan");

        let uuid = first.find_by_ref("page:news").expect("news").uuid();
        assert_eq!(second.find_by_ref("page:news").expect("news").uuid(), uuid);
        assert!(!content.join("news/default.txt").exists());
        let draft = fs::read_to_string(content.join("news/_changes/default.txt")).expect("draft");
        assert!(draft.contains("Title: Unpublished"));
        assert!(draft.contains(&uuid.to_string()));
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use time::OffsetDateTime;
use tracing::debug;

use super::codec::{self, normalize_fields, normalize_key};
use super::error::ContentError;
use super::file;
use super::version_id::VersionId;
use super::Fields;
use crate::domain::entities::Entity;
use crate::domain::languages::{Lang, LanguageScope, Languages};
use crate::util::fs::{remove_dir_if_empty, remove_file_if_exists, write_atomic};

/// One version of an entity's content.
///
/// A handle over `(entity, version id)`. Nothing is cached: every call goes
/// back to disk. Language arguments are explicit; [`Lang::Default`] selects
/// the default language, or the only file of a single-language site.
#[derive(Debug, Clone, Copy)]
pub struct Version<'a> {
    entity: &'a Entity,
    languages: &'a Languages,
    id: VersionId,
}

impl<'a> Version<'a> {
    pub fn new(entity: &'a Entity, languages: &'a Languages, id: VersionId) -> Self {
        Self {
            entity,
            languages,
            id,
        }
    }

    pub fn published(entity: &'a Entity, languages: &'a Languages) -> Self {
        Self::new(entity, languages, VersionId::Published)
    }

    pub fn changes(entity: &'a Entity, languages: &'a Languages) -> Self {
        Self::new(entity, languages, VersionId::Changes)
    }

    pub fn id(&self) -> VersionId {
        self.id
    }

    pub fn entity(&self) -> &'a Entity {
        self.entity
    }

    /// The same entity under another version id.
    pub fn sibling(&self, id: VersionId) -> Version<'a> {
        Version::new(self.entity, self.languages, id)
    }

    pub fn content_file(&self, lang: &Lang) -> Result<PathBuf, ContentError> {
        let code = self.languages.resolve(lang)?;
        Ok(self.file_for(code.as_deref()))
    }

    /// Unknown languages do not exist.
    pub fn exists(&self, lang: &Lang) -> bool {
        self.content_file(lang)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Whether any language in `scope` has a file for this version.
    pub fn exists_in(&self, scope: &LanguageScope) -> bool {
        self.languages
            .resolve_scope(scope)
            .map(|codes| {
                codes
                    .iter()
                    .any(|code| self.file_for(code.as_deref()).is_file())
            })
            .unwrap_or(false)
    }

    pub fn modified(&self, lang: &Lang) -> Option<OffsetDateTime> {
        let path = self.content_file(lang).ok()?;
        let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
        Some(OffsetDateTime::from(modified))
    }

    pub fn ensure(&self, lang: &Lang) -> Result<(), ContentError> {
        let code = self.languages.resolve(lang)?;
        if self.file_for(code.as_deref()).is_file() {
            Ok(())
        } else {
            Err(ContentError::version_not_found(self.id, code))
        }
    }

    pub fn read(&self, lang: &Lang) -> Result<Fields, ContentError> {
        let code = self.languages.resolve(lang)?;
        let path = self.file_for(code.as_deref());
        match read_fields(&path) {
            Err(ContentError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Err(ContentError::version_not_found(self.id, code))
            }
            other => other,
        }
    }

    pub fn content(&self, lang: &Lang) -> Result<Content, ContentError> {
        self.read(lang).map(Content::new)
    }

    /// Write a new content file, replacing any file already there.
    pub fn create(&self, fields: Fields, lang: &Lang) -> Result<(), ContentError> {
        let path = self.content_file(lang)?;
        write_fields(&path, &normalize_fields(fields))?;
        debug!(
            op = "version.create",
            entity = self.entity.id(),
            version = %self.id,
            language = %lang,
            "content file created"
        );
        Ok(())
    }

    /// Write `fields`. Without `overwrite` they are merged over the fields
    /// already on disk, incoming values winning. Keys are compared the way
    /// they read back, so `Title` replaces a stored `title`.
    pub fn save(&self, fields: Fields, lang: &Lang, overwrite: bool) -> Result<(), ContentError> {
        let path = self.content_file(lang)?;
        let fields = normalize_fields(fields);
        let fields = if overwrite {
            fields
        } else {
            let mut merged = read_fields_or_empty(&path)?;
            merged.extend(fields);
            merged
        };
        write_fields(&path, &fields)?;
        debug!(
            op = "version.save",
            entity = self.entity.id(),
            version = %self.id,
            language = %lang,
            overwrite,
            "content file saved"
        );
        Ok(())
    }

    pub fn replace(&self, fields: Fields, lang: &Lang) -> Result<(), ContentError> {
        self.save(fields, lang, true)
    }

    pub fn update(&self, fields: Fields, lang: &Lang) -> Result<(), ContentError> {
        self.save(fields, lang, false)
    }

    /// Remove the content files of `scope`. Missing files are skipped.
    ///
    /// An emptied `_changes` folder is removed as well. Other entities'
    /// drafts in the same folder are left alone.
    pub fn delete(&self, scope: &LanguageScope) -> Result<(), ContentError> {
        for code in self.languages.resolve_scope(scope)? {
            let path = self.file_for(code.as_deref());
            remove_file_if_exists(&path).map_err(|err| ContentError::io(&path, err))?;
        }
        self.prune_changes_dir()?;
        debug!(
            op = "version.delete",
            entity = self.entity.id(),
            version = %self.id,
            "content files deleted"
        );
        Ok(())
    }

    /// Bump the modification time of an existing file.
    pub fn touch(&self, lang: &Lang) -> Result<(), ContentError> {
        self.ensure(lang)?;
        let path = self.content_file(lang)?;
        fs::File::options()
            .write(true)
            .open(&path)
            .and_then(|handle| handle.set_modified(SystemTime::now()))
            .map_err(|err| ContentError::io(&path, err))
    }

    /// Rename one language file onto another version and/or language.
    ///
    /// An existing destination is replaced. On failure the source stays put.
    pub fn move_to(&self, from: &Lang, to: VersionId, to_lang: &Lang) -> Result<(), ContentError> {
        let source_code = self.languages.resolve(from)?;
        let target_code = self.languages.resolve(to_lang)?;
        self.move_file(source_code, to, target_code)
    }

    /// Field-wise comparison. A missing file compares as empty.
    pub fn is_identical(&self, other: &Version<'_>, lang: &Lang) -> Result<bool, ContentError> {
        let mine = read_fields_or_empty(&self.content_file(lang)?)?;
        let theirs = read_fields_or_empty(&other.content_file(lang)?)?;
        Ok(mine == theirs)
    }

    /// Move this version onto the published slot.
    ///
    /// With [`LanguageScope::All`] every language holding a file is moved;
    /// languages without one are skipped.
    pub fn publish(&self, scope: &LanguageScope) -> Result<(), ContentError> {
        if self.id == VersionId::Published {
            return Err(ContentError::AlreadyPublished);
        }

        match scope {
            LanguageScope::One(lang) => self.move_to(lang, VersionId::Published, lang)?,
            LanguageScope::All => {
                for code in self.languages.resolve_scope(scope)? {
                    if self.file_for(code.as_deref()).is_file() {
                        self.move_file(code.clone(), VersionId::Published, code)?;
                    }
                }
            }
        }

        debug!(
            op = "version.publish",
            entity = self.entity.id(),
            "draft published"
        );
        Ok(())
    }

    fn move_file(
        &self,
        source_code: Option<String>,
        to: VersionId,
        target_code: Option<String>,
    ) -> Result<(), ContentError> {
        let source = self.file_for(source_code.as_deref());
        if !source.is_file() {
            return Err(ContentError::version_not_found(self.id, source_code));
        }

        let target = self.sibling(to).file_for(target_code.as_deref());
        if source == target {
            return Ok(());
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|err| ContentError::io(parent, err))?;
        }
        fs::rename(&source, &target).map_err(|err| ContentError::io(&source, err))?;
        self.prune_changes_dir()?;
        Ok(())
    }

    fn file_for(&self, code: Option<&str>) -> PathBuf {
        file::content_file(
            self.entity.root(),
            self.entity.content_name(),
            self.id,
            code,
        )
    }

    fn prune_changes_dir(&self) -> Result<(), ContentError> {
        if self.id != VersionId::Changes {
            return Ok(());
        }
        let dir = file::version_dir(self.entity.root(), self.id);
        remove_dir_if_empty(&dir).map_err(|err| ContentError::io(&dir, err))?;
        Ok(())
    }
}

/// Fields of one content file with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Content {
    fields: Fields,
}

impl Content {
    pub fn new(fields: Fields) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(&normalize_key(key)).map(String::as_str)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn read_fields(path: &Path) -> Result<Fields, ContentError> {
    let text = fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::InvalidData => ContentError::codec(path, "content file is not valid UTF-8"),
        _ => ContentError::io(path, err),
    })?;
    Ok(codec::decode(&text))
}

fn read_fields_or_empty(path: &Path) -> Result<Fields, ContentError> {
    match read_fields(path) {
        Err(ContentError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            Ok(Fields::new())
        }
        other => other,
    }
}

fn write_fields(path: &Path, fields: &Fields) -> Result<(), ContentError> {
    write_atomic(path, codec::encode(fields).as_bytes()).map_err(|err| ContentError::io(path, err))
}

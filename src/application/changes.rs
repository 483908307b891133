//! The editorial draft workflow: save, discard and publish.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::application::error::AppError;
use crate::cache::CacheBackend;
use crate::content::codec::normalize_fields;
use crate::content::file::legacy_lock_file;
use crate::content::{ChangesRegistry, ContentError, Fields, Version};
use crate::domain::entities::Entity;
use crate::domain::languages::{Lang, LanguageScope, Languages};
use crate::util::fs::remove_file_if_exists;

/// Acknowledgement returned by every workflow operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub status: &'static str,
}

impl Ack {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

pub struct ChangesService {
    languages: Languages,
    registry: ChangesRegistry,
    page_cache: Option<Arc<dyn CacheBackend>>,
}

impl ChangesService {
    pub fn new(languages: Languages, registry: ChangesRegistry) -> Self {
        Self {
            languages,
            registry,
            page_cache: None,
        }
    }

    /// Flush this page cache after every publish.
    pub fn with_page_cache(mut self, page_cache: Arc<dyn CacheBackend>) -> Self {
        self.page_cache = Some(page_cache);
        self
    }

    pub fn languages(&self) -> &Languages {
        &self.languages
    }

    pub fn registry(&self) -> &ChangesRegistry {
        &self.registry
    }

    /// Write `input` over the published fields into the draft.
    ///
    /// A draft that ends up identical to the published version is removed.
    pub fn save(&self, entity: &Entity, input: Fields, lang: &Lang) -> Result<Ack, AppError> {
        let latest = Version::published(entity, &self.languages);
        let changes = Version::changes(entity, &self.languages);

        remove_legacy_lock(entity)?;

        let mut fields = match latest.read(lang) {
            Ok(fields) => fields,
            Err(ContentError::VersionNotFound { .. }) => Fields::new(),
            Err(err) => return Err(err.into()),
        };
        fields.extend(normalize_fields(input));
        changes.update(fields, lang)?;

        if changes.is_identical(&latest, lang)? {
            changes.delete(&LanguageScope::One(lang.clone()))?;
        }

        self.sync_registry(entity, &changes)?;
        info!(
            op = "changes.save",
            entity = entity.id(),
            language = %lang,
            draft = changes.exists(lang),
            "draft saved"
        );
        Ok(Ack::ok())
    }

    pub fn discard(&self, entity: &Entity, scope: &LanguageScope) -> Result<Ack, AppError> {
        let changes = Version::changes(entity, &self.languages);
        changes.delete(scope)?;
        remove_legacy_lock(entity)?;

        self.sync_registry(entity, &changes)?;
        info!(op = "changes.discard", entity = entity.id(), "draft discarded");
        Ok(Ack::ok())
    }

    /// Save `input`, then move the draft onto the published version.
    pub fn publish(&self, entity: &Entity, input: Fields, lang: &Lang) -> Result<Ack, AppError> {
        self.save(entity, input, lang)?;
        remove_legacy_lock(entity)?;

        let changes = Version::changes(entity, &self.languages);
        if !changes.exists(lang) {
            return Ok(Ack::ok());
        }

        changes.publish(&LanguageScope::One(lang.clone()))?;
        self.sync_registry(entity, &changes)?;
        self.flush_page_cache();

        info!(
            op = "changes.publish",
            entity = entity.id(),
            language = %lang,
            "draft published"
        );
        Ok(Ack::ok())
    }

    fn sync_registry(&self, entity: &Entity, changes: &Version<'_>) -> Result<(), AppError> {
        if entity.changes_bucket().is_none() {
            return Ok(());
        }
        if changes.exists_in(&LanguageScope::All) {
            self.registry.track(entity)?;
        } else {
            self.registry.untrack(entity)?;
        }
        Ok(())
    }

    fn flush_page_cache(&self) {
        let Some(cache) = self.page_cache.as_ref() else {
            return;
        };
        if let Err(err) = cache.flush() {
            warn!(
                op = "changes.publish",
                result = "cache_flush_failed",
                error = %err,
                "Page cache could not be flushed after publishing"
            );
        }
    }
}

fn remove_legacy_lock(entity: &Entity) -> Result<(), AppError> {
    let path = legacy_lock_file(entity.root());
    remove_file_if_exists(&path).map_err(|err| ContentError::io(&path, err))?;
    Ok(())
}

//! Index of entities holding unsaved drafts.
//!
//! One cache entry per bucket (`pages`, `files`, `users`) holding a list of
//! UUID strings. The index is best effort: a missing entry reads as empty,
//! cache failures are logged and ignored, and the drafts on disk remain the
//! source of truth.

use std::sync::Arc;

use metrics::counter;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::cache::CacheBackend;
use crate::domain::entities::Entity;
use crate::domain::error::DomainError;
use crate::domain::types::{ChangesBucket, EntityKind};

pub const METRIC_CHANGES_TRACKED: &str = "folio_changes_tracked_total";

/// Looks entities up by UUID in the live content tree.
pub trait EntityResolver {
    fn find(&self, kind: EntityKind, uuid: &Uuid) -> Option<Entity>;
}

pub struct ChangesRegistry {
    cache: Arc<dyn CacheBackend>,
}

impl ChangesRegistry {
    pub fn new(cache: Arc<dyn CacheBackend>) -> Self {
        Self { cache }
    }

    /// Add the entity to its bucket. Tracking twice keeps a single entry.
    pub fn track(&self, entity: &Entity) -> Result<(), DomainError> {
        let bucket = bucket_of(entity)?;
        let mut uuids = self.read(bucket);
        let uuid = entity.uuid();
        if !uuids.contains(&uuid) {
            uuids.push(uuid);
            self.update(bucket, &uuids);
            counter!(METRIC_CHANGES_TRACKED).increment(1);
        }
        Ok(())
    }

    pub fn untrack(&self, entity: &Entity) -> Result<(), DomainError> {
        let bucket = bucket_of(entity)?;
        let uuid = entity.uuid();
        let uuids = self.read(bucket);
        if uuids.contains(&uuid) {
            let remaining: Vec<Uuid> = uuids.into_iter().filter(|id| *id != uuid).collect();
            self.update(bucket, &remaining);
        }
        Ok(())
    }

    pub fn is_tracked(&self, entity: &Entity) -> bool {
        entity
            .changes_bucket()
            .is_some_and(|bucket| self.read(bucket).contains(&entity.uuid()))
    }

    /// Tracked UUIDs in insertion order. Unparsable entries are dropped.
    pub fn read(&self, bucket: ChangesBucket) -> Vec<Uuid> {
        let value = match self.cache.get(bucket.as_str()) {
            Ok(Some(value)) => value,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(
                    op = "changes.read",
                    bucket = bucket.as_str(),
                    result = "backend_error",
                    error = %err,
                    "Changes index unavailable; treating as empty"
                );
                return Vec::new();
            }
        };

        let Value::Array(items) = value else {
            warn!(
                op = "changes.read",
                bucket = bucket.as_str(),
                result = "malformed",
                "Changes index is not a list; treating as empty"
            );
            return Vec::new();
        };

        let mut uuids = Vec::with_capacity(items.len());
        for item in items {
            match item.as_str().map(Uuid::parse_str) {
                Some(Ok(uuid)) if !uuids.contains(&uuid) => uuids.push(uuid),
                Some(Ok(_)) => {}
                _ => warn!(
                    op = "changes.read",
                    bucket = bucket.as_str(),
                    entry = %item,
                    "Skipping malformed changes entry"
                ),
            }
        }
        uuids
    }

    /// Persist a bucket, dropping duplicates but keeping first occurrences.
    pub fn update(&self, bucket: ChangesBucket, uuids: &[Uuid]) {
        let mut unique: Vec<Uuid> = Vec::with_capacity(uuids.len());
        for uuid in uuids {
            if !unique.contains(uuid) {
                unique.push(*uuid);
            }
        }
        let value = Value::Array(
            unique
                .iter()
                .map(|uuid| Value::String(uuid.to_string()))
                .collect(),
        );

        if let Err(err) = self.cache.set(bucket.as_str(), value, None) {
            warn!(
                op = "changes.update",
                bucket = bucket.as_str(),
                result = "backend_error",
                error = %err,
                "Failed to persist changes index"
            );
        }
    }

    pub fn pages(&self, resolver: &dyn EntityResolver) -> Vec<Entity> {
        self.resolve(ChangesBucket::Pages, resolver)
    }

    pub fn files(&self, resolver: &dyn EntityResolver) -> Vec<Entity> {
        self.resolve(ChangesBucket::Files, resolver)
    }

    pub fn users(&self, resolver: &dyn EntityResolver) -> Vec<Entity> {
        self.resolve(ChangesBucket::Users, resolver)
    }

    /// Entities of a bucket that still exist. Stale UUIDs are skipped.
    pub fn resolve(&self, bucket: ChangesBucket, resolver: &dyn EntityResolver) -> Vec<Entity> {
        self.read(bucket)
            .iter()
            .filter_map(|uuid| resolver.find(bucket.kind(), uuid))
            .collect()
    }
}

fn bucket_of(entity: &Entity) -> Result<ChangesBucket, DomainError> {
    entity
        .changes_bucket()
        .ok_or_else(|| DomainError::untrackable(entity.kind()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::cache::MemoryCache;

    struct Fixed(HashMap<Uuid, Entity>);

    impl EntityResolver for Fixed {
        fn find(&self, kind: EntityKind, uuid: &Uuid) -> Option<Entity> {
            self.0.get(uuid).filter(|entity| entity.kind() == kind).cloned()
        }
    }

    fn registry() -> (ChangesRegistry, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::with_capacity(16));
        (ChangesRegistry::new(cache.clone()), cache)
    }

    fn page(id: &str) -> Entity {
        Entity::page(id, Uuid::new_v4(), format!("/content/{id}"), "default")
    }

    #[test]
    fn tracking_twice_keeps_one_entry() {
        let (registry, _) = registry();
        let entity = page("a");

        registry.track(&entity).expect("track");
        registry.track(&entity).expect("track again");

        assert_eq!(registry.read(ChangesBucket::Pages), vec![entity.uuid()]);
    }

    #[test]
    fn untrack_restores_previous_state() {
        let (registry, _) = registry();
        let first = page("a");
        let second = page("b");

        registry.track(&first).expect("track");
        let before = registry.read(ChangesBucket::Pages);
        registry.track(&second).expect("track");
        registry.untrack(&second).expect("untrack");

        assert_eq!(registry.read(ChangesBucket::Pages), before);
        assert!(!registry.is_tracked(&second));
    }

    #[test]
    fn site_is_not_trackable() {
        let (registry, _) = registry();
        let site = Entity::site(Uuid::new_v4(), "/content");
        assert_eq!(
            registry.track(&site),
            Err(DomainError::untrackable(EntityKind::Site))
        );
    }

    #[test]
    fn buckets_are_separate() {
        let (registry, _) = registry();
        let user = Entity::user("editor", Uuid::new_v4(), "/accounts/editor");
        registry.track(&user).expect("track");

        assert!(registry.read(ChangesBucket::Pages).is_empty());
        assert_eq!(registry.read(ChangesBucket::Users), vec![user.uuid()]);
    }

    #[test]
    fn stale_and_malformed_entries_are_skipped() {
        let (registry, cache) = registry();
        let live = page("live");
        let gone = Uuid::new_v4();
        cache
            .set(
                "pages",
                json!([gone.to_string(), "not-a-uuid", live.uuid().to_string(), 7]),
                None,
            )
            .expect("seed");

        let resolver = Fixed(HashMap::from([(live.uuid(), live.clone())]));
        assert_eq!(registry.read(ChangesBucket::Pages), vec![gone, live.uuid()]);
        assert_eq!(registry.pages(&resolver), vec![live]);
        assert!(registry.files(&resolver).is_empty());
    }

    #[test]
    fn update_drops_duplicates_in_order() {
        let (registry, cache) = registry();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        registry.update(ChangesBucket::Files, &[a, b, a]);

        assert_eq!(
            cache.get("files").expect("get"),
            Some(json!([a.to_string(), b.to_string()]))
        );
    }
}

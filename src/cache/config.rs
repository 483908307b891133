//! Page cache switches.
//!
//! Controlled via the `[cache.pages]` table:
//!
//! ```toml
//! [cache.pages]
//! active = true
//! ignore = ["contact", "shop/cart"]
//! ```

use std::fmt;
use std::sync::Arc;

use crate::domain::entities::Entity;

/// Entities for which this returns `true` are never cached.
pub type IgnorePredicate = Arc<dyn Fn(&Entity) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct PageCacheConfig {
    /// Site-wide switch.
    pub active: bool,
    /// Entity ids excluded from caching.
    pub ignore: Vec<String>,
    ignore_when: Option<IgnorePredicate>,
}

impl Default for PageCacheConfig {
    fn default() -> Self {
        Self {
            active: true,
            ignore: Vec::new(),
            ignore_when: None,
        }
    }
}

impl fmt::Debug for PageCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCacheConfig")
            .field("active", &self.active)
            .field("ignore", &self.ignore)
            .field("ignore_when", &self.ignore_when.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl From<&crate::config::PageCacheSettings> for PageCacheConfig {
    fn from(settings: &crate::config::PageCacheSettings) -> Self {
        Self {
            active: settings.active,
            ignore: settings.ignore.clone(),
            ignore_when: None,
        }
    }
}

impl PageCacheConfig {
    pub fn disabled() -> Self {
        Self {
            active: false,
            ..Self::default()
        }
    }

    pub fn with_ignored(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignore.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_ignore_when(
        mut self,
        predicate: impl Fn(&Entity) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.ignore_when = Some(Arc::new(predicate));
        self
    }

    /// Whether `entity` may be cached at all under this configuration.
    pub fn is_enabled_for(&self, entity: &Entity) -> bool {
        if !self.active {
            return false;
        }
        if self.ignore.iter().any(|id| id == entity.id()) {
            return false;
        }
        !self
            .ignore_when
            .as_ref()
            .is_some_and(|predicate| predicate(entity))
    }
}

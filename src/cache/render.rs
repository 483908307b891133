//! Render cache for entity output.
//!
//! A request is only looked up or stored when its shape allows it (plain
//! GET/HEAD, no query, no extra params, no explicit data) and the page cache
//! is enabled for the entity. Stored entries carry the renderer's
//! auth/cookie usage flags; a hit is only served when those signals are
//! absent from the current request.
//!
//! Concurrent first renders of the same id are not coordinated: each one
//! renders and the last store wins.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{Duration, OffsetDateTime};
use tracing::{debug, instrument, warn};

use super::backend::CacheBackend;
use super::clock::{Clock, SystemClock};
use super::config::PageCacheConfig;
use super::error::{CacheError, RenderError};
use super::keys::page_cache_id;
use super::request::RequestContext;
use crate::domain::entities::Entity;

pub const METRIC_RENDER_CACHE_HIT: &str = "folio_render_cache_hit_total";
pub const METRIC_RENDER_CACHE_MISS: &str = "folio_render_cache_miss_total";
pub const METRIC_RENDER_CACHE_STORE: &str = "folio_render_cache_store_total";
pub const METRIC_RENDER_CACHE_BYPASS: &str = "folio_render_cache_bypass_total";

/// Cookie consulted whenever a render touches the visitor session.
pub const SESSION_COOKIE: &str = "folio_session";

/// Explicit per-call render data.
pub type RenderData = Map<String, Value>;

/// Status, headers and content type of a rendered response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub code: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(rename = "type")]
    pub content_type: String,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            code: 200,
            headers: BTreeMap::new(),
            content_type: "text/html".to_string(),
        }
    }
}

/// When a stored render stops being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    At(OffsetDateTime),
    After(Duration),
}

impl Expiry {
    pub fn resolve(self, now: OffsetDateTime) -> OffsetDateTime {
        match self {
            Expiry::At(at) => at,
            Expiry::After(after) => now + after,
        }
    }
}

/// What the renderer produced, plus the signals it consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub body: String,
    pub response: ResponseMeta,
    pub uses_auth: bool,
    pub uses_cookies: BTreeSet<String>,
    /// `false` when the template opted out of caching.
    pub cacheable: bool,
    pub expires: Option<Expiry>,
}

impl RenderOutput {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            response: ResponseMeta::default(),
            uses_auth: false,
            uses_cookies: BTreeSet::new(),
            cacheable: true,
            expires: None,
        }
    }

    pub fn with_response(mut self, response: ResponseMeta) -> Self {
        self.response = response;
        self
    }

    pub fn using_auth(mut self) -> Self {
        self.uses_auth = true;
        self
    }

    pub fn using_cookie(mut self, name: impl Into<String>) -> Self {
        self.uses_cookies.insert(name.into());
        self
    }

    pub fn using_session(self) -> Self {
        self.using_cookie(SESSION_COOKIE)
    }

    pub fn not_cacheable(mut self) -> Self {
        self.cacheable = false;
        self
    }

    pub fn expires(mut self, expiry: Expiry) -> Self {
        self.expires = Some(expiry);
        self
    }
}

/// Template engine seam.
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        entity: &Entity,
        request: &RequestContext,
        representation: &str,
        data: Option<&RenderData>,
    ) -> Result<RenderOutput, RenderError>;
}

/// Value stored under a page cache id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPage {
    pub html: String,
    pub response: ResponseMeta,
    pub uses_auth: bool,
    pub uses_cookies: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    /// The request or entity rules out caching.
    Uncacheable,
    Hit,
    /// Rendered and written to the cache.
    Stored,
    /// Rendered but not written: private output, an opted-out template, or
    /// a failed cache write.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub body: String,
    pub response: ResponseMeta,
    pub cache: CacheStatus,
}

pub struct RenderCache {
    backend: Arc<dyn CacheBackend>,
    config: PageCacheConfig,
    renderer: Arc<dyn Renderer>,
    clock: Arc<dyn Clock>,
}

impl RenderCache {
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        config: PageCacheConfig,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            backend,
            config,
            renderer,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    pub fn cache_id(&self, entity: &Entity, request: &RequestContext, representation: &str) -> String {
        page_cache_id(entity, request.language(), representation)
    }

    pub fn is_cacheable(
        &self,
        entity: &Entity,
        request: &RequestContext,
        data: Option<&RenderData>,
    ) -> bool {
        data.is_none() && request.is_cacheable_shape() && self.config.is_enabled_for(entity)
    }

    #[instrument(skip_all, fields(entity = entity.id(), representation = representation))]
    pub fn render(
        &self,
        entity: &Entity,
        request: &RequestContext,
        representation: &str,
        data: Option<&RenderData>,
    ) -> Result<RenderedPage, RenderError> {
        if !self.is_cacheable(entity, request, data) {
            counter!(METRIC_RENDER_CACHE_BYPASS).increment(1);
            let output = self.renderer.render(entity, request, representation, data)?;
            return Ok(finish(output, CacheStatus::Uncacheable));
        }

        let id = self.cache_id(entity, request, representation);
        if let Some(cached) = self.lookup(&id) {
            if !request.is_private(cached.uses_auth, &cached.uses_cookies) {
                counter!(METRIC_RENDER_CACHE_HIT).increment(1);
                debug!(op = "render_cache.lookup", id = %id, result = "hit", "serving cached render");
                return Ok(RenderedPage {
                    body: cached.html,
                    response: cached.response,
                    cache: CacheStatus::Hit,
                });
            }
            debug!(op = "render_cache.lookup", id = %id, result = "private", "cached render not reusable");
        }

        counter!(METRIC_RENDER_CACHE_MISS).increment(1);
        let output = self.renderer.render(entity, request, representation, data)?;

        let status = if output.cacheable
            && !request.is_private(output.uses_auth, &output.uses_cookies)
            && self.store(&id, &output)
        {
            counter!(METRIC_RENDER_CACHE_STORE).increment(1);
            CacheStatus::Stored
        } else {
            CacheStatus::Skipped
        };

        Ok(finish(output, status))
    }

    fn lookup(&self, id: &str) -> Option<CachedPage> {
        let value = match self.backend.get(id) {
            Ok(value) => value?,
            Err(err) => {
                warn!(
                    op = "render_cache.lookup",
                    id,
                    result = "backend_error",
                    error = %err,
                    "Page cache read failed; rendering"
                );
                return None;
            }
        };

        match serde_json::from_value(value) {
            Ok(page) => Some(page),
            Err(err) => {
                warn!(
                    op = "render_cache.lookup",
                    id,
                    result = "decode_error",
                    error = %err,
                    "Discarding unreadable page cache entry"
                );
                None
            }
        }
    }

    fn store(&self, id: &str, output: &RenderOutput) -> bool {
        let page = CachedPage {
            html: output.body.clone(),
            response: output.response.clone(),
            uses_auth: output.uses_auth,
            uses_cookies: output.uses_cookies.clone(),
        };
        let expires = output.expires.map(|expiry| expiry.resolve(self.clock.now()));

        let result = serde_json::to_value(&page)
            .map_err(CacheError::from)
            .and_then(|value| self.backend.set(id, value, expires));
        match result {
            Ok(stored) => stored,
            Err(err) => {
                warn!(
                    op = "render_cache.store",
                    id,
                    result = "backend_error",
                    error = %err,
                    "Page cache write failed"
                );
                false
            }
        }
    }
}

fn finish(output: RenderOutput, cache: CacheStatus) -> RenderedPage {
    RenderedPage {
        body: output.body,
        response: output.response,
        cache,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn relative_expiry_counts_from_now() {
        let now = datetime!(2024-01-01 0:00 UTC);
        assert_eq!(
            Expiry::After(Duration::hours(1)).resolve(now),
            datetime!(2024-01-01 1:00 UTC)
        );
        assert_eq!(
            Expiry::At(datetime!(2030-01-01 0:00 UTC)).resolve(now),
            datetime!(2030-01-01 0:00 UTC)
        );
    }

    #[test]
    fn cached_page_uses_camel_case_flags() {
        let page = CachedPage {
            html: "<p>x</p>".into(),
            response: ResponseMeta::default(),
            uses_auth: true,
            uses_cookies: [SESSION_COOKIE.to_string()].into(),
        };
        let value = serde_json::to_value(&page).expect("serialize");
        assert_eq!(value["usesAuth"], Value::Bool(true));
        assert_eq!(value["usesCookies"][0], Value::from(SESSION_COOKIE));
        assert_eq!(value["response"]["type"], Value::from("text/html"));
    }
}

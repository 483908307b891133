//! Cache backends and the page render cache.
//!
//! - [`CacheBackend`]: key-value capability with optional expiry, injected
//!   wherever a cache is needed ([`MemoryCache`], [`FileCache`]).
//! - [`RenderCache`]: decides whether a render may be served from or written
//!   to the page cache.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! directory = "cache"
//! memory_limit = 512
//!
//! [cache.pages]
//! active = true
//! ignore = ["contact"]
//! ```

mod backend;
mod clock;
mod config;
mod error;
mod file;
mod keys;
mod lock;
mod memory;
mod render;
mod request;

pub use backend::{CacheBackend, CacheEntry};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{IgnorePredicate, PageCacheConfig};
pub use error::{CacheError, RenderError};
pub use file::FileCache;
pub use keys::{DEFAULT_REPRESENTATION, page_cache_id};
pub use memory::MemoryCache;
pub use render::{
    CacheStatus, CachedPage, Expiry, METRIC_RENDER_CACHE_BYPASS, METRIC_RENDER_CACHE_HIT,
    METRIC_RENDER_CACHE_MISS, METRIC_RENDER_CACHE_STORE, RenderCache, RenderData, RenderOutput,
    RenderedPage, Renderer, ResponseMeta, SESSION_COOKIE,
};
pub use request::RequestContext;

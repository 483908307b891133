//! Application services orchestrating the content store and caches.

pub mod changes;
pub mod error;

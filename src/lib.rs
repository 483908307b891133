//! Flat-file content store with draft versions, a changes index and a
//! request-aware page render cache.

pub mod application;
pub mod cache;
pub mod config;
pub mod content;
pub mod domain;
pub mod infra;
pub mod util;

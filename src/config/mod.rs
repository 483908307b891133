//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroUsize, path::PathBuf, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::domain::languages::{Language, Languages};

mod cli;

pub use cli::{ChangesArgs, CliArgs, Command, EditArgs, GlobalOverrides, TargetArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "folio";
const DEFAULT_CONTENT_ROOT: &str = "content";
const DEFAULT_ACCOUNTS_DIR: &str = "site/accounts";
const DEFAULT_CACHE_DIR: &str = "cache";
const DEFAULT_MEMORY_LIMIT: usize = 512;
const PAGES_CACHE_SUBDIR: &str = "pages";
const CHANGES_CACHE_SUBDIR: &str = "changes";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub content: ContentSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub root: PathBuf,
    pub accounts: PathBuf,
    pub languages: Languages,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackendKind,
    pub directory: PathBuf,
    pub memory_limit: NonZeroUsize,
    pub pages: PageCacheSettings,
}

impl CacheSettings {
    pub fn pages_dir(&self) -> PathBuf {
        self.directory.join(PAGES_CACHE_SUBDIR)
    }

    pub fn changes_dir(&self) -> PathBuf {
        self.directory.join(CHANGES_CACHE_SUBDIR)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    File,
    Memory,
}

#[derive(Debug, Clone)]
pub struct PageCacheSettings {
    pub active: bool,
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("FOLIO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Parse the process arguments and resolve settings from them.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    content: RawContentSettings,
    cache: RawCacheSettings,
    logging: RawLoggingSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(root) = overrides.content_root.as_ref() {
            self.content.root = Some(root.clone());
        }
        if let Some(dir) = overrides.cache_dir.as_ref() {
            self.cache.directory = Some(dir.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            content,
            cache,
            logging,
        } = raw;

        Ok(Self {
            content: build_content_settings(content)?,
            cache: build_cache_settings(cache)?,
            logging: build_logging_settings(logging)?,
        })
    }
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let root = content
        .root
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_ROOT));
    if root.as_os_str().is_empty() {
        return Err(LoadError::invalid("content.root", "must not be empty"));
    }

    let accounts = content
        .accounts
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ACCOUNTS_DIR));
    let languages = Languages::new(content.languages)
        .map_err(|err| LoadError::invalid("content.languages", err.to_string()))?;

    Ok(ContentSettings {
        root,
        accounts,
        languages,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let backend = match cache.backend.as_deref().map(str::trim) {
        None | Some("file") => CacheBackendKind::File,
        Some("memory") => CacheBackendKind::Memory,
        Some(other) => {
            return Err(LoadError::invalid(
                "cache.backend",
                format!("unknown backend `{other}` (expected file or memory)"),
            ));
        }
    };

    let directory = cache
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));
    let memory_limit = NonZeroUsize::new(cache.memory_limit.unwrap_or(DEFAULT_MEMORY_LIMIT))
        .ok_or_else(|| LoadError::invalid("cache.memory_limit", "must be greater than zero"))?;

    let ignore = cache
        .pages
        .ignore
        .into_iter()
        .map(|id| id.trim().trim_matches('/').to_string())
        .filter(|id| !id.is_empty())
        .collect();

    Ok(CacheSettings {
        backend,
        directory,
        memory_limit,
        pages: PageCacheSettings {
            active: cache.pages.active.unwrap_or(true),
            ignore,
        },
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    root: Option<PathBuf>,
    accounts: Option<PathBuf>,
    languages: Vec<Language>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    backend: Option<String>,
    directory: Option<PathBuf>,
    memory_limit: Option<usize>,
    pages: RawPageCacheSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPageCacheSettings {
    active: Option<bool>,
    ignore: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[cfg(test)]
mod tests;

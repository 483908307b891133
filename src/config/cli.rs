use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

use crate::domain::types::ChangesBucket;

/// Command-line arguments for the `folio` binary.
#[derive(Debug, Parser)]
#[command(
    name = "folio",
    version,
    about = "Flat-file content store with drafts and a page cache"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "FOLIO_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the content root folder.
    #[arg(long = "content-root", value_name = "PATH", global = true)]
    pub content_root: Option<PathBuf>,

    /// Override the cache folder.
    #[arg(long = "cache-dir", value_name = "PATH", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Merge fields into an entity's draft.
    Save(EditArgs),
    /// Throw away an entity's draft (every language unless `--lang` is given).
    Discard(TargetArgs),
    /// Save fields into the draft, then publish it.
    Publish(EditArgs),
    /// List entities that have unsaved drafts.
    Changes(ChangesArgs),
    /// Show which versions exist for an entity.
    Status(TargetArgs),
    /// Remove every cached page.
    #[command(name = "cache-clear")]
    CacheClear,
}

#[derive(Debug, Args, Clone)]
pub struct TargetArgs {
    /// `site`, `page:<id>`, `file:<page-id>/<filename>` or `user:<id>`.
    #[arg(value_name = "ENTITY")]
    pub entity: String,

    /// Language code; defaults to the site's default language.
    #[arg(long = "lang", value_name = "CODE")]
    pub lang: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct EditArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Field values as `key=value`.
    #[arg(value_name = "FIELD=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Args, Clone)]
pub struct ChangesArgs {
    /// Only list one bucket (pages|files|users).
    #[arg(value_name = "BUCKET", value_parser = parse_bucket)]
    pub bucket: Option<ChangesBucket>,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected `key=value`, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("field name missing in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_bucket(raw: &str) -> Result<ChangesBucket, String> {
    ChangesBucket::ALL
        .into_iter()
        .find(|bucket| bucket.as_str() == raw)
        .ok_or_else(|| format!("unknown bucket `{raw}` (expected pages, files or users)"))
}

use std::{process, sync::Arc};

use folio::{
    application::{changes::ChangesService, error::AppError},
    cache::{CacheBackend, FileCache, MemoryCache},
    config::{self, CacheBackendKind, ChangesArgs, Command, EditArgs, Settings, TargetArgs},
    content::{ChangesRegistry, ContentTree, Fields, Version, VersionId},
    domain::{
        entities::Entity,
        languages::{Lang, LanguageScope, Languages},
        types::ChangesBucket,
    },
    infra::{error::InfraError, telemetry},
};
use serde::Serialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::{Dispatch, Level, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let summary = error.report().summary();
    if dispatcher::has_been_set() {
        error!(error = %summary, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %summary, "application error");
    });
}

fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let app = AppContext::build(&settings)?;

    match cli_args.command {
        Command::Save(args) => run_save(&app, args),
        Command::Discard(args) => run_discard(&app, args),
        Command::Publish(args) => run_publish(&app, args),
        Command::Changes(args) => run_changes(&app, args),
        Command::Status(args) => run_status(&app, args),
        Command::CacheClear => run_cache_clear(&app),
    }
}

struct AppContext {
    tree: ContentTree,
    changes: ChangesService,
    page_cache: Arc<dyn CacheBackend>,
}

impl AppContext {
    fn build(settings: &Settings) -> Result<Self, AppError> {
        let languages = settings.content.languages.clone();
        let tree = ContentTree::scan(
            &settings.content.root,
            &settings.content.accounts,
            &languages,
        )?;

        let (changes_cache, page_cache): (Arc<dyn CacheBackend>, Arc<dyn CacheBackend>) =
            match settings.cache.backend {
                CacheBackendKind::File => (
                    Arc::new(FileCache::with_system_clock(settings.cache.changes_dir())),
                    Arc::new(FileCache::with_system_clock(settings.cache.pages_dir())),
                ),
                CacheBackendKind::Memory => {
                    let limit = settings.cache.memory_limit.get();
                    (
                        Arc::new(MemoryCache::with_capacity(limit)),
                        Arc::new(MemoryCache::with_capacity(limit)),
                    )
                }
            };

        let changes = ChangesService::new(languages, ChangesRegistry::new(changes_cache))
            .with_page_cache(page_cache.clone());

        Ok(Self {
            tree,
            changes,
            page_cache,
        })
    }

    fn entity(&self, reference: &str) -> Result<&Entity, AppError> {
        self.tree
            .find_by_ref(reference)
            .ok_or_else(|| AppError::not_found(reference))
    }
}

fn run_save(app: &AppContext, args: EditArgs) -> Result<(), AppError> {
    let entity = app.entity(&args.target.entity)?;
    let lang = parse_lang(args.target.lang.as_deref());
    let ack = app.changes.save(entity, into_fields(args.fields), &lang)?;
    print_json(&ack)
}

fn run_discard(app: &AppContext, args: TargetArgs) -> Result<(), AppError> {
    let entity = app.entity(&args.entity)?;
    let scope = match args.lang.as_deref() {
        Some(code) => LanguageScope::One(parse_lang(Some(code))),
        None => LanguageScope::All,
    };
    let ack = app.changes.discard(entity, &scope)?;
    print_json(&ack)
}

fn run_publish(app: &AppContext, args: EditArgs) -> Result<(), AppError> {
    let entity = app.entity(&args.target.entity)?;
    let lang = parse_lang(args.target.lang.as_deref());
    let ack = app.changes.publish(entity, into_fields(args.fields), &lang)?;
    print_json(&ack)
}

fn run_changes(app: &AppContext, args: ChangesArgs) -> Result<(), AppError> {
    let buckets = match args.bucket {
        Some(bucket) => vec![bucket],
        None => ChangesBucket::ALL.to_vec(),
    };

    let mut listing = Map::new();
    for bucket in buckets {
        let entities = app.changes.registry().resolve(bucket, &app.tree);
        let entities = serde_json::to_value(entities)
            .map_err(|err| AppError::unexpected(format!("failed to encode entities: {err}")))?;
        listing.insert(bucket.as_str().to_string(), entities);
    }
    print_json(&Value::Object(listing))
}

#[derive(Debug, Serialize)]
struct VersionStatus {
    version: VersionId,
    language: Option<String>,
    exists: bool,
    #[serde(serialize_with = "time::serde::rfc3339::option::serialize")]
    modified: Option<OffsetDateTime>,
}

fn run_status(app: &AppContext, args: TargetArgs) -> Result<(), AppError> {
    let entity = app.entity(&args.entity)?;
    let languages = app.changes.languages();
    let langs = match args.lang.as_deref() {
        Some(code) => vec![parse_lang(Some(code))],
        None => every_language(languages),
    };

    let mut statuses = Vec::new();
    for id in [VersionId::Published, VersionId::Changes] {
        let version = Version::new(entity, languages, id);
        for lang in &langs {
            let language = languages.resolve(lang)?;
            statuses.push(VersionStatus {
                version: id,
                language,
                exists: version.exists(lang),
                modified: version.modified(lang),
            });
        }
    }
    print_json(&statuses)
}

fn run_cache_clear(app: &AppContext) -> Result<(), AppError> {
    app.page_cache.flush().map_err(InfraError::from)?;
    print_json(&folio::application::changes::Ack::ok())
}

fn parse_lang(code: Option<&str>) -> Lang {
    match code {
        Some(code) => {
            let Ok(lang) = code.parse::<Lang>();
            lang
        }
        None => Lang::Default,
    }
}

fn every_language(languages: &Languages) -> Vec<Lang> {
    if languages.is_multilingual() {
        languages.iter().map(Lang::from).collect()
    } else {
        vec![Lang::Default]
    }
}

fn into_fields(pairs: Vec<(String, String)>) -> Fields {
    pairs.into_iter().collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let encoded = serde_json::to_string(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{encoded}");
    Ok(())
}

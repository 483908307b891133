use clap::Parser;

use super::*;

#[test]
fn defaults_describe_a_single_language_site() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.content.root, PathBuf::from("content"));
    assert_eq!(settings.content.accounts, PathBuf::from("site/accounts"));
    assert!(!settings.content.languages.is_multilingual());
    assert_eq!(settings.cache.backend, CacheBackendKind::File);
    assert_eq!(settings.cache.pages_dir(), PathBuf::from("cache/pages"));
    assert_eq!(settings.cache.changes_dir(), PathBuf::from("cache/changes"));
    assert_eq!(settings.cache.memory_limit.get(), DEFAULT_MEMORY_LIMIT);
    assert!(settings.cache.pages.active);
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.content.root = Some(PathBuf::from("from-file"));
    raw.logging.level = Some("info".to_string());

    let overrides = GlobalOverrides {
        content_root: Some(PathBuf::from("from-cli")),
        log_level: Some("debug".to_string()),
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.content.root, PathBuf::from("from-cli"));
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn languages_need_exactly_one_default() {
    let mut raw = RawSettings::default();
    raw.content.languages = vec![Language::new("en", false), Language::new("de", false)];

    let err = Settings::from_raw(raw).expect_err("no default");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "content.languages",
            ..
        }
    ));
}

#[test]
fn configured_languages_are_kept_in_order() {
    let mut raw = RawSettings::default();
    raw.content.languages = vec![Language::new("en", true), Language::new("de", false)];

    let settings = Settings::from_raw(raw).expect("valid settings");
    let codes: Vec<&str> = settings.content.languages.iter().map(Language::code).collect();
    assert_eq!(codes, ["en", "de"]);
}

#[test]
fn zero_memory_limit_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.memory_limit = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn unknown_backend_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some("redis".to_string());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "cache.backend",
            ..
        })
    ));
}

#[test]
fn ignored_ids_are_normalized() {
    let mut raw = RawSettings::default();
    raw.cache.pages.ignore = vec!["/contact/".to_string(), "  ".to_string()];
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cache.pages.ignore, ["contact"]);
}

#[test]
fn toml_sources_deserialize_into_settings() {
    let raw: RawSettings = Config::builder()
        .add_source(config::File::from_str(
            r#"
            [content]
            root = "site/content"
            languages = [
                { code = "en", default = true, name = "English" },
                { code = "de" },
            ]

            [cache.pages]
            active = false
            ignore = ["contact"]
            "#,
            config::FileFormat::Toml,
        ))
        .build()
        .expect("build")
        .try_deserialize()
        .expect("deserialize");

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.content.root, PathBuf::from("site/content"));
    assert_eq!(settings.content.languages.len(), 2);
    assert_eq!(
        settings
            .content
            .languages
            .default_language()
            .map(Language::code),
        Some("en")
    );
    assert!(!settings.cache.pages.active);
}

#[test]
fn parse_save_arguments() {
    let args = CliArgs::parse_from([
        "folio",
        "--content-root",
        "/srv/content",
        "save",
        "page:blog/hello",
        "--lang",
        "de",
        "title=Hallo",
        "text=a=b",
    ]);

    assert_eq!(
        args.overrides.content_root.as_deref(),
        Some(std::path::Path::new("/srv/content"))
    );
    match args.command {
        Command::Save(edit) => {
            assert_eq!(edit.target.entity, "page:blog/hello");
            assert_eq!(edit.target.lang.as_deref(), Some("de"));
            assert_eq!(
                edit.fields,
                [
                    ("title".to_string(), "Hallo".to_string()),
                    ("text".to_string(), "a=b".to_string())
                ]
            );
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
}

#[test]
fn parse_changes_bucket() {
    let args = CliArgs::parse_from(["folio", "changes", "files"]);
    match args.command {
        Command::Changes(changes) => {
            assert_eq!(changes.bucket, Some(crate::domain::types::ChangesBucket::Files))
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
    assert!(CliArgs::try_parse_from(["folio", "changes", "sites"]).is_err());
}

#[test]
fn malformed_fields_are_rejected() {
    assert!(CliArgs::try_parse_from(["folio", "save", "site", "title"]).is_err());
    assert!(CliArgs::try_parse_from(["folio", "save", "site", "=x"]).is_err());
}

#[test]
fn cache_clear_takes_global_flags_after_the_subcommand() {
    let args = CliArgs::parse_from(["folio", "cache-clear", "--cache-dir", "/tmp/c"]);
    assert!(matches!(args.command, Command::CacheClear));
    assert_eq!(
        args.overrides.cache_dir.as_deref(),
        Some(std::path::Path::new("/tmp/c"))
    );
}

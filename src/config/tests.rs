use super::*;

fn parse(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(args).expect("cli parses")
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.database.url = Some("postgres://file".to_string());

    let overrides = GlobalOverrides {
        log_level: Some("debug".to_string()),
        database_url: Some("postgres://cli".to_string()),
        ..Default::default()
    };

    raw.apply_global_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.database.url.as_deref(), Some("postgres://cli"));
}

#[test]
fn defaults_use_memory_store_and_crc32() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert!(settings.database.url.is_none());
    assert_eq!(settings.database.max_connections.get(), DEFAULT_DB_MAX_CONNECTIONS);
    assert_eq!(settings.abbrlink, AbbrlinkSettings::new("crc32", "dec"));
    assert_eq!(settings.site.root, PathBuf::from("."));
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn blank_database_url_is_treated_as_unset() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn zero_pool_size_is_rejected() {
    let mut raw = RawSettings::default();
    raw.database.max_connections = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero pool");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "database.max_connections",
            ..
        }
    ));
}

#[test]
fn unsupported_abbrlink_algorithm_is_rejected() {
    let mut raw = RawSettings::default();
    raw.abbrlink.algorithm = Some("md5".to_string());
    let err = Settings::from_raw(raw).expect_err("md5");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "abbrlink.algorithm",
            ..
        }
    ));
}

#[test]
fn unknown_representation_is_rejected() {
    let mut raw = RawSettings::default();
    raw.abbrlink.representation = Some("base64".to_string());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn abbrlink_command_overrides_algorithm() {
    let cli = parse(&[
        "scrivo",
        "abbrlink",
        "--algorithm",
        "CRC16",
        "--representation",
        "hex",
    ]);
    let Command::Abbrlink(args) = &cli.command else {
        panic!("wrong command parsed");
    };

    let mut raw = RawSettings::default();
    raw.apply_abbrlink_overrides(args);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.abbrlink, AbbrlinkSettings::new("crc16", "hex"));
}

#[test]
fn cli_json_logging_enforces_format() {
    let cli = parse(&["scrivo", "cache", "purge", "--log-json", "true"]);
    let mut raw = RawSettings::default();
    raw.apply_global_overrides(&cli.overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn cache_list_parses_search_term() {
    let cli = parse(&["scrivo", "cache", "list", "posts", "--search", "foo"]);
    match cli.command {
        Command::Cache(CacheArgs {
            command: CacheCommand::List { collection, search },
        }) => {
            assert_eq!(collection, "posts");
            assert_eq!(search.as_deref(), Some("foo"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn index_mark_defaults_to_published() {
    let cli = parse(&["scrivo", "index", "mark", "source/_posts/a.md"]);
    match cli.command {
        Command::Index(IndexArgs {
            command:
                IndexCommand::Mark {
                    file,
                    path,
                    status,
                    filename,
                },
        }) => {
            assert_eq!(file, PathBuf::from("source/_posts/a.md"));
            assert!(path.is_none());
            assert_eq!(status, "published");
            assert!(filename.is_none());
        }
        _ => panic!("wrong command parsed"),
    }
}

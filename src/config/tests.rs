use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_describe_a_local_memory_backed_server() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert!(settings.database.url.is_none());
    assert!(settings.admin.key.is_none());
    assert_eq!(settings.uploads.max_file_bytes.get(), 5 * 1024 * 1024);
    assert_eq!(settings.uploads.public_prefix, "/uploads");
    assert_eq!(settings.listing.default_size, 9);
    assert_eq!(settings.listing.max_size, DEFAULT_MAX_PAGE_SIZE);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn uploads_limit_can_be_overridden_via_cli() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        uploads_max_file_bytes: Some(1_572_864),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.uploads.max_file_bytes.get(), 1_572_864);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn blank_admin_key_counts_as_unset() {
    let mut raw = RawSettings::default();
    raw.admin.key = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.admin.key.is_none());
}

#[test]
fn admin_key_is_redacted_in_debug_output() {
    let admin = AdminSettings {
        key: Some("hunter2".to_string()),
    };
    let rendered = format!("{admin:?}");
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("<redacted>"));
}

#[test]
fn site_base_url_is_validated_and_normalized() {
    let mut raw = RawSettings::default();
    raw.site.base_url = Some("https://ada.dev/".to_string());
    raw.site.same_as = vec![" https://github.com/ada ".to_string(), String::new()];
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.site.base_url, "https://ada.dev");
    assert_eq!(settings.site.same_as, vec!["https://github.com/ada"]);

    let mut raw = RawSettings::default();
    raw.site.base_url = Some("ftp://ada.dev".to_string());
    let err = Settings::from_raw(raw).expect_err("scheme rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "site.base_url",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.site.base_url = Some("not a url".to_string());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn default_page_size_may_not_exceed_maximum() {
    let mut raw = RawSettings::default();
    raw.listing.default_page_size = Some(60);
    raw.listing.max_page_size = Some(50);

    let err = Settings::from_raw(raw).expect_err("invalid listing policy");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "listing.default_page_size",
            ..
        }
    ));
}

#[test]
fn upload_prefix_must_be_absolute() {
    let mut raw = RawSettings::default();
    raw.uploads.public_prefix = Some("uploads".to_string());
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = RawSettings::default();
    raw.uploads.public_prefix = Some("/media/".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.uploads.public_prefix, "/media");
}

#[test]
fn zero_rate_limit_is_rejected() {
    let mut raw = RawSettings::default();
    raw.admin_rate_limit.max_requests = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["folio"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from(["folio", "migrate", "--database-url", "postgres://example"]);

    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => {
            assert_eq!(
                migrate.database.database_url.as_deref(),
                Some("postgres://example")
            );
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "folio",
        "serve",
        "--server-port",
        "8080",
        "--listing-max-page-size",
        "24",
        "--site-base-url",
        "https://ada.dev",
        "--log-json",
        "true",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_port, Some(8080));
            assert_eq!(serve.overrides.listing_max_page_size, Some(24));
            assert_eq!(
                serve.overrides.site_base_url.as_deref(),
                Some("https://ada.dev")
            );
            assert_eq!(serve.overrides.log_json, Some(true));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn migrate_only_takes_database_override() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("postgres://from-file".to_string());
    raw.apply_database_override(&DatabaseOverride {
        database_url: Some("postgres://from-cli".to_string()),
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.database.url.as_deref(),
        Some("postgres://from-cli")
    );
}

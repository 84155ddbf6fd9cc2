//! Parsers built from layered configuration.

use argmill::config::{ArgmillConfig, ConfigLoader};
use argmill::middleware::MiddlewareCatalog;
use argmill::telemetry::LogConfig;
use argmill::{ArgmillError, Arguments, Parser, ParserContext};
use std::sync::{Arc, Mutex};

const CONFIG: &str = r#"
[parser]
exit_process = false

[logging]
level = "debug"
format = "json"

[middleware]
before_validation = ["defaults"]
global = ["trim", "stamp"]
"#;

fn catalog() -> MiddlewareCatalog {
    let mut catalog = MiddlewareCatalog::new();
    catalog.insert_fn("defaults", |args: &mut Arguments, _: &ParserContext| {
        if !args.contains_key("region") {
            args.set("region", "  eu-west  ");
        }
    });
    catalog.insert_fn("trim", |args: &mut Arguments, _: &ParserContext| {
        if let Some(region) = args.get_str("region").map(|r| r.trim().to_string()) {
            args.set("region", region);
        }
    });
    catalog.insert_fn("stamp", |args: &mut Arguments, _: &ParserContext| {
        args.set("stamped", true);
    });
    catalog
}

fn load(content: &str) -> ArgmillConfig {
    ConfigLoader::new()
        .with_defaults()
        .with_string(content, "toml")
        .unwrap()
        .load()
        .unwrap()
}

#[test]
fn test_configured_middleware_runs_in_listed_order() {
    let config = load(CONFIG);
    let mut parser = Parser::from_config(&config, catalog()).unwrap();
    parser.demand("region");

    assert_eq!(parser.global_middleware().len(), 3);
    assert_eq!(parser.global_middleware().before_validation_count(), 1);

    let args = parser
        .parse(Vec::<String>::new())
        .unwrap()
        .into_resolved()
        .unwrap();
    assert_eq!(args.get_str("region"), Some("eu-west"));
    assert_eq!(args.get_bool("stamped"), Some(true));
}

#[test]
fn test_configured_parser_routes_failures_to_sink() {
    let config = load(CONFIG);
    assert!(!config.parser.exit_process);

    let mut parser = Parser::from_config(&config, catalog()).unwrap();
    let failures = Arc::new(Mutex::new(0));
    let count = failures.clone();

    parser.demand("missing").fail(move |_: Option<&str>, _: Option<&ArgmillError>| {
        *count.lock().unwrap() += 1;
    });

    assert!(parser.parse(["--region", "us"]).is_err());
    assert_eq!(*failures.lock().unwrap(), 1);
}

#[test]
fn test_unknown_configured_middleware_is_rejected() {
    let config = load(
        r#"
[middleware]
global = ["stamp", "audit"]
"#,
    );

    let err = Parser::from_config(&config, catalog()).unwrap_err();
    assert!(matches!(err, ArgmillError::Config(_)));
    assert!(err.to_string().contains("audit"));
}

#[test]
fn test_logging_section_maps_to_log_config() {
    let config = load(CONFIG);
    let log = LogConfig::from(&config.logging);

    assert_eq!(log.level, "debug");
    assert!(log.json_format);
}

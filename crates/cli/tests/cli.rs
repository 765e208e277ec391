use std::ffi::OsString;

use clap::{CommandFactory, Parser};
use lazy_query_cli::{run, Cli};
use lazy_query_configuration::FixedEnvironment;

const CONFIGURATION: &str = r#"{
    "version": 1,
    "dialect": "sqlite",
    "connectionUri": { "variable": "LAZY_QUERY_DATABASE_URL" },
    "metadata": { "tables": { "people": {
        "tableName": "people",
        "columns": {
            "g": { "name": "g", "type": "integer" },
            "name": { "name": "name", "type": "text" }
        }
    } } }
}"#;

const REQUEST: &str = r#"{
    "collection": "people",
    "pipeline": [
        { "verb": "select", "columns": [{ "column": "name" }] },
        { "verb": "head", "n": 2 }
    ]
}"#;

fn environment() -> FixedEnvironment {
    FixedEnvironment::from([("LAZY_QUERY_DATABASE_URL", "sqlite::memory:")])
}

#[test]
fn the_command_line_is_well_formed() {
    Cli::command().debug_assert();
}

#[tokio::test]
async fn show_prints_the_compiled_query() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("configuration.json"), CONFIGURATION).unwrap();
    let request = dir.path().join("request.json");
    std::fs::write(&request, REQUEST).unwrap();

    let cli = Cli::try_parse_from([
        OsString::from("lazy-query"),
        OsString::from("--context"),
        dir.path().as_os_str().to_owned(),
        OsString::from("show"),
        OsString::from("--simple-names"),
        request.into_os_string(),
    ])
    .unwrap();
    let output = run(cli, environment()).await.unwrap();
    assert_eq!(
        output,
        r#"SELECT "people_0"."name" FROM "people" AS "people_0" LIMIT 2"#
    );
}

#[tokio::test]
async fn print_schema_describes_the_configuration() {
    let cli = Cli::try_parse_from(["lazy-query", "print-schema"]).unwrap();
    let output = run(cli, environment()).await.unwrap();
    assert!(output.contains("connectionUri"));
}

#[tokio::test]
async fn missing_requests_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("configuration.json"), CONFIGURATION).unwrap();
    let cli = Cli::try_parse_from([
        OsString::from("lazy-query"),
        OsString::from("--context"),
        dir.path().as_os_str().to_owned(),
        OsString::from("show"),
        dir.path().join("nope.json").into_os_string(),
    ])
    .unwrap();
    let error = run(cli, environment()).await.unwrap_err();
    assert!(format!("{error:#}").contains("nope.json"));
}

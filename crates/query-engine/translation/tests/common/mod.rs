use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use query_engine_sql::sql;
use query_engine_sql::sql::string::RenderMode;
use query_engine_translation::translation;
use query_engine_translation::translation::functions::DialectFunctions;

fn test_directory(segment: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join(segment)
}

/// Translate a golden file request with the shared test configuration and
/// return the pretty-printed SQL followed by its parameters.
pub async fn test_translation(testname: &str) -> anyhow::Result<String> {
    let directory = test_directory("goldenfiles").join(testname);

    let parsed_configuration =
        lazy_query_configuration::parse_configuration(test_directory("configuration")).await?;
    let configuration = lazy_query_configuration::make_runtime_configuration(
        parsed_configuration,
        lazy_query_configuration::FixedEnvironment::from([(
            "LAZY_QUERY_DATABASE_URL",
            "the translation tests do not rely on a database connection",
        )]),
    )?;

    let request = serde_json::from_str(&fs::read_to_string(directory.join("request.json"))?)?;
    let plan = translation::query::translate(
        &configuration.metadata,
        Arc::new(DialectFunctions::for_dialect(configuration.dialect)),
        &request,
    )?;
    let query = plan.query_sql(RenderMode::default());
    let params: Vec<(usize, &sql::string::Param)> = query
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, p))
        .collect();

    let pretty = sqlformat::format(
        &query.sql,
        &sqlformat::QueryParams::None,
        sqlformat::FormatOptions::default(),
    );

    Ok(format!("{pretty}\n\n{params:?}"))
}

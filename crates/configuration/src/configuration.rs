//! Configuration for the query engine.

use query_engine_metadata::metadata::{self, Dialect};
use schemars::{gen::SchemaSettings, schema::RootSchema};

use crate::environment::Environment;
use crate::error::MakeRuntimeConfigurationError;
use crate::values::{ConnectionUri, PoolSettings, Secret};
use crate::version1::ParsedConfiguration;

/// The 'Configuration' type collects all the information necessary to compile and run
/// queries at runtime.
///
/// Values of this type are produced from a 'ParsedConfiguration' using
/// 'make_runtime_configuration', which resolves secrets from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub dialect: Dialect,
    pub metadata: metadata::Metadata,
    pub pool_settings: PoolSettings,
    pub connection_uri: String,
}

/// Resolve the secrets of a parsed configuration.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
    environment: impl Environment,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    let connection_uri = match parsed_config.connection_uri {
        ConnectionUri(Secret::Plain(uri)) => uri,
        ConnectionUri(Secret::FromEnvironment { variable }) => environment
            .read(&variable)
            .map_err(|_| MakeRuntimeConfigurationError::MissingEnvironmentVariable {
                attribute: "connectionUri".to_string(),
                variable,
            })?,
    };
    Ok(Configuration {
        dialect: parsed_config.dialect,
        metadata: parsed_config.metadata,
        pool_settings: parsed_config.pool_settings,
        connection_uri,
    })
}

/// The JSON schema of the configuration file.
pub fn generate_schema() -> RootSchema {
    SchemaSettings::draft07()
        .into_generator()
        .into_root_schema_for::<ParsedConfiguration>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::FixedEnvironment;

    #[test]
    fn connection_uris_are_read_from_the_environment() {
        let configuration = make_runtime_configuration(
            ParsedConfiguration::empty(),
            FixedEnvironment::from([("LAZY_QUERY_DATABASE_URL", "sqlite::memory:")]),
        )
        .unwrap();
        assert_eq!(configuration.connection_uri, "sqlite::memory:");
        assert_eq!(configuration.dialect, Dialect::Postgres);
    }

    #[test]
    fn missing_variables_are_reported() {
        let error = make_runtime_configuration(
            ParsedConfiguration::empty(),
            FixedEnvironment::default(),
        )
        .unwrap_err();
        assert_eq!(
            error,
            MakeRuntimeConfigurationError::MissingEnvironmentVariable {
                attribute: "connectionUri".to_string(),
                variable: "LAZY_QUERY_DATABASE_URL".into(),
            }
        );
    }

    #[test]
    fn the_empty_configuration_matches_the_schema() {
        let schema = serde_json::to_value(generate_schema()).unwrap();
        let compiled = jsonschema::JSONSchema::compile(&schema).unwrap();
        let instance = serde_json::to_value(ParsedConfiguration::empty()).unwrap();
        assert!(compiled.is_valid(&instance));
    }
}

//! Version 1 of the configuration file format.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::fs;

use query_engine_metadata::metadata::{self, Dialect};

use crate::environment::Variable;
use crate::error::ParseConfigurationError;
use crate::values::{ConnectionUri, PoolSettings, Secret};

const CURRENT_VERSION: u32 = 1;
pub const CONFIGURATION_FILENAME: &str = "configuration.json";
pub const DEFAULT_CONNECTION_URI_VARIABLE: &str = "LAZY_QUERY_DATABASE_URL";

/// Initial configuration, just enough to connect to a database and
/// compile queries against its tables.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfiguration {
    // Which version of the configuration format are we using
    pub version: u32,
    /// The SQL dialect queries are compiled for.
    #[serde(default)]
    pub dialect: Dialect,
    pub connection_uri: ConnectionUri,
    #[serde(skip_serializing_if = "PoolSettings::is_default")]
    #[serde(default)]
    pub pool_settings: PoolSettings,
    #[serde(default)]
    pub metadata: metadata::Metadata,
}

impl ParsedConfiguration {
    pub fn empty() -> Self {
        Self {
            version: CURRENT_VERSION,
            dialect: Dialect::default(),
            connection_uri: ConnectionUri(Secret::FromEnvironment {
                variable: Variable::from(DEFAULT_CONNECTION_URI_VARIABLE),
            }),
            pool_settings: PoolSettings::default(),
            metadata: metadata::Metadata::default(),
        }
    }
}

/// Read and parse `configuration.json` from a configuration directory.
pub async fn parse_configuration(
    configuration_dir: impl AsRef<Path>,
) -> Result<ParsedConfiguration, ParseConfigurationError> {
    let configuration_file = configuration_dir.as_ref().join(CONFIGURATION_FILENAME);

    let configuration_file_contents =
        fs::read_to_string(&configuration_file)
            .await
            .map_err(|source| ParseConfigurationError::IoError {
                file_path: configuration_file.clone(),
                source,
            })?;

    let parsed_config: ParsedConfiguration = serde_json::from_str(&configuration_file_contents)
        .map_err(|error| ParseConfigurationError::ParseError {
            file_path: configuration_file.clone(),
            line: error.line(),
            column: error.column(),
            message: error.to_string(),
        })?;

    if parsed_config.version != CURRENT_VERSION {
        return Err(ParseConfigurationError::UnsupportedVersion(parsed_config.version));
    }

    tracing::debug!(
        file = %configuration_file.display(),
        dialect = %parsed_config.dialect,
        tables = parsed_config.metadata.tables.0.len(),
        "parsed configuration"
    );
    Ok(parsed_config)
}

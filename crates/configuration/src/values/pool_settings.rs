use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings for the connection pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoolSettings {
    /// maximum number of pool connections
    #[serde(default = "max_connections_default")]
    pub max_connections: u32,
}

impl PoolSettings {
    pub fn is_default(&self) -> bool {
        *self == PoolSettings::default()
    }
}

impl Default for PoolSettings {
    fn default() -> PoolSettings {
        PoolSettings {
            max_connections: max_connections_default(),
        }
    }
}

fn max_connections_default() -> u32 {
    5
}

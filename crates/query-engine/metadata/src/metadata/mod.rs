//! Metadata information regarding the database and tracked information.

pub mod database;
pub mod dialect;

// re-export without modules
pub use database::*;
pub use dialect::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadata information.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct Metadata {
    pub tables: TablesInfo,
}

impl Metadata {
    pub fn empty() -> Self {
        Metadata {
            tables: TablesInfo::empty(),
        }
    }
}

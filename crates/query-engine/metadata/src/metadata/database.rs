//! Metadata information regarding the database and tracked information.

use std::collections::BTreeMap;
use std::fmt;

use enum_iterator::Sequence;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The scalar types a column can be declared with.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Sequence,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Boolean,
    Smallint,
    Integer,
    Bigint,
    Real,
    #[serde(rename = "double precision")]
    DoublePrecision,
    Numeric,
    Text,
    Date,
    Timestamp,
    Any,
}

impl ScalarType {
    /// Find a scalar type by its configuration name or a common shorthand
    /// (`int`, `float`, `str`, `bool`).
    pub fn from_name(name: &str) -> Option<ScalarType> {
        match name {
            "int" => Some(ScalarType::Bigint),
            "float" => Some(ScalarType::DoublePrecision),
            "str" => Some(ScalarType::Text),
            "bool" => Some(ScalarType::Boolean),
            _ => enum_iterator::all::<ScalarType>().find(|scalar_type| scalar_type.name() == name),
        }
    }

    /// The name used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Boolean => "boolean",
            ScalarType::Smallint => "smallint",
            ScalarType::Integer => "integer",
            ScalarType::Bigint => "bigint",
            ScalarType::Real => "real",
            ScalarType::DoublePrecision => "double precision",
            ScalarType::Numeric => "numeric",
            ScalarType::Text => "text",
            ScalarType::Date => "date",
            ScalarType::Timestamp => "timestamp",
            ScalarType::Any => "any",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mapping from a "table" name to its information.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TablesInfo(pub BTreeMap<String, TableInfo>);

impl TablesInfo {
    pub fn empty() -> Self {
        TablesInfo(BTreeMap::new())
    }
}

/// Information about a database table (or any other kind of relation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    #[serde(default)]
    pub schema_name: Option<String>,
    pub table_name: String,
    /// Columns in the order the table exposes them.
    pub columns: IndexMap<String, ColumnInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Can this column contain null values
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Nullable {
    #[default]
    Nullable,
    NonNullable,
}

/// Information about a database column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnInfo {
    pub name: String,
    pub r#type: ScalarType,
    #[serde(default)]
    pub nullable: Nullable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_keep_their_declared_order() {
        let table: TableInfo = serde_json::from_value(serde_json::json!({
            "schemaName": "public",
            "tableName": "people",
            "columns": {
                "z": { "name": "z", "type": "integer" },
                "a": { "name": "a", "type": "double precision" },
                "m": { "name": "m", "type": "text", "nullable": "nonNullable" }
            }
        }))
        .unwrap();
        assert_eq!(
            table.columns.keys().collect::<Vec<_>>(),
            vec!["z", "a", "m"]
        );
        assert_eq!(table.columns["a"].r#type, ScalarType::DoublePrecision);
        assert_eq!(table.columns["m"].nullable, Nullable::NonNullable);
    }

    #[test]
    fn scalar_types_resolve_by_name_and_shorthand() {
        assert_eq!(ScalarType::from_name("integer"), Some(ScalarType::Integer));
        assert_eq!(
            ScalarType::from_name("double precision"),
            Some(ScalarType::DoublePrecision)
        );
        assert_eq!(
            ScalarType::from_name("float"),
            Some(ScalarType::DoublePrecision)
        );
        assert_eq!(ScalarType::from_name("complex"), None);
    }
}

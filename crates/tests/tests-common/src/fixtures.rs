//! A small `people` and `groups` database, as metadata and as SQLite tables.

use indexmap::IndexMap;
use query_engine_metadata::metadata;
use sqlx::any::AnyPoolOptions;

const SCHEMA: &str = "main";

const SEED: &[&str] = &[
    "CREATE TABLE people (g INTEGER NOT NULL, x INTEGER NOT NULL, name TEXT NOT NULL)",
    "INSERT INTO people VALUES (1, 1, 'ada'), (1, 2, 'bob'), (2, 5, 'cy')",
    "CREATE TABLE groups (g INTEGER NOT NULL, label TEXT NOT NULL)",
    "INSERT INTO groups VALUES (1, 'small'), (2, 'large')",
];

fn column(name: &str, r#type: metadata::ScalarType) -> (String, metadata::ColumnInfo) {
    (
        name.to_string(),
        metadata::ColumnInfo {
            name: name.to_string(),
            r#type,
            nullable: metadata::Nullable::NonNullable,
        },
    )
}

fn table(
    name: &str,
    columns: Vec<(String, metadata::ColumnInfo)>,
) -> (String, metadata::TableInfo) {
    (
        name.to_string(),
        metadata::TableInfo {
            schema_name: Some(SCHEMA.to_string()),
            table_name: name.to_string(),
            columns: columns.into_iter().collect::<IndexMap<_, _>>(),
            description: None,
        },
    )
}

/// Metadata describing the seeded tables.
pub fn metadata() -> metadata::Metadata {
    metadata::Metadata {
        tables: metadata::TablesInfo(
            [
                table(
                    "people",
                    vec![
                        column("g", metadata::ScalarType::Integer),
                        column("x", metadata::ScalarType::Integer),
                        column("name", metadata::ScalarType::Text),
                    ],
                ),
                table(
                    "groups",
                    vec![
                        column("g", metadata::ScalarType::Integer),
                        column("label", metadata::ScalarType::Text),
                    ],
                ),
            ]
            .into_iter()
            .collect(),
        ),
    }
}

/// An in-memory SQLite database holding the seeded tables. The pool keeps a
/// single connection, since every connection gets its own memory database.
pub async fn sqlite_pool() -> anyhow::Result<sqlx::AnyPool> {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    for statement in SEED {
        sqlx::query(statement).execute(&pool).await?;
    }
    Ok(pool)
}

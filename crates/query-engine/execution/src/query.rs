//! Execute an execution plan against the database.

use std::time::Instant;

use serde::Serialize;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::{info_span, Instrument};

use query_engine_sql::sql;
use query_engine_sql::sql::string::RenderMode;

use crate::error::Error;
use crate::metrics;

pub use sqlx::AnyPool as Pool;

/// The rows a query returned, with the names of its columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl RowSet {
    /// One JSON object per row, with fields in column order.
    pub fn to_records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

/// Connect a pool to a `postgres://` or `sqlite:` URL.
pub async fn create_pool(connection_uri: &str, max_connections: u32) -> Result<Pool, Error> {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(max_connections)
        .connect(connection_uri)
        .await?;
    Ok(pool)
}

/// Execute a query and fetch every row.
pub async fn execute(
    pool: &Pool,
    metrics: &metrics::Metrics,
    plan: &sql::execution_plan::ExecutionPlan,
) -> Result<RowSet, Error> {
    let query = plan.query_sql(RenderMode::default());

    tracing::info!(
        root_field = %plan.root_field,
        generated_sql = query.sql,
        params = ?&query.params,
    );

    let started = Instant::now();
    let result = async {
        let rows = build_query_with_params(&query)
            .fetch_all(pool)
            .instrument(info_span!("Fetch rows"))
            .await?;
        rows_to_row_set(&rows)
    }
    .instrument(info_span!("Execute query"))
    .await;
    metrics.record_query_execution_time(started.elapsed());

    match result {
        Ok(row_set) => {
            metrics.record_successful_query();
            Ok(row_set)
        }
        Err(error) => {
            metrics.record_error();
            Err(error)
        }
    }
}

/// Convert a query to an EXPLAIN query and execute it. Returns the
/// pretty-printed query and the database's plan.
pub async fn explain(
    pool: &Pool,
    metrics: &metrics::Metrics,
    plan: &sql::execution_plan::ExecutionPlan,
) -> Result<(String, String), Error> {
    let query = plan.explain_query_sql(RenderMode::default());

    tracing::info!(generated_sql = query.sql, params = ?&query.params);

    let rows = build_query_with_params(&query)
        .fetch_all(pool)
        .instrument(info_span!("Explain query"))
        .await
        .map_err(|error| {
            metrics.record_error();
            error
        })?;

    // postgres returns one text column, sqlite's detail is the last of four
    let mut results: Vec<String> = vec![];
    for row in &rows {
        if let Some(last) = row.len().checked_sub(1) {
            results.push(row.try_get(last)?);
        }
    }
    metrics.record_successful_explain();

    Ok((show(plan, RenderMode::default(), true), results.join("\n")))
}

/// Render a plan's query, optionally pretty-printed.
pub fn show(plan: &sql::execution_plan::ExecutionPlan, mode: RenderMode, pretty: bool) -> String {
    let query = plan.query_sql(mode);
    if pretty {
        sqlformat::format(
            &query.sql,
            &sqlformat::QueryParams::None,
            sqlformat::FormatOptions::default(),
        )
    } else {
        query.sql
    }
}

/// Create a SQLx query based on our SQL query and bind our parameters to it.
fn build_query_with_params(
    query: &sql::string::SQL,
) -> sqlx::query::Query<'_, sqlx::Any, sqlx::any::AnyArguments<'_>> {
    query
        .params
        .iter()
        .fold(sqlx::query(query.sql.as_str()), |sqlx_query, param| match param {
            sql::string::Param::String(s) => sqlx_query.bind(s.clone()),
        })
}

fn rows_to_row_set(rows: &[AnyRow]) -> Result<RowSet, Error> {
    let columns = rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|column| column.name().to_string())
                .collect()
        })
        .unwrap_or_default();
    let rows = rows
        .iter()
        .map(|row| (0..row.len()).map(|index| decode_value(row, index)).collect())
        .collect::<Result<_, _>>()?;
    Ok(RowSet { columns, rows })
}

/// Decode one value as the first JSON type that fits.
fn decode_value(row: &AnyRow, index: usize) -> Result<serde_json::Value, Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(serde_json::Value::Null);
    }
    if let Ok(value) = row.try_get::<i64, _>(index) {
        return Ok(value.into());
    }
    if let Ok(value) = row.try_get::<f64, _>(index) {
        return Ok(serde_json::Number::from_f64(value).map_or(serde_json::Value::Null, Into::into));
    }
    if let Ok(value) = row.try_get::<bool, _>(index) {
        return Ok(value.into());
    }
    if let Ok(value) = row.try_get::<String, _>(index) {
        return Ok(value.into());
    }
    let column = &row.columns()[index];
    Err(Error::UnsupportedColumnType {
        column: column.name().to_string(),
        type_name: column.type_info().name().to_string(),
    })
}

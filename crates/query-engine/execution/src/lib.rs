//! Query execution against a database through sqlx.

pub mod error;
pub mod metrics;
pub mod query;

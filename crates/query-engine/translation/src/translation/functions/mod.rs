//! Per-dialect tables mapping operations to SQL builders.
//!
//! Every dialect has three buckets. Scalar builders apply in every context.
//! Aggregate builders are consulted when summarizing, window builders when
//! filtering or mutating. A builder receives already-translated arguments and
//! returns either a finished expression or a [`WindowFragment`] that still
//! needs an OVER clause.

mod common;
pub mod postgres;
pub mod sqlite;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use query_engine_metadata::metadata::Dialect;
use query_engine_sql::sql;

use super::error::Error;
use super::expression::Operation;
use super::translator::Mode;
use super::windows::WindowFragment;

/// Translated arguments handed to a builder.
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
    pub operation: Operation,
    pub args: Vec<sql::ast::Expression>,
    pub kwargs: BTreeMap<String, sql::ast::Expression>,
}

impl Arguments {
    /// Exactly `N` positional arguments and no keywords.
    pub fn exactly<const N: usize>(self) -> Result<[sql::ast::Expression; N], Error> {
        let operation = self.operation;
        if !self.kwargs.is_empty() {
            return Err(Error::invalid_operation_arguments(
                operation,
                "keyword arguments are not accepted",
            ));
        }
        let count = self.args.len();
        <[sql::ast::Expression; N]>::try_from(self.args).map_err(|_| {
            Error::invalid_operation_arguments(
                operation,
                format!("expected {N} argument(s), got {count}"),
            )
        })
    }
}

/// What a builder produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Physical {
    /// A complete SQL expression.
    Expression(sql::ast::Expression),
    /// A window function awaiting its OVER clause.
    Window(WindowFragment),
}

pub type Builder = Arc<dyn Fn(Arguments) -> Result<Physical, Error> + Send + Sync>;

/// Turns a closure into a [`Builder`].
pub fn builder(
    function: impl Fn(Arguments) -> Result<Physical, Error> + Send + Sync + 'static,
) -> Builder {
    Arc::new(function)
}

/// The operations a dialect supports, and how to write each one.
#[derive(Clone)]
pub struct DialectFunctions {
    dialect: Dialect,
    scalar: BTreeMap<Operation, Builder>,
    aggregate: BTreeMap<Operation, Builder>,
    window: BTreeMap<Operation, Builder>,
}

impl fmt::Debug for DialectFunctions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectFunctions")
            .field("dialect", &self.dialect)
            .field("scalar", &self.scalar.keys().collect::<Vec<_>>())
            .field("aggregate", &self.aggregate.keys().collect::<Vec<_>>())
            .field("window", &self.window.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl DialectFunctions {
    /// A dialect with no operations at all.
    pub fn empty(dialect: Dialect) -> Self {
        DialectFunctions {
            dialect,
            scalar: BTreeMap::new(),
            aggregate: BTreeMap::new(),
            window: BTreeMap::new(),
        }
    }

    /// The built-in table for a dialect.
    pub fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Postgres => postgres::functions(),
            Dialect::Sqlite => sqlite::functions(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Add or replace a scalar builder.
    #[must_use]
    pub fn with_scalar(mut self, operation: Operation, builder: Builder) -> Self {
        self.scalar.insert(operation, builder);
        self
    }

    /// Add or replace an aggregate builder.
    #[must_use]
    pub fn with_aggregate(mut self, operation: Operation, builder: Builder) -> Self {
        self.aggregate.insert(operation, builder);
        self
    }

    /// Add or replace a window builder.
    #[must_use]
    pub fn with_window(mut self, operation: Operation, builder: Builder) -> Self {
        self.window.insert(operation, builder);
        self
    }

    /// Remove an operation from every bucket.
    #[must_use]
    pub fn without(mut self, operation: Operation) -> Self {
        self.scalar.remove(&operation);
        self.aggregate.remove(&operation);
        self.window.remove(&operation);
        self
    }

    /// Find the builder for an operation in a context. Scalar builders win;
    /// otherwise the bucket for the context is consulted.
    pub fn lookup(&self, operation: Operation, mode: Mode) -> Result<&Builder, Error> {
        let bucket = match mode {
            Mode::Scalar => None,
            Mode::Aggregate => Some(&self.aggregate),
            Mode::Window => Some(&self.window),
        };
        self.scalar
            .get(&operation)
            .or_else(|| bucket.and_then(|bucket| bucket.get(&operation)))
            .ok_or(Error::UnsupportedOperation {
                dialect: self.dialect,
                operation,
                mode,
            })
    }

    /// Whether an operation can be translated in a context.
    pub fn supports(&self, operation: Operation, mode: Mode) -> bool {
        self.lookup(operation, mode).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::expression::{AggregateFunction, ArithmeticFunction, MathFunction};

    #[test]
    fn scalar_builders_apply_in_every_mode() {
        let functions = DialectFunctions::for_dialect(Dialect::Postgres);
        let add = Operation::Arithmetic(ArithmeticFunction::Add);
        for mode in [Mode::Scalar, Mode::Aggregate, Mode::Window] {
            assert!(functions.supports(add, mode), "{mode}");
        }
    }

    #[test]
    fn aggregates_are_missing_from_scalar_context() {
        let functions = DialectFunctions::for_dialect(Dialect::Sqlite);
        let mean = Operation::Aggregate(AggregateFunction::Mean);
        assert!(functions.supports(mean, Mode::Aggregate));
        assert!(functions.supports(mean, Mode::Window));
        assert_eq!(
            functions.lookup(mean, Mode::Scalar).err(),
            Some(Error::UnsupportedOperation {
                dialect: Dialect::Sqlite,
                operation: mean,
                mode: Mode::Scalar,
            })
        );
    }

    #[test]
    fn sqlite_lacks_statistics_that_postgres_has() {
        let var = Operation::Aggregate(AggregateFunction::Var);
        let cot = Operation::Math(MathFunction::Cot);
        let postgres = DialectFunctions::for_dialect(Dialect::Postgres);
        let sqlite = DialectFunctions::for_dialect(Dialect::Sqlite);
        assert!(postgres.supports(var, Mode::Window));
        assert!(postgres.supports(cot, Mode::Scalar));
        assert!(!sqlite.supports(var, Mode::Window));
        assert!(!sqlite.supports(var, Mode::Aggregate));
        assert!(!sqlite.supports(cot, Mode::Scalar));
    }

    #[test]
    fn overrides_replace_and_remove_builders() {
        let mean = Operation::Aggregate(AggregateFunction::Mean);
        let functions = DialectFunctions::for_dialect(Dialect::Postgres)
            .without(mean)
            .with_aggregate(
                mean,
                builder(|arguments| {
                    let [x] = arguments.exactly()?;
                    Ok(Physical::Expression(sql::ast::Expression::FunctionCall {
                        function: sql::ast::Function::Unknown("my_mean".to_string()),
                        args: vec![x],
                    }))
                }),
            );
        assert!(functions.supports(mean, Mode::Aggregate));
        assert!(!functions.supports(mean, Mode::Window));
    }
}

//! The relational verbs a lazy query supports.
//!
//! Every verb takes a [`QueryState`] and returns a new one, leaving its input
//! untouched. Each lives in its own module; [`Verbs`] gathers them behind one
//! interface so other kinds of table can offer the same verbs.

mod arrange;
mod count;
mod distinct;
mod filter;
mod group_by;
mod head;
mod join;
mod mutate;
mod rename;
mod select;
mod summarize;

use std::convert::Infallible;

use indexmap::IndexMap;

use super::error::Error;
use super::expression::{Expression, Literal};
use super::state::QueryState;

pub use count::CountOptions;
pub use join::{JoinKind, JoinOn};

/// The verbs of a table-like source.
pub trait Verbs: Sized {
    /// Keep, drop, reorder or relabel columns.
    fn select(&self, columns: &[Expression]) -> Result<Self, Error>;
    /// Keep the rows matching every predicate.
    fn filter(&self, predicates: &[Expression]) -> Result<Self, Error>;
    /// Add or replace columns, in order.
    fn mutate(&self, columns: &[(&str, Expression)]) -> Result<Self, Error>;
    /// Sort the rows.
    fn arrange(&self, terms: &[Expression]) -> Result<Self, Error>;
    /// One row per group, with the grouping columns and the given aggregates.
    fn summarize(&self, columns: &[(&str, Expression)]) -> Result<Self, Error>;
    /// Count rows per group and per the given columns.
    fn count(&self, columns: &[Expression], options: CountOptions) -> Result<Self, Error>;
    /// Set the grouping, or with `add` extend it.
    fn group_by(&self, columns: &[Expression], add: bool) -> Result<Self, Error>;
    /// Drop the grouping.
    fn ungroup(&self) -> Result<Self, Error>;
    /// Join with another source of the same kind.
    fn join(&self, right: &Self, on: &JoinOn, kind: JoinKind) -> Result<Self, Error>;
    /// Relabel columns. Each pair is `(new name, old column)`.
    fn rename(&self, columns: &[(&str, Expression)]) -> Result<Self, Error>;
    /// Unique rows over the given columns, or over every column.
    fn distinct(
        &self,
        columns: &[Expression],
        computed: &[(&str, Expression)],
        keep_all: bool,
    ) -> Result<Self, Error>;
    /// At most `n` rows.
    fn head(&self, n: u32) -> Result<Self, Error>;
}

impl Verbs for QueryState {
    fn select(&self, columns: &[Expression]) -> Result<Self, Error> {
        select::select(self, columns)
    }

    fn filter(&self, predicates: &[Expression]) -> Result<Self, Error> {
        filter::filter(self, predicates)
    }

    fn mutate(&self, columns: &[(&str, Expression)]) -> Result<Self, Error> {
        mutate::mutate(self, columns)
    }

    fn arrange(&self, terms: &[Expression]) -> Result<Self, Error> {
        arrange::arrange(self, terms)
    }

    fn summarize(&self, columns: &[(&str, Expression)]) -> Result<Self, Error> {
        summarize::summarize(self, columns)
    }

    fn count(&self, columns: &[Expression], options: CountOptions) -> Result<Self, Error> {
        count::count(self, columns, &options)
    }

    fn group_by(&self, columns: &[Expression], add: bool) -> Result<Self, Error> {
        group_by::group_by(self, columns, add)
    }

    fn ungroup(&self) -> Result<Self, Error> {
        Ok(group_by::ungroup(self))
    }

    fn join(&self, right: &Self, on: &JoinOn, kind: JoinKind) -> Result<Self, Error> {
        join::join(self, right, on, kind)
    }

    fn rename(&self, columns: &[(&str, Expression)]) -> Result<Self, Error> {
        rename::rename(self, columns)
    }

    fn distinct(
        &self,
        columns: &[Expression],
        computed: &[(&str, Expression)],
        keep_all: bool,
    ) -> Result<Self, Error> {
        distinct::distinct(self, columns, computed, keep_all)
    }

    fn head(&self, n: u32) -> Result<Self, Error> {
        Ok(head::head(self, n))
    }
}

/// Normalise an expression before translation: `_["x"]` becomes `_.x`, and
/// the `str` and `dt` accessors are dropped, so `_.x.str.upper()` is
/// `upper(_.x)`.
pub fn shape(expression: &Expression) -> Expression {
    let shaped = expression.rewrite(&mut |node| {
        Ok::<_, Infallible>(match node {
            Expression::Attribute { parent, name }
                if *parent != Expression::Reference && (name == "str" || name == "dt") =>
            {
                *parent
            }
            Expression::Index { parent, key } if *parent == Expression::Reference => match *key {
                Expression::Literal(Literal::String(name)) => {
                    Expression::Attribute { parent, name }
                }
                key => Expression::Index {
                    parent,
                    key: Box::new(key),
                },
            },
            other => other,
        })
    });
    match shaped {
        Ok(expression) => expression,
        Err(never) => match never {},
    }
}

/// Point references to renamed columns at their new names.
fn rename_references(expression: &Expression, renames: &IndexMap<String, String>) -> Expression {
    let renamed = expression.rewrite(&mut |node| {
        Ok::<_, Infallible>(match node {
            Expression::Attribute { parent, name } if *parent == Expression::Reference => {
                let name = renames.get(&name).cloned().unwrap_or(name);
                Expression::Attribute { parent, name }
            }
            other => other,
        })
    });
    match renamed {
        Ok(expression) => expression,
        Err(never) => match never {},
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use indexmap::IndexMap;
    use query_engine_metadata::metadata;
    use query_engine_sql::sql::string::RenderMode;

    use super::*;
    use crate::translation::expression::*;
    use crate::translation::functions::DialectFunctions;

    pub fn table(name: &str, columns: &[&str]) -> metadata::TableInfo {
        metadata::TableInfo {
            schema_name: Some("public".to_string()),
            table_name: name.to_string(),
            columns: columns
                .iter()
                .map(|column| {
                    (
                        (*column).to_string(),
                        metadata::ColumnInfo {
                            name: (*column).to_string(),
                            r#type: metadata::ScalarType::Integer,
                            nullable: metadata::Nullable::Nullable,
                        },
                    )
                })
                .collect::<IndexMap<_, _>>(),
            description: None,
        }
    }

    pub fn people(dialect: metadata::Dialect) -> QueryState {
        QueryState::new(
            Arc::new(DialectFunctions::for_dialect(dialect)),
            "people",
            &table("people", &["g", "x"]),
        )
    }

    pub fn show(state: &QueryState) -> String {
        state.show_query(RenderMode {
            literal_binds: true,
            simple_names: false,
        })
    }

    #[test]
    fn shaping_drops_accessors_and_normalises_subscripts() {
        let expression = reference().index("x").attr("str").upper();
        assert_eq!(shape(&expression), col("x").upper());
    }

    #[test]
    fn shaping_keeps_columns_named_like_accessors() {
        assert_eq!(shape(&col("str")), col("str"));
    }

    #[test]
    fn renaming_rewrites_column_references_only() {
        let renames = IndexMap::from([("x".to_string(), "y".to_string())]);
        assert_eq!(
            rename_references(&(col("x") + lit("x")), &renames),
            col("y") + lit("x")
        );
    }
}

//! Helpers for resolving column names and building SQL.

use indexmap::{IndexMap, IndexSet};
use query_engine_sql::sql;
use query_engine_sql::sql::helpers::{aliased_column, make_column_alias, make_table_alias};

use super::error::Error;

/// Hands out table aliases with a unique index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct State {
    unique_index: u64,
}

impl State {
    /// create table aliases using this function so they get a unique index.
    pub fn make_table_alias(&mut self, name: &str) -> sql::ast::TableAlias {
        let index = self.unique_index;
        self.unique_index += 1;
        make_table_alias(name.to_string(), index)
    }

    /// Continue after whichever of the two states handed out more aliases.
    pub fn merge(&mut self, other: State) {
        self.unique_index = self.unique_index.max(other.unique_index);
    }
}

/// The columns visible to an expression, by name, and what each one
/// translates to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Namespace {
    columns: IndexMap<String, sql::ast::Expression>,
}

impl Namespace {
    pub fn from_columns(columns: impl IntoIterator<Item = (String, sql::ast::Expression)>) -> Self {
        Namespace {
            columns: columns.into_iter().collect(),
        }
    }

    /// Expressions see the select list of the same SELECT, so a name
    /// translates to the expression it labels.
    pub fn of_select_list(select: &sql::ast::Select) -> Self {
        Namespace::from_columns(
            select
                .select_list
                .0
                .iter()
                .map(|(alias, expression)| (alias.name.clone(), expression.clone())),
        )
    }

    /// Expressions see the output of `select` through a subquery aliased
    /// `alias`, so a name translates to `"alias"."name"`.
    pub fn of_subquery(select: &sql::ast::Select, alias: &sql::ast::TableAlias) -> Self {
        Namespace::from_columns(
            select
                .select_list
                .0
                .iter()
                .map(|(column, _)| (column.name.clone(), aliased_column(alias, column))),
        )
    }

    pub fn lookup(&self, name: &str) -> Result<&sql::ast::Expression, Error> {
        self.columns.get(name).ok_or_else(|| Error::UnknownColumn {
            name: name.to_string(),
            available: self.columns.keys().cloned().collect(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.columns.keys()
    }

    /// The namespace as a select list exposing every column under its name.
    pub fn select_list(&self) -> Vec<(sql::ast::ColumnAlias, sql::ast::Expression)> {
        self.columns
            .iter()
            .map(|(name, expression)| (make_column_alias(name.clone()), expression.clone()))
            .collect()
    }
}

/// The output column names of a SELECT, in order.
pub fn column_names(select: &sql::ast::Select) -> Vec<String> {
    select
        .select_list
        .0
        .iter()
        .map(|(alias, _)| alias.name.clone())
        .collect()
}

/// Columns a SELECT computes itself, rather than passing through from its
/// FROM clause under the same name. Later expressions in the same SELECT
/// cannot refer to them.
pub fn derived_columns(select: &sql::ast::Select) -> IndexSet<String> {
    select
        .select_list
        .0
        .iter()
        .filter(|(alias, expression)| !passes_through(expression, alias))
        .map(|(alias, _)| alias.name.clone())
        .collect()
}

fn passes_through(expression: &sql::ast::Expression, alias: &sql::ast::ColumnAlias) -> bool {
    use sql::ast::{ColumnReference, Expression};
    match expression {
        Expression::ColumnReference(ColumnReference::TableColumn { name, .. }) => {
            name.0 == alias.name
        }
        Expression::ColumnReference(ColumnReference::AliasedColumn { column, .. }) => {
            column == alias
        }
        _ => false,
    }
}

/// Stages a later verb cannot extend in place: DISTINCT and LIMIT change
/// which rows exist, so anything added afterwards must see their result.
pub fn changes_row_set(select: &sql::ast::Select) -> bool {
    select.distinct || select.limit.limit.is_some() || select.limit.offset.is_some()
}

/// Wrap `select` in a subquery that passes every column through.
pub fn wrap(state: &mut State, select: sql::ast::Select) -> sql::ast::Select {
    let alias = state.make_table_alias("subquery");
    sql::helpers::select_all_from(select, alias)
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_engine_sql::sql::helpers::simple_select;

    #[test]
    fn aliases_are_numbered_in_order() {
        let mut state = State::default();
        assert_eq!(state.make_table_alias("people").unique_index, 0);
        assert_eq!(state.make_table_alias("subquery").unique_index, 1);
    }

    #[test]
    fn unknown_columns_list_what_is_available() {
        let table = make_table_alias("t".to_string(), 0);
        let value = |n| sql::ast::Expression::Value(sql::ast::Value::Int8(n));
        let select = simple_select(vec![
            (make_column_alias("a".to_string()), value(1)),
            (make_column_alias("b".to_string()), value(2)),
        ]);
        let namespace = Namespace::of_subquery(&select, &table);
        assert_eq!(
            namespace.lookup("c"),
            Err(Error::UnknownColumn {
                name: "c".to_string(),
                available: vec!["a".to_string(), "b".to_string()],
            })
        );
        assert_eq!(
            namespace.lookup("a"),
            Ok(&aliased_column(&table, &make_column_alias("a".to_string())))
        );
    }

    #[test]
    fn derived_columns_exclude_pass_through_references() {
        let table = make_table_alias("t".to_string(), 0);
        let a = make_column_alias("a".to_string());
        let b = make_column_alias("b".to_string());
        let select = simple_select(vec![
            (a.clone(), aliased_column(&table, &a)),
            (b, aliased_column(&table, &a)),
        ]);
        assert_eq!(
            derived_columns(&select).into_iter().collect::<Vec<_>>(),
            vec!["b".to_string()]
        );
    }
}

//! join: combine two queries on equal key columns.

use std::fmt;
use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use query_engine_sql::sql;
use serde::{Deserialize, Serialize};

use crate::translation::error::Error;
use crate::translation::helpers::Namespace;
use crate::translation::state::QueryState;

/// Which rows a join keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => f.write_str("inner"),
            JoinKind::Left => f.write_str("left"),
            JoinKind::Right => f.write_str("right"),
            JoinKind::Full => f.write_str("full"),
        }
    }
}

impl FromStr for JoinKind {
    type Err = Error;

    fn from_str(how: &str) -> Result<Self, Self::Err> {
        match how {
            "inner" => Ok(JoinKind::Inner),
            "left" => Ok(JoinKind::Left),
            "right" => Ok(JoinKind::Right),
            "full" => Ok(JoinKind::Full),
            _ => Err(Error::invalid_verb_argument(
                "join",
                format!("how must be one of inner, left, right or full, not '{how}'"),
            )),
        }
    }
}

/// The key columns of a join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JoinOn {
    /// Columns with the same name on both sides.
    Columns(Vec<String>),
    /// Left column name to right column name.
    Pairs(IndexMap<String, String>),
}

impl JoinOn {
    pub fn pairs(&self) -> Vec<(String, String)> {
        match self {
            JoinOn::Columns(columns) => columns
                .iter()
                .map(|column| (column.clone(), column.clone()))
                .collect(),
            JoinOn::Pairs(pairs) => pairs
                .iter()
                .map(|(left, right)| (left.clone(), right.clone()))
                .collect(),
        }
    }
}

/// Columns of the left side come first, then the right side's. A key with
/// the same name on both sides appears once; other names present on both
/// sides get `_x` and `_y` suffixes.
///
/// A right join is a left join with the sides swapped.
pub fn join(
    left: &QueryState,
    right: &QueryState,
    on: &JoinOn,
    kind: JoinKind,
) -> Result<QueryState, Error> {
    if left.dialect() != right.dialect() {
        return Err(Error::invalid_verb_argument(
            "join",
            format!(
                "cannot join a {} query with a {} query",
                left.dialect(),
                right.dialect()
            ),
        ));
    }
    let pairs = on.pairs();
    if pairs.is_empty() {
        return Err(Error::invalid_verb_argument("join", "on must name at least one key column"));
    }

    let mut aliases = left.aliases();
    aliases.merge(right.aliases());
    let lhs = aliases.make_table_alias("lhs");
    let rhs = aliases.make_table_alias("rhs");
    let left_namespace = Namespace::of_subquery(left.last_stage(), &lhs);
    let right_namespace = Namespace::of_subquery(right.last_stage(), &rhs);

    let on_clause = sql::helpers::and_all(
        pairs
            .iter()
            .map(|(left_key, right_key)| {
                Ok(sql::helpers::equals(
                    left_namespace.lookup(left_key)?.clone(),
                    right_namespace.lookup(right_key)?.clone(),
                ))
            })
            .collect::<Result<Vec<_>, Error>>()?,
    );

    let left_columns = left.column_names();
    let right_columns = right.column_names();
    let shared_keys: IndexSet<&String> = pairs
        .iter()
        .filter(|(left_key, right_key)| left_key == right_key)
        .map(|(key, _)| key)
        .collect();
    let clashes: IndexSet<&String> = left_columns
        .iter()
        .filter(|name| right_columns.contains(name) && !shared_keys.contains(name))
        .collect();

    let mut select_list = vec![];
    for name in &left_columns {
        let left_column = left_namespace.lookup(name)?.clone();
        let (label, expression) = if shared_keys.contains(name) {
            let right_column = right_namespace.lookup(name)?.clone();
            let expression = match kind {
                JoinKind::Inner | JoinKind::Left => left_column,
                JoinKind::Right => right_column,
                JoinKind::Full => sql::ast::Expression::FunctionCall {
                    function: sql::ast::Function::Coalesce,
                    args: vec![left_column, right_column],
                },
            };
            (name.clone(), expression)
        } else if clashes.contains(name) {
            (format!("{name}_x"), left_column)
        } else {
            (name.clone(), left_column)
        };
        select_list.push((sql::helpers::make_column_alias(label), expression));
    }
    for name in right_columns
        .iter()
        .filter(|name| !shared_keys.contains(name))
    {
        let label = if clashes.contains(name) {
            format!("{name}_y")
        } else {
            name.clone()
        };
        select_list.push((
            sql::helpers::make_column_alias(label),
            right_namespace.lookup(name)?.clone(),
        ));
    }

    let left_select = sql::ast::From::Select {
        select: Box::new(left.last_stage().clone()),
        alias: lhs.clone(),
    };
    let (from, joined, joined_alias) = match kind {
        JoinKind::Right => (
            sql::ast::From::Select {
                select: Box::new(right.last_stage().clone()),
                alias: rhs,
            },
            left.last_stage().clone(),
            lhs,
        ),
        _ => (left_select, right.last_stage().clone(), rhs),
    };
    let mut select = sql::helpers::simple_select(select_list);
    select.from = Some(from);
    select.joins = vec![sql::ast::Join {
        kind: match kind {
            JoinKind::Inner => sql::ast::JoinKind::Inner,
            JoinKind::Left | JoinKind::Right => sql::ast::JoinKind::LeftOuter,
            JoinKind::Full => sql::ast::JoinKind::FullOuter,
        },
        select: Box::new(joined),
        alias: joined_alias,
        on: on_clause,
    }];

    let output: IndexSet<String> = select
        .select_list
        .0
        .iter()
        .map(|(alias, _)| alias.name.clone())
        .collect();
    let group_columns = left
        .group_columns()
        .iter()
        .filter(|group| output.contains(*group))
        .cloned()
        .collect();

    tracing::debug!(
        verb = "join",
        how = %kind,
        stages = left.stages().depth() + 1,
        wrapped = true,
        "applied verb"
    );
    Ok(left.with_stage(select, aliases, group_columns, vec![]))
}

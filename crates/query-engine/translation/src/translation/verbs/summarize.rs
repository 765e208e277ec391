//! summarize: one row per group.

use indexmap::IndexSet;
use query_engine_sql::sql;

use super::shape;
use crate::translation::error::Error;
use crate::translation::expression::Expression;
use crate::translation::helpers::{self, Namespace};
use crate::translation::state::QueryState;
use crate::translation::translator::Mode;
use crate::translation::windows::WindowContext;

/// The result has the grouping columns followed by one column per aggregate,
/// and is neither grouped nor ordered.
///
/// The current SELECT is reused when it has no GROUP BY of its own, keeps
/// every row, and neither the aggregates nor the grouping read a column it
/// computes. Otherwise it becomes a subquery.
pub fn summarize(state: &QueryState, columns: &[(&str, Expression)]) -> Result<QueryState, Error> {
    if columns.is_empty() && state.group_columns().is_empty() {
        return Err(Error::invalid_verb_argument(
            "summarize",
            "expected at least one column or a grouping",
        ));
    }

    let shaped: Vec<(&str, Expression)> = columns
        .iter()
        .map(|(name, expression)| (*name, shape(expression)))
        .collect();

    let mut referenced = IndexSet::new();
    for (index, (_, expression)) in shaped.iter().enumerate() {
        let reads = expression.referenced_columns();
        if let Some((column, _)) = shaped[..index]
            .iter()
            .find(|(earlier, _)| reads.contains(*earlier))
        {
            return Err(Error::AmbiguousColumnReference {
                verb: "summarize",
                column: (*column).to_string(),
            });
        }
        referenced.extend(reads);
    }
    referenced.extend(state.group_columns().iter().cloned());

    let mut aliases = state.aliases();
    let last = state.last_stage();
    let derived = helpers::derived_columns(last);
    let wrapped = !last.group_by.elements.is_empty()
        || helpers::changes_row_set(last)
        || referenced.iter().any(|column| derived.contains(column));
    let mut select = if wrapped {
        helpers::wrap(&mut aliases, last.clone())
    } else {
        let mut select = last.clone();
        select.order_by = sql::helpers::empty_order_by();
        select
    };
    let namespace = Namespace::of_select_list(&select);

    let groups = state
        .group_columns()
        .iter()
        .map(|name| Ok((name.clone(), namespace.lookup(name)?.clone())))
        .collect::<Result<Vec<_>, Error>>()?;

    let mut select_list: Vec<_> = groups
        .iter()
        .map(|(name, expression)| {
            (
                sql::helpers::make_column_alias(name.clone()),
                expression.clone(),
            )
        })
        .collect();
    for (name, expression) in &shaped {
        let translated = state.translate(
            expression,
            &namespace,
            Mode::Aggregate,
            &WindowContext::empty(),
        )?;
        select_list.push((
            sql::helpers::make_column_alias((*name).to_string()),
            translated.expression,
        ));
    }
    select.select_list = sql::ast::SelectList(select_list);
    select.group_by = sql::ast::GroupBy {
        elements: groups.into_iter().map(|(_, group)| group).collect(),
    };

    tracing::debug!(
        verb = "summarize",
        stages = state.stages().depth() + 1,
        wrapped,
        "applied verb"
    );
    Ok(state.with_stage(select, aliases, IndexSet::new(), vec![]))
}

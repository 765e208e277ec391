//! distinct: unique rows.

use indexmap::IndexSet;
use query_engine_sql::sql;

use super::{mutate::mutate, shape};
use crate::translation::error::Error;
use crate::translation::expression::Expression;
use crate::translation::helpers::{self, Namespace};
use crate::translation::state::QueryState;

/// Unique combinations of `columns` and `computed`, the latter added with
/// mutate first. Without any columns, unique rows over every column.
pub fn distinct(
    state: &QueryState,
    columns: &[Expression],
    computed: &[(&str, Expression)],
    keep_all: bool,
) -> Result<QueryState, Error> {
    if keep_all && !(columns.is_empty() && computed.is_empty()) {
        return Err(Error::invalid_verb_argument(
            "distinct",
            "keep_all cannot be combined with columns",
        ));
    }

    let mut names = IndexSet::new();
    for column in columns {
        let column = shape(column);
        let name = column.simple_name().ok_or_else(|| {
            Error::invalid_verb_argument(
                "distinct",
                format!("'{column}' is not a column name; name it to compute it first"),
            )
        })?;
        names.insert(name.to_string());
    }
    names.extend(computed.iter().map(|(name, _)| (*name).to_string()));

    let base = if computed.is_empty() {
        state.clone()
    } else {
        mutate(state, computed)?
    };

    let mut aliases = base.aliases();
    let last = base.last_stage();
    // DISTINCT must see the rows of a limited query, and may only be
    // ordered by what it selects
    let wrapped = helpers::changes_row_set(last) || !last.order_by.elements.is_empty();
    let mut select = if wrapped {
        helpers::wrap(&mut aliases, last.clone())
    } else {
        last.clone()
    };

    if names.is_empty() {
        names.extend(base.column_names());
    }
    let namespace = Namespace::of_select_list(&select);
    select.select_list = sql::ast::SelectList(
        names
            .iter()
            .map(|name| {
                Ok((
                    sql::helpers::make_column_alias(name.clone()),
                    namespace.lookup(name)?.clone(),
                ))
            })
            .collect::<Result<_, Error>>()?,
    );
    select.distinct = true;

    let group_columns = base
        .group_columns()
        .iter()
        .filter(|group| names.contains(*group))
        .cloned()
        .collect();

    tracing::debug!(
        verb = "distinct",
        stages = base.stages().depth() + 1,
        wrapped,
        "applied verb"
    );
    Ok(base.with_stage(select, aliases, group_columns, vec![]))
}

//! filter: keep the rows matching every predicate.
//!
//! Window functions are not allowed in WHERE, so a filter builds two stages.
//! The inner one (`windows`) selects everything from the current query plus
//! every window function the predicates use, each under a label. The outer
//! one filters `windows`, with the window functions replaced by their labels.

use query_engine_sql::sql;

use super::shape;
use crate::translation::error::Error;
use crate::translation::expression::Expression;
use crate::translation::helpers::Namespace;
use crate::translation::state::QueryState;
use crate::translation::translator::Mode;
use crate::translation::windows::Placement;

pub fn filter(state: &QueryState, predicates: &[Expression]) -> Result<QueryState, Error> {
    if predicates.is_empty() {
        return Ok(state.clone());
    }

    let mut aliases = state.aliases();
    let subquery = aliases.make_table_alias("subquery");
    let windows = aliases.make_table_alias("windows");
    let last = state.last_stage();

    let inner = Namespace::of_subquery(last, &subquery);
    let context = state.window_context(
        &inner,
        Placement::Hoist {
            table: windows.clone(),
        },
    )?;
    let shaped: Vec<Expression> = predicates.iter().map(shape).collect();
    let (conditions, labeled) = state.translate_all(&shaped, &inner, Mode::Window, &context)?;

    let mut window_list = inner.select_list();
    window_list.extend(
        labeled
            .into_iter()
            .map(|window| (window.alias, window.expression)),
    );
    let mut window_select = sql::helpers::simple_select(window_list);
    window_select.from = Some(sql::ast::From::Select {
        select: Box::new(last.clone()),
        alias: subquery.clone(),
    });

    let outer = Namespace::of_subquery(&window_select, &windows);
    let select_list = state
        .ordered_column_names()
        .into_iter()
        .map(|name| {
            Ok((
                sql::helpers::make_column_alias(name.clone()),
                outer.lookup(&name)?.clone(),
            ))
        })
        .collect::<Result<_, Error>>()?;
    let mut select = sql::helpers::simple_select(select_list);
    select.from = Some(sql::ast::From::Select {
        select: Box::new(window_select),
        alias: windows.clone(),
    });
    select.where_ = sql::ast::Where(sql::helpers::and_all(conditions.into_iter().map(
        |condition| sql::helpers::replace_table_alias(condition, &subquery, &windows),
    )));

    tracing::debug!(
        verb = "filter",
        stages = state.stages().depth() + 1,
        wrapped = true,
        "applied verb"
    );
    Ok(state.append(select, aliases))
}

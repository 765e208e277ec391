//! count: the number of rows per group.
//!
//! Two stages, like filter. The inner one computes any derived columns to
//! count by, named after the expression (`x + 1`). The outer one groups by
//! the current grouping plus the counted columns and adds the count.

use indexmap::IndexSet;
use query_engine_sql::sql;

use super::shape;
use crate::translation::error::Error;
use crate::translation::expression::Expression;
use crate::translation::helpers::Namespace;
use crate::translation::state::QueryState;
use crate::translation::translator::Mode;
use crate::translation::windows::WindowContext;

/// How the count column is named and whether rows are sorted by it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountOptions {
    /// Name of the count column, `n` when not given. Extended with more `n`s
    /// while it collides with a grouping column.
    pub name: Option<String>,
    /// Sort by the count, largest first.
    pub sort: bool,
}

pub fn count(
    state: &QueryState,
    columns: &[Expression],
    options: &CountOptions,
) -> Result<QueryState, Error> {
    let mut aliases = state.aliases();
    let subquery = aliases.make_table_alias("subquery");
    let last = state.last_stage();
    let inner = Namespace::of_subquery(last, &subquery);

    let mut inner_list = inner.select_list();
    let mut counted = IndexSet::new();
    for column in columns {
        let column = shape(column);
        if let Some(name) = column.simple_name() {
            inner.lookup(name)?;
            counted.insert(name.to_string());
        } else {
            let name = column.to_string();
            let translated =
                state.translate(&column, &inner, Mode::Scalar, &WindowContext::empty())?;
            let alias = sql::helpers::make_column_alias(name.clone());
            match inner_list.iter_mut().find(|(label, _)| *label == alias) {
                Some((_, existing)) => *existing = translated.expression,
                None => inner_list.push((alias, translated.expression)),
            }
            counted.insert(name);
        }
    }
    let mut inner_select = sql::helpers::simple_select(inner_list);
    inner_select.from = Some(sql::ast::From::Select {
        select: Box::new(last.clone()),
        alias: subquery,
    });

    let grouped = aliases.make_table_alias("grouped");
    let outer = Namespace::of_subquery(&inner_select, &grouped);
    let mut groups: IndexSet<String> = state.group_columns().clone();
    groups.extend(counted);

    let mut count_name = options.name.clone().unwrap_or_else(|| "n".to_string());
    while groups.contains(&count_name) {
        count_name.push('n');
    }

    let group_expressions = groups
        .iter()
        .map(|name| outer.lookup(name).cloned())
        .collect::<Result<Vec<_>, _>>()?;
    let mut select_list: Vec<_> = groups
        .iter()
        .zip(&group_expressions)
        .map(|(name, expression)| {
            (
                sql::helpers::make_column_alias(name.clone()),
                expression.clone(),
            )
        })
        .collect();
    select_list.push((
        sql::helpers::make_column_alias(count_name),
        sql::ast::Expression::Count(sql::ast::CountType::Star),
    ));

    let mut select = sql::helpers::simple_select(select_list);
    select.from = Some(sql::ast::From::Select {
        select: Box::new(inner_select),
        alias: grouped,
    });
    select.group_by = sql::ast::GroupBy {
        elements: group_expressions,
    };
    if options.sort {
        select.order_by = sql::ast::OrderBy {
            elements: vec![sql::ast::OrderByElement {
                target: sql::ast::Expression::Count(sql::ast::CountType::Star),
                direction: sql::ast::OrderByDirection::Desc,
            }],
        };
    }

    tracing::debug!(
        verb = "count",
        stages = state.stages().depth() + 1,
        wrapped = true,
        "applied verb"
    );
    Ok(state.with_stage(select, aliases, state.group_columns().clone(), vec![]))
}

#[cfg(test)]
mod tests {
    use query_engine_metadata::metadata::Dialect;

    use super::super::tests::{people, show};
    use super::super::Verbs;
    use super::CountOptions;
    use crate::translation::expression::*;

    #[test]
    fn counts_per_column() {
        let state = people(Dialect::Postgres)
            .count(&[col("g")], CountOptions::default())
            .unwrap();
        assert_eq!(
            show(&state),
            concat!(
                r#"SELECT "grouped_2"."g" AS "g", COUNT(*) AS "n" FROM "#,
                r#"(SELECT "subquery_1"."g" AS "g", "subquery_1"."x" AS "x" FROM "#,
                r#"(SELECT "people_0"."g" AS "g", "people_0"."x" AS "x" FROM "public"."people" AS "people_0") "#,
                r#"AS "subquery_1") AS "grouped_2" GROUP BY "grouped_2"."g""#
            )
        );
    }

    #[test]
    fn derived_columns_are_named_after_their_expression() {
        let state = people(Dialect::Postgres)
            .count(&[col("x") + 1], CountOptions::default())
            .unwrap();
        assert_eq!(state.column_names(), vec!["x + 1", "n"]);
        assert!(show(&state).contains(r#"("subquery_1"."x" + 1) AS "x + 1""#));
    }

    #[test]
    fn the_count_column_avoids_collisions() {
        let state = people(Dialect::Postgres)
            .rename(&[("n", col("g"))])
            .unwrap()
            .count(&[col("n")], CountOptions::default())
            .unwrap();
        assert_eq!(state.column_names(), vec!["n", "nn"]);
    }

    #[test]
    fn grouping_is_kept_and_sorting_is_by_count() {
        let state = people(Dialect::Sqlite)
            .group_by(&[col("g")], false)
            .unwrap()
            .count(
                &[col("x")],
                CountOptions {
                    name: Some("rows".to_string()),
                    sort: true,
                },
            )
            .unwrap();
        assert_eq!(state.column_names(), vec!["g", "x", "rows"]);
        assert_eq!(state.group_columns().len(), 1);
        assert!(show(&state)
            .ends_with(r#"GROUP BY "grouped_2"."g", "grouped_2"."x" ORDER BY COUNT(*) DESC"#));
    }
}

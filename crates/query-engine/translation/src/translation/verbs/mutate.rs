//! mutate: add or replace columns.
//!
//! A new column extends the current SELECT unless its expression, or the
//! grouping and ordering its windows are built from, reads a column that
//! SELECT computes itself. SQL cannot refer to one select-list entry from
//! another, so the SELECT is wrapped in a subquery first.

use query_engine_sql::sql;

use super::shape;
use crate::translation::error::Error;
use crate::translation::expression::Expression;
use crate::translation::helpers::{self, Namespace};
use crate::translation::state::QueryState;
use crate::translation::translator::Mode;
use crate::translation::windows::Placement;

pub fn mutate(state: &QueryState, columns: &[(&str, Expression)]) -> Result<QueryState, Error> {
    if columns.is_empty() {
        return Ok(state.clone());
    }

    let mut aliases = state.aliases();
    let mut select = state.last_stage().clone();
    let mut wrapped = false;
    let window_columns = state.window_columns();

    for (name, expression) in columns {
        let expression = shape(expression);
        let derived = helpers::derived_columns(&select);
        let reads = expression.referenced_columns();
        let needs_subquery = helpers::changes_row_set(&select)
            || !select.group_by.elements.is_empty()
            || reads
                .iter()
                .chain(&window_columns)
                .any(|column| derived.contains(column));
        if needs_subquery {
            select = helpers::wrap(&mut aliases, select);
            wrapped = true;
        }

        let namespace = Namespace::of_select_list(&select);
        let context = state.window_context(&namespace, Placement::InPlace)?;
        let translated = state.translate(&expression, &namespace, Mode::Window, &context)?;

        let alias = sql::helpers::make_column_alias((*name).to_string());
        match select
            .select_list
            .0
            .iter_mut()
            .find(|(existing, _)| *existing == alias)
        {
            Some((_, existing)) => *existing = translated.expression,
            None => select.select_list.0.push((alias, translated.expression)),
        }
    }

    tracing::debug!(
        verb = "mutate",
        stages = state.stages().depth() + 1,
        wrapped,
        "applied verb"
    );
    Ok(state.append(select, aliases))
}

#[cfg(test)]
mod tests {
    use query_engine_metadata::metadata::Dialect;

    use super::super::tests::{people, show};
    use super::super::Verbs;
    use crate::translation::expression::*;

    #[test]
    fn independent_columns_extend_the_select() {
        let state = people(Dialect::Postgres)
            .mutate(&[("a", col("x") + 1), ("x", col("x") * 2)])
            .unwrap();
        assert_eq!(
            show(&state),
            r#"SELECT "people_0"."g" AS "g", ("people_0"."x" * 2) AS "x", ("people_0"."x" + 1) AS "a" FROM "public"."people" AS "people_0""#
        );
    }

    #[test]
    fn reading_a_computed_column_wraps_the_select() {
        let state = people(Dialect::Postgres)
            .mutate(&[("a", col("x") + 1)])
            .unwrap()
            .mutate(&[("b", col("a") * 2)])
            .unwrap();
        assert_eq!(
            show(&state),
            concat!(
                r#"SELECT "subquery_1"."g" AS "g", "subquery_1"."x" AS "x", "subquery_1"."a" AS "a", "#,
                r#"("subquery_1"."a" * 2) AS "b" FROM (SELECT "people_0"."g" AS "g", "people_0"."x" AS "x", "#,
                r#"("people_0"."x" + 1) AS "a" FROM "public"."people" AS "people_0") AS "subquery_1""#
            )
        );
    }

    #[test]
    fn windows_are_partitioned_by_the_groups_and_kept_in_place() {
        let state = people(Dialect::Postgres)
            .group_by(&[col("g")], false)
            .unwrap()
            .mutate(&[("centered", col("x") - col("x").mean())])
            .unwrap();
        assert!(show(&state).contains(
            r#"("people_0"."x" - avg("people_0"."x") OVER (PARTITION BY "people_0"."g")) AS "centered""#
        ));
    }

    #[test]
    fn cumulative_windows_follow_the_arrangement() {
        let state = people(Dialect::Sqlite)
            .arrange(&[col("x")])
            .unwrap()
            .mutate(&[("running", col("x").cumsum())])
            .unwrap();
        assert!(show(&state).contains(
            r#"sum("people_0"."x") OVER (ORDER BY "people_0"."x" ASC ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) AS "running""#
        ));
    }

    #[test]
    fn partitioning_by_a_window_label_wraps_the_select() {
        let state = people(Dialect::Sqlite)
            .mutate(&[("r", col("x").rank())])
            .unwrap()
            .group_by(&[col("r")], false)
            .unwrap()
            .mutate(&[("m", col("x").mean())])
            .unwrap();
        assert_eq!(
            show(&state),
            concat!(
                r#"SELECT "subquery_1"."g" AS "g", "subquery_1"."x" AS "x", "subquery_1"."r" AS "r", "#,
                r#"avg("subquery_1"."x") OVER (PARTITION BY "subquery_1"."r") AS "m" FROM "#,
                r#"(SELECT "people_0"."g" AS "g", "people_0"."x" AS "x", "#,
                r#"rank() OVER (ORDER BY "people_0"."x" ASC) AS "r" "#,
                r#"FROM "public"."people" AS "people_0") AS "subquery_1""#
            )
        );
    }

    #[test]
    fn ordering_by_a_window_label_wraps_the_select() {
        let state = people(Dialect::Postgres)
            .mutate(&[("r", col("x").rank())])
            .unwrap()
            .arrange(&[col("r")])
            .unwrap()
            .mutate(&[("c", col("x").cumsum())])
            .unwrap();
        let sql = show(&state);
        assert!(sql.contains(concat!(
            r#"sum("subquery_1"."x") OVER (ORDER BY "subquery_1"."r" ASC "#,
            r#"ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) AS "c""#
        )));
        assert!(sql.ends_with(
            r#"ORDER BY rank() OVER (ORDER BY "people_0"."x" ASC) ASC) AS "subquery_1""#
        ));
    }

    #[test]
    fn columns_passed_through_do_not_wrap() {
        let grouped = people(Dialect::Postgres)
            .group_by(&[col("g")], false)
            .unwrap();
        let state = grouped
            .mutate(&[("m", col("x").mean())])
            .unwrap()
            .mutate(&[("s", col("x").sum())])
            .unwrap();
        assert!(!show(&state).contains("subquery"));
    }

    #[test]
    fn nested_windows_are_rejected() {
        assert!(matches!(
            people(Dialect::Postgres).mutate(&[("m", col("x").cumsum().mean())]),
            Err(crate::translation::error::Error::NotSupported(_))
        ));
    }

    #[test]
    fn mutating_after_head_wraps_the_limit() {
        let state = people(Dialect::Postgres)
            .head(3)
            .unwrap()
            .mutate(&[("a", col("x") + 1)])
            .unwrap();
        assert!(show(&state).starts_with(r#"SELECT "subquery_1"."g" AS "g""#));
        assert!(show(&state).contains("LIMIT 3) AS \"subquery_1\""));
    }
}

//! rename: relabel columns in place.

use indexmap::{IndexMap, IndexSet};

use super::{rename_references, shape};
use crate::translation::error::Error;
use crate::translation::expression::Expression;
use crate::translation::state::{OrderTerm, QueryState};

pub fn rename(state: &QueryState, columns: &[(&str, Expression)]) -> Result<QueryState, Error> {
    let available = state.column_names();
    let mut renames: IndexMap<String, String> = IndexMap::new();
    for (new, old) in columns {
        let old = shape(old);
        let old = old.simple_name().ok_or_else(|| {
            Error::invalid_verb_argument(
                "rename",
                format!("'{old}' is not a column name, e.g. _.x or _[\"x\"]"),
            )
        })?;
        if !available.iter().any(|column| column == old) {
            return Err(Error::UnknownColumn {
                name: old.to_string(),
                available,
            });
        }
        renames.insert(old.to_string(), (*new).to_string());
    }

    let mut select = state.last_stage().clone();
    let mut seen = IndexSet::new();
    for (alias, _) in &mut select.select_list.0 {
        if let Some(new) = renames.get(&alias.name) {
            alias.name = new.clone();
        }
        if !seen.insert(alias.name.clone()) {
            return Err(Error::invalid_verb_argument(
                "rename",
                format!("more than one column would be named '{}'", alias.name),
            ));
        }
    }

    let group_columns = state
        .group_columns()
        .iter()
        .map(|name| renames.get(name).unwrap_or(name).clone())
        .collect();
    let order_terms = state
        .order_terms()
        .iter()
        .map(|term| OrderTerm {
            expression: rename_references(&term.expression, &renames),
            direction: term.direction,
        })
        .collect();

    tracing::debug!(
        verb = "rename",
        stages = state.stages().depth() + 1,
        wrapped = false,
        "applied verb"
    );
    Ok(state.with_stage(select, state.aliases(), group_columns, order_terms))
}

#[cfg(test)]
mod tests {
    use query_engine_metadata::metadata::Dialect;

    use super::super::tests::{people, show};
    use super::super::Verbs;
    use crate::translation::error::Error;
    use crate::translation::expression::*;

    #[test]
    fn relabels_columns_and_groups() {
        let state = people(Dialect::Postgres)
            .group_by(&[col("g")], false)
            .unwrap()
            .arrange(&[col("g")])
            .unwrap()
            .rename(&[("group", col("g"))])
            .unwrap();
        assert!(show(&state)
            .starts_with(r#"SELECT "people_0"."g" AS "group", "people_0"."x" AS "x" FROM"#));
        assert_eq!(
            state.group_columns().iter().collect::<Vec<_>>(),
            vec!["group"]
        );
        assert_eq!(state.order_terms()[0].expression, col("group"));
    }

    #[test]
    fn clashing_names_are_rejected() {
        assert!(matches!(
            people(Dialect::Postgres).rename(&[("x", col("g"))]),
            Err(Error::InvalidVerbArgument { verb: "rename", .. })
        ));
    }

    #[test]
    fn renaming_needs_an_existing_column() {
        assert!(matches!(
            people(Dialect::Postgres).rename(&[("y", col("nope"))]),
            Err(Error::UnknownColumn { .. })
        ));
        assert!(matches!(
            people(Dialect::Postgres).rename(&[("y", col("x") + 1)]),
            Err(Error::InvalidVerbArgument { .. })
        ));
    }
}

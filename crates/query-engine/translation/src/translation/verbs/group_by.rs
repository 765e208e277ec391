//! group_by and ungroup only change the grouping, never the SQL.

use indexmap::IndexSet;

use super::shape;
use crate::translation::error::Error;
use crate::translation::expression::Expression;
use crate::translation::state::QueryState;

pub fn group_by(
    state: &QueryState,
    columns: &[Expression],
    add: bool,
) -> Result<QueryState, Error> {
    let available = state.column_names();
    let mut groups = if add {
        state.group_columns().clone()
    } else {
        IndexSet::new()
    };
    for column in columns {
        let column = shape(column);
        let name = column.simple_name().ok_or_else(|| {
            Error::invalid_verb_argument(
                "group_by",
                format!("'{column}' is not a column name; add it with mutate first"),
            )
        })?;
        if !available.iter().any(|existing| existing == name) {
            return Err(Error::UnknownColumn {
                name: name.to_string(),
                available,
            });
        }
        groups.insert(name.to_string());
    }
    tracing::debug!(
        verb = "group_by",
        stages = state.stages().depth(),
        wrapped = false,
        "applied verb"
    );
    Ok(state.with_group_columns(groups))
}

pub fn ungroup(state: &QueryState) -> QueryState {
    tracing::debug!(
        verb = "ungroup",
        stages = state.stages().depth(),
        wrapped = false,
        "applied verb"
    );
    state.with_group_columns(IndexSet::new())
}

#[cfg(test)]
mod tests {
    use query_engine_metadata::metadata::Dialect;

    use super::super::tests::people;
    use super::super::Verbs;
    use crate::translation::error::Error;
    use crate::translation::expression::*;

    #[test]
    fn grouping_leaves_the_stages_alone() {
        let state = people(Dialect::Postgres);
        let grouped = state.group_by(&[index("g")], false).unwrap();
        assert!(grouped.stages().same_as(state.stages()));
        assert_eq!(grouped.group_columns().len(), 1);
        assert!(grouped.ungroup().unwrap().group_columns().is_empty());
    }

    #[test]
    fn adding_keeps_existing_groups_first() {
        let state = people(Dialect::Postgres)
            .group_by(&[col("x")], false)
            .unwrap()
            .group_by(&[col("g"), col("x")], true)
            .unwrap();
        assert_eq!(
            state.group_columns().iter().collect::<Vec<_>>(),
            vec!["x", "g"]
        );
    }

    #[test]
    fn only_known_simple_names_are_accepted() {
        let state = people(Dialect::Postgres);
        assert!(matches!(
            state.group_by(&[col("nope")], false),
            Err(Error::UnknownColumn { .. })
        ));
        assert!(matches!(
            state.group_by(&[col("x") + 1], false),
            Err(Error::InvalidVerbArgument {
                verb: "group_by",
                ..
            })
        ));
    }
}

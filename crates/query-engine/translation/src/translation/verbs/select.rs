//! select: keep, drop, reorder or relabel columns.
//!
//! Each argument is one of
//! - a column, `_.x` or `"x"`
//! - a run of columns, `_["a":"c"]`, inclusive at both ends
//! - a rename, `_.new == _.old`
//! - an exclusion of either of the first two, `-_.x`
//!
//! When every argument is an exclusion, the selection starts from all columns.

use indexmap::{IndexMap, IndexSet};
use query_engine_sql::sql;

use super::{rename_references, shape};
use crate::translation::error::Error;
use crate::translation::expression::{
    ArithmeticFunction, ComparisonFunction, Expression, Literal, Operation,
};
use crate::translation::helpers::{self, Namespace};
use crate::translation::state::{OrderTerm, QueryState};

/// One parsed select argument.
enum Selector {
    Include(Vec<String>),
    Exclude(Vec<String>),
    Rename { new: String, old: String },
}

pub fn select(state: &QueryState, columns: &[Expression]) -> Result<QueryState, Error> {
    let available = state.column_names();
    let selectors = columns
        .iter()
        .map(|column| parse(&shape(column), &available))
        .collect::<Result<Vec<_>, _>>()?;

    let only_exclusions = selectors
        .iter()
        .all(|selector| matches!(selector, Selector::Exclude(_)));
    // output name -> source column
    let mut selection: IndexMap<String, String> = if only_exclusions {
        available
            .iter()
            .map(|name| (name.clone(), name.clone()))
            .collect()
    } else {
        IndexMap::new()
    };
    for selector in selectors {
        match selector {
            Selector::Include(names) => {
                for name in names {
                    selection.insert(name.clone(), name);
                }
            }
            Selector::Exclude(names) => {
                selection.retain(|_, source| !names.contains(source));
            }
            Selector::Rename { new, old } => {
                selection.shift_remove(&old);
                selection.insert(new, old);
            }
        }
    }

    // grouping columns always survive, renamed along with their source
    let mut group_columns = IndexSet::new();
    let mut missing_groups = vec![];
    for group in state.group_columns() {
        match selection.iter().find(|(_, source)| *source == group) {
            Some((output, _)) => {
                group_columns.insert(output.clone());
            }
            None => {
                tracing::info!("Adding missing grouping variable: {}", group);
                missing_groups.push(group.clone());
                group_columns.insert(group.clone());
            }
        }
    }
    if !missing_groups.is_empty() {
        let mut with_groups: IndexMap<String, String> = missing_groups
            .into_iter()
            .map(|group| (group.clone(), group))
            .collect();
        with_groups.extend(selection);
        selection = with_groups;
    }

    if selection.is_empty() {
        return Err(Error::invalid_verb_argument("select", "no columns were selected"));
    }

    let renames: IndexMap<String, String> = selection
        .iter()
        .filter(|(output, source)| output != source)
        .map(|(output, source)| (source.clone(), output.clone()))
        .collect();
    let order_terms = state
        .order_terms()
        .iter()
        .filter(|term| {
            term.expression
                .referenced_columns()
                .iter()
                .all(|name| selection.values().any(|source| source == name))
        })
        .map(|term| OrderTerm {
            expression: rename_references(&term.expression, &renames),
            direction: term.direction,
        })
        .collect();

    let mut aliases = state.aliases();
    let last = state.last_stage();
    // narrowing a DISTINCT changes which rows are unique
    let wrapped = last.distinct;
    let (mut select, namespace) = if wrapped {
        let inner = helpers::wrap(&mut aliases, last.clone());
        let namespace = Namespace::of_select_list(&inner);
        (inner, namespace)
    } else {
        (last.clone(), Namespace::of_select_list(last))
    };
    select.select_list = sql::ast::SelectList(
        selection
            .iter()
            .map(|(output, source)| {
                Ok((
                    sql::helpers::make_column_alias(output.clone()),
                    namespace.lookup(source)?.clone(),
                ))
            })
            .collect::<Result<_, Error>>()?,
    );

    tracing::debug!(
        verb = "select",
        stages = state.stages().depth() + 1,
        wrapped,
        "applied verb"
    );
    Ok(state.with_stage(select, aliases, group_columns, order_terms))
}

fn parse(expression: &Expression, available: &[String]) -> Result<Selector, Error> {
    if let Some(name) = expression.simple_name() {
        return Ok(Selector::Include(vec![known(name, available)?]));
    }
    match expression {
        Expression::Index { parent, key } if **parent == Expression::Reference => {
            if let Expression::Slice { start, stop } = key.as_ref() {
                return Ok(Selector::Include(run(start.as_deref(), stop.as_deref(), available)?));
            }
        }
        Expression::Call {
            operation: Operation::Arithmetic(ArithmeticFunction::Negate),
            args,
            kwargs,
        } if kwargs.is_empty() && args.len() == 1 => {
            if let Selector::Include(names) = parse(&args[0], available)? {
                return Ok(Selector::Exclude(names));
            }
        }
        Expression::Call {
            operation: Operation::Comparison(ComparisonFunction::Equal),
            args,
            kwargs,
        } if kwargs.is_empty() && args.len() == 2 => {
            if let (Some(new), Some(old)) = (args[0].simple_name(), args[1].simple_name()) {
                return Ok(Selector::Rename {
                    new: new.to_string(),
                    old: known(old, available)?,
                });
            }
        }
        _ => {}
    }
    Err(Error::invalid_verb_argument(
        "select",
        format!("'{expression}' is not a column, a run of columns, a rename or an exclusion"),
    ))
}

fn known(name: &str, available: &[String]) -> Result<String, Error> {
    if available.iter().any(|column| column == name) {
        Ok(name.to_string())
    } else {
        Err(Error::UnknownColumn {
            name: name.to_string(),
            available: available.to_vec(),
        })
    }
}

/// The columns from `start` to `stop`, both included. A bound is a column
/// name or a position.
fn run(
    start: Option<&Expression>,
    stop: Option<&Expression>,
    available: &[String],
) -> Result<Vec<String>, Error> {
    let position = |bound: &Expression| -> Result<usize, Error> {
        match bound {
            Expression::Literal(Literal::Int(index)) => usize::try_from(*index)
                .ok()
                .filter(|index| *index < available.len())
                .ok_or_else(|| {
                    Error::invalid_verb_argument("select", format!("no column at position {index}"))
                }),
            _ => {
                let name = bound.simple_name().ok_or_else(|| {
                    Error::invalid_verb_argument(
                        "select",
                        format!("'{bound}' cannot bound a run of columns"),
                    )
                })?;
                let name = known(name, available)?;
                Ok(available
                    .iter()
                    .position(|column| *column == name)
                    .unwrap_or_default())
            }
        }
    };
    let first = start.map(position).transpose()?.unwrap_or(0);
    let last = match stop {
        Some(stop) => position(stop)?,
        None => available.len().saturating_sub(1),
    };
    if first > last {
        return Ok(vec![]);
    }
    Ok(available[first..=last].to_vec())
}

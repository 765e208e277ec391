//! arrange: sort the rows.

use query_engine_sql::sql;

use super::shape;
use crate::translation::error::Error;
use crate::translation::expression::{ArithmeticFunction, Expression, Operation, OrderingFunction};
use crate::translation::helpers::{self, Namespace};
use crate::translation::state::{OrderTerm, QueryState};
use crate::translation::translator::Mode;
use crate::translation::windows::WindowContext;

/// Adds to the current ordering: the new terms sort rows that tie on the
/// earlier ones. The terms are remembered so that later cumulative and
/// ranking windows are ordered the same way.
pub fn arrange(state: &QueryState, terms: &[Expression]) -> Result<QueryState, Error> {
    if terms.is_empty() {
        return Ok(state.clone());
    }

    let mut aliases = state.aliases();
    let last = state.last_stage();
    let wrapped = helpers::changes_row_set(last);
    let mut select = if wrapped {
        helpers::wrap(&mut aliases, last.clone())
    } else {
        last.clone()
    };

    let namespace = Namespace::of_select_list(&select);
    let new_terms: Vec<OrderTerm> = terms
        .iter()
        .map(|term| strip_direction(&shape(term)))
        .collect();
    for term in &new_terms {
        let translated = state.translate(
            &term.expression,
            &namespace,
            Mode::Scalar,
            &WindowContext::empty(),
        )?;
        select.order_by.elements.push(sql::ast::OrderByElement {
            target: translated.expression,
            direction: term.direction,
        });
    }

    let mut order_terms = state.order_terms().to_vec();
    order_terms.extend(new_terms);

    tracing::debug!(
        verb = "arrange",
        stages = state.stages().depth() + 1,
        wrapped,
        "applied verb"
    );
    Ok(state.with_stage(select, aliases, state.group_columns().clone(), order_terms))
}

/// `desc(x)` and `-x` sort descending.
fn strip_direction(expression: &Expression) -> OrderTerm {
    match expression {
        Expression::Call {
            operation:
                Operation::Ordering(OrderingFunction::Desc)
                | Operation::Arithmetic(ArithmeticFunction::Negate),
            args,
            kwargs,
        } if args.len() == 1 && kwargs.is_empty() => OrderTerm {
            expression: args[0].clone(),
            direction: sql::ast::OrderByDirection::Desc,
        },
        _ => OrderTerm {
            expression: expression.clone(),
            direction: sql::ast::OrderByDirection::Asc,
        },
    }
}

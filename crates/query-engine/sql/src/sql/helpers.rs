//! Helpers for building sql::ast types in certain shapes and patterns.

use super::ast::*;

// Empty clauses //

/// An empty `WHERE` clause.
pub fn empty_where() -> Expression {
    Expression::Value(Value::Bool(true))
}

/// An empty `GROUP BY` clause.
pub fn empty_group_by() -> GroupBy {
    GroupBy { elements: vec![] }
}

/// An empty `ORDER BY` clause.
pub fn empty_order_by() -> OrderBy {
    OrderBy { elements: vec![] }
}

/// Empty `LIMIT` and `OFFSET` clauses.
pub fn empty_limit() -> Limit {
    Limit {
        limit: None,
        offset: None,
    }
}

/// A `true` expression.
pub fn true_expr() -> Expression {
    Expression::Value(Value::Bool(true))
}

/// A `false` expression.
pub fn false_expr() -> Expression {
    Expression::Value(Value::Bool(false))
}

/// Combine expressions with `AND`. No expressions at all is `true`.
pub fn and_all(expressions: impl IntoIterator<Item = Expression>) -> Expression {
    expressions
        .into_iter()
        .reduce(|left, right| Expression::And {
            left: Box::new(left),
            right: Box::new(right),
        })
        .unwrap_or_else(true_expr)
}

/// `left = right`
pub fn equals(left: Expression, right: Expression) -> Expression {
    Expression::BinaryOperation {
        left: Box::new(left),
        operator: BinaryOperator("=".to_string()),
        right: Box::new(right),
    }
}

// Aliasing //

/// Generate a column expression refering to a specific table.
pub fn make_column(
    table: TableReference,
    name: ColumnName,
    alias: ColumnAlias,
) -> (ColumnAlias, Expression) {
    (
        alias,
        Expression::ColumnReference(ColumnReference::TableColumn { table, name }),
    )
}

/// Create column aliases using this function so we build everything in one place.
pub fn make_column_alias(name: String) -> ColumnAlias {
    ColumnAlias { name }
}

/// Create table aliases using this function so we build everything in one place.
pub fn make_table_alias(name: String, unique_index: u64) -> TableAlias {
    TableAlias { unique_index, name }
}

/// A reference to a column exposed by an aliased relation.
pub fn aliased_column(table: &TableAlias, column: &ColumnAlias) -> Expression {
    Expression::ColumnReference(ColumnReference::AliasedColumn {
        table: TableReference::AliasedTable(table.clone()),
        column: column.clone(),
    })
}

// SELECTs //

/// Build a simple select with a select list and the rest are empty.
pub fn simple_select(select_list: Vec<(ColumnAlias, Expression)>) -> Select {
    Select {
        distinct: false,
        select_list: SelectList(select_list),
        from: None,
        joins: vec![],
        where_: Where(empty_where()),
        group_by: empty_group_by(),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

/// Select every output column of `select` through a subquery aliased `alias`.
pub fn select_all_from(select: Select, alias: TableAlias) -> Select {
    let select_list = select
        .select_list
        .0
        .iter()
        .map(|(column, _)| (column.clone(), aliased_column(&alias, column)))
        .collect();
    let mut outer = simple_select(select_list);
    outer.from = Some(From::Select {
        select: Box::new(select),
        alias,
    });
    outer
}

// Rewriting //

/// Rebuild an expression bottom-up, applying `transform` to every node after
/// its children have been rebuilt.
pub fn transform_expression(
    expression: Expression,
    transform: &mut impl FnMut(Expression) -> Expression,
) -> Expression {
    let mut recurse = |expression: Expression| transform_expression(expression, transform);
    let rebuilt = match expression {
        Expression::And { left, right } => Expression::And {
            left: Box::new(recurse(*left)),
            right: Box::new(recurse(*right)),
        },
        Expression::Or { left, right } => Expression::Or {
            left: Box::new(recurse(*left)),
            right: Box::new(recurse(*right)),
        },
        Expression::Not(expression) => Expression::Not(Box::new(recurse(*expression))),
        Expression::BinaryOperation {
            left,
            operator,
            right,
        } => Expression::BinaryOperation {
            left: Box::new(recurse(*left)),
            operator,
            right: Box::new(recurse(*right)),
        },
        Expression::BinaryArrayOperation {
            left,
            operator,
            right,
        } => Expression::BinaryArrayOperation {
            left: Box::new(recurse(*left)),
            operator,
            right: right.into_iter().map(&mut recurse).collect(),
        },
        Expression::UnaryOperation {
            expression,
            operator,
        } => Expression::UnaryOperation {
            expression: Box::new(recurse(*expression)),
            operator,
        },
        Expression::FunctionCall { function, args } => Expression::FunctionCall {
            function,
            args: args.into_iter().map(&mut recurse).collect(),
        },
        Expression::Case { whens, else_ } => Expression::Case {
            whens: whens
                .into_iter()
                .map(|(condition, result)| (recurse(condition), recurse(result)))
                .collect(),
            else_: else_.map(|expression| Box::new(recurse(*expression))),
        },
        Expression::WindowFunction { function, window } => Expression::WindowFunction {
            function: Box::new(recurse(*function)),
            window: Window {
                partition_by: window.partition_by.into_iter().map(&mut recurse).collect(),
                order_by: OrderBy {
                    elements: window
                        .order_by
                        .elements
                        .into_iter()
                        .map(|element| OrderByElement {
                            target: recurse(element.target),
                            direction: element.direction,
                        })
                        .collect(),
                },
                frame: window.frame,
            },
        },
        Expression::Cast { expression, r#type } => Expression::Cast {
            expression: Box::new(recurse(*expression)),
            r#type,
        },
        Expression::Count(CountType::Simple(expression)) => {
            Expression::Count(CountType::Simple(Box::new(recurse(*expression))))
        }
        Expression::Count(CountType::Distinct(expression)) => {
            Expression::Count(CountType::Distinct(Box::new(recurse(*expression))))
        }
        leaf @ (Expression::Count(CountType::Star)
        | Expression::ColumnReference(_)
        | Expression::Value(_)) => leaf,
    };
    transform(rebuilt)
}

/// Point every column reference through table alias `from` at `to` instead.
pub fn replace_table_alias(
    expression: Expression,
    from: &TableAlias,
    to: &TableAlias,
) -> Expression {
    transform_expression(expression, &mut |expression| match expression {
        Expression::ColumnReference(ColumnReference::AliasedColumn {
            table: TableReference::AliasedTable(table),
            column,
        }) if table == *from => aliased_column(to, &column),
        other => other,
    })
}

/// Whether an expression contains a window function anywhere.
pub fn contains_window_function(expression: &Expression) -> bool {
    let mut found = false;
    transform_expression(expression.clone(), &mut |expression| {
        if matches!(expression, Expression::WindowFunction { .. }) {
            found = true;
        }
        expression
    });
    found
}

//! Builders shared by the dialects.

use std::collections::BTreeMap;

use query_engine_metadata::metadata::ScalarType;
use query_engine_sql::sql;
use query_engine_sql::sql::ast::Expression;

use super::{builder, Arguments, Builder, Physical};
use crate::translation::error::Error;
use crate::translation::expression::*;
use crate::translation::windows::{WindowFragment, WindowKind};

pub(super) fn function_call(name: &str, args: Vec<Expression>) -> Expression {
    Expression::FunctionCall {
        function: sql::ast::Function::Unknown(name.to_string()),
        args,
    }
}

pub(super) fn string_value(value: &str) -> Expression {
    Expression::Value(sql::ast::Value::String(value.to_string()))
}

fn binary_operation(left: Expression, operator: &str, right: Expression) -> Expression {
    Expression::BinaryOperation {
        left: Box::new(left),
        operator: sql::ast::BinaryOperator(operator.to_string()),
        right: Box::new(right),
    }
}

fn unary_operation(expression: Expression, operator: sql::ast::UnaryOperator) -> Expression {
    Expression::UnaryOperation {
        expression: Box::new(expression),
        operator,
    }
}

/// `(a <operator> b)`
pub(super) fn binary(operator: &'static str) -> Builder {
    builder(move |arguments| {
        let [left, right] = arguments.exactly()?;
        Ok(Physical::Expression(binary_operation(left, operator, right)))
    })
}

/// `name(a, ...)` with a fixed number of arguments.
pub(super) fn function<const N: usize>(name: &'static str) -> Builder {
    builder(move |arguments| {
        let args: [Expression; N] = arguments.exactly()?;
        Ok(Physical::Expression(function_call(name, args.into())))
    })
}

/// `name(a)` evaluated once per group.
pub(super) fn aggregate(name: &'static str) -> Builder {
    function::<1>(name)
}

/// `name(a)` over the whole partition.
pub(super) fn window_aggregate(name: &'static str) -> Builder {
    builder(move |arguments| {
        let [arg] = arguments.exactly()?;
        Ok(Physical::Window(WindowFragment {
            function: function_call(name, vec![arg]),
            kind: WindowKind::Aggregate,
        }))
    })
}

/// `name(a)` from the start of the partition up to the current row.
pub(super) fn window_cumulative(name: &'static str) -> Builder {
    builder(move |arguments| {
        let [arg] = arguments.exactly()?;
        Ok(Physical::Window(WindowFragment {
            function: function_call(name, vec![arg]),
            kind: WindowKind::Cumulative,
        }))
    })
}

/// `name()`, ordered by its argument when it has one.
pub(super) fn window_ranking(name: &'static str) -> Builder {
    builder(move |arguments| {
        let operation = arguments.operation;
        let mut args = arguments.args;
        if args.len() > 1 || !arguments.kwargs.is_empty() {
            return Err(Error::invalid_operation_arguments(
                operation,
                "expected at most one argument to rank by",
            ));
        }
        Ok(Physical::Window(WindowFragment {
            function: function_call(name, vec![]),
            kind: WindowKind::Ranking {
                order_by: args.pop().map(|target| sql::ast::OrderByElement {
                    target,
                    direction: sql::ast::OrderByDirection::Asc,
                }),
            },
        }))
    })
}

/// `COUNT(*)`, ignoring any argument.
fn count_star(arguments: &Arguments) -> Result<Expression, Error> {
    if arguments.args.len() > 1 || !arguments.kwargs.is_empty() {
        return Err(Error::invalid_operation_arguments(
            arguments.operation,
            "expected at most one argument",
        ));
    }
    Ok(Expression::Count(sql::ast::CountType::Star))
}

fn round(arguments: Arguments) -> Result<Physical, Error> {
    let operation = arguments.operation;
    match arguments.args.len() {
        1 => {
            let [x] = arguments.exactly()?;
            Ok(Physical::Expression(function_call("round", vec![x])))
        }
        2 => {
            let [x, digits] = arguments.exactly()?;
            Ok(Physical::Expression(function_call("round", vec![x, digits])))
        }
        count => Err(Error::invalid_operation_arguments(
            operation,
            format!("expected 1 or 2 arguments, got {count}"),
        )),
    }
}

fn like(pattern: fn(Expression) -> Expression) -> Builder {
    builder(move |arguments| {
        let [x, needle] = arguments.exactly()?;
        Ok(Physical::Expression(binary_operation(x, "LIKE", pattern(needle))))
    })
}

fn concat(left: Expression, right: Expression) -> Expression {
    binary_operation(left, "||", right)
}

fn is_in(arguments: Arguments) -> Result<Physical, Error> {
    if !arguments.kwargs.is_empty() {
        return Err(Error::invalid_operation_arguments(
            arguments.operation,
            "keyword arguments are not accepted",
        ));
    }
    let mut args = arguments.args.into_iter();
    let x = args.next().ok_or_else(|| {
        Error::invalid_operation_arguments(arguments.operation, "expected a value to test")
    })?;
    let values: Vec<Expression> = args.collect();
    if values.is_empty() {
        return Ok(Physical::Expression(sql::helpers::false_expr()));
    }
    Ok(Physical::Expression(Expression::BinaryArrayOperation {
        left: Box::new(x),
        operator: sql::ast::BinaryArrayOperator::In,
        right: values,
    }))
}

fn between(arguments: Arguments) -> Result<Physical, Error> {
    let [x, low, high] = arguments.exactly()?;
    Ok(Physical::Expression(Expression::And {
        left: Box::new(binary_operation(x.clone(), ">=", low)),
        right: Box::new(binary_operation(x, "<=", high)),
    }))
}

fn if_else(arguments: Arguments) -> Result<Physical, Error> {
    let [condition, when_true, when_false] = arguments.exactly()?;
    Ok(Physical::Expression(Expression::Case {
        whens: vec![(condition, when_true)],
        else_: Some(Box::new(when_false)),
    }))
}

fn case_when(arguments: Arguments) -> Result<Physical, Error> {
    let Arguments {
        operation,
        args,
        mut kwargs,
    } = arguments;
    let default = kwargs.remove("default");
    if let Some(name) = kwargs.keys().next() {
        return Err(Error::invalid_operation_arguments(
            operation,
            format!("unexpected keyword argument '{name}'"),
        ));
    }
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(Error::invalid_operation_arguments(
            operation,
            "expected condition and value pairs",
        ));
    }
    let mut args = args.into_iter();
    let mut whens = vec![];
    while let (Some(condition), Some(value)) = (args.next(), args.next()) {
        whens.push((condition, value));
    }
    Ok(Physical::Expression(Expression::Case {
        whens,
        else_: default.map(Box::new),
    }))
}

fn coalesce(arguments: Arguments) -> Result<Physical, Error> {
    if arguments.args.is_empty() || !arguments.kwargs.is_empty() {
        return Err(Error::invalid_operation_arguments(
            arguments.operation,
            "expected at least one positional argument",
        ));
    }
    Ok(Physical::Expression(Expression::FunctionCall {
        function: sql::ast::Function::Coalesce,
        args: arguments.args,
    }))
}

/// `CAST(x AS <type>)`. The type is a string naming a [`ScalarType`],
/// positionally or as `dtype`.
pub(super) fn cast(type_names: BTreeMap<ScalarType, String>) -> Builder {
    builder(move |arguments| {
        let Arguments {
            operation,
            mut args,
            mut kwargs,
        } = arguments;
        let target = match (args.len(), kwargs.remove("dtype")) {
            (1, Some(target)) => target,
            (2, None) => args.remove(1),
            _ => {
                return Err(Error::invalid_operation_arguments(
                    operation,
                    "expected a value and a type",
                ))
            }
        };
        let scalar_type = match target {
            Expression::Value(sql::ast::Value::String(name)) => ScalarType::from_name(&name)
                .ok_or_else(|| {
                    Error::invalid_operation_arguments(operation, format!("unknown type '{name}'"))
                })?,
            _ => {
                return Err(Error::invalid_operation_arguments(
                    operation,
                    "the type must be a string",
                ))
            }
        };
        let type_name = type_names
            .get(&scalar_type)
            .cloned()
            .unwrap_or_else(|| scalar_type.name().to_uppercase());
        Ok(Physical::Expression(Expression::Cast {
            expression: Box::new(args.remove(0)),
            r#type: sql::ast::ScalarType(type_name),
        }))
    })
}

/// The three buckets of a function table.
pub(super) struct Buckets {
    pub scalar: BTreeMap<Operation, Builder>,
    pub aggregate: BTreeMap<Operation, Builder>,
    pub window: BTreeMap<Operation, Builder>,
}

/// Builders every dialect shares.
pub(super) fn base() -> Buckets {
    use AggregateFunction as A;
    use ArithmeticFunction as Arith;
    use ComparisonFunction as Cmp;
    use ConditionalFunction as Cond;
    use StringFunction as Str;
    use WindowFunction as W;

    let scalar: BTreeMap<Operation, Builder> = BTreeMap::from([
        (Operation::Comparison(Cmp::Equal), binary("=")),
        (Operation::Comparison(Cmp::NotEqual), binary("<>")),
        (Operation::Comparison(Cmp::LessThan), binary("<")),
        (Operation::Comparison(Cmp::LessThanOrEqual), binary("<=")),
        (Operation::Comparison(Cmp::GreaterThan), binary(">")),
        (Operation::Comparison(Cmp::GreaterThanOrEqual), binary(">=")),
        (Operation::Comparison(Cmp::Between), builder(between)),
        (Operation::Comparison(Cmp::IsIn), builder(is_in)),
        (
            Operation::Comparison(Cmp::IsNa),
            builder(|arguments| {
                let [x] = arguments.exactly()?;
                Ok(Physical::Expression(unary_operation(x, sql::ast::UnaryOperator::IsNull)))
            }),
        ),
        (
            Operation::Comparison(Cmp::NotNa),
            builder(|arguments| {
                let [x] = arguments.exactly()?;
                Ok(Physical::Expression(unary_operation(x, sql::ast::UnaryOperator::IsNotNull)))
            }),
        ),
        (Operation::Arithmetic(Arith::Add), binary("+")),
        (Operation::Arithmetic(Arith::Subtract), binary("-")),
        (Operation::Arithmetic(Arith::Multiply), binary("*")),
        (Operation::Arithmetic(Arith::Divide), binary("/")),
        (Operation::Arithmetic(Arith::Modulo), binary("%")),
        (
            Operation::Arithmetic(Arith::Negate),
            builder(|arguments| {
                let [x] = arguments.exactly()?;
                Ok(Physical::Expression(unary_operation(x, sql::ast::UnaryOperator::Negate)))
            }),
        ),
        (
            Operation::Logical(LogicalFunction::And),
            builder(|arguments| {
                let [left, right] = arguments.exactly()?;
                Ok(Physical::Expression(Expression::And {
                    left: Box::new(left),
                    right: Box::new(right),
                }))
            }),
        ),
        (
            Operation::Logical(LogicalFunction::Or),
            builder(|arguments| {
                let [left, right] = arguments.exactly()?;
                Ok(Physical::Expression(Expression::Or {
                    left: Box::new(left),
                    right: Box::new(right),
                }))
            }),
        ),
        (
            Operation::Logical(LogicalFunction::Not),
            builder(|arguments| {
                let [x] = arguments.exactly()?;
                Ok(Physical::Expression(Expression::Not(Box::new(x))))
            }),
        ),
        (Operation::Math(MathFunction::Abs), function::<1>("abs")),
        (Operation::Math(MathFunction::Round), builder(round)),
        (Operation::String(Str::Upper), function::<1>("upper")),
        (Operation::String(Str::Lower), function::<1>("lower")),
        (Operation::String(Str::Length), function::<1>("length")),
        (Operation::String(Str::Strip), function::<1>("trim")),
        (
            Operation::String(Str::StartsWith),
            like(|needle| concat(needle, string_value("%"))),
        ),
        (
            Operation::String(Str::EndsWith),
            like(|needle| concat(string_value("%"), needle)),
        ),
        (
            Operation::String(Str::Contains),
            like(|needle| concat(concat(string_value("%"), needle), string_value("%"))),
        ),
        (Operation::Conditional(Cond::IfElse), builder(if_else)),
        (Operation::Conditional(Cond::CaseWhen), builder(case_when)),
        (Operation::Conditional(Cond::Coalesce), builder(coalesce)),
    ]);

    let aggregate: BTreeMap<Operation, Builder> = BTreeMap::from([
        (Operation::Aggregate(A::Mean), aggregate("avg")),
        (Operation::Aggregate(A::Sum), aggregate("sum")),
        (Operation::Aggregate(A::Min), aggregate("min")),
        (Operation::Aggregate(A::Max), aggregate("max")),
        (
            Operation::Aggregate(A::N),
            builder(|arguments| Ok(Physical::Expression(count_star(&arguments)?))),
        ),
        (
            Operation::Aggregate(A::NDistinct),
            builder(|arguments| {
                let [x] = arguments.exactly()?;
                Ok(Physical::Expression(Expression::Count(
                    sql::ast::CountType::Distinct(Box::new(x)),
                )))
            }),
        ),
    ]);

    let window: BTreeMap<Operation, Builder> = BTreeMap::from([
        (Operation::Aggregate(A::Mean), window_aggregate("avg")),
        (Operation::Aggregate(A::Sum), window_aggregate("sum")),
        (Operation::Aggregate(A::Min), window_aggregate("min")),
        (Operation::Aggregate(A::Max), window_aggregate("max")),
        (
            Operation::Aggregate(A::N),
            builder(|arguments| {
                Ok(Physical::Window(WindowFragment {
                    function: count_star(&arguments)?,
                    kind: WindowKind::Aggregate,
                }))
            }),
        ),
        (
            Operation::Window(W::RowNumber),
            window_ranking("row_number"),
        ),
        (Operation::Window(W::Rank), window_ranking("rank")),
        (Operation::Window(W::MinRank), window_ranking("rank")),
        (
            Operation::Window(W::DenseRank),
            window_ranking("dense_rank"),
        ),
        (
            Operation::Window(W::PercentRank),
            window_ranking("percent_rank"),
        ),
        (Operation::Window(W::CumeDist), window_ranking("cume_dist")),
        (Operation::Window(W::CumSum), window_cumulative("sum")),
        (Operation::Window(W::CumMean), window_cumulative("avg")),
        (Operation::Window(W::CumMin), window_cumulative("min")),
        (Operation::Window(W::CumMax), window_cumulative("max")),
    ]);

    Buckets {
        scalar,
        aggregate,
        window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_engine_sql::sql::string::{ParamStyle, RenderMode, SQL};

    fn column(name: &str) -> Expression {
        sql::helpers::aliased_column(
            &sql::helpers::make_table_alias("t".to_string(), 0),
            &sql::helpers::make_column_alias(name.to_string()),
        )
    }

    fn apply(
        builder: &Builder,
        operation: Operation,
        args: Vec<Expression>,
    ) -> Result<Physical, Error> {
        builder(Arguments {
            operation,
            args,
            kwargs: BTreeMap::new(),
        })
    }

    fn render(physical: Physical) -> String {
        let Physical::Expression(expression) = physical else {
            panic!("expected a finished expression, got {physical:?}");
        };
        let mut sql = SQL::with_options(
            RenderMode {
                literal_binds: true,
                simple_names: false,
            },
            ParamStyle::Dollar,
        );
        expression.to_sql(&mut sql);
        sql.sql
    }

    #[test]
    fn wrong_arity_is_reported() {
        let scalar = base().scalar;
        let add = Operation::Arithmetic(ArithmeticFunction::Add);
        assert_eq!(
            apply(&scalar[&add], add, vec![column("x")]),
            Err(Error::InvalidOperationArguments {
                operation: add,
                message: "expected 2 argument(s), got 1".to_string(),
            })
        );
    }

    #[test]
    fn string_matching_uses_like() {
        let scalar = base().scalar;
        let startswith = Operation::String(StringFunction::StartsWith);
        let physical = apply(
            &scalar[&startswith],
            startswith,
            vec![column("name"), string_value("A")],
        )
        .unwrap();
        assert_eq!(render(physical), r#"("t_0"."name" LIKE ('A' || '%'))"#);
    }

    #[test]
    fn empty_membership_is_false() {
        let scalar = base().scalar;
        let isin = Operation::Comparison(ComparisonFunction::IsIn);
        let physical = apply(&scalar[&isin], isin, vec![column("x")]).unwrap();
        assert_eq!(render(physical), "false");
    }

    #[test]
    fn case_when_needs_pairs() {
        let scalar = base().scalar;
        let case_when = Operation::Conditional(ConditionalFunction::CaseWhen);
        assert!(apply(&scalar[&case_when], case_when, vec![column("x")]).is_err());
        let physical = apply(
            &scalar[&case_when],
            case_when,
            vec![column("x"), string_value("yes")],
        )
        .unwrap();
        assert_eq!(render(physical), r#"CASE WHEN "t_0"."x" THEN 'yes' END"#);
    }

    #[test]
    fn ranking_orders_by_its_argument() {
        let window = base().window;
        let rank = Operation::Window(WindowFunction::Rank);
        let physical = apply(&window[&rank], rank, vec![column("x")]).unwrap();
        assert_eq!(
            physical,
            Physical::Window(WindowFragment {
                function: function_call("rank", vec![]),
                kind: WindowKind::Ranking {
                    order_by: Some(sql::ast::OrderByElement {
                        target: column("x"),
                        direction: sql::ast::OrderByDirection::Asc,
                    }),
                },
            })
        );
    }
}

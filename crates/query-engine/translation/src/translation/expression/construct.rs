//! Building expression trees from Rust.
//!
//! ```
//! use query_engine_translation::translation::expression::*;
//!
//! // _.x > _.x.mean()
//! let above_average = col("x").gt(col("x").mean());
//! // (_.a + 1) * 2
//! let scaled = (col("a") + 1) * 2;
//! # let _ = (above_average, scaled);
//! ```

use std::collections::BTreeMap;
use std::ops;

use super::operation::*;
use super::{Expression, Literal};

/// The placeholder for the current table, `_`.
pub fn reference() -> Expression {
    Expression::Reference
}

/// `_.name`
pub fn col(name: impl Into<String>) -> Expression {
    reference().attr(name)
}

/// `_["name"]`
pub fn index(name: impl Into<String>) -> Expression {
    Expression::Index {
        parent: Box::new(reference()),
        key: Box::new(lit(name.into())),
    }
}

/// A constant.
pub fn lit(value: impl Into<Literal>) -> Expression {
    Expression::Literal(value.into())
}

/// `start:stop` for selecting a run of columns. Both ends are inclusive.
pub fn slice(start: Option<Expression>, stop: Option<Expression>) -> Expression {
    Expression::Slice {
        start: start.map(Box::new),
        stop: stop.map(Box::new),
    }
}

/// Call an operation with positional arguments.
pub fn call(operation: Operation, args: Vec<Expression>) -> Expression {
    Expression::Call {
        operation,
        args,
        kwargs: BTreeMap::new(),
    }
}

/// Call an operation with positional and keyword arguments.
pub fn call_with_kwargs(
    operation: Operation,
    args: Vec<Expression>,
    kwargs: BTreeMap<String, Expression>,
) -> Expression {
    Expression::Call {
        operation,
        args,
        kwargs,
    }
}

/// The number of rows in the group.
pub fn n() -> Expression {
    call(Operation::Aggregate(AggregateFunction::N), vec![])
}

pub fn row_number() -> Expression {
    call(Operation::Window(WindowFunction::RowNumber), vec![])
}

/// `condition ? when_true : when_false`
pub fn if_else(
    condition: Expression,
    when_true: impl Into<Expression>,
    when_false: impl Into<Expression>,
) -> Expression {
    call(
        Operation::Conditional(ConditionalFunction::IfElse),
        vec![condition, when_true.into(), when_false.into()],
    )
}

/// The first matching branch wins. Rows matching no branch get `default`,
/// or NULL without one.
pub fn case_when(
    branches: Vec<(Expression, Expression)>,
    default: Option<Expression>,
) -> Expression {
    let args = branches
        .into_iter()
        .flat_map(|(condition, value)| [condition, value])
        .collect();
    let kwargs = default
        .map(|default| BTreeMap::from([("default".to_string(), default)]))
        .unwrap_or_default();
    call_with_kwargs(
        Operation::Conditional(ConditionalFunction::CaseWhen),
        args,
        kwargs,
    )
}

/// The first argument that is not NULL.
pub fn coalesce(args: Vec<Expression>) -> Expression {
    call(Operation::Conditional(ConditionalFunction::Coalesce), args)
}

macro_rules! binary_methods {
    ($($(#[$meta:meta])* $name:ident => $operation:expr;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(self, other: impl Into<Expression>) -> Expression {
                call($operation, vec![self, other.into()])
            }
        )*
    };
}

macro_rules! unary_methods {
    ($($(#[$meta:meta])* $name:ident => $operation:expr;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(self) -> Expression {
                call($operation, vec![self])
            }
        )*
    };
}

impl Expression {
    /// `self.name`
    pub fn attr(self, name: impl Into<String>) -> Expression {
        Expression::Attribute {
            parent: Box::new(self),
            name: name.into(),
        }
    }

    /// `self[key]`
    pub fn index(self, key: impl Into<Expression>) -> Expression {
        Expression::Index {
            parent: Box::new(self),
            key: Box::new(key.into()),
        }
    }

    binary_methods! {
        eq => Operation::Comparison(ComparisonFunction::Equal);
        ne => Operation::Comparison(ComparisonFunction::NotEqual);
        lt => Operation::Comparison(ComparisonFunction::LessThan);
        le => Operation::Comparison(ComparisonFunction::LessThanOrEqual);
        gt => Operation::Comparison(ComparisonFunction::GreaterThan);
        ge => Operation::Comparison(ComparisonFunction::GreaterThanOrEqual);
        add => Operation::Arithmetic(ArithmeticFunction::Add);
        sub => Operation::Arithmetic(ArithmeticFunction::Subtract);
        mul => Operation::Arithmetic(ArithmeticFunction::Multiply);
        div => Operation::Arithmetic(ArithmeticFunction::Divide);
        modulo => Operation::Arithmetic(ArithmeticFunction::Modulo);
        and => Operation::Logical(LogicalFunction::And);
        or => Operation::Logical(LogicalFunction::Or);
        startswith => Operation::String(StringFunction::StartsWith);
        endswith => Operation::String(StringFunction::EndsWith);
        contains => Operation::String(StringFunction::Contains);
        /// Convert to a type, named as in configuration files (`integer`,
        /// `double precision`, ...) or by shorthand (`int`, `float`, `str`, `bool`).
        astype => Operation::Conditional(ConditionalFunction::AsType);
        fillna => Operation::Conditional(ConditionalFunction::Coalesce);
    }

    unary_methods! {
        neg => Operation::Arithmetic(ArithmeticFunction::Negate);
        not => Operation::Logical(LogicalFunction::Not);
        is_na => Operation::Comparison(ComparisonFunction::IsNa);
        not_na => Operation::Comparison(ComparisonFunction::NotNa);
        abs => Operation::Math(MathFunction::Abs);
        sqrt => Operation::Math(MathFunction::Sqrt);
        exp => Operation::Math(MathFunction::Exp);
        ln => Operation::Math(MathFunction::Ln);
        cos => Operation::Math(MathFunction::Cos);
        sin => Operation::Math(MathFunction::Sin);
        cot => Operation::Math(MathFunction::Cot);
        upper => Operation::String(StringFunction::Upper);
        lower => Operation::String(StringFunction::Lower);
        str_len => Operation::String(StringFunction::Length);
        strip => Operation::String(StringFunction::Strip);
        year => Operation::Temporal(TemporalFunction::Year);
        hour => Operation::Temporal(TemporalFunction::Hour);
        week => Operation::Temporal(TemporalFunction::Week);
        mean => Operation::Aggregate(AggregateFunction::Mean);
        sum => Operation::Aggregate(AggregateFunction::Sum);
        min => Operation::Aggregate(AggregateFunction::Min);
        max => Operation::Aggregate(AggregateFunction::Max);
        var => Operation::Aggregate(AggregateFunction::Var);
        sd => Operation::Aggregate(AggregateFunction::Sd);
        n_distinct => Operation::Aggregate(AggregateFunction::NDistinct);
        rank => Operation::Window(WindowFunction::Rank);
        min_rank => Operation::Window(WindowFunction::MinRank);
        dense_rank => Operation::Window(WindowFunction::DenseRank);
        percent_rank => Operation::Window(WindowFunction::PercentRank);
        cume_dist => Operation::Window(WindowFunction::CumeDist);
        cumsum => Operation::Window(WindowFunction::CumSum);
        cummean => Operation::Window(WindowFunction::CumMean);
        cummin => Operation::Window(WindowFunction::CumMin);
        cummax => Operation::Window(WindowFunction::CumMax);
        lag => Operation::Window(WindowFunction::Lag);
        lead => Operation::Window(WindowFunction::Lead);
        /// Sort descending. Only meaningful inside arrange.
        desc => Operation::Ordering(OrderingFunction::Desc);
    }

    /// Round to `digits` decimal places.
    pub fn round(self, digits: i64) -> Expression {
        call(
            Operation::Math(MathFunction::Round),
            vec![self, lit(digits)],
        )
    }

    /// `low <= self <= high`
    pub fn between(self, low: impl Into<Expression>, high: impl Into<Expression>) -> Expression {
        call(
            Operation::Comparison(ComparisonFunction::Between),
            vec![self, low.into(), high.into()],
        )
    }

    /// Membership in a list of values.
    pub fn isin<T: Into<Expression>>(self, values: impl IntoIterator<Item = T>) -> Expression {
        let mut args = vec![self];
        args.extend(values.into_iter().map(Into::into));
        call(Operation::Comparison(ComparisonFunction::IsIn), args)
    }
}

macro_rules! operator_impls {
    ($($trait:ident $method:ident => $function:ident;)*) => {
        $(
            impl<T: Into<Expression>> ops::$trait<T> for Expression {
                type Output = Expression;

                fn $method(self, other: T) -> Expression {
                    Expression::$function(self, other)
                }
            }
        )*
    };
}

operator_impls! {
    Add add => add;
    Sub sub => sub;
    Mul mul => mul;
    Div div => div;
    Rem rem => modulo;
    BitAnd bitand => and;
    BitOr bitor => or;
}

impl ops::Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        Expression::neg(self)
    }
}

impl ops::Not for Expression {
    type Output = Expression;

    fn not(self) -> Expression {
        Expression::not(self)
    }
}

impl From<Literal> for Expression {
    fn from(literal: Literal) -> Self {
        Expression::Literal(literal)
    }
}

macro_rules! literal_from {
    ($($type:ty => $variant:ident $(as $target:ty)?;)*) => {
        $(
            impl From<$type> for Literal {
                fn from(value: $type) -> Self {
                    Literal::$variant(value $(as $target)?)
                }
            }

            impl From<$type> for Expression {
                fn from(value: $type) -> Self {
                    Expression::Literal(Literal::from(value))
                }
            }
        )*
    };
}

literal_from! {
    bool => Bool;
    i32 => Int as i64;
    i64 => Int;
    u32 => Int as i64;
    f64 => Float;
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        lit(value)
    }
}

impl From<String> for Expression {
    fn from(value: String) -> Self {
        lit(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_build_calls() {
        assert_eq!(
            col("a") + 1,
            call(
                Operation::Arithmetic(ArithmeticFunction::Add),
                vec![col("a"), lit(1)]
            )
        );
        assert_eq!(-col("a"), col("a").neg());
        assert_eq!(!col("a").is_na(), col("a").is_na().not());
        assert_eq!(
            col("a").gt(1) & col("b").lt(2),
            col("a").gt(1).and(col("b").lt(2))
        );
    }

    #[test]
    fn case_when_flattens_branches_and_keeps_default_as_keyword() {
        let expression = case_when(vec![(col("a").gt(1), lit("big"))], Some(lit("small")));
        match expression {
            Expression::Call { args, kwargs, .. } => {
                assert_eq!(args, vec![col("a").gt(1), lit("big")]);
                assert_eq!(kwargs.get("default"), Some(&lit("small")));
            }
            other => panic!("expected a call, got {other:?}"),
        }
    }
}

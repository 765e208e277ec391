//! The closed set of operations an expression tree can call.

use std::fmt;
use std::str::FromStr;

use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};

/// An operation, grouped by what kind of thing it does.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum Operation {
    Comparison(ComparisonFunction),
    Arithmetic(ArithmeticFunction),
    Logical(LogicalFunction),
    Math(MathFunction),
    String(StringFunction),
    Temporal(TemporalFunction),
    Conditional(ConditionalFunction),
    Aggregate(AggregateFunction),
    Window(WindowFunction),
    Ordering(OrderingFunction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum ComparisonFunction {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Between,
    IsIn,
    IsNa,
    NotNa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum ArithmeticFunction {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum LogicalFunction {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum MathFunction {
    Abs,
    Round,
    Sqrt,
    Exp,
    Ln,
    Cos,
    Sin,
    Cot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum StringFunction {
    Upper,
    Lower,
    Length,
    Strip,
    StartsWith,
    EndsWith,
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum TemporalFunction {
    Year,
    Hour,
    Week,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum ConditionalFunction {
    IfElse,
    CaseWhen,
    Coalesce,
    AsType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum AggregateFunction {
    Mean,
    Sum,
    Min,
    Max,
    Var,
    Sd,
    N,
    NDistinct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum WindowFunction {
    RowNumber,
    Rank,
    MinRank,
    DenseRank,
    PercentRank,
    CumeDist,
    CumSum,
    CumMean,
    CumMin,
    CumMax,
    Lead,
    Lag,
    Nth,
    First,
    Last,
    Ntile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum OrderingFunction {
    Desc,
}

impl Operation {
    /// The names an operation is known by. The first one is canonical.
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            Operation::Comparison(function) => match function {
                ComparisonFunction::Equal => &["eq"],
                ComparisonFunction::NotEqual => &["ne"],
                ComparisonFunction::LessThan => &["lt"],
                ComparisonFunction::LessThanOrEqual => &["le"],
                ComparisonFunction::GreaterThan => &["gt"],
                ComparisonFunction::GreaterThanOrEqual => &["ge"],
                ComparisonFunction::Between => &["between"],
                ComparisonFunction::IsIn => &["isin"],
                ComparisonFunction::IsNa => &["isna", "isnull"],
                ComparisonFunction::NotNa => &["notna", "notnull"],
            },
            Operation::Arithmetic(function) => match function {
                ArithmeticFunction::Add => &["add"],
                ArithmeticFunction::Subtract => &["sub"],
                ArithmeticFunction::Multiply => &["mul"],
                ArithmeticFunction::Divide => &["truediv", "div"],
                ArithmeticFunction::Modulo => &["mod"],
                ArithmeticFunction::Negate => &["neg"],
            },
            Operation::Logical(function) => match function {
                LogicalFunction::And => &["and"],
                LogicalFunction::Or => &["or"],
                LogicalFunction::Not => &["invert", "not"],
            },
            Operation::Math(function) => match function {
                MathFunction::Abs => &["abs"],
                MathFunction::Round => &["round"],
                MathFunction::Sqrt => &["sqrt"],
                MathFunction::Exp => &["exp"],
                MathFunction::Ln => &["log", "ln"],
                MathFunction::Cos => &["cos"],
                MathFunction::Sin => &["sin"],
                MathFunction::Cot => &["cot"],
            },
            Operation::String(function) => match function {
                StringFunction::Upper => &["upper"],
                StringFunction::Lower => &["lower"],
                StringFunction::Length => &["str_len"],
                StringFunction::Strip => &["strip"],
                StringFunction::StartsWith => &["startswith"],
                StringFunction::EndsWith => &["endswith"],
                StringFunction::Contains => &["contains"],
            },
            Operation::Temporal(function) => match function {
                TemporalFunction::Year => &["year"],
                TemporalFunction::Hour => &["hour"],
                TemporalFunction::Week => &["week"],
            },
            Operation::Conditional(function) => match function {
                ConditionalFunction::IfElse => &["if_else", "where"],
                ConditionalFunction::CaseWhen => &["case_when"],
                ConditionalFunction::Coalesce => &["coalesce", "fillna"],
                ConditionalFunction::AsType => &["astype", "cast"],
            },
            Operation::Aggregate(function) => match function {
                AggregateFunction::Mean => &["mean"],
                AggregateFunction::Sum => &["sum"],
                AggregateFunction::Min => &["min"],
                AggregateFunction::Max => &["max"],
                AggregateFunction::Var => &["var"],
                AggregateFunction::Sd => &["sd", "std"],
                AggregateFunction::N => &["n", "len", "count"],
                AggregateFunction::NDistinct => &["n_distinct", "nunique"],
            },
            Operation::Window(function) => match function {
                WindowFunction::RowNumber => &["row_number"],
                WindowFunction::Rank => &["rank"],
                WindowFunction::MinRank => &["min_rank"],
                WindowFunction::DenseRank => &["dense_rank"],
                WindowFunction::PercentRank => &["percent_rank"],
                WindowFunction::CumeDist => &["cume_dist"],
                WindowFunction::CumSum => &["cumsum"],
                WindowFunction::CumMean => &["cummean"],
                WindowFunction::CumMin => &["cummin"],
                WindowFunction::CumMax => &["cummax"],
                WindowFunction::Lead => &["lead"],
                WindowFunction::Lag => &["lag"],
                WindowFunction::Nth => &["nth"],
                WindowFunction::First => &["first"],
                WindowFunction::Last => &["last"],
                WindowFunction::Ntile => &["ntile"],
            },
            Operation::Ordering(OrderingFunction::Desc) => &["desc"],
        }
    }

    /// The canonical name of the operation.
    pub fn name(&self) -> &'static str {
        self.names()[0]
    }

    /// Look an operation up by any of its names.
    pub fn from_name(name: &str) -> Option<Operation> {
        enum_iterator::all::<Operation>().find(|operation| operation.names().contains(&name))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An operation name that is not in the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation '{0}'")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Operation::from_name(name).ok_or_else(|| UnknownOperation(name.to_string()))
    }
}

impl TryFrom<String> for Operation {
    type Error = UnknownOperation;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<Operation> for String {
    fn from(operation: Operation) -> Self {
        operation.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_belongs_to_exactly_one_operation() {
        for operation in enum_iterator::all::<Operation>() {
            for name in operation.names() {
                assert_eq!(Operation::from_name(name), Some(operation), "{name}");
            }
        }
    }

    #[test]
    fn operations_serialize_as_their_canonical_name() {
        let operation = Operation::Window(WindowFunction::CumSum);
        assert_eq!(
            serde_json::to_value(operation).unwrap(),
            serde_json::json!("cumsum")
        );
        let parsed: Operation = serde_json::from_value(serde_json::json!("isnull")).unwrap();
        assert_eq!(parsed, Operation::Comparison(ComparisonFunction::IsNa));
        assert!(serde_json::from_value::<Operation>(serde_json::json!("frobnicate")).is_err());
    }
}

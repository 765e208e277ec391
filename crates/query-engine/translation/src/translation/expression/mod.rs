//! Symbolic expressions over the columns of a query, independent of any SQL dialect.
//!
//! An expression is built against a placeholder for "the current table"
//! ([`Expression::Reference`]). `_.x + 1` is the call `add(_.x, 1)`, where `_.x`
//! is an attribute access on the placeholder.

pub mod construct;
pub mod operation;

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

pub use construct::*;
pub use operation::*;

/// A node of the expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ExpressionRepr", into = "ExpressionRepr")]
pub enum Expression {
    /// The current table.
    Reference,
    /// `parent.name`
    Attribute {
        parent: Box<Expression>,
        name: String,
    },
    /// An operation applied to positional and keyword arguments.
    Call {
        operation: Operation,
        args: Vec<Expression>,
        kwargs: BTreeMap<String, Expression>,
    },
    /// `parent[key]`
    Index {
        parent: Box<Expression>,
        key: Box<Expression>,
    },
    /// `start:stop`, only meaningful inside a select.
    Slice {
        start: Option<Box<Expression>>,
        stop: Option<Box<Expression>>,
    },
    Literal(Literal),
}

/// A constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::Null, Literal::Null) => true,
            (Literal::Bool(left), Literal::Bool(right)) => left == right,
            (Literal::Int(left), Literal::Int(right)) => left == right,
            (Literal::Float(left), Literal::Float(right)) => left.to_bits() == right.to_bits(),
            (Literal::String(left), Literal::String(right)) => left == right,
            _ => false,
        }
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Literal::Null => {}
            Literal::Bool(value) => value.hash(state),
            Literal::Int(value) => value.hash(state),
            Literal::Float(value) => value.to_bits().hash(state),
            Literal::String(value) => value.hash(state),
        }
    }
}

impl Expression {
    /// Rebuild the tree bottom-up. `transform` sees every node after its
    /// children have been rebuilt. The receiver is left untouched.
    pub fn rewrite<E, F>(&self, transform: &mut F) -> Result<Expression, E>
    where
        F: FnMut(Expression) -> Result<Expression, E>,
    {
        let rebuilt = match self {
            Expression::Reference | Expression::Literal(_) => self.clone(),
            Expression::Attribute { parent, name } => Expression::Attribute {
                parent: Box::new(parent.rewrite(transform)?),
                name: name.clone(),
            },
            Expression::Call {
                operation,
                args,
                kwargs,
            } => Expression::Call {
                operation: *operation,
                args: args
                    .iter()
                    .map(|arg| arg.rewrite(transform))
                    .collect::<Result<_, _>>()?,
                kwargs: kwargs
                    .iter()
                    .map(|(name, arg)| Ok::<_, E>((name.clone(), arg.rewrite(transform)?)))
                    .collect::<Result<_, E>>()?,
            },
            Expression::Index { parent, key } => Expression::Index {
                parent: Box::new(parent.rewrite(transform)?),
                key: Box::new(key.rewrite(transform)?),
            },
            Expression::Slice { start, stop } => Expression::Slice {
                start: start
                    .as_ref()
                    .map(|start| start.rewrite(transform).map(Box::new))
                    .transpose()?,
                stop: stop
                    .as_ref()
                    .map(|stop| stop.rewrite(transform).map(Box::new))
                    .transpose()?,
            },
        };
        transform(rebuilt)
    }

    /// If this expression names a single column (`_.x`, `_["x"]` or `"x"`),
    /// that column's name.
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            Expression::Attribute { parent, name } if **parent == Expression::Reference => {
                Some(name)
            }
            Expression::Index { parent, key } if **parent == Expression::Reference => {
                match key.as_ref() {
                    Expression::Literal(Literal::String(name)) => Some(name),
                    _ => None,
                }
            }
            Expression::Literal(Literal::String(name)) => Some(name),
            _ => None,
        }
    }

    /// The names of every column this expression reads, in order of appearance.
    pub fn referenced_columns(&self) -> IndexSet<String> {
        let mut columns = IndexSet::new();
        self.collect_columns(&mut columns);
        columns
    }

    fn collect_columns(&self, columns: &mut IndexSet<String>) {
        match self {
            Expression::Attribute { parent, name } if **parent == Expression::Reference => {
                columns.insert(name.clone());
            }
            Expression::Index { parent, key } if **parent == Expression::Reference => {
                if let Expression::Literal(Literal::String(name)) = key.as_ref() {
                    columns.insert(name.clone());
                } else {
                    key.collect_columns(columns);
                }
            }
            Expression::Attribute { parent, .. } => parent.collect_columns(columns),
            Expression::Index { parent, key } => {
                parent.collect_columns(columns);
                key.collect_columns(columns);
            }
            Expression::Call { args, kwargs, .. } => {
                for arg in args.iter().chain(kwargs.values()) {
                    arg.collect_columns(columns);
                }
            }
            Expression::Slice { start, stop } => {
                for bound in start.iter().chain(stop.iter()) {
                    bound.collect_columns(columns);
                }
            }
            Expression::Reference | Expression::Literal(_) => {}
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("None"),
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Float(value) => write!(f, "{value:?}"),
            Literal::String(value) => write!(f, "'{value}'"),
        }
    }
}

/// Renders the expression the way a user would write it, with column
/// references as bare names. Used to name derived columns.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.simple_name() {
            if !matches!(self, Expression::Literal(_)) {
                return f.write_str(name);
            }
        }
        match self {
            Expression::Reference => f.write_str("_"),
            Expression::Attribute { parent, name } => write!(f, "{parent}.{name}"),
            Expression::Index { parent, key } => write!(f, "{parent}[{key}]"),
            Expression::Slice { start, stop } => {
                if let Some(start) = start {
                    write!(f, "{start}")?;
                }
                f.write_str(":")?;
                if let Some(stop) = stop {
                    write!(f, "{stop}")?;
                }
                Ok(())
            }
            Expression::Literal(literal) => write!(f, "{literal}"),
            Expression::Call {
                operation,
                args,
                kwargs,
            } => {
                if let (Some(symbol), [left, right]) = (infix_symbol(*operation), args.as_slice()) {
                    return write!(f, "{left} {symbol} {right}");
                }
                if let (Operation::Arithmetic(ArithmeticFunction::Negate), [operand]) =
                    (operation, args.as_slice())
                {
                    return write!(f, "-{operand}");
                }
                write!(f, "{operation}(")?;
                let mut first = true;
                for arg in args {
                    if !first {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                    first = false;
                }
                for (name, arg) in kwargs {
                    if !first {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}={arg}")?;
                    first = false;
                }
                f.write_str(")")
            }
        }
    }
}

fn infix_symbol(operation: Operation) -> Option<&'static str> {
    match operation {
        Operation::Comparison(ComparisonFunction::Equal) => Some("=="),
        Operation::Comparison(ComparisonFunction::NotEqual) => Some("!="),
        Operation::Comparison(ComparisonFunction::LessThan) => Some("<"),
        Operation::Comparison(ComparisonFunction::LessThanOrEqual) => Some("<="),
        Operation::Comparison(ComparisonFunction::GreaterThan) => Some(">"),
        Operation::Comparison(ComparisonFunction::GreaterThanOrEqual) => Some(">="),
        Operation::Arithmetic(ArithmeticFunction::Add) => Some("+"),
        Operation::Arithmetic(ArithmeticFunction::Subtract) => Some("-"),
        Operation::Arithmetic(ArithmeticFunction::Multiply) => Some("*"),
        Operation::Arithmetic(ArithmeticFunction::Divide) => Some("/"),
        Operation::Arithmetic(ArithmeticFunction::Modulo) => Some("%"),
        Operation::Logical(LogicalFunction::And) => Some("&"),
        Operation::Logical(LogicalFunction::Or) => Some("|"),
        _ => None,
    }
}

/// The serialized form of an expression. Adds `{"column": "x"}` as a
/// shorthand for `_.x`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ExpressionRepr {
    Reference,
    Column(String),
    Attribute {
        parent: Box<Expression>,
        name: String,
    },
    Call {
        operation: Operation,
        #[serde(default)]
        args: Vec<Expression>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        kwargs: BTreeMap<String, Expression>,
    },
    Index {
        parent: Box<Expression>,
        key: Box<Expression>,
    },
    Slice {
        #[serde(default)]
        start: Option<Box<Expression>>,
        #[serde(default)]
        stop: Option<Box<Expression>>,
    },
    Literal(Literal),
}

impl From<ExpressionRepr> for Expression {
    fn from(repr: ExpressionRepr) -> Self {
        match repr {
            ExpressionRepr::Reference => Expression::Reference,
            ExpressionRepr::Column(name) => col(name),
            ExpressionRepr::Attribute { parent, name } => Expression::Attribute { parent, name },
            ExpressionRepr::Call {
                operation,
                args,
                kwargs,
            } => Expression::Call {
                operation,
                args,
                kwargs,
            },
            ExpressionRepr::Index { parent, key } => Expression::Index { parent, key },
            ExpressionRepr::Slice { start, stop } => Expression::Slice { start, stop },
            ExpressionRepr::Literal(literal) => Expression::Literal(literal),
        }
    }
}

impl From<Expression> for ExpressionRepr {
    fn from(expression: Expression) -> Self {
        match expression {
            Expression::Reference => ExpressionRepr::Reference,
            Expression::Attribute { parent, name } if *parent == Expression::Reference => {
                ExpressionRepr::Column(name)
            }
            Expression::Attribute { parent, name } => ExpressionRepr::Attribute { parent, name },
            Expression::Call {
                operation,
                args,
                kwargs,
            } => ExpressionRepr::Call {
                operation,
                args,
                kwargs,
            },
            Expression::Index { parent, key } => ExpressionRepr::Index { parent, key },
            Expression::Slice { start, stop } => ExpressionRepr::Slice { start, stop },
            Expression::Literal(literal) => ExpressionRepr::Literal(literal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_leaves_the_original_untouched() {
        let original = col("x").add(1);
        let renamed = original
            .rewrite(&mut |node| {
                Ok::<_, ()>(match node {
                    Expression::Attribute { parent, name } if name == "x" => {
                        Expression::Attribute {
                            parent,
                            name: "y".to_string(),
                        }
                    }
                    other => other,
                })
            })
            .unwrap();
        assert_eq!(renamed, col("y").add(1));
        assert_eq!(original, col("x").add(1));
    }

    #[test]
    fn referenced_columns_are_collected_in_order() {
        let expression = col("b").add(col("a")).gt(index("c"));
        let columns: Vec<_> = expression.referenced_columns().into_iter().collect();
        assert_eq!(columns, vec!["b", "a", "c"]);
    }

    #[test]
    fn simple_names() {
        assert_eq!(col("x").simple_name(), Some("x"));
        assert_eq!(index("x").simple_name(), Some("x"));
        assert_eq!(lit("x").simple_name(), Some("x"));
        assert_eq!(col("x").add(1).simple_name(), None);
        assert_eq!(reference().attr("a").attr("b").simple_name(), None);
    }

    #[test]
    fn display_reads_like_the_source_expression() {
        assert_eq!(col("x").add(1).to_string(), "x + 1");
        assert_eq!(col("x").mean().to_string(), "mean(x)");
        assert_eq!(col("x").neg().to_string(), "-x");
        assert_eq!(
            col("s").attr("str").attr("upper").to_string(),
            "s.str.upper"
        );
    }

    #[test]
    fn expressions_deserialize_from_json() {
        let expression: Expression = serde_json::from_value(serde_json::json!({
            "call": {
                "operation": "gt",
                "args": [{ "column": "x" }, { "literal": 1.5 }]
            }
        }))
        .unwrap();
        assert_eq!(expression, col("x").gt(1.5));

        let round_tripped: Expression =
            serde_json::from_value(serde_json::to_value(&expression).unwrap()).unwrap();
        assert_eq!(round_tripped, expression);
    }

    #[test]
    fn literals_compare_floats_by_bits() {
        assert_eq!(Literal::Float(f64::NAN), Literal::Float(f64::NAN));
        assert_ne!(Literal::Int(1), Literal::Float(1.0));
    }
}

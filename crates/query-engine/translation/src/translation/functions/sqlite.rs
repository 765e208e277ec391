//! The SQLite function table.

use std::collections::BTreeMap;

use query_engine_metadata::metadata::{Dialect, ScalarType};
use query_engine_sql::sql;

use super::common::{self, function_call, string_value, Buckets};
use super::{builder, DialectFunctions, Physical};
use crate::translation::expression::*;

/// SQLite has no boolean or timestamp storage classes.
fn type_names() -> BTreeMap<ScalarType, String> {
    BTreeMap::from([
        (ScalarType::Boolean, "INTEGER".to_string()),
        (ScalarType::Smallint, "INTEGER".to_string()),
        (ScalarType::Bigint, "INTEGER".to_string()),
        (ScalarType::DoublePrecision, "REAL".to_string()),
        (ScalarType::Date, "TEXT".to_string()),
        (ScalarType::Timestamp, "TEXT".to_string()),
    ])
}

/// Format a timestamp with `strftime`.
fn strftime(format: &'static str) -> super::Builder {
    builder(move |arguments| {
        let [x] = arguments.exactly()?;
        Ok(Physical::Expression(function_call("strftime", vec![string_value(format), x])))
    })
}

pub fn functions() -> DialectFunctions {
    let Buckets {
        mut scalar,
        aggregate,
        window,
    } = common::base();

    use MathFunction as M;

    scalar.extend([
        (Operation::Math(M::Sqrt), common::function::<1>("sqrt")),
        (Operation::Math(M::Exp), common::function::<1>("exp")),
        (Operation::Math(M::Ln), common::function::<1>("ln")),
        (Operation::Math(M::Cos), common::function::<1>("cos")),
        (Operation::Math(M::Sin), common::function::<1>("sin")),
        (
            Operation::Temporal(TemporalFunction::Year),
            builder(|arguments| {
                let [x] = arguments.exactly()?;
                Ok(Physical::Expression(sql::ast::Expression::Cast {
                    expression: Box::new(function_call("strftime", vec![string_value("%Y"), x])),
                    r#type: sql::ast::ScalarType("INTEGER".to_string()),
                }))
            }),
        ),
        (
            Operation::Temporal(TemporalFunction::Hour),
            strftime("%Y-%m-%d %H:00:00"),
        ),
        // the Monday on or before the date
        (
            Operation::Temporal(TemporalFunction::Week),
            builder(|arguments| {
                let [x] = arguments.exactly()?;
                Ok(Physical::Expression(function_call(
                    "date",
                    vec![x, string_value("-6 days"), string_value("weekday 1")],
                )))
            }),
        ),
        (
            Operation::Conditional(ConditionalFunction::AsType),
            common::cast(type_names()),
        ),
    ]);

    DialectFunctions {
        dialect: Dialect::Sqlite,
        scalar,
        aggregate,
        window,
    }
}

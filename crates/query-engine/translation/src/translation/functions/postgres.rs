//! The PostgreSQL function table.

use std::collections::BTreeMap;

use query_engine_metadata::metadata::Dialect;

use super::common::{self, function_call, string_value, Buckets};
use super::{builder, DialectFunctions, Physical};
use crate::translation::expression::*;

/// Truncate a timestamp to a unit with `date_trunc`.
fn truncate(unit: &'static str) -> super::Builder {
    builder(move |arguments| {
        let [x] = arguments.exactly()?;
        Ok(Physical::Expression(function_call("date_trunc", vec![string_value(unit), x])))
    })
}

pub fn functions() -> DialectFunctions {
    let Buckets {
        mut scalar,
        mut aggregate,
        mut window,
    } = common::base();

    use AggregateFunction as A;
    use MathFunction as M;
    use TemporalFunction as T;

    scalar.extend([
        (Operation::Math(M::Sqrt), common::function::<1>("sqrt")),
        (Operation::Math(M::Exp), common::function::<1>("exp")),
        (Operation::Math(M::Ln), common::function::<1>("ln")),
        (Operation::Math(M::Cos), common::function::<1>("cos")),
        (Operation::Math(M::Sin), common::function::<1>("sin")),
        (Operation::Math(M::Cot), common::function::<1>("cot")),
        (
            Operation::Temporal(T::Year),
            builder(|arguments| {
                let [x] = arguments.exactly()?;
                Ok(Physical::Expression(function_call("date_part", vec![string_value("year"), x])))
            }),
        ),
        (Operation::Temporal(T::Hour), truncate("hour")),
        (Operation::Temporal(T::Week), truncate("week")),
        (
            Operation::Conditional(ConditionalFunction::AsType),
            common::cast(BTreeMap::new()),
        ),
    ]);

    aggregate.extend([
        (Operation::Aggregate(A::Var), common::aggregate("var_samp")),
        (
            Operation::Aggregate(A::Sd),
            common::aggregate("stddev_samp"),
        ),
    ]);

    window.extend([
        (
            Operation::Aggregate(A::Var),
            common::window_aggregate("var_samp"),
        ),
        (
            Operation::Aggregate(A::Sd),
            common::window_aggregate("stddev_samp"),
        ),
    ]);

    DialectFunctions {
        dialect: Dialect::Postgres,
        scalar,
        aggregate,
        window,
    }
}

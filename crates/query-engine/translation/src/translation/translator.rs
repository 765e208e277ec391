//! Translate expression trees into SQL expressions.

use std::collections::BTreeMap;
use std::fmt;

use query_engine_sql::sql;

use super::error::Error;
use super::expression::{Expression, Literal};
use super::functions::{Arguments, DialectFunctions, Physical};
use super::helpers::Namespace;
use super::windows::{LabeledWindow, WindowContext};

/// The context an expression is translated in. It decides which bucket of
/// the dialect's function table is consulted after the scalar one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Row-wise only: ordering, derived count columns.
    Scalar,
    /// One value per group: summarize.
    Aggregate,
    /// Row-wise, with window functions available: filter, mutate.
    Window,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Scalar => f.write_str("scalar"),
            Mode::Aggregate => f.write_str("aggregate"),
            Mode::Window => f.write_str("window"),
        }
    }
}

/// Everything a translation looks things up in.
#[derive(Debug, Clone, Copy)]
pub struct Env<'a> {
    pub functions: &'a DialectFunctions,
    pub namespace: &'a Namespace,
    pub windows: &'a WindowContext,
}

/// A translated expression and the windows labeled while translating it.
#[derive(Debug, Clone, PartialEq)]
pub struct Translated {
    pub expression: sql::ast::Expression,
    pub windows: Vec<LabeledWindow>,
}

/// Translate one expression.
pub fn translate(env: &Env, expression: &Expression, mode: Mode) -> Result<Translated, Error> {
    let (expression, windows) = translate_expression(env, expression, mode, vec![])?;
    Ok(Translated {
        expression,
        windows,
    })
}

/// Translate several expressions, labeling their windows from one sequence.
pub fn translate_all<'e>(
    env: &Env,
    expressions: impl IntoIterator<Item = &'e Expression>,
    mode: Mode,
) -> Result<(Vec<sql::ast::Expression>, Vec<LabeledWindow>), Error> {
    let mut translated = vec![];
    let mut windows = vec![];
    for expression in expressions {
        let (sql_expression, discovered) = translate_expression(env, expression, mode, windows)?;
        translated.push(sql_expression);
        windows = discovered;
    }
    Ok((translated, windows))
}

fn translate_expression(
    env: &Env,
    expression: &Expression,
    mode: Mode,
    discovered: Vec<LabeledWindow>,
) -> Result<(sql::ast::Expression, Vec<LabeledWindow>), Error> {
    match expression {
        Expression::Literal(literal) => Ok((translate_literal(literal), discovered)),
        Expression::Call {
            operation,
            args,
            kwargs,
        } => {
            let builder = env.functions.lookup(*operation, mode)?;

            let outer_windows = discovered.len();
            let mut discovered = discovered;
            let mut sql_args = Vec::with_capacity(args.len());
            for arg in args {
                let (sql_arg, found) = translate_expression(env, arg, mode, discovered)?;
                sql_args.push(sql_arg);
                discovered = found;
            }
            let mut sql_kwargs = BTreeMap::new();
            for (name, arg) in kwargs {
                let (sql_arg, found) = translate_expression(env, arg, mode, discovered)?;
                sql_kwargs.insert(name.clone(), sql_arg);
                discovered = found;
            }

            match builder(Arguments {
                operation: *operation,
                args: sql_args,
                kwargs: sql_kwargs,
            })? {
                Physical::Expression(sql_expression) => Ok((sql_expression, discovered)),
                Physical::Window(_) if discovered.len() > outer_windows => {
                    Err(Error::NotSupported(format!(
                        "a window function inside the arguments of '{operation}'"
                    )))
                }
                Physical::Window(fragment) => {
                    Ok(env.windows.place(fragment, env.namespace, discovered))
                }
            }
        }
        Expression::Reference
        | Expression::Attribute { .. }
        | Expression::Index { .. }
        | Expression::Slice { .. } => match expression.simple_name() {
            Some(name) => Ok((env.namespace.lookup(name)?.clone(), discovered)),
            None => Err(Error::NotSupported(format!("the expression '{expression}'"))),
        },
    }
}

fn translate_literal(literal: &Literal) -> sql::ast::Expression {
    sql::ast::Expression::Value(match literal {
        Literal::Null => sql::ast::Value::Null,
        Literal::Bool(value) => sql::ast::Value::Bool(*value),
        Literal::Int(value) => sql::ast::Value::Int8(*value),
        Literal::Float(value) => sql::ast::Value::Float8(*value),
        Literal::String(value) => sql::ast::Value::String(value.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::expression::*;
    use crate::translation::windows::Placement;
    use query_engine_metadata::metadata::Dialect;
    use query_engine_sql::sql::helpers::{aliased_column, make_column_alias, make_table_alias};
    use query_engine_sql::sql::string::{ParamStyle, RenderMode, SQL};

    fn render(expression: &sql::ast::Expression) -> String {
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

    fn namespace() -> Namespace {
        let table = make_table_alias("t".to_string(), 0);
        Namespace::from_columns(["g", "x", "name"].map(|name| {
            (
                name.to_string(),
                aliased_column(&table, &make_column_alias(name.to_string())),
            )
        }))
    }

    fn partitioned(placement: Placement) -> WindowContext {
        let namespace = namespace();
        WindowContext {
            partition_by: vec![namespace.lookup("g").unwrap().clone()],
            order_by: vec![],
            placement,
        }
    }

    #[test]
    fn scalar_expressions_translate_structurally() {
        let functions = DialectFunctions::for_dialect(Dialect::Postgres);
        let namespace = namespace();
        let windows = WindowContext::empty();
        let env = Env {
            functions: &functions,
            namespace: &namespace,
            windows: &windows,
        };
        let expression = (col("x") + 1).gt(lit(2) * col("x"));
        let translated = translate(&env, &expression, Mode::Scalar).unwrap();
        assert_eq!(
            render(&translated.expression),
            r#"(("t_0"."x" + 1) > (2 * "t_0"."x"))"#
        );
        assert!(translated.windows.is_empty());
    }

    #[test]
    fn unknown_columns_are_reported() {
        let functions = DialectFunctions::for_dialect(Dialect::Postgres);
        let namespace = namespace();
        let windows = WindowContext::empty();
        let env = Env {
            functions: &functions,
            namespace: &namespace,
            windows: &windows,
        };
        let error = translate(&env, &col("nope").add(1), Mode::Scalar).unwrap_err();
        assert!(matches!(error, Error::UnknownColumn { name, .. } if name == "nope"));
    }

    #[test]
    fn window_mode_completes_aggregates_with_the_partition() {
        let functions = DialectFunctions::for_dialect(Dialect::Postgres);
        let namespace = namespace();
        let windows = partitioned(Placement::InPlace);
        let env = Env {
            functions: &functions,
            namespace: &namespace,
            windows: &windows,
        };
        let translated = translate(&env, &col("x").gt(col("x").mean()), Mode::Window).unwrap();
        assert_eq!(
            render(&translated.expression),
            r#"("t_0"."x" > avg("t_0"."x") OVER (PARTITION BY "t_0"."g"))"#
        );
        assert_eq!(translated.windows.len(), 1);
    }

    #[test]
    fn hoisting_replaces_windows_with_references() {
        let functions = DialectFunctions::for_dialect(Dialect::Postgres);
        let namespace = namespace();
        let windows = partitioned(Placement::Hoist {
            table: make_table_alias("windows".to_string(), 2),
        });
        let env = Env {
            functions: &functions,
            namespace: &namespace,
            windows: &windows,
        };
        let (expressions, labeled) = translate_all(
            &env,
            [&col("x").rank().eq(1), &col("x").gt(col("x").mean())],
            Mode::Window,
        )
        .unwrap();
        assert_eq!(render(&expressions[0]), r#"("windows_2"."win1" = 1)"#);
        assert_eq!(
            render(&expressions[1]),
            r#"("t_0"."x" > "windows_2"."win2")"#
        );
        assert_eq!(
            render(&labeled[0].expression),
            r#"rank() OVER (PARTITION BY "t_0"."g" ORDER BY "t_0"."x" ASC)"#
        );
        assert_eq!(labeled[1].alias.name, "win2");
    }

    #[test]
    fn operations_outside_their_context_are_unsupported() {
        let functions = DialectFunctions::for_dialect(Dialect::Sqlite);
        let namespace = namespace();
        let windows = WindowContext::empty();
        let env = Env {
            functions: &functions,
            namespace: &namespace,
            windows: &windows,
        };
        assert_eq!(
            translate(&env, &col("x").var(), Mode::Window).unwrap_err(),
            Error::UnsupportedOperation {
                dialect: Dialect::Sqlite,
                operation: Operation::Aggregate(AggregateFunction::Var),
                mode: Mode::Window,
            }
        );
        assert!(matches!(
            translate(&env, &col("x").mean(), Mode::Scalar).unwrap_err(),
            Error::UnsupportedOperation { .. }
        ));
    }

    #[test]
    fn windows_inside_windows_are_rejected() {
        let functions = DialectFunctions::for_dialect(Dialect::Postgres);
        let namespace = namespace();
        for windows in [
            partitioned(Placement::InPlace),
            partitioned(Placement::Hoist {
                table: make_table_alias("windows".to_string(), 2),
            }),
        ] {
            let env = Env {
                functions: &functions,
                namespace: &namespace,
                windows: &windows,
            };
            assert_eq!(
                translate(&env, &col("x").cumsum().mean(), Mode::Window).unwrap_err(),
                Error::NotSupported(
                    "a window function inside the arguments of 'mean'".to_string()
                )
            );
        }
    }

    #[test]
    fn windows_beside_each_other_are_fine() {
        let functions = DialectFunctions::for_dialect(Dialect::Postgres);
        let namespace = namespace();
        let windows = partitioned(Placement::InPlace);
        let env = Env {
            functions: &functions,
            namespace: &namespace,
            windows: &windows,
        };
        let expression = col("x").cumsum() - col("x").mean();
        let translated = translate(&env, &expression, Mode::Window).unwrap();
        assert_eq!(translated.windows.len(), 2);
    }

    #[test]
    fn offset_and_positional_windows_are_unsupported() {
        for dialect in enum_iterator::all::<Dialect>() {
            let functions = DialectFunctions::for_dialect(dialect);
            let namespace = namespace();
            let windows = partitioned(Placement::InPlace);
            let env = Env {
                functions: &functions,
                namespace: &namespace,
                windows: &windows,
            };
            for function in [
                WindowFunction::Lead,
                WindowFunction::Lag,
                WindowFunction::Nth,
                WindowFunction::First,
                WindowFunction::Last,
                WindowFunction::Ntile,
            ] {
                let operation = Operation::Window(function);
                assert_eq!(
                    translate(&env, &call(operation, vec![col("x")]), Mode::Window).unwrap_err(),
                    Error::UnsupportedOperation {
                        dialect,
                        operation,
                        mode: Mode::Window,
                    }
                );
            }
        }
    }

    #[test]
    fn translating_twice_gives_the_same_result() {
        let functions = DialectFunctions::for_dialect(Dialect::Sqlite);
        let namespace = namespace();
        let windows = WindowContext::empty();
        let env = Env {
            functions: &functions,
            namespace: &namespace,
            windows: &windows,
        };
        let expression = if_else(col("x").gt(1), col("name"), lit("small"))
            .eq(lit("ada"))
            .or(col("g").isin([1, 2]));
        assert_eq!(
            translate(&env, &expression, Mode::Scalar).unwrap(),
            translate(&env, &expression, Mode::Scalar).unwrap()
        );
    }

    #[test]
    fn accessors_on_computed_values_are_rejected() {
        let functions = DialectFunctions::for_dialect(Dialect::Postgres);
        let namespace = namespace();
        let windows = WindowContext::empty();
        let env = Env {
            functions: &functions,
            namespace: &namespace,
            windows: &windows,
        };
        assert!(matches!(
            translate(&env, &col("x").attr("real"), Mode::Scalar),
            Err(Error::NotSupported(_))
        ));
    }
}

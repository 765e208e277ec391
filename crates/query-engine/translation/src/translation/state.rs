//! The immutable state a query is built up in.
//!
//! Each verb takes a [`QueryState`] and returns a new one. The state records
//! every SELECT stage built so far (the last one is the query), the columns
//! the data is grouped by, and the ordering applied by arrange. Stages are
//! shared between states, so branching a pipeline costs nothing.

use std::sync::Arc;

use indexmap::IndexSet;
use query_engine_metadata::metadata;
use query_engine_sql::sql;
use query_engine_sql::sql::execution_plan::{simple_exec_plan, ExecutionPlan, ExplainStyle};
use query_engine_sql::sql::string::{ParamStyle, RenderMode, SQL};

use super::error::Error;
use super::expression::Expression;
use super::functions::DialectFunctions;
use super::helpers::{self, Namespace, State};
use super::translator::{self, Env, Mode, Translated};
use super::windows::{LabeledWindow, Placement, WindowContext};

/// One term of the current ordering, kept symbolic so it can be resolved
/// against whatever stage a window function ends up in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub expression: Expression,
    pub direction: sql::ast::OrderByDirection,
}

/// The SELECT stages built so far, newest last. Cloning is cheap and clones
/// share every stage.
#[derive(Debug, Clone)]
pub struct Stages {
    last: Arc<Stage>,
    depth: usize,
}

#[derive(Debug)]
struct Stage {
    select: sql::ast::Select,
    previous: Option<Arc<Stage>>,
}

impl Stages {
    fn new(select: sql::ast::Select) -> Self {
        Stages {
            last: Arc::new(Stage {
                select,
                previous: None,
            }),
            depth: 1,
        }
    }

    fn push(&self, select: sql::ast::Select) -> Self {
        Stages {
            last: Arc::new(Stage {
                select,
                previous: Some(Arc::clone(&self.last)),
            }),
            depth: self.depth + 1,
        }
    }

    pub fn last(&self) -> &sql::ast::Select {
        &self.last.select
    }

    /// How many stages there are. A query always has its source stage, so
    /// this is never zero.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Every stage, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &sql::ast::Select> {
        std::iter::successors(Some(self.last.as_ref()), |stage| stage.previous.as_deref())
            .map(|stage| &stage.select)
    }

    /// Whether both histories end in the very same stage.
    pub fn same_as(&self, other: &Stages) -> bool {
        Arc::ptr_eq(&self.last, &other.last)
    }
}

/// A lazily built query.
#[derive(Debug, Clone)]
pub struct QueryState {
    functions: Arc<DialectFunctions>,
    root_field: String,
    stages: Stages,
    group_columns: IndexSet<String>,
    order_terms: Vec<OrderTerm>,
    aliases: State,
}

impl QueryState {
    /// Start from every column of a table.
    pub fn new(
        functions: Arc<DialectFunctions>,
        collection: &str,
        table: &metadata::TableInfo,
    ) -> Self {
        let mut aliases = State::default();
        let alias = aliases.make_table_alias(&table.table_name);
        let select_list = table
            .columns
            .iter()
            .map(|(name, column)| {
                sql::helpers::make_column(
                    sql::ast::TableReference::AliasedTable(alias.clone()),
                    sql::ast::ColumnName(column.name.clone()),
                    sql::helpers::make_column_alias(name.clone()),
                )
            })
            .collect();
        let mut select = sql::helpers::simple_select(select_list);
        select.from = Some(sql::ast::From::Table {
            reference: sql::ast::TableReference::DBTable {
                schema: table.schema_name.clone().map(sql::ast::SchemaName),
                table: sql::ast::TableName(table.table_name.clone()),
            },
            alias,
        });
        QueryState {
            functions,
            root_field: collection.to_string(),
            stages: Stages::new(select),
            group_columns: IndexSet::new(),
            order_terms: vec![],
            aliases,
        }
    }

    pub fn functions(&self) -> &Arc<DialectFunctions> {
        &self.functions
    }

    pub fn dialect(&self) -> metadata::Dialect {
        self.functions.dialect()
    }

    pub fn root_field(&self) -> &str {
        &self.root_field
    }

    pub fn stages(&self) -> &Stages {
        &self.stages
    }

    /// The query as it stands.
    pub fn last_stage(&self) -> &sql::ast::Select {
        self.stages.last()
    }

    pub fn group_columns(&self) -> &IndexSet<String> {
        &self.group_columns
    }

    pub fn order_terms(&self) -> &[OrderTerm] {
        &self.order_terms
    }

    /// Columns read by the grouping and the ordering, which window
    /// functions are partitioned and ordered by.
    pub fn window_columns(&self) -> IndexSet<String> {
        let mut columns = self.group_columns.clone();
        for term in &self.order_terms {
            columns.extend(term.expression.referenced_columns());
        }
        columns
    }

    pub(crate) fn aliases(&self) -> State {
        self.aliases
    }

    /// Output column names of the query.
    pub fn column_names(&self) -> Vec<String> {
        helpers::column_names(self.last_stage())
    }

    /// Output column names with the grouping columns moved to the front.
    pub fn ordered_column_names(&self) -> Vec<String> {
        let mut names: IndexSet<String> = self.group_columns.iter().cloned().collect();
        names.extend(self.column_names());
        names.into_iter().collect()
    }

    /// A new state with `select` as its newest stage.
    pub(crate) fn with_stage(
        &self,
        select: sql::ast::Select,
        aliases: State,
        group_columns: IndexSet<String>,
        order_terms: Vec<OrderTerm>,
    ) -> Self {
        QueryState {
            functions: Arc::clone(&self.functions),
            root_field: self.root_field.clone(),
            stages: self.stages.push(select),
            group_columns,
            order_terms,
            aliases,
        }
    }

    /// A new stage, keeping grouping and ordering.
    pub(crate) fn append(&self, select: sql::ast::Select, aliases: State) -> Self {
        self.with_stage(
            select,
            aliases,
            self.group_columns.clone(),
            self.order_terms.clone(),
        )
    }

    /// Same stages, different grouping.
    pub(crate) fn with_group_columns(&self, group_columns: IndexSet<String>) -> Self {
        QueryState {
            group_columns,
            ..self.clone()
        }
    }

    /// Resolve grouping and ordering against `namespace` for building
    /// window functions.
    pub(crate) fn window_context(
        &self,
        namespace: &Namespace,
        placement: Placement,
    ) -> Result<WindowContext, Error> {
        let partition_by = self
            .group_columns
            .iter()
            .map(|name| namespace.lookup(name).cloned())
            .collect::<Result<_, _>>()?;
        let order_by = self
            .order_terms
            .iter()
            .map(|term| {
                let translated = self.translate(
                    &term.expression,
                    namespace,
                    Mode::Scalar,
                    &WindowContext::empty(),
                )?;
                Ok(sql::ast::OrderByElement {
                    target: translated.expression,
                    direction: term.direction,
                })
            })
            .collect::<Result<_, Error>>()?;
        Ok(WindowContext {
            partition_by,
            order_by,
            placement,
        })
    }

    /// Translate an expression with this state's dialect.
    pub(crate) fn translate(
        &self,
        expression: &Expression,
        namespace: &Namespace,
        mode: Mode,
        windows: &WindowContext,
    ) -> Result<Translated, Error> {
        translator::translate(
            &Env {
                functions: &self.functions,
                namespace,
                windows,
            },
            expression,
            mode,
        )
    }

    /// Translate several expressions, labeling their windows from one sequence.
    pub(crate) fn translate_all<'e>(
        &self,
        expressions: impl IntoIterator<Item = &'e Expression>,
        namespace: &Namespace,
        mode: Mode,
        windows: &WindowContext,
    ) -> Result<(Vec<sql::ast::Expression>, Vec<LabeledWindow>), Error> {
        translator::translate_all(
            &Env {
                functions: &self.functions,
                namespace,
                windows,
            },
            expressions,
            mode,
        )
    }

    /// The query as an execution plan.
    pub fn to_plan(&self) -> ExecutionPlan {
        let (param_style, explain_style) = match self.dialect() {
            metadata::Dialect::Postgres => (ParamStyle::Dollar, ExplainStyle::Explain),
            metadata::Dialect::Sqlite => (ParamStyle::QuestionMark, ExplainStyle::ExplainQueryPlan),
        };
        simple_exec_plan(
            self.root_field.clone(),
            self.last_stage().clone(),
            param_style,
            explain_style,
        )
    }

    /// Render the query for the database.
    pub fn compile(&self, mode: RenderMode) -> SQL {
        self.to_plan().query_sql(mode)
    }

    /// Render the query as text for people to read.
    pub fn show_query(&self, mode: RenderMode) -> String {
        self.compile(mode).sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn people() -> metadata::TableInfo {
        metadata::TableInfo {
            schema_name: Some("public".to_string()),
            table_name: "people".to_string(),
            columns: IndexMap::from_iter(["g", "x"].map(|name| {
                (
                    name.to_string(),
                    metadata::ColumnInfo {
                        name: name.to_string(),
                        r#type: metadata::ScalarType::Integer,
                        nullable: metadata::Nullable::Nullable,
                    },
                )
            })),
            description: None,
        }
    }

    #[test]
    fn a_new_state_selects_every_column() {
        let state = QueryState::new(
            Arc::new(DialectFunctions::for_dialect(metadata::Dialect::Postgres)),
            "people",
            &people(),
        );
        assert_eq!(
            state.show_query(RenderMode::default()),
            r#"SELECT "people_0"."g" AS "g", "people_0"."x" AS "x" FROM "public"."people" AS "people_0""#
        );
        assert_eq!(state.stages().depth(), 1);
        assert!(state.group_columns().is_empty());
    }

    #[test]
    fn appending_shares_earlier_stages() {
        let state = QueryState::new(
            Arc::new(DialectFunctions::for_dialect(metadata::Dialect::Sqlite)),
            "people",
            &people(),
        );
        let mut aliases = state.aliases();
        let wrapped = helpers::wrap(&mut aliases, state.last_stage().clone());
        let next = state.append(wrapped, aliases);
        assert_eq!(next.stages().depth(), 2);
        let earlier: Vec<_> = next.stages().iter().skip(1).collect();
        assert!(std::ptr::eq(earlier[0], state.last_stage()));
        assert!(state.stages().same_as(&state.clone().stages));
        assert!(!state.stages().same_as(next.stages()));
    }

    #[test]
    fn grouping_columns_come_first() {
        let state = QueryState::new(
            Arc::new(DialectFunctions::for_dialect(metadata::Dialect::Postgres)),
            "people",
            &people(),
        )
        .with_group_columns(IndexSet::from(["x".to_string()]));
        assert_eq!(state.ordered_column_names(), vec!["x", "g"]);
    }
}

//! Describe the SQL execution plan.

use super::ast;
use super::string::{ParamStyle, RenderMode, SQL};

/// How a database asks for a query plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplainStyle {
    /// `EXPLAIN ...`
    Explain,
    /// `EXPLAIN QUERY PLAN ...`
    ExplainQueryPlan,
}

#[derive(Debug, Clone, PartialEq)]
/// Definition of an execution plan to be run against the database.
pub struct ExecutionPlan {
    pub root_field: String,
    /// The query.
    pub query: ast::Select,
    pub param_style: ParamStyle,
    pub explain_style: ExplainStyle,
}

impl ExecutionPlan {
    /// Extract the query component as SQL.
    pub fn query_sql(&self, mode: RenderMode) -> SQL {
        select_to_sql(&self.query, mode, self.param_style)
    }
    /// Extract the query plan request as SQL.
    pub fn explain_query_sql(&self, mode: RenderMode) -> SQL {
        let explain = match self.explain_style {
            ExplainStyle::Explain => ast::Explain::Select(&self.query),
            ExplainStyle::ExplainQueryPlan => ast::Explain::QueryPlan(&self.query),
        };
        let mut sql = SQL::with_options(mode, self.param_style);
        explain.to_sql(&mut sql);
        sql
    }
}

/// Render a SELECT with the given options.
pub fn select_to_sql(select: &ast::Select, mode: RenderMode, param_style: ParamStyle) -> SQL {
    let mut sql = SQL::with_options(mode, param_style);
    select.to_sql(&mut sql);
    sql
}

/// A simple execution plan with only a root field and a query.
pub fn simple_exec_plan(
    root_field: String,
    query: ast::Select,
    param_style: ParamStyle,
    explain_style: ExplainStyle,
) -> ExecutionPlan {
    ExecutionPlan {
        root_field,
        query,
        param_style,
        explain_style,
    }
}

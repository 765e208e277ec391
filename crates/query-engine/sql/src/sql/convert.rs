//! Convert a SQL AST to a low-level SQL string.

use super::ast::*;
use super::helpers;
use super::string::*;

// Convert to SQL strings

impl Explain<'_> {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            Explain::Select(select) => {
                sql.append_syntax("EXPLAIN ");
                select.to_sql(sql);
            }
            Explain::QueryPlan(select) => {
                sql.append_syntax("EXPLAIN QUERY PLAN ");
                select.to_sql(sql);
            }
        }
    }
}

impl SelectList {
    pub fn to_sql(&self, sql: &mut SQL) {
        let SelectList(select_list) = self;
        for (index, (col, expr)) in select_list.iter().enumerate() {
            expr.to_sql(sql);
            if !(sql.mode().simple_names && is_named(expr, col)) {
                sql.append_syntax(" AS ");
                col.to_sql(sql);
            }
            if index < (select_list.len() - 1) {
                sql.append_syntax(", ");
            }
        }
    }
}

/// Whether the expression already exposes the column under the alias' name.
fn is_named(expression: &Expression, alias: &ColumnAlias) -> bool {
    match expression {
        Expression::ColumnReference(ColumnReference::TableColumn { name, .. }) => {
            name.0 == alias.name
        }
        Expression::ColumnReference(ColumnReference::AliasedColumn { column, .. }) => {
            column == alias
        }
        _ => false,
    }
}

impl Select {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("SELECT ");

        if self.distinct {
            sql.append_syntax("DISTINCT ");
        }

        self.select_list.to_sql(sql);

        if let Some(from) = &self.from {
            sql.append_syntax(" ");
            from.to_sql(sql);
        }

        for join in &self.joins {
            join.to_sql(sql);
        }

        self.where_.to_sql(sql);

        self.group_by.to_sql(sql);

        self.order_by.to_sql(sql);

        self.limit.to_sql(sql);
    }
}

impl From {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("FROM ");
        match &self {
            From::Table { reference, alias } => {
                reference.to_sql(sql);
                sql.append_syntax(" AS ");
                alias.to_sql(sql);
            }
            From::Select { select, alias } => {
                sql.append_syntax("(");
                select.to_sql(sql);
                sql.append_syntax(")");
                sql.append_syntax(" AS ");
                alias.to_sql(sql);
            }
        }
    }
}

impl Join {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self.kind {
            JoinKind::Inner => sql.append_syntax(" INNER JOIN "),
            JoinKind::LeftOuter => sql.append_syntax(" LEFT OUTER JOIN "),
            JoinKind::FullOuter => sql.append_syntax(" FULL OUTER JOIN "),
        }
        sql.append_syntax("(");
        self.select.to_sql(sql);
        sql.append_syntax(")");
        sql.append_syntax(" AS ");
        self.alias.to_sql(sql);
        sql.append_syntax(" ON ");
        self.on.to_sql(sql);
    }
}

impl Where {
    pub fn to_sql(&self, sql: &mut SQL) {
        let Where(expression) = self;
        if *expression != helpers::true_expr() {
            sql.append_syntax(" WHERE ");
            expression.to_sql(sql);
        }
    }
}

impl GroupBy {
    pub fn to_sql(&self, sql: &mut SQL) {
        if !self.elements.is_empty() {
            sql.append_syntax(" GROUP BY ");
            comma_separated(&self.elements, sql);
        }
    }
}

// scalars
impl Expression {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Expression::ColumnReference(column_reference) => column_reference.to_sql(sql),
            Expression::Value(value) => value.to_sql(sql),
            Expression::And { left, right } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                sql.append_syntax(" AND ");
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Or { left, right } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                sql.append_syntax(" OR ");
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Not(expr) => {
                sql.append_syntax("NOT (");
                expr.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::BinaryOperation {
                left,
                operator,
                right,
            } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                operator.to_sql(sql);
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::BinaryArrayOperation {
                left,
                operator,
                right,
            } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                operator.to_sql(sql);
                sql.append_syntax("(");
                comma_separated(right, sql);
                sql.append_syntax(")");
                sql.append_syntax(")");
            }
            Expression::UnaryOperation {
                expression,
                operator,
            } => {
                sql.append_syntax("(");
                match operator {
                    UnaryOperator::Negate => {
                        sql.append_syntax("-");
                        expression.to_sql(sql);
                    }
                    UnaryOperator::IsNull => {
                        expression.to_sql(sql);
                        sql.append_syntax(" IS NULL");
                    }
                    UnaryOperator::IsNotNull => {
                        expression.to_sql(sql);
                        sql.append_syntax(" IS NOT NULL");
                    }
                }
                sql.append_syntax(")");
            }
            Expression::FunctionCall { function, args } => {
                function.to_sql(sql);
                sql.append_syntax("(");
                comma_separated(args, sql);
                sql.append_syntax(")");
            }
            Expression::Case { whens, else_ } => {
                sql.append_syntax("CASE");
                for (condition, result) in whens {
                    sql.append_syntax(" WHEN ");
                    condition.to_sql(sql);
                    sql.append_syntax(" THEN ");
                    result.to_sql(sql);
                }
                if let Some(else_) = else_ {
                    sql.append_syntax(" ELSE ");
                    else_.to_sql(sql);
                }
                sql.append_syntax(" END");
            }
            Expression::WindowFunction { function, window } => {
                function.to_sql(sql);
                sql.append_syntax(" OVER (");
                window.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Cast { expression, r#type } => {
                sql.append_syntax("CAST(");
                expression.to_sql(sql);
                sql.append_syntax(" AS ");
                r#type.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Count(count_type) => {
                sql.append_syntax("COUNT");
                sql.append_syntax("(");
                count_type.to_sql(sql);
                sql.append_syntax(")");
            }
        }
    }
}

fn comma_separated(expressions: &[Expression], sql: &mut SQL) {
    for (index, expression) in expressions.iter().enumerate() {
        expression.to_sql(sql);
        if index < (expressions.len() - 1) {
            sql.append_syntax(", ");
        }
    }
}

impl Window {
    pub fn to_sql(&self, sql: &mut SQL) {
        let mut needs_space = false;
        if !self.partition_by.is_empty() {
            sql.append_syntax("PARTITION BY ");
            comma_separated(&self.partition_by, sql);
            needs_space = true;
        }
        if !self.order_by.elements.is_empty() {
            if needs_space {
                sql.append_syntax(" ");
            }
            sql.append_syntax("ORDER BY ");
            self.order_by.elements_to_sql(sql);
            needs_space = true;
        }
        if let Some(frame) = &self.frame {
            if needs_space {
                sql.append_syntax(" ");
            }
            frame.to_sql(sql);
        }
    }
}

impl WindowFrame {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("ROWS BETWEEN ");
        self.start.to_sql(sql);
        sql.append_syntax(" AND ");
        self.end.to_sql(sql);
    }
}

impl FrameBound {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            FrameBound::UnboundedPreceding => sql.append_syntax("UNBOUNDED PRECEDING"),
            FrameBound::CurrentRow => sql.append_syntax("CURRENT ROW"),
        }
    }
}

impl ScalarType {
    pub fn to_sql(&self, sql: &mut SQL) {
        let ScalarType(name) = self;
        sql.append_syntax(name);
    }
}

impl BinaryOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        let BinaryOperator(name) = self;
        sql.append_syntax(" ");
        sql.append_syntax(name);
        sql.append_syntax(" ");
    }
}

impl BinaryArrayOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            BinaryArrayOperator::In => sql.append_syntax(" IN "),
        }
    }
}

impl Function {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            Function::Coalesce => sql.append_syntax("coalesce"),
            Function::Unknown(name) => sql.append_syntax(name),
        }
    }
}

impl CountType {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            CountType::Star => sql.append_syntax("*"),
            CountType::Simple(expression) => expression.to_sql(sql),
            CountType::Distinct(expression) => {
                sql.append_syntax("DISTINCT ");
                expression.to_sql(sql);
            }
        }
    }
}

impl Value {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Value::Int8(i) => sql.append_syntax(&i.to_string()),
            Value::Float8(n) => sql.append_syntax(&format!("{n:?}")),
            Value::String(s) => sql.append_param(Param::String(s.clone())),
            Value::Bool(true) => sql.append_syntax("true"),
            Value::Bool(false) => sql.append_syntax("false"),
            Value::Null => sql.append_syntax("NULL"),
        }
    }
}

impl Limit {
    pub fn to_sql(&self, sql: &mut SQL) {
        if let Some(limit) = self.limit {
            sql.append_syntax(" LIMIT ");
            sql.append_syntax(&limit.to_string());
        }
        if let Some(offset) = self.offset {
            sql.append_syntax(" OFFSET ");
            sql.append_syntax(&offset.to_string());
        }
    }
}

// names
impl TableReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            TableReference::DBTable { schema, table } => {
                if let Some(schema) = schema {
                    schema.to_sql(sql);
                    sql.append_syntax(".");
                }
                table.to_sql(sql);
            }
            TableReference::AliasedTable(alias) => alias.to_sql(sql),
        };
    }
}

impl SchemaName {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.0);
    }
}

impl TableName {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.0);
    }
}

impl TableAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        let name = format!("{}_{}", self.name, self.unique_index);
        sql.append_identifier(&name);
    }
}

impl ColumnReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            ColumnReference::TableColumn { table, name } => {
                table.to_sql(sql);
                sql.append_syntax(".");
                name.to_sql(sql);
            }
            ColumnReference::AliasedColumn { table, column } => {
                table.to_sql(sql);
                sql.append_syntax(".");
                column.to_sql(sql);
            }
        };
    }
}

impl ColumnName {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.0);
    }
}

impl ColumnAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.name);
    }
}

impl OrderBy {
    pub fn to_sql(&self, sql: &mut SQL) {
        if !self.elements.is_empty() {
            sql.append_syntax(" ORDER BY ");
            self.elements_to_sql(sql);
        }
    }

    fn elements_to_sql(&self, sql: &mut SQL) {
        for (index, order_by_item) in self.elements.iter().enumerate() {
            order_by_item.to_sql(sql);
            if index < (self.elements.len() - 1) {
                sql.append_syntax(", ");
            }
        }
    }
}

impl OrderByElement {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.target.to_sql(sql);
        self.direction.to_sql(sql);
    }
}

impl OrderByDirection {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            OrderByDirection::Asc => sql.append_syntax(" ASC"),
            OrderByDirection::Desc => sql.append_syntax(" DESC"),
        }
    }
}

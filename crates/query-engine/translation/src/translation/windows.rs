//! Completing window functions and lifting them out of expressions.
//!
//! A builder that needs an OVER clause returns a [`WindowFragment`]. The
//! translator hands it to [`WindowContext::place`], which builds the clause from
//! the query's grouping and ordering, labels the result, and decides what the
//! surrounding expression sees: the window itself, or a reference to a column
//! of an outer stage where the window is computed instead. The latter is
//! needed wherever SQL does not allow window functions, e.g. in WHERE.

use query_engine_sql::sql;
use query_engine_sql::sql::helpers::{aliased_column, empty_order_by, make_column_alias};

use super::helpers::Namespace;

/// A window function, before its OVER clause is known.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowFragment {
    pub function: sql::ast::Expression,
    pub kind: WindowKind,
}

/// Decides how the OVER clause of a fragment is built.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowKind {
    /// An aggregate over the whole partition.
    Aggregate,
    /// A ranking. Ordered by `order_by` when given, else by the query's ordering.
    Ranking {
        order_by: Option<sql::ast::OrderByElement>,
    },
    /// A running aggregate from the start of the partition to the current row.
    Cumulative,
}

/// A completed window function and the label it was given.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledWindow {
    pub alias: sql::ast::ColumnAlias,
    pub expression: sql::ast::Expression,
}

/// Where completed window functions go.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Leave the window function where it appeared.
    InPlace,
    /// Replace it with a reference to its label, read from `table`.
    Hoist { table: sql::ast::TableAlias },
}

/// The grouping and ordering window functions are built from, already
/// resolved against the namespace being translated in.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowContext {
    pub partition_by: Vec<sql::ast::Expression>,
    pub order_by: Vec<sql::ast::OrderByElement>,
    pub placement: Placement,
}

impl WindowContext {
    /// No partitions, no ordering, windows stay in place.
    pub fn empty() -> Self {
        WindowContext {
            partition_by: vec![],
            order_by: vec![],
            placement: Placement::InPlace,
        }
    }

    /// Complete a fragment and place it. `discovered` holds the windows
    /// labeled so far in this translation and comes back extended.
    pub fn place(
        &self,
        fragment: WindowFragment,
        namespace: &Namespace,
        mut discovered: Vec<LabeledWindow>,
    ) -> (sql::ast::Expression, Vec<LabeledWindow>) {
        let expression = sql::ast::Expression::WindowFunction {
            function: Box::new(fragment.function),
            window: self.over(fragment.kind),
        };
        let alias = make_column_alias(fresh_label(namespace, &discovered));
        let substitute = match &self.placement {
            Placement::InPlace => expression.clone(),
            Placement::Hoist { table } => aliased_column(table, &alias),
        };
        discovered.push(LabeledWindow { alias, expression });
        (substitute, discovered)
    }

    fn over(&self, kind: WindowKind) -> sql::ast::Window {
        match kind {
            WindowKind::Aggregate => sql::ast::Window {
                partition_by: self.partition_by.clone(),
                order_by: empty_order_by(),
                frame: None,
            },
            WindowKind::Ranking { order_by } => sql::ast::Window {
                partition_by: self.partition_by.clone(),
                order_by: sql::ast::OrderBy {
                    elements: order_by
                        .map_or_else(|| self.order_by.clone(), |element| vec![element]),
                },
                frame: None,
            },
            WindowKind::Cumulative => sql::ast::Window {
                partition_by: self.partition_by.clone(),
                order_by: sql::ast::OrderBy {
                    elements: self.order_by.clone(),
                },
                frame: Some(sql::ast::WindowFrame {
                    start: sql::ast::FrameBound::UnboundedPreceding,
                    end: sql::ast::FrameBound::CurrentRow,
                }),
            },
        }
    }
}

/// `win1`, `win2`, ... skipping names already visible or already handed out.
fn fresh_label(namespace: &Namespace, discovered: &[LabeledWindow]) -> String {
    (discovered.len() + 1..)
        .map(|index| format!("win{index}"))
        .find(|label| {
            !namespace.contains(label)
                && !discovered.iter().any(|window| window.alias.name == *label)
        })
        .unwrap_or_else(|| format!("win{}", discovered.len() + 1))
}

//! The serialized form of a lazy query: a table and the verbs applied to it.
//!
//! ```json
//! { "collection": "people",
//!   "pipeline": [
//!     { "verb": "group_by", "columns": [{ "column": "g" }] },
//!     { "verb": "summarize", "columns": {
//!         "total": { "call": { "operation": "sum", "args": [{ "column": "x" }] } } } }
//!   ] }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::translation::expression::Expression;
use crate::translation::verbs::{JoinKind, JoinOn};

/// A table and a pipeline of verbs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Name of a table in the metadata.
    pub collection: String,
    #[serde(default)]
    pub pipeline: Vec<Verb>,
}

/// One verb with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verb", rename_all = "snake_case")]
pub enum Verb {
    Select {
        columns: Vec<Expression>,
    },
    Filter {
        predicates: Vec<Expression>,
    },
    Mutate {
        columns: IndexMap<String, Expression>,
    },
    Arrange {
        terms: Vec<Expression>,
    },
    Summarize {
        #[serde(default)]
        columns: IndexMap<String, Expression>,
    },
    Count {
        #[serde(default)]
        columns: Vec<Expression>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default)]
        sort: bool,
    },
    GroupBy {
        columns: Vec<Expression>,
        #[serde(default)]
        add: bool,
    },
    Ungroup,
    Join {
        right: Box<QueryRequest>,
        on: JoinOn,
        #[serde(default)]
        how: JoinKind,
    },
    Rename {
        /// New name to old column.
        columns: IndexMap<String, Expression>,
    },
    Distinct {
        #[serde(default)]
        columns: Vec<Expression>,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        computed: IndexMap<String, Expression>,
        #[serde(default)]
        keep_all: bool,
    },
    Head {
        #[serde(default = "default_head")]
        n: u32,
    },
}

fn default_head() -> u32 {
    5
}

impl Verb {
    /// The name the verb is serialized under.
    pub fn name(&self) -> &'static str {
        match self {
            Verb::Select { .. } => "select",
            Verb::Filter { .. } => "filter",
            Verb::Mutate { .. } => "mutate",
            Verb::Arrange { .. } => "arrange",
            Verb::Summarize { .. } => "summarize",
            Verb::Count { .. } => "count",
            Verb::GroupBy { .. } => "group_by",
            Verb::Ungroup => "ungroup",
            Verb::Join { .. } => "join",
            Verb::Rename { .. } => "rename",
            Verb::Distinct { .. } => "distinct",
            Verb::Head { .. } => "head",
        }
    }
}

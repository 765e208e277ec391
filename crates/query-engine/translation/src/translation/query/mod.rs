//! Translate a serialized verb pipeline into an execution plan.

pub mod request;

use std::sync::Arc;

use query_engine_metadata::metadata;
use query_engine_sql::sql;

use crate::translation::error::Error;
use crate::translation::functions::DialectFunctions;
use crate::translation::state::QueryState;
use crate::translation::verbs::{CountOptions, Verbs};
use request::{QueryRequest, Verb};

/// Translate a query request to an execution plan.
pub fn translate(
    metadata: &metadata::Metadata,
    functions: Arc<DialectFunctions>,
    request: &QueryRequest,
) -> Result<sql::execution_plan::ExecutionPlan, Error> {
    let state = translate_request(metadata, &functions, request)?;
    let plan = state.to_plan();
    tracing::info!("SQL AST: {:?}", plan.query);
    Ok(plan)
}

/// Apply every verb of a request, in order, to its collection.
pub fn translate_request(
    metadata: &metadata::Metadata,
    functions: &Arc<DialectFunctions>,
    request: &QueryRequest,
) -> Result<QueryState, Error> {
    let table = metadata
        .tables
        .0
        .get(&request.collection)
        .ok_or_else(|| Error::CollectionNotFound(request.collection.clone()))?;
    let initial = QueryState::new(Arc::clone(functions), &request.collection, table);
    request
        .pipeline
        .iter()
        .try_fold(initial, |state, verb| {
            apply(metadata, functions, &state, verb)
        })
}

fn apply(
    metadata: &metadata::Metadata,
    functions: &Arc<DialectFunctions>,
    state: &QueryState,
    verb: &Verb,
) -> Result<QueryState, Error> {
    tracing::trace!(verb = verb.name(), "translating verb");
    match verb {
        Verb::Select { columns } => state.select(columns),
        Verb::Filter { predicates } => state.filter(predicates),
        Verb::Mutate { columns } => state.mutate(&named(columns)),
        Verb::Arrange { terms } => state.arrange(terms),
        Verb::Summarize { columns } => state.summarize(&named(columns)),
        Verb::Count {
            columns,
            name,
            sort,
        } => state.count(
            columns,
            CountOptions {
                name: name.clone(),
                sort: *sort,
            },
        ),
        Verb::GroupBy { columns, add } => state.group_by(columns, *add),
        Verb::Ungroup => state.ungroup(),
        Verb::Join { right, on, how } => {
            let right = translate_request(metadata, functions, right)?;
            state.join(&right, on, *how)
        }
        Verb::Rename { columns } => state.rename(&named(columns)),
        Verb::Distinct {
            columns,
            computed,
            keep_all,
        } => state.distinct(columns, &named(computed), *keep_all),
        Verb::Head { n } => state.head(*n),
    }
}

fn named<V: Clone>(columns: &indexmap::IndexMap<String, V>) -> Vec<(&str, V)> {
    columns
        .iter()
        .map(|(name, value)| (name.as_str(), value.clone()))
        .collect()
}

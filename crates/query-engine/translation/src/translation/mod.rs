//! Compile lazy queries, pipelines of relational verbs over symbolic
//! expressions, into SQL for a given dialect.

pub mod error;
pub mod expression;
pub mod functions;
pub mod helpers;
pub mod query;
pub mod state;
pub mod translator;
pub mod verbs;
pub mod windows;

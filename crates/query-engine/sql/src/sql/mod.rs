//! The SQL AST, its string rendering, and the plan handed to execution.

pub mod ast;
pub mod convert;
pub mod execution_plan;
pub mod helpers;
pub mod string;

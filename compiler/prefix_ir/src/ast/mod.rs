//! Syntax tree handed to the evaluator by the (external) parser.
//!
//! Every node carries a [`Location`](crate::Location) for diagnostics.
//! Statement bodies are plain `Vec<Stmt>`: each list is one label scope for
//! `GOTO`/`GOTOPOINT` resolution.

mod expr;
mod stmt;

pub use expr::{Expr, ExprKind, KwArg};
pub use stmt::{ElseIf, FuncDef, Param, Program, Stmt, StmtKind};

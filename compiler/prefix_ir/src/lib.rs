//! Prefix IR - syntax tree types.
//!
//! The lexer/parser is an external producer; this crate only defines the
//! tree it hands to `prefix_eval`:
//! - [`Location`] on every node
//! - [`DeclType`] for declared binding and parameter types
//! - [`Expr`]/[`Stmt`] nodes plus [`FuncDef`] and [`Program`]
//!
//! With the `serde` feature every node is (de)serializable, which is how
//! the `prefix` driver receives programs.

pub mod ast;
mod decl_type;
mod location;

pub use ast::{ElseIf, Expr, ExprKind, FuncDef, KwArg, Param, Program, Stmt, StmtKind};
pub use decl_type::DeclType;
pub use location::Location;

//! Statement nodes and function definitions.

use std::sync::Arc;

use super::Expr;
use crate::{DeclType, Location};

/// A statement node.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stmt {
    pub kind: StmtKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub loc: Location,
}

/// Statement kinds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StmtKind {
    /// Nested statement list. Shares the enclosing scope.
    Block(Vec<Stmt>),
    /// Expression evaluated for its effect.
    Expr(Expr),
    /// `[TYPE:] name = value`. With a declared type the binding is created
    /// if missing.
    Assign {
        decl_type: Option<DeclType>,
        name: String,
        value: Expr,
    },
    /// `target[...] = value` / `target<key> = value`; `target` is an
    /// [`ExprKind::Index`](super::ExprKind::Index).
    IndexAssign { target: Expr, value: Expr },
    /// `TYPE: name` without a value.
    Decl { decl_type: DeclType, name: String },
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        elifs: Vec<ElseIf>,
        else_branch: Option<Vec<Stmt>>,
    },
    While { cond: Expr, body: Vec<Stmt> },
    /// `FOR(counter, target)`: counter runs `1..=target`.
    For {
        counter: String,
        target: Expr,
        body: Vec<Stmt>,
    },
    Func(Arc<FuncDef>),
    Return(Expr),
    /// `POP(name)`: return the binding's value and delete it.
    Pop(String),
    /// `BREAK(n)`: leave `n` enclosing loops.
    Break(Expr),
    Continue,
    Try {
        body: Vec<Stmt>,
        catch_name: Option<String>,
        catch_body: Vec<Stmt>,
    },
    /// `GOTO(target)`: jump to the label whose key equals `target`.
    Goto(Expr),
    /// `GOTOPOINT(key)`: label definition.
    Label(Expr),
}

/// `ELSEIF` arm.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElseIf {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

/// A function parameter. Parameters with a default are keyword-capable.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    pub decl_type: DeclType,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub default: Option<Expr>,
}

/// A user function definition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: DeclType,
    pub body: Vec<Stmt>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub loc: Location,
}

/// A whole program: the top-level statement list.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    pub body: Vec<Stmt>,
}

impl Param {
    pub fn new(decl_type: DeclType, name: impl Into<String>) -> Self {
        Param {
            decl_type,
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(decl_type: DeclType, name: impl Into<String>, default: Expr) -> Self {
        Param {
            decl_type,
            name: name.into(),
            default: Some(default),
        }
    }

    #[inline]
    pub fn is_keyword(&self) -> bool {
        self.default.is_some()
    }
}

impl FuncDef {
    pub fn new(
        name: impl Into<String>,
        params: Vec<Param>,
        return_type: DeclType,
        body: Vec<Stmt>,
    ) -> Self {
        FuncDef {
            name: name.into(),
            params,
            return_type,
            body,
            loc: Location::DUMMY,
        }
    }
}

impl Program {
    pub fn new(body: Vec<Stmt>) -> Self {
        Program { body }
    }
}

impl Stmt {
    #[inline]
    pub fn new(kind: StmtKind) -> Self {
        Stmt {
            kind,
            loc: Location::DUMMY,
        }
    }

    /// Set the source location.
    #[must_use]
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.loc = Location::new(line, column);
        self
    }

    pub fn block(stmts: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Block(stmts))
    }

    pub fn expr(e: Expr) -> Self {
        Self::new(StmtKind::Expr(e))
    }

    /// Untyped assignment to an existing binding.
    pub fn assign(name: impl Into<String>, value: Expr) -> Self {
        Self::new(StmtKind::Assign {
            decl_type: None,
            name: name.into(),
            value,
        })
    }

    /// Typed assignment, declaring the binding if needed.
    pub fn typed(decl_type: DeclType, name: impl Into<String>, value: Expr) -> Self {
        Self::new(StmtKind::Assign {
            decl_type: Some(decl_type),
            name: name.into(),
            value,
        })
    }

    pub fn index_assign(target: Expr, value: Expr) -> Self {
        Self::new(StmtKind::IndexAssign { target, value })
    }

    pub fn decl(decl_type: DeclType, name: impl Into<String>) -> Self {
        Self::new(StmtKind::Decl {
            decl_type,
            name: name.into(),
        })
    }

    pub fn if_(cond: Expr, then_branch: Vec<Stmt>, else_branch: Option<Vec<Stmt>>) -> Self {
        Self::new(StmtKind::If {
            cond,
            then_branch,
            elifs: Vec::new(),
            else_branch,
        })
    }

    pub fn if_chain(
        cond: Expr,
        then_branch: Vec<Stmt>,
        elifs: Vec<ElseIf>,
        else_branch: Option<Vec<Stmt>>,
    ) -> Self {
        Self::new(StmtKind::If {
            cond,
            then_branch,
            elifs,
            else_branch,
        })
    }

    pub fn while_(cond: Expr, body: Vec<Stmt>) -> Self {
        Self::new(StmtKind::While { cond, body })
    }

    pub fn for_(counter: impl Into<String>, target: Expr, body: Vec<Stmt>) -> Self {
        Self::new(StmtKind::For {
            counter: counter.into(),
            target,
            body,
        })
    }

    pub fn func(def: FuncDef) -> Self {
        let loc = def.loc;
        Stmt {
            kind: StmtKind::Func(Arc::new(def)),
            loc,
        }
    }

    pub fn ret(value: Expr) -> Self {
        Self::new(StmtKind::Return(value))
    }

    pub fn pop(name: impl Into<String>) -> Self {
        Self::new(StmtKind::Pop(name.into()))
    }

    pub fn brk(count: i64) -> Self {
        Self::new(StmtKind::Break(Expr::int(count)))
    }

    pub fn cont() -> Self {
        Self::new(StmtKind::Continue)
    }

    pub fn try_(body: Vec<Stmt>, catch_name: Option<&str>, catch_body: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Try {
            body,
            catch_name: catch_name.map(str::to_owned),
            catch_body,
        })
    }

    pub fn goto(target: Expr) -> Self {
        Self::new(StmtKind::Goto(target))
    }

    pub fn label(key: Expr) -> Self {
        Self::new(StmtKind::Label(key))
    }
}

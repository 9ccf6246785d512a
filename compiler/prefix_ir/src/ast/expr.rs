//! Expression nodes.

use crate::Location;

/// An expression node.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expr {
    pub kind: ExprKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub loc: Location,
}

/// Expression kinds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExprKind {
    Int(i64),
    Flt(f64),
    Str(String),
    /// Variable or function reference.
    Ident(String),
    /// Pointer literal `@name`. Reads dereference the binding; as an
    /// assignment source it creates an alias.
    Ptr(String),
    /// Call with positional then keyword arguments.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<KwArg>,
    },
    /// Tensor literal `[a, b, ...]`; nested literals form higher dimensions.
    Tns(Vec<Expr>),
    /// Map literal `<k = v, ...>`.
    Map(Vec<(Expr, Expr)>),
    /// `target[i, j, ...]` on tensors, `target<key>` on maps.
    Index { target: Box<Expr>, indices: Vec<Expr> },
    /// Slice `start-end` inside an index list. Missing bounds mean the
    /// first/last element.
    Range {
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },
    /// `*` inside an index list: the whole dimension.
    Wildcard,
}

/// Keyword argument `name = value`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KwArg {
    pub name: String,
    pub value: Expr,
}

impl Expr {
    #[inline]
    pub fn new(kind: ExprKind) -> Self {
        Expr {
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

    pub fn int(v: i64) -> Self {
        Self::new(ExprKind::Int(v))
    }

    pub fn flt(v: f64) -> Self {
        Self::new(ExprKind::Flt(v))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Self::new(ExprKind::Str(s.into()))
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Ident(name.into()))
    }

    pub fn ptr(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Ptr(name.into()))
    }

    /// Call a function by name.
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::call_expr(Expr::ident(name), args, Vec::new())
    }

    /// Call a function by name with keyword arguments.
    pub fn call_kw(name: impl Into<String>, args: Vec<Expr>, kwargs: Vec<KwArg>) -> Self {
        Self::call_expr(Expr::ident(name), args, kwargs)
    }

    /// Call an arbitrary callee expression.
    pub fn call_expr(callee: Expr, args: Vec<Expr>, kwargs: Vec<KwArg>) -> Self {
        Self::new(ExprKind::Call {
            callee: Box::new(callee),
            args,
            kwargs,
        })
    }

    pub fn tns(items: Vec<Expr>) -> Self {
        Self::new(ExprKind::Tns(items))
    }

    pub fn map(pairs: Vec<(Expr, Expr)>) -> Self {
        Self::new(ExprKind::Map(pairs))
    }

    pub fn index(target: Expr, indices: Vec<Expr>) -> Self {
        Self::new(ExprKind::Index {
            target: Box::new(target),
            indices,
        })
    }

    pub fn range(start: Option<Expr>, end: Option<Expr>) -> Self {
        Self::new(ExprKind::Range {
            start: start.map(Box::new),
            end: end.map(Box::new),
        })
    }

    pub fn wildcard() -> Self {
        Self::new(ExprKind::Wildcard)
    }

    /// The identifier name, if this is a plain identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}

impl KwArg {
    pub fn new(name: impl Into<String>, value: Expr) -> Self {
        KwArg {
            name: name.into(),
            value,
        }
    }
}

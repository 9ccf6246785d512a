//! Runtime values.
//!
//! Copy semantics follow the binding model: `Int`/`Float` copy by value,
//! `Str` is duplicated on every copy (Rust `String::clone`), and
//! `Tensor`/`Map`/`Thread` are shared handles, so `clone()` duplicates the
//! handle and mutation through one handle is visible through all of them.
//! [`Value::deep_copy`] is the explicit payload duplication behind `DEEPCOPY`.

mod map;
mod tensor;
mod thread;

use std::fmt;
use std::sync::Arc;

use prefix_ir::{DeclType, FuncDef};

use crate::environment::Scope;

pub use map::{MapData, MapKey, MapRef};
pub use tensor::{Selector, Tensor, TensorError, TensorRef};
pub use thread::{ThreadHandle, ThreadState};

/// A runtime value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    Tensor(TensorRef),
    Map(MapRef),
    Func(FuncValue),
    Thread(ThreadHandle),
}

/// A closure: the shared definition plus the scope it was defined in.
#[derive(Clone)]
pub struct FuncValue {
    def: Arc<FuncDef>,
    closure: Scope,
}

impl FuncValue {
    pub fn new(def: Arc<FuncDef>, closure: Scope) -> Self {
        FuncValue { def, closure }
    }

    #[inline]
    pub fn def(&self) -> &Arc<FuncDef> {
        &self.def
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.def.name
    }

    #[inline]
    pub fn closure(&self) -> &Scope {
        &self.closure
    }

    /// Same definition captured in the same scope.
    pub fn ptr_eq(&self, other: &FuncValue) -> bool {
        Arc::ptr_eq(&self.def, &other.def) && self.closure.ptr_eq(&other.closure)
    }
}

impl fmt::Debug for FuncValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FuncValue({})", self.def.name)
    }
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn tensor(t: Tensor) -> Self {
        Value::Tensor(TensorRef::new(t))
    }

    pub fn map(m: MapData) -> Self {
        Value::Map(MapRef::new(m))
    }

    pub fn bool(b: bool) -> Self {
        Value::Int(i64::from(b))
    }

    /// Runtime type as a declarable type. `Null` has no declarable type.
    pub fn decl_type(&self) -> DeclType {
        match self {
            Value::Null => DeclType::Unknown,
            Value::Int(_) => DeclType::Int,
            Value::Float(_) => DeclType::Flt,
            Value::Str(_) => DeclType::Str,
            Value::Tensor(_) => DeclType::Tns,
            Value::Map(_) => DeclType::Map,
            Value::Func(_) => DeclType::Func,
            Value::Thread(_) => DeclType::Thr,
        }
    }

    /// Type name as reported by `TYPE()` and diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            other => other.decl_type().keyword(),
        }
    }

    /// Whether a binding declared as `ty` accepts this value.
    #[inline]
    pub fn matches_decl(&self, ty: DeclType) -> bool {
        !ty.is_known() || self.decl_type() == ty
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Tensor(t) => !t.read().is_empty(),
            Value::Map(m) => !m.read().is_empty(),
            Value::Func(_) => true,
            Value::Thread(h) => h.is_running(),
            Value::Null => false,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Recursively duplicate tensor and map payloads. Functions and thread
    /// handles stay shared.
    #[must_use]
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Tensor(t) => Value::tensor(t.read().deep_copy()),
            Value::Map(m) => Value::map(m.read().deep_copy()),
            other => other.clone(),
        }
    }

    /// Identity comparison.
    ///
    /// Shared handles compare by allocation. A `Str` is only identical to
    /// itself, so a copied string never is, even when empty.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Tensor(a), Value::Tensor(b)) => TensorRef::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => MapRef::ptr_eq(a, b),
            (Value::Func(a), Value::Func(b)) => a.ptr_eq(b),
            (Value::Thread(a), Value::Thread(b)) => ThreadHandle::ptr_eq(a, b),
            (Value::Str(a), Value::Str(b)) => std::ptr::eq(a, b),
            _ => false,
        }
    }

    /// Structural equality used by `EQ`: same variant and equal contents.
    pub fn deep_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            #[expect(clippy::float_cmp, reason = "EQ compares floats exactly")]
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tensor(a), Value::Tensor(b)) => {
                if TensorRef::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.read(), b.read());
                a.shape() == b.shape() && a.iter().zip(b.iter()).all(|(x, y)| x.deep_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                if MapRef::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.read(), b.read());
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| v.deep_eq(other)))
            }
            (Value::Func(a), Value::Func(b)) => a.ptr_eq(b),
            (Value::Thread(a), Value::Thread(b)) => ThreadHandle::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Render for display inside a container: strings are quoted.
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            other => write!(f, "{other}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.deep_eq(other)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// Binary rendering of an integer: `5` prints as `101`, `-2` as `-10`.
pub fn int_to_binary(n: i64) -> String {
    if n < 0 {
        format!("-{:b}", n.unsigned_abs())
    } else {
        format!("{n:b}")
    }
}

/// Binary rendering of a float with up to 32 fractional bits, trailing
/// zeros trimmed: `2.5` prints as `10.1`, `3.0` as `11.0`.
pub fn float_to_binary(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x < 0.0 { "-INF" } else { "INF" }.to_string();
    }
    let negative = x < 0.0;
    let x = x.abs();
    let whole = x.trunc();
    let mut frac = x - whole;

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "whole part is non-negative and saturates on overflow"
    )]
    let whole_bits = format!("{:b}", whole as u64);

    let mut frac_bits = String::new();
    for _ in 0..32 {
        if frac <= 0.0 {
            break;
        }
        frac *= 2.0;
        if frac >= 1.0 {
            frac_bits.push('1');
            frac -= 1.0;
        } else {
            frac_bits.push('0');
        }
    }
    let frac_bits = frac_bits.trim_end_matches('0');
    let sign = if negative { "-" } else { "" };
    if frac_bits.is_empty() {
        format!("{sign}{whole_bits}.0")
    } else {
        format!("{sign}{whole_bits}.{frac_bits}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("<null>"),
            Value::Int(n) => f.write_str(&int_to_binary(*n)),
            Value::Float(x) => f.write_str(&float_to_binary(*x)),
            Value::Str(s) => f.write_str(s),
            Value::Tensor(t) => t.read().fmt_with(f, Value::fmt_nested),
            Value::Map(m) => {
                let m = m.read();
                f.write_str("<")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    k.to_value().fmt_nested(f)?;
                    f.write_str(" = ")?;
                    v.fmt_nested(f)?;
                }
                f.write_str(">")
            }
            Value::Func(func) => write!(f, "<func {}>", func.name()),
            Value::Thread(_) => f.write_str("<thread>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Tensor(_) | Value::Map(_) => write!(f, "{}({self})", self.type_name()),
            Value::Func(func) => write!(f, "{func:?}"),
            Value::Thread(h) => write!(f, "{h:?}"),
        }
    }
}

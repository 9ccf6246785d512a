//! Length, shape and map projections.

use super::{BuiltinCall, BuiltinEntry, BuiltinRegistry};
use crate::errors::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::{Tensor, Value};

pub(super) fn register(reg: &mut BuiltinRegistry) {
    reg.add("LEN", BuiltinEntry::new(1, Some(1), len));
    reg.add("SHAPE", BuiltinEntry::new(1, Some(1), shape));
    reg.add("KEYS", BuiltinEntry::new(1, Some(1), keys));
    reg.add("VALUES", BuiltinEntry::new(1, Some(1), values));
}

fn int_of(n: usize) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

/// Characters of a STR, the leading dimension of a TNS, entries of a MAP.
fn len(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    match call.arg(0) {
        Value::Str(s) => Ok(int_of(s.chars().count())),
        Value::Tensor(t) => Ok(int_of(t.read().shape().first().copied().unwrap_or(0))),
        Value::Map(m) => Ok(int_of(m.read().len())),
        _ => Err(EvalError::new("LEN expects STR, TNS or MAP")),
    }
}

fn shape(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    let Value::Tensor(t) = call.arg(0) else {
        return Err(EvalError::new("SHAPE expects TNS argument"));
    };
    let dims = t.read().shape().iter().map(|&d| int_of(d)).collect();
    Ok(Value::tensor(Tensor::vector(dims)))
}

/// Keys in insertion order. All keys must share one type.
fn keys(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    let Value::Map(m) = call.arg(0) else {
        return Err(EvalError::new("KEYS expects MAP argument"));
    };
    let items: Vec<Value> = m.read().keys().map(|k| k.to_value()).collect();
    uniform(items, "KEYS: mixed key types in map")
}

/// Values in insertion order. All values must share one type.
fn values(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    let Value::Map(m) = call.arg(0) else {
        return Err(EvalError::new("VALUES expects MAP argument"));
    };
    let items: Vec<Value> = m.read().values().cloned().collect();
    uniform(items, "VALUES: mixed value types in map")
}

fn uniform(items: Vec<Value>, mixed: &'static str) -> EvalResult {
    if let Some(first) = items.first() {
        let ty = first.decl_type();
        if items.iter().any(|v| v.decl_type() != ty) {
            return Err(EvalError::new(mixed));
        }
    }
    Ok(Value::tensor(Tensor::vector(items)))
}

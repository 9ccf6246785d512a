//! Comparison and logic. Results are INT `1`/`0`.

use super::{num_pair, BuiltinCall, BuiltinEntry, BuiltinRegistry, NumPair};
use crate::errors::EvalResult;
use crate::interpreter::Interpreter;
use crate::value::Value;

pub(super) fn register(reg: &mut BuiltinRegistry) {
    reg.add("EQ", BuiltinEntry::new(2, Some(2), eq));
    reg.add("GT", BuiltinEntry::new(2, Some(2), |_, c| ordered(c, |o| o.is_gt())));
    reg.add("LT", BuiltinEntry::new(2, Some(2), |_, c| ordered(c, |o| o.is_lt())));
    reg.add("GTE", BuiltinEntry::new(2, Some(2), |_, c| ordered(c, |o| o.is_ge())));
    reg.add("LTE", BuiltinEntry::new(2, Some(2), |_, c| ordered(c, |o| o.is_le())));

    reg.add(
        "AND",
        BuiltinEntry::new(2, Some(2), |_, c| {
            Ok(Value::bool(c.arg(0).is_truthy() && c.arg(1).is_truthy()))
        }),
    );
    reg.add(
        "OR",
        BuiltinEntry::new(2, Some(2), |_, c| {
            Ok(Value::bool(c.arg(0).is_truthy() || c.arg(1).is_truthy()))
        }),
    );
    reg.add(
        "NOT",
        BuiltinEntry::new(1, Some(1), |_, c| Ok(Value::bool(!c.arg(0).is_truthy()))),
    );
    reg.add(
        "BOOL",
        BuiltinEntry::new(1, Some(1), |_, c| Ok(Value::bool(c.arg(0).is_truthy()))),
    );
}

/// Structural equality; values of different types are never equal.
fn eq(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    Ok(Value::bool(call.arg(0).deep_eq(call.arg(1))))
}

/// Numeric ordering. A NaN operand compares false against everything.
fn ordered(call: &BuiltinCall<'_>, test: fn(std::cmp::Ordering) -> bool) -> EvalResult {
    let ord = match num_pair(call)? {
        NumPair::Int(a, b) => Some(a.cmp(&b)),
        NumPair::Flt(a, b) => a.partial_cmp(&b),
    };
    Ok(Value::bool(ord.is_some_and(test)))
}

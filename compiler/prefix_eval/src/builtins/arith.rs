//! Arithmetic operators.
//!
//! Both operands must have the same numeric type; there is no implicit
//! INT/FLT promotion. Integer arithmetic wraps.

use prefix_ir::DeclType;

use super::{num_pair, BuiltinCall, BuiltinEntry, BuiltinRegistry, NumPair};
use crate::errors::{division_by_zero, EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::Value;

pub(super) fn register(reg: &mut BuiltinRegistry) {
    reg.add("ADD", BuiltinEntry::new(2, Some(2), add));
    reg.add("SUB", BuiltinEntry::new(2, Some(2), sub));
    reg.add("MUL", BuiltinEntry::new(2, Some(2), mul));
    reg.add("DIV", BuiltinEntry::new(2, Some(2), div));
    reg.add("MOD", BuiltinEntry::new(2, Some(2), modulo));
    reg.add("NEG", BuiltinEntry::new(1, Some(1), neg));
    reg.add("ABS", BuiltinEntry::new(1, Some(1), abs));
    reg.add(
        "ROUND",
        BuiltinEntry::new(1, Some(3), round).with_params(&["x", "ndigits", "mode"]),
    );
}

/// `ADD(@x, n)` stores the result back into `x` as well as returning it.
/// A failed store is reported through the sticky error slot.
fn write_back(interp: &mut Interpreter, call: &BuiltinCall<'_>, result: Value) -> EvalResult {
    if let Some(name) = call.ptr_target(0) {
        let stored = interp
            .namespace()
            .assign(&call.scope, name, result.clone(), DeclType::Unknown, false);
        if stored.is_err() {
            interp.raise(EvalError::new(format!("{} writeback failed", call.name)));
            return Ok(Value::Null);
        }
    }
    Ok(result)
}

fn add(interp: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    let result = match num_pair(call)? {
        NumPair::Int(a, b) => Value::Int(a.wrapping_add(b)),
        NumPair::Flt(a, b) => Value::Float(a + b),
    };
    write_back(interp, call, result)
}

fn sub(interp: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    let result = match num_pair(call)? {
        NumPair::Int(a, b) => Value::Int(a.wrapping_sub(b)),
        NumPair::Flt(a, b) => Value::Float(a - b),
    };
    write_back(interp, call, result)
}

fn mul(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    Ok(match num_pair(call)? {
        NumPair::Int(a, b) => Value::Int(a.wrapping_mul(b)),
        NumPair::Flt(a, b) => Value::Float(a * b),
    })
}

fn div(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    match num_pair(call)? {
        NumPair::Int(_, 0) => Err(division_by_zero()),
        NumPair::Int(a, b) => Ok(Value::Int(a.wrapping_div(b))),
        NumPair::Flt(_, b) if b == 0.0 => Err(division_by_zero()),
        NumPair::Flt(a, b) => Ok(Value::Float(a / b)),
    }
}

/// Remainder against `|b|`; the sign follows the dividend.
fn modulo(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    match num_pair(call)? {
        NumPair::Int(_, 0) => Err(division_by_zero()),
        NumPair::Int(a, b) => Ok(Value::Int(a.wrapping_rem(b.wrapping_abs()))),
        NumPair::Flt(_, b) if b == 0.0 => Err(division_by_zero()),
        NumPair::Flt(a, b) => Ok(Value::Float(a % b.abs())),
    }
}

fn neg(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    match call.arg(0) {
        Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
        Value::Float(x) => Ok(Value::Float(-x)),
        _ => Err(EvalError::new("NEG expects INT or FLT argument")),
    }
}

fn abs(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    match call.arg(0) {
        Value::Int(n) => Ok(Value::Int(n.wrapping_abs())),
        Value::Float(x) => Ok(Value::Float(x.abs())),
        _ => Err(EvalError::new("ABS expects INT or FLT argument")),
    }
}

/// `ROUND(x, ndigits = 0, mode = "floor")`, with `ndigits` counted in
/// binary places.
///
/// On an INT a non-negative `ndigits` is a no-op; a negative one rounds
/// toward zero to a multiple of `2^-ndigits`.
fn round(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    let places = match call.args.get(1) {
        None | Some(Value::Null) => 0,
        Some(_) => call.int(1)?,
    };
    let mode = match call.args.get(2) {
        None | Some(Value::Null) => "floor",
        Some(Value::Str(s)) => s.as_str(),
        Some(_) => return Err(EvalError::new("ROUND expects STR mode")),
    };

    match call.arg(0) {
        Value::Int(n) => {
            if places >= 0 {
                return Ok(Value::Int(*n));
            }
            let shift = places.unsigned_abs();
            if shift >= 63 {
                return Ok(Value::Int(0));
            }
            let factor = 1_i64 << shift;
            Ok(Value::Int(n / factor * factor))
        }
        Value::Float(x) => {
            #[expect(
                clippy::cast_precision_loss,
                reason = "binary place counts are small"
            )]
            let factor = 2.0_f64.powf(places as f64);
            let scaled = x * factor;
            let rounded = match mode {
                "floor" => scaled.floor(),
                "ceiling" | "ceil" => scaled.ceil(),
                "zero" => scaled.trunc(),
                "logical" | "half-up" => scaled.round(),
                _ => return Err(EvalError::new("Unknown ROUND mode")),
            };
            Ok(Value::Float(rounded / factor))
        }
        _ => Err(EvalError::new("ROUND expects INT or FLT argument")),
    }
}

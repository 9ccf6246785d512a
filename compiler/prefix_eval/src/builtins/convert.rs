//! Conversions and type predicates.
//!
//! Strings convert through their binary spelling: `INT("101")` is `5`,
//! `FLT("1.1")` is `1.5`.

use super::{BuiltinCall, BuiltinEntry, BuiltinRegistry};
use crate::errors::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::Value;

pub(super) fn register(reg: &mut BuiltinRegistry) {
    reg.add("INT", BuiltinEntry::new(1, Some(1), to_int));
    reg.add("FLT", BuiltinEntry::new(1, Some(1), to_flt));
    reg.add("STR", BuiltinEntry::new(1, Some(1), to_str));
    reg.add(
        "TYPE",
        BuiltinEntry::new(1, Some(1), |_, c| Ok(Value::string(c.arg(0).type_name()))),
    );
    reg.add(
        "ISINT",
        BuiltinEntry::new(1, Some(1), |_, c| {
            Ok(Value::bool(matches!(c.arg(0), Value::Int(_))))
        }),
    );
    reg.add(
        "ISFLT",
        BuiltinEntry::new(1, Some(1), |_, c| {
            Ok(Value::bool(matches!(c.arg(0), Value::Float(_))))
        }),
    );
    reg.add(
        "ISSTR",
        BuiltinEntry::new(1, Some(1), |_, c| {
            Ok(Value::bool(matches!(c.arg(0), Value::Str(_))))
        }),
    );
    reg.add(
        "ISTNS",
        BuiltinEntry::new(1, Some(1), |_, c| {
            Ok(Value::bool(matches!(c.arg(0), Value::Tensor(_))))
        }),
    );
}

fn to_int(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    match call.arg(0) {
        Value::Int(n) => Ok(Value::Int(*n)),
        #[expect(
            clippy::cast_possible_truncation,
            reason = "INT truncates toward zero and saturates"
        )]
        Value::Float(x) => Ok(Value::Int(*x as i64)),
        Value::Str(s) => Ok(Value::Int(parse_binary_int(s))),
        _ => Err(EvalError::new("INT expects INT, FLT, or STR argument")),
    }
}

/// Empty parses as `0`; anything that is not an optionally negated run of
/// binary digits parses as `1`.
pub(crate) fn parse_binary_int(s: &str) -> i64 {
    if s.is_empty() {
        return 0;
    }
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b == b'0' || b == b'1') {
        return 1;
    }
    let magnitude = i64::from_str_radix(digits, 2).unwrap_or(i64::MAX);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

fn to_flt(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    match call.arg(0) {
        Value::Float(x) => Ok(Value::Float(*x)),
        #[expect(clippy::cast_precision_loss, reason = "FLT of a large INT rounds")]
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Str(s) => Ok(Value::Float(parse_binary_float(s))),
        _ => Err(EvalError::new("FLT expects INT, FLT, or STR argument")),
    }
}

/// `[-]int[.frac]` in binary. `INF`, `-INF` and `NaN` are accepted
/// literally; characters other than `0`/`1` are skipped.
pub(crate) fn parse_binary_float(s: &str) -> f64 {
    match s {
        "" => return 0.0,
        "INF" => return f64::INFINITY,
        "-INF" => return f64::NEG_INFINITY,
        "NaN" => return f64::NAN,
        _ => {}
    }
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));

    let mut value = 0.0;
    for b in int_part.bytes() {
        match b {
            b'0' => value *= 2.0,
            b'1' => value = value * 2.0 + 1.0,
            _ => {}
        }
    }
    let mut weight = 0.5;
    for b in frac_part.bytes() {
        match b {
            b'0' => weight /= 2.0,
            b'1' => {
                value += weight;
                weight /= 2.0;
            }
            _ => {}
        }
    }
    if negative {
        -value
    } else {
        value
    }
}

/// Scalars and functions render as they print; containers and null give
/// the empty string.
fn to_str(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    Ok(match call.arg(0) {
        v @ (Value::Int(_) | Value::Float(_) | Value::Str(_) | Value::Func(_)) => {
            Value::string(v.to_string())
        }
        _ => Value::string(""),
    })
}

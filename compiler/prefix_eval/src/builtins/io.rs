//! Output and raised errors.

use super::{BuiltinCall, BuiltinEntry, BuiltinRegistry};
use crate::errors::{assertion_failed, EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::Value;

pub(super) fn register(reg: &mut BuiltinRegistry) {
    reg.add("PRINT", BuiltinEntry::new(0, None, print));
    reg.add("THROW", BuiltinEntry::new(0, Some(1), throw));
    reg.add("ASSERT", BuiltinEntry::new(1, Some(1), assert));
}

/// Arguments separated by single spaces, then a newline.
fn print(interp: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    let line = call
        .args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    interp.print_handler().println(&line);
    Ok(Value::Null)
}

/// `THROW("msg")` raises `msg`; any other argument, or none, raises a
/// generic exception.
fn throw(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    match call.args.first() {
        Some(Value::Str(msg)) => Err(EvalError::new(msg.clone())),
        _ => Err(EvalError::new("Exception thrown")),
    }
}

fn assert(_: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    if call.arg(0).is_truthy() {
        Ok(Value::Int(1))
    } else {
        Err(assertion_failed())
    }
}

//! Operators on bindings rather than values.
//!
//! The identifier operand is passed unevaluated; these operators read the
//! name from the AST and go through the namespace service.

use prefix_ir::{DeclType, ExprKind};

use super::{BuiltinCall, BuiltinEntry, BuiltinRegistry};
use crate::environment::{EnvError, FrozenState};
use crate::errors::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::Value;

pub(super) fn register(reg: &mut BuiltinRegistry) {
    reg.add("DEL", lazy_ident(1, Some(1), del));
    reg.add("FREEZE", lazy_ident(1, Some(1), freeze));
    reg.add("THAW", lazy_ident(1, Some(1), thaw));
    reg.add("PERMAFREEZE", lazy_ident(1, Some(1), permafreeze));
    reg.add("FROZEN", lazy_ident(1, Some(1), frozen));
    reg.add("PERMAFROZEN", lazy_ident(1, Some(1), permafrozen));
    reg.add("EXIST", lazy_ident(1, Some(1), exist));
    reg.add("ASSIGN", lazy_ident(2, Some(2), assign));
    reg.add(
        "COPY",
        BuiltinEntry::new(1, Some(1), |_, c| Ok(c.arg(0).clone())),
    );
    reg.add(
        "DEEPCOPY",
        BuiltinEntry::new(1, Some(1), |_, c| Ok(c.arg(0).deep_copy())),
    );
}

type OpFn = fn(&mut Interpreter, &BuiltinCall<'_>) -> EvalResult;

/// Entry whose first operand is an unevaluated identifier.
fn lazy_ident(min: usize, max: Option<usize>, f: OpFn) -> BuiltinEntry {
    BuiltinEntry::new(min, max, f).with_lazy(&[0])
}

fn ident<'c>(call: &'c BuiltinCall<'_>) -> Result<&'c str, EvalError> {
    call.ident(0)
        .ok_or_else(|| EvalError::new(format!("{} expects an identifier", call.name)))
}

fn del(interp: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    let name = ident(call)?;
    let ns = interp.namespace();
    match ns.get_entry(&call.scope, name) {
        Some(entry) if entry.initialized => {
            if entry.frozen || entry.permafrozen {
                return Err(EvalError::new(format!(
                    "Cannot delete frozen identifier '{name}'"
                )));
            }
        }
        _ => {
            return Err(EvalError::new(format!(
                "Cannot delete undefined identifier '{name}'"
            )))
        }
    }
    ns.delete(&call.scope, name)
        .map_err(|_| EvalError::new(format!("Cannot delete identifier '{name}'")))?;
    Ok(Value::Int(0))
}

fn freeze(interp: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    let name = ident(call)?;
    interp
        .namespace()
        .freeze(&call.scope, name)
        .map_err(|_| EvalError::new(format!("FREEZE: identifier '{name}' not found")))?;
    Ok(Value::Int(0))
}

fn thaw(interp: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    let name = ident(call)?;
    match interp.namespace().thaw(&call.scope, name) {
        Ok(()) => Ok(Value::Int(0)),
        Err(EnvError::Permafrozen(_)) => Err(EvalError::new(format!(
            "THAW: identifier '{name}' is permanently frozen"
        ))),
        Err(_) => Err(EvalError::new(format!(
            "THAW: identifier '{name}' not found"
        ))),
    }
}

fn permafreeze(interp: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    let name = ident(call)?;
    interp
        .namespace()
        .permafreeze(&call.scope, name)
        .map_err(|_| EvalError::new(format!("PERMAFREEZE: identifier '{name}' not found")))?;
    Ok(Value::Int(0))
}

/// `-1` permanently frozen, `1` frozen, `0` thawed or missing.
fn frozen(interp: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    let name = ident(call)?;
    let state = interp.namespace().frozen_state(&call.scope, name);
    Ok(Value::Int(state.map_or(0, FrozenState::code)))
}

fn permafrozen(interp: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    let name = ident(call)?;
    let state = interp.namespace().frozen_state(&call.scope, name);
    Ok(Value::bool(state == Some(FrozenState::Permafrozen)))
}

/// `0` for anything that is not a bound identifier, never an error.
fn exist(interp: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    let found = call
        .ident(0)
        .is_some_and(|name| interp.namespace().exists(&call.scope, name));
    Ok(Value::bool(found))
}

/// `ASSIGN(target, value)` stores into a declared identifier or an indexed
/// location and returns the stored value.
fn assign(interp: &mut Interpreter, call: &BuiltinCall<'_>) -> EvalResult {
    let value = call.arg(1).clone();
    let Some(target) = call.node(0) else {
        return Err(EvalError::new("ASSIGN: missing target expression"));
    };
    match &target.kind {
        ExprKind::Ident(name) => {
            let ns = interp.namespace();
            let Some(entry) = ns.get_entry(&call.scope, name) else {
                return Err(EvalError::new(
                    "ASSIGN requires target identifier to be declared",
                ));
            };
            if !value.matches_decl(entry.declared_type) {
                return Err(EvalError::new("ASSIGN: type mismatch"));
            }
            ns.assign(&call.scope, name, value.clone(), DeclType::Unknown, false)
                .map_err(|_| EvalError::new("ASSIGN: cannot assign to target (frozen?)"))?;
            Ok(value)
        }
        ExprKind::Index { .. } => {
            interp.assign_index(target, value.clone())?;
            Ok(value)
        }
        _ => Err(EvalError::new("ASSIGN: unsupported target expression")),
    }
}

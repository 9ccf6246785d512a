//! Function calls: builtins first, then user functions.

use std::sync::Arc;

use prefix_ir::{DeclType, Expr, FuncDef, KwArg, Location, Param};
use smallvec::SmallVec;

use super::{Flow, Interpreter};
use crate::builtins::{BuiltinCall, BuiltinEntry};
use crate::diagnostics::CallFrame;
use crate::errors::{arity_mismatch, from_env, label_not_found, unknown_function, EvalError, EvalResult};
use crate::value::{FuncValue, MapData, Value};

impl Interpreter {
    /// Resolve and call `callee`.
    ///
    /// A plain name resolves to, in order: a builtin, a named user
    /// function, a variable holding a function.
    pub(super) fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        kwargs: &[KwArg],
        loc: Location,
    ) -> EvalResult {
        let Some(name) = callee.as_ident() else {
            return match self.eval_expr(callee)? {
                Value::Func(func) => self.call_function(&func, args, kwargs, loc),
                other => Err(EvalError::new(format!(
                    "Cannot call a {} value",
                    other.type_name()
                ))),
            };
        };

        if let Some(entry) = self.builtins.get(name).cloned() {
            return self.call_builtin(name, &entry, args, kwargs, loc);
        }
        if let Some(func) = self.functions.get(name).cloned() {
            return self.call_function(&func, args, kwargs, loc);
        }
        match self.ns.get(&self.scope, name) {
            Some(binding) if binding.initialized => match binding.value {
                Value::Func(func) => self.call_function(&func, args, kwargs, loc),
                other => Err(EvalError::new(format!(
                    "'{name}' is a {} value, not a function",
                    other.type_name()
                ))),
            },
            _ => Err(unknown_function(name)),
        }
    }

    fn call_builtin(
        &mut self,
        name: &str,
        entry: &BuiltinEntry,
        args: &[Expr],
        kwargs: &[KwArg],
        loc: Location,
    ) -> EvalResult {
        let mut slots: SmallVec<[Option<(&Expr, Value)>; 4]> = SmallVec::new();
        for (i, arg) in args.iter().enumerate() {
            let value = if entry.is_lazy(i) {
                Value::Null
            } else {
                self.eval_expr(arg)?
            };
            slots.push(Some((arg, value)));
        }

        for (k, kw) in kwargs.iter().enumerate() {
            if kwargs[..k].iter().any(|prev| prev.name == kw.name) {
                return Err(EvalError::new(format!(
                    "Duplicate keyword argument '{}'",
                    kw.name
                )));
            }
            let Some(pos) = entry.param_index(&kw.name) else {
                return Err(EvalError::new(format!(
                    "{name} has no keyword parameter '{}'",
                    kw.name
                )));
            };
            if slots.get(pos).is_some_and(Option::is_some) {
                return Err(EvalError::new(format!(
                    "Duplicate argument for parameter '{}'",
                    kw.name
                )));
            }
            let value = self.eval_expr(&kw.value)?;
            if slots.len() <= pos {
                slots.resize(pos + 1, None);
            }
            slots[pos] = Some((&kw.value, value));
        }

        let got = slots.len();
        if got < entry.min || entry.max.is_some_and(|max| got > max) {
            return Err(arity_mismatch(name, entry.min, entry.max, got));
        }

        let mut nodes = SmallVec::with_capacity(got);
        let mut values = SmallVec::with_capacity(got);
        for (i, slot) in slots.into_iter().enumerate() {
            match slot {
                Some((node, value)) => {
                    nodes.push(Some(node));
                    values.push(value);
                }
                None if i >= entry.min => {
                    nodes.push(None);
                    values.push(Value::Null);
                }
                None => {
                    let param = entry.params.get(i).copied().unwrap_or("?");
                    return Err(EvalError::new(format!(
                        "{name} is missing argument '{param}'"
                    )));
                }
            }
        }

        let call = BuiltinCall {
            name,
            args: values,
            nodes,
            scope: self.scope.clone(),
            loc,
        };
        let result = (entry.func)(self, &call);
        self.settle(result, loc)
    }

    /// Call a user function.
    ///
    /// Arguments are evaluated in the caller's scope; the body runs in a
    /// fresh child of the closure scope.
    pub fn call_function(
        &mut self,
        func: &FuncValue,
        args: &[Expr],
        kwargs: &[KwArg],
        loc: Location,
    ) -> EvalResult {
        let def = Arc::clone(func.def());
        let name = def.name.as_str();

        let positional: SmallVec<[&Param; 4]> =
            def.params.iter().filter(|p| !p.is_keyword()).collect();
        if args.len() != positional.len() {
            return Err(arity_mismatch(
                name,
                positional.len(),
                Some(positional.len()),
                args.len(),
            ));
        }
        for (k, kw) in kwargs.iter().enumerate() {
            if kwargs[..k].iter().any(|prev| prev.name == kw.name) {
                return Err(EvalError::new(format!(
                    "Duplicate keyword argument '{}'",
                    kw.name
                )));
            }
            match def.params.iter().find(|p| p.name == kw.name) {
                None => {
                    return Err(EvalError::new(format!(
                        "{name} has no parameter '{}'",
                        kw.name
                    )))
                }
                Some(p) if !p.is_keyword() => {
                    return Err(EvalError::new(format!(
                        "Parameter '{}' of {name} cannot be passed by keyword",
                        kw.name
                    )))
                }
                Some(_) => {}
            }
        }

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval_expr(arg)?);
        }
        let mut kw_values = Vec::with_capacity(kwargs.len());
        for kw in kwargs {
            kw_values.push((kw.name.as_str(), self.eval_expr(&kw.value)?));
        }

        self.call_stack.push(CallFrame {
            name: name.to_owned(),
            call_site: loc,
        })?;
        tracing::debug!(function = name, depth = self.call_stack.depth(), "call");

        let callee_scope = func.closure().child();
        let saved_scope = std::mem::replace(&mut self.scope, callee_scope);
        let saved_loops = std::mem::take(&mut self.loop_depth);

        let result = self
            .bind_params(&def, arg_values, kw_values)
            .and_then(|()| self.exec_block(&def.body))
            .and_then(|flow| self.finish_call(&def, flow))
            .map_err(|e| self.call_stack.attach_backtrace(e));

        self.scope = saved_scope;
        self.loop_depth = saved_loops;
        self.call_stack.pop();
        result
    }

    fn bind_params(
        &mut self,
        def: &FuncDef,
        args: Vec<Value>,
        mut kwargs: Vec<(&str, Value)>,
    ) -> Result<(), EvalError> {
        let scope = self.scope.clone();
        let mut args = args.into_iter();
        for param in &def.params {
            let value = match &param.default {
                None => args.next().unwrap_or_default(),
                Some(default) => match kwargs.iter().position(|(n, _)| *n == param.name) {
                    Some(i) => kwargs.swap_remove(i).1,
                    // Defaults see the parameters bound before them.
                    None => self.eval_expr(default)?,
                },
            };
            if !value.matches_decl(param.decl_type) {
                return Err(EvalError::new(format!(
                    "Type mismatch for parameter '{}' of {}: expected {} but got {}",
                    param.name,
                    def.name,
                    param.decl_type.keyword(),
                    value.type_name()
                )));
            }
            self.ns
                .define(&scope, &param.name, param.decl_type)
                .and_then(|()| {
                    self.ns
                        .assign(&scope, &param.name, value, DeclType::Unknown, false)
                })
                .map_err(|e| from_env(&param.name, &e))?;
        }
        Ok(())
    }

    fn finish_call(&mut self, def: &FuncDef, flow: Flow) -> EvalResult {
        let value = match flow {
            Flow::Return(v) => v,
            Flow::Normal => default_return(def)?,
            Flow::Goto(key) => return Err(label_not_found(&key.display())),
            // Loop depth is reset per call, so BREAK/CONTINUE cannot escape.
            Flow::Break(_) | Flow::Continue => Value::Null,
        };
        let ret = def.return_type;
        if !value.matches_decl(ret) {
            return Err(EvalError::new(format!(
                "Return type mismatch in function '{}': expected {} but got {}",
                def.name,
                ret.keyword(),
                value.type_name()
            )));
        }
        Ok(value)
    }
}

/// Value of a call that fell off the end of its body.
fn default_return(def: &FuncDef) -> EvalResult {
    match def.return_type {
        DeclType::Int => Ok(Value::Int(0)),
        DeclType::Flt => Ok(Value::Float(0.0)),
        DeclType::Str => Ok(Value::Str(String::new())),
        DeclType::Map => Ok(Value::map(MapData::new())),
        DeclType::Unknown => Ok(Value::Null),
        ty @ (DeclType::Tns | DeclType::Func | DeclType::Thr) => Err(EvalError::new(format!(
            "{}-returning function '{}' must return a value",
            ty.keyword(),
            def.name
        ))),
    }
}

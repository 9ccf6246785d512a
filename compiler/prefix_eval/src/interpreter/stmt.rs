//! Statement execution.

use std::sync::Arc;

use prefix_ir::{DeclType, ElseIf, Expr, ExprKind, FuncDef, Location, Stmt, StmtKind};
use prefix_stack::ensure_sufficient_stack;
use rustc_hash::FxHashMap;

use super::{map_key, Flow, Interpreter, LabelKey};
use crate::environment::{EnvError, FrozenState};
use crate::errors::{
    break_depth_exceeded, continue_outside_loop, from_env, frozen_identifier, type_mismatch,
    undefined_identifier, uninitialized, EvalError,
};
use crate::value::{FuncValue, Value};

type ExecResult = Result<Flow, EvalError>;

impl Interpreter {
    /// Execute a statement list in the current scope.
    ///
    /// Labels (`GOTOPOINT`) are collected first; a `GOTO` to one of them
    /// moves the cursor, any other `GOTO` is handed to the enclosing block.
    pub fn exec_block(&mut self, stmts: &[Stmt]) -> ExecResult {
        let labels = self.collect_labels(stmts)?;
        let mut pc = 0;
        while let Some(stmt) = stmts.get(pc) {
            match self.exec_stmt(stmt)? {
                Flow::Normal => pc += 1,
                Flow::Goto(key) => match labels.get(&key) {
                    Some(&target) => pc = target,
                    None => return Ok(Flow::Goto(key)),
                },
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn collect_labels(&mut self, stmts: &[Stmt]) -> Result<FxHashMap<LabelKey, usize>, EvalError> {
        let mut labels = FxHashMap::default();
        for (i, stmt) in stmts.iter().enumerate() {
            let StmtKind::Label(key) = &stmt.kind else {
                continue;
            };
            let key = self.label_key(key, "GOTOPOINT")?;
            if labels.insert(key.clone(), i).is_some() {
                return Err(EvalError::new(format!(
                    "Duplicate GOTOPOINT label {}",
                    key.display()
                ))
                .at(stmt.loc));
            }
        }
        Ok(labels)
    }

    fn label_key(&mut self, expr: &Expr, what: &str) -> Result<LabelKey, EvalError> {
        let v = self.eval_expr(expr)?;
        LabelKey::from_value(&v).ok_or_else(|| {
            EvalError::new(format!("{what} expects INT or STR, got {}", v.type_name()))
                .at(expr.loc)
        })
    }

    /// Execute one statement.
    pub fn exec_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        ensure_sufficient_stack(|| {
            self.tick().map_err(|e| e.at(stmt.loc))?;
            self.exec_stmt_inner(stmt)
                .map_err(|e| self.call_stack.attach_backtrace(e.at(stmt.loc)))
        })
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt) -> ExecResult {
        let loc = stmt.loc;
        match &stmt.kind {
            StmtKind::Block(body) => self.exec_block(body),
            StmtKind::Expr(e) => {
                self.eval_expr(e)?;
                Ok(Flow::Normal)
            }
            StmtKind::Assign {
                decl_type,
                name,
                value,
            } => {
                self.exec_assign(*decl_type, name, value)?;
                Ok(Flow::Normal)
            }
            StmtKind::IndexAssign { target, value } => {
                let value = self.eval_expr(value)?;
                self.assign_index(target, value)?;
                Ok(Flow::Normal)
            }
            StmtKind::Decl { decl_type, name } => {
                let scope = self.scope.clone();
                match self.ns.define(&scope, name, *decl_type) {
                    Ok(()) => Ok(Flow::Normal),
                    Err(EnvError::AlreadyDefined(_)) => Err(EvalError::new(format!(
                        "Cannot redeclare identifier '{name}'"
                    ))),
                    Err(e) => Err(from_env(name, &e)),
                }
            }
            StmtKind::If {
                cond,
                then_branch,
                elifs,
                else_branch,
            } => self.exec_if(cond, then_branch, elifs, else_branch.as_deref()),
            StmtKind::While { cond, body } => self.in_loop(|this| this.exec_while(cond, body)),
            StmtKind::For {
                counter,
                target,
                body,
            } => self.in_loop(|this| this.exec_for(counter, target, body)),
            StmtKind::Func(def) => {
                self.define_function(def)?;
                Ok(Flow::Normal)
            }
            StmtKind::Return(e) => Ok(Flow::Return(self.eval_expr(e)?)),
            StmtKind::Pop(name) => self.exec_pop(name),
            StmtKind::Break(count) => {
                let n = self.eval_expr(count)?;
                let Value::Int(n) = n else {
                    return Err(EvalError::new(format!(
                        "BREAK expects INT argument, got {}",
                        n.type_name()
                    )));
                };
                let in_range = usize::try_from(n).is_ok_and(|n| n >= 1 && n <= self.loop_depth);
                if !in_range {
                    return Err(break_depth_exceeded(n, self.loop_depth));
                }
                Ok(Flow::Break(n))
            }
            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    return Err(continue_outside_loop());
                }
                Ok(Flow::Continue)
            }
            StmtKind::Try {
                body,
                catch_name,
                catch_body,
            } => self.exec_try(body, catch_name.as_deref(), catch_body, loc),
            StmtKind::Goto(target) => Ok(Flow::Goto(self.label_key(target, "GOTO")?)),
            StmtKind::Label(_) => Ok(Flow::Normal),
        }
    }

    fn exec_assign(&mut self, decl_type: Option<DeclType>, name: &str, value: &Expr) -> Result<(), EvalError> {
        let scope = self.scope.clone();
        let ty = decl_type.unwrap_or(DeclType::Unknown);

        if let ExprKind::Ptr(target) = &value.kind {
            return self
                .ns
                .set_alias(&scope, name, target, ty, decl_type.is_some())
                .map_err(|e| {
                    EvalError::new(format!("Cannot create alias '{name}' -> '{target}': {e}"))
                });
        }

        let v = self.eval_expr(value)?;
        if decl_type.is_some() {
            if !v.matches_decl(ty) {
                return Err(type_mismatch(ty.keyword(), v.type_name()));
            }
            return self
                .ns
                .assign(&scope, name, v, ty, true)
                .map_err(|e| from_env(name, &e));
        }
        self.ns
            .assign(&scope, name, v, DeclType::Unknown, false)
            .map_err(|e| from_env(name, &e))
    }

    /// Store `value` at `target[...]` / `target<...>`.
    ///
    /// The container is shared, so the write is visible through every
    /// binding holding it. The root identifier must not be frozen.
    pub(crate) fn assign_index(&mut self, target: &Expr, value: Value) -> Result<(), EvalError> {
        let ExprKind::Index {
            target: container,
            indices,
        } = &target.kind
        else {
            return Err(EvalError::new("Index assignment requires an indexed target"));
        };

        if let Some(root) = root_ident(container) {
            let scope = self.scope.clone();
            match self.ns.frozen_state(&scope, root) {
                Some(FrozenState::Frozen | FrozenState::Permafrozen) => {
                    return Err(frozen_identifier(root));
                }
                Some(FrozenState::Thawed) => {}
                None => return Err(undefined_identifier(root)),
            }
        }

        match self.eval_expr(container)? {
            Value::Tensor(t) => {
                let idx = self.eval_int_indices(indices)?;
                t.write().set(&idx, value)?;
                Ok(())
            }
            Value::Map(m) => {
                let mut keys = Vec::with_capacity(indices.len());
                for index in indices {
                    keys.push(map_key(&self.eval_expr(index)?)?);
                }
                let Some((last, path)) = keys.split_last() else {
                    return Err(EvalError::new("Map index requires a key"));
                };
                let mut current = m;
                for key in path {
                    let next = match current.read().get(key) {
                        Some(Value::Map(inner)) => inner.clone(),
                        Some(other) => {
                            return Err(EvalError::new(format!(
                                "Cannot index {} with a map key",
                                other.type_name()
                            )))
                        }
                        None => {
                            return Err(EvalError::new(format!(
                                "Key {} not found",
                                key.to_value()
                            )))
                        }
                    };
                    current = next;
                }
                current.write().insert(last.clone(), value);
                Ok(())
            }
            other => Err(EvalError::new(format!(
                "Cannot index-assign into {}",
                other.type_name()
            ))),
        }
    }

    fn exec_if(
        &mut self,
        cond: &Expr,
        then_branch: &[Stmt],
        elifs: &[ElseIf],
        else_branch: Option<&[Stmt]>,
    ) -> ExecResult {
        if self.eval_expr(cond)?.is_truthy() {
            return self.exec_block(then_branch);
        }
        for arm in elifs {
            if self.eval_expr(&arm.cond)?.is_truthy() {
                return self.exec_block(&arm.body);
            }
        }
        match else_branch {
            Some(body) => self.exec_block(body),
            None => Ok(Flow::Normal),
        }
    }

    /// Handle the flow a loop body produced. `Some` ends the loop.
    fn loop_exit(flow: Flow) -> Option<Flow> {
        match flow {
            Flow::Normal | Flow::Continue => None,
            Flow::Break(1) => Some(Flow::Normal),
            Flow::Break(n) => Some(Flow::Break(n - 1)),
            other @ (Flow::Return(_) | Flow::Goto(_)) => Some(other),
        }
    }

    fn exec_while(&mut self, cond: &Expr, body: &[Stmt]) -> ExecResult {
        while self.eval_expr(cond)?.is_truthy() {
            if let Some(flow) = Self::loop_exit(self.exec_block(body)?) {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for(&mut self, counter: &str, target: &Expr, body: &[Stmt]) -> ExecResult {
        let n = match self.eval_expr(target)? {
            Value::Int(n) => n,
            other => {
                return Err(EvalError::new(format!(
                    "FOR target must be INT, got {}",
                    other.type_name()
                )))
            }
        };
        let scope = self.scope.clone();
        for i in 1..=n {
            self.ns
                .assign(&scope, counter, Value::Int(i), DeclType::Int, true)
                .map_err(|e| from_env(counter, &e))?;
            if let Some(flow) = Self::loop_exit(self.exec_block(body)?) {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn define_function(&mut self, def: &Arc<FuncDef>) -> Result<(), EvalError> {
        let name = def.name.as_str();
        if self.builtins.contains(name) {
            return Err(EvalError::new(format!(
                "Cannot define function '{name}': name is a builtin"
            )));
        }
        let scope = self.scope.clone();
        if let Some(entry) = self.ns.get_entry(&scope, name) {
            if entry.initialized && entry.declared_type != DeclType::Func {
                return Err(EvalError::new(format!(
                    "Cannot define function '{name}': identifier is bound to a {} value",
                    entry.declared_type.keyword()
                )));
            }
        }
        let func = FuncValue::new(Arc::clone(def), scope.clone());
        self.ns
            .assign(&scope, name, Value::Func(func.clone()), DeclType::Func, true)
            .map_err(|e| from_env(name, &e))?;
        self.functions.insert(name.to_owned(), func);
        Ok(())
    }

    fn exec_pop(&mut self, name: &str) -> ExecResult {
        if self.call_stack.is_empty() {
            return Err(EvalError::new("POP outside of function"));
        }
        let scope = self.scope.clone();
        let binding = self
            .ns
            .get(&scope, name)
            .ok_or_else(|| undefined_identifier(name))?;
        if !binding.initialized {
            return Err(uninitialized(name));
        }
        self.ns
            .delete(&scope, name)
            .map_err(|e| from_env(name, &e))?;
        Ok(Flow::Return(binding.value))
    }

    fn exec_try(
        &mut self,
        body: &[Stmt],
        catch_name: Option<&str>,
        catch_body: &[Stmt],
        loc: Location,
    ) -> ExecResult {
        let err = match self.exec_block(body) {
            Ok(flow) => return Ok(flow),
            Err(err) => err,
        };
        self.take_error();
        tracing::debug!(error = %err.message, at = %loc, "caught runtime error");
        if let Some(name) = catch_name {
            let scope = self.scope.clone();
            match self.ns.define(&scope, name, DeclType::Str) {
                Ok(()) | Err(EnvError::AlreadyDefined(_)) => {}
                Err(e) => return Err(from_env(name, &e)),
            }
            self.ns
                .assign(&scope, name, Value::Str(err.message), DeclType::Str, false)
                .map_err(|e| from_env(name, &e))?;
        }
        self.exec_block(catch_body)
    }
}

/// Identifier at the bottom of a chain of index expressions.
fn root_ident(expr: &Expr) -> Option<&str> {
    match &expr.kind {
        ExprKind::Ident(name) | ExprKind::Ptr(name) => Some(name),
        ExprKind::Index { target, .. } => root_ident(target),
        _ => None,
    }
}
